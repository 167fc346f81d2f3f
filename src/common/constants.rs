//! Numerical constants used throughout the fitting and propagation code.
//!
//! These are fixed algorithm constants, intentionally separate from the
//! user-configurable parameters in [`crate::detector`] and
//! [`crate::propagation::PropagatorConfig`].

/// Squared-distance tolerance for deciding that two planes coincide.
///
/// Both the plane positions and the plane directions are compared
/// independently against this tolerance before a Kalman update or
/// combination is allowed to proceed.
pub const PLANE_MATCH_TOL2: f64 = 1e-5;

/// Hard cap on propagation sub-steps.
///
/// Exceeding the cap is reported as a propagation failure; it is a bound on
/// non-convergence, not an expected operating point.
pub const MAX_PROPAGATION_ITERS: usize = 10_000;

/// Muon mass (GeV/c^2).
pub const MASS_MUON: f64 = 0.105658367;

/// Charged pion mass (GeV/c^2).
pub const MASS_PION: f64 = 0.1395704;

/// Charged kaon mass (GeV/c^2).
pub const MASS_KAON: f64 = 0.4936770;

/// Proton mass (GeV/c^2).
pub const MASS_PROTON: f64 = 0.9382720;

/// Sentinel mass for unrecognized particle hypotheses (GeV/c^2).
///
/// Only the four hypotheses above are supported; anything else maps to this
/// sentinel rather than being silently extended.
pub const BOGUS_MASS: f64 = -999.0;

/// Bethe stopping-power constant K = 4 pi N_A r_e^2 m_e c^2 (MeV cm^2/mol).
pub const BETHE_K_MEV: f64 = 0.307075;

/// Electron mass (MeV/c^2).
pub const ELECTRON_MASS_MEV: f64 = 0.510998918;

/// Highland multiple-scattering constant (GeV).
pub const HIGHLAND_S2: f64 = 0.0136;

/// Logarithmic correction coefficient in the Highland formula.
pub const HIGHLAND_EPSILON: f64 = 0.038;
