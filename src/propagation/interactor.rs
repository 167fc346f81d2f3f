//! Material-interaction hooks for the propagator: energy loss and
//! multiple-scattering process noise.

use nalgebra::Matrix5;

use crate::common::constants::{HIGHLAND_EPSILON, HIGHLAND_S2};
use crate::detector::DetectorProperties;
use crate::fit::TrackState;

/// Material effects applied during propagation.
///
/// `dedx_prop` advances the signed inverse momentum over a path length
/// (`None` means the particle ran out of energy and the propagation must
/// fail); `noise` returns the 5x5 process-noise covariance for multiple
/// scattering and energy-loss fluctuations over a path length (`None` on
/// invalid kinematics).
///
/// Implementations are read-only and shared across concurrent fits.
pub trait Interactor: Sync {
    fn dedx_prop(&self, pinv: f64, mass: f64, s: f64) -> Option<f64>;

    fn noise(&self, state: &TrackState, s: f64) -> Option<Matrix5<f64>>;
}

/// Liquid-argon implementation: midpoint dE/dx integration and Highland
/// multiple scattering.
#[derive(Debug, Clone)]
pub struct LarInteractor<'a, D: DetectorProperties> {
    detprop: &'a D,
    /// Delta-ray cutoff (MeV) for the restricted energy loss.
    tcut: f64,
}

impl<'a, D: DetectorProperties> LarInteractor<'a, D> {
    pub fn new(detprop: &'a D, tcut: f64) -> Self {
        Self { detprop, tcut }
    }
}

impl<D: DetectorProperties> Interactor for LarInteractor<'_, D> {
    /// Midpoint integration of the energy loss over `s` (cm, signed along
    /// the momentum vector; negative path lengths add energy back, as used
    /// by backward smoothing passes).
    fn dedx_prop(&self, pinv: f64, mass: f64, s: f64) -> Option<f64> {
        // infinite momentum propagates unchanged
        if pinv == 0.0 {
            return Some(pinv);
        }
        let p1 = 1.0 / pinv.abs();
        let e1 = p1.hypot(mass);

        // half step at the initial momentum to get a midpoint estimate
        let e_mid = e1 - 0.5 * s * self.detprop.eloss(p1, mass, self.tcut);
        if e_mid <= mass {
            return None;
        }
        let p_mid = (e_mid * e_mid - mass * mass).sqrt();

        // full step evaluated at the midpoint momentum
        let e2 = e1 - s * self.detprop.eloss(p_mid, mass, self.tcut);
        if e2 <= mass {
            return None;
        }
        let p2 = (e2 * e2 - mass * mass).sqrt();

        Some(pinv.signum() / p2)
    }

    /// Multiple-scattering plus energy-loss-fluctuation covariance for a
    /// step of `s` cm (signed along the momentum vector).
    ///
    /// The projected scattering angle follows the Highland formula; the
    /// slope/position block is the standard thick-scatterer covariance for
    /// the slope parameterization, with the position block growing as s^2/3
    /// and the position-slope correlation as s/2.
    fn noise(&self, state: &TrackState, s: f64) -> Option<Matrix5<f64>> {
        let mass = state.mass();
        if mass < 0.0 {
            return None;
        }
        let pinv = state.parameters()[4];
        if pinv == 0.0 || s == 0.0 {
            return Some(Matrix5::zeros());
        }
        let p = 1.0 / pinv.abs();
        let e = p.hypot(mass);
        let beta = p / e;

        let x0 = self.detprop.radiation_length() / self.detprop.density();
        let xs = s.abs() / x0;
        let theta_fact = (HIGHLAND_S2 / (beta * p)) * (1.0 + HIGHLAND_EPSILON * xs.ln());
        let theta02 = theta_fact * theta_fact * xs;

        let a = state.parameters()[2];
        let b = state.parameters()[3];
        let fu = 1.0 + a * a;
        let fv = 1.0 + b * b;
        let fuv = 1.0 + a * a + b * b;
        let fuv_sqrt = fuv.sqrt();

        let dist_2 = s / 2.0;
        let dist2_3 = s * s / 3.0;

        let mut n = Matrix5::zeros();
        n[(0, 0)] = theta02 * fuv * fu * dist2_3;
        n[(1, 1)] = theta02 * fuv * fv * dist2_3;
        n[(0, 1)] = theta02 * fuv * a * b * dist2_3;
        n[(1, 0)] = n[(0, 1)];

        n[(0, 2)] = theta02 * fuv_sqrt * fu * dist_2;
        n[(2, 0)] = n[(0, 2)];
        n[(1, 3)] = theta02 * fuv_sqrt * fv * dist_2;
        n[(3, 1)] = n[(1, 3)];
        n[(0, 3)] = theta02 * fuv_sqrt * a * b * dist_2;
        n[(3, 0)] = n[(0, 3)];
        n[(1, 2)] = theta02 * fuv_sqrt * a * b * dist_2;
        n[(2, 1)] = n[(1, 2)];

        n[(2, 2)] = theta02 * fuv * fu;
        n[(3, 3)] = theta02 * fuv * fv;
        n[(2, 3)] = theta02 * fuv * a * b;
        n[(3, 2)] = n[(2, 3)];

        // energy-loss fluctuations on q/p
        let evar = self.detprop.eloss_var(p, mass) * s.abs();
        n[(4, 4)] = evar * e * e / (p * p * p * p * p * p);

        Some(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::constants::MASS_MUON;
    use crate::detector::LarProperties;
    use crate::geometry::Plane;
    use nalgebra::{Point3, Vector3, Vector5};

    fn muon_state(p: f64) -> TrackState {
        TrackState::new(
            Vector5::new(0.0, 0.0, 0.0, 0.0, 1.0 / p),
            Matrix5::identity() * 1e-4,
            Plane::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0)),
            true,
            13,
        )
    }

    #[test]
    fn test_dedx_decreases_momentum_forward() {
        let props = LarProperties::standard();
        let inter = LarInteractor::new(&props, 0.0);
        let pinv = inter.dedx_prop(1.0, MASS_MUON, 10.0).unwrap();
        assert!(pinv > 1.0, "momentum should drop, got 1/pinv = {}", 1.0 / pinv);
    }

    #[test]
    fn test_dedx_negative_path_restores_momentum() {
        let props = LarProperties::standard();
        let inter = LarInteractor::new(&props, 0.0);
        let down = inter.dedx_prop(1.0, MASS_MUON, 10.0).unwrap();
        let back = inter.dedx_prop(down, MASS_MUON, -10.0).unwrap();
        assert!((back - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_dedx_stops_slow_particle() {
        let props = LarProperties::standard();
        let inter = LarInteractor::new(&props, 0.0);
        // a 50 MeV muon cannot cross a meter of argon
        assert!(inter.dedx_prop(1.0 / 0.05, MASS_MUON, 100.0).is_none());
    }

    #[test]
    fn test_dedx_preserves_charge_sign() {
        let props = LarProperties::standard();
        let inter = LarInteractor::new(&props, 0.0);
        let pinv = inter.dedx_prop(-1.0, MASS_MUON, 10.0).unwrap();
        assert!(pinv < 0.0);
    }

    #[test]
    fn test_noise_positive_variances() {
        let props = LarProperties::standard();
        let inter = LarInteractor::new(&props, 0.0);
        let n = inter.noise(&muon_state(1.0), 5.0).unwrap();
        for i in 0..5 {
            assert!(n[(i, i)] > 0.0, "diagonal {} not positive", i);
        }
        // symmetric by construction
        for i in 0..5 {
            for j in 0..5 {
                assert_eq!(n[(i, j)], n[(j, i)]);
            }
        }
    }

    #[test]
    fn test_noise_shrinks_with_momentum() {
        let props = LarProperties::standard();
        let inter = LarInteractor::new(&props, 0.0);
        let lo = inter.noise(&muon_state(0.5), 5.0).unwrap();
        let hi = inter.noise(&muon_state(5.0), 5.0).unwrap();
        assert!(hi[(2, 2)] < lo[(2, 2)]);
    }

    #[test]
    fn test_noise_rejects_invalid_mass() {
        let props = LarProperties::standard();
        let inter = LarInteractor::new(&props, 0.0);
        let mut state = muon_state(1.0);
        state = TrackState::new(
            *state.parameters(),
            *state.covariance(),
            state.plane().clone(),
            true,
            11, // electron: unsupported hypothesis
        );
        assert!(inter.noise(&state, 5.0).is_none());
    }
}
