//! The 5-parameter track state and particle hypotheses.

use nalgebra::{Matrix5, Matrix6, Point3, Vector3, Vector5, Vector6};

use crate::common::constants::{BOGUS_MASS, MASS_KAON, MASS_MUON, MASS_PION, MASS_PROTON};
use crate::fit::hit::HitState;
use crate::geometry::Plane;

/// Rest mass in GeV for a PDG particle code.
///
/// Only the four hypotheses used by the track fit are supported; any other
/// code maps to the [`BOGUS_MASS`] sentinel. Deliberately not extended.
pub fn mass_for_pdg(pdg: i32) -> f64 {
    match pdg.abs() {
        13 => MASS_MUON,
        211 => MASS_PION,
        321 => MASS_KAON,
        2212 => MASS_PROTON,
        _ => BOGUS_MASS,
    }
}

/// Track kinematic state with uncertainty on a specific [`Plane`].
///
/// Owns the local 5-parameter vector `(u, v, du/dw, dv/dw, q/p)`, its 5x5
/// symmetric covariance, the plane the parameters are expressed on, and the
/// particle hypothesis. The derived global position and momentum are kept
/// consistent with the parameters: every parameter or plane change goes
/// through [`TrackState::set_parameters`], which recomputes them.
#[derive(Debug, Clone)]
pub struct TrackState {
    par: Vector5<f64>,
    cov: Matrix5<f64>,
    plane: Plane,
    pid: i32,
    pos: Point3<f64>,
    mom: Vector3<f64>,
}

impl TrackState {
    /// Build a state from local parameters on a plane.
    ///
    /// `track_along_plane_dir` resolves the two-fold sign ambiguity of the
    /// slope parameterization when deriving the global momentum.
    pub fn new(
        par: Vector5<f64>,
        cov: Matrix5<f64>,
        plane: Plane,
        track_along_plane_dir: bool,
        pid: i32,
    ) -> Self {
        let (pos, mom) = plane.local_to_global(&par, track_along_plane_dir);
        Self {
            par,
            cov,
            plane,
            pid,
            pos,
            mom,
        }
    }

    /// Local 5-parameter vector.
    #[inline]
    pub fn parameters(&self) -> &Vector5<f64> {
        &self.par
    }

    /// Local 5x5 covariance.
    #[inline]
    pub fn covariance(&self) -> &Matrix5<f64> {
        &self.cov
    }

    /// Plane the parameters are expressed on.
    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }

    /// PDG particle hypothesis code.
    #[inline]
    pub fn pid(&self) -> i32 {
        self.pid
    }

    /// Global position derived from the parameters.
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        self.pos
    }

    /// Global momentum derived from the parameters.
    #[inline]
    pub fn momentum(&self) -> Vector3<f64> {
        self.mom
    }

    /// Rest mass of the current hypothesis; [`BOGUS_MASS`] if unsupported.
    #[inline]
    pub fn mass(&self) -> f64 {
        mass_for_pdg(self.pid)
    }

    /// True iff the momentum has positive component along the plane normal.
    #[inline]
    pub fn is_track_along_plane_dir(&self) -> bool {
        self.mom.dot(&self.plane.direction()) > 0.0
    }

    /// Replace the parameters, recomputing the derived position and
    /// momentum. The direction flag is taken from the state before the
    /// update. Always paired with [`TrackState::set_covariance`].
    pub fn set_parameters(&mut self, par: Vector5<f64>) {
        let along = self.is_track_along_plane_dir();
        self.par = par;
        let (pos, mom) = self.plane.local_to_global(&self.par, along);
        self.pos = pos;
        self.mom = mom;
    }

    /// Replace the covariance.
    #[inline]
    pub fn set_covariance(&mut self, cov: Matrix5<f64>) {
        self.cov = cov;
    }

    /// Position and momentum packed as a global 6-vector.
    pub fn parameters_6d(&self) -> Vector6<f64> {
        Vector6::new(
            self.pos.x, self.pos.y, self.pos.z, self.mom.x, self.mom.y, self.mom.z,
        )
    }

    /// Global 6x6 covariance, mapping the local covariance through the
    /// plane's local-to-global Jacobian.
    pub fn covariance_6d(&self) -> Matrix6<f64> {
        self.plane
            .local_to_global_covariance(&self.cov, &self.par, self.is_track_along_plane_dir())
    }

    /// Measurement residual of the leading (measured) parameter.
    #[inline]
    pub fn residual(&self, hit: &HitState) -> f64 {
        hit.hit_meas() - self.par[0]
    }

    /// Sum of measurement variance and the state's leading variance.
    #[inline]
    pub fn combined_error2(&self, hit: &HitState) -> f64 {
        hit.hit_meas_err2() + self.cov[(0, 0)]
    }

    #[inline]
    pub fn combined_error(&self, hit: &HitState) -> f64 {
        self.combined_error2(hit).sqrt()
    }

    /// One-degree-of-freedom chi2 of the state against a hit.
    #[inline]
    pub fn chi2(&self, hit: &HitState) -> f64 {
        let r = self.residual(hit);
        r * r / self.combined_error2(hit)
    }
}
