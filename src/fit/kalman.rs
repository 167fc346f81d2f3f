//! Kalman update and combination of track states.
//!
//! [`KFTrackState`] wraps one [`TrackState`] and implements the two core
//! operations of the fit:
//!
//! - `update_with_hit_state`: 1D Kalman gain update against a scalar wire
//!   measurement (component 0 of the state is the measured coordinate);
//! - `combine_with_track_state`: information-form fusion of two independent
//!   estimates on the same plane (e.g. forward and backward fit results).
//!
//! Both are guarded transitions: on any precondition failure they return
//! `false` and leave the wrapped state unchanged.

use nalgebra::{Matrix5, RowVector5, Vector5};

use crate::common::constants::PLANE_MATCH_TOL2;
use crate::common::linalg::{planes_match, sym_lower};
use crate::fit::hit::HitState;
use crate::fit::state::TrackState;

/// Covariance-update formula for the measurement update.
///
/// `Standard` is the plain gain-form update `cov - k * c0 * c0^T` and the
/// default. `Joseph` is the numerically more robust Joseph form, available
/// only by explicit request, never silently selected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CovUpdateForm {
    #[default]
    Standard,
    Joseph,
}

/// A track state undergoing Kalman filtering. Owns the wrapped state.
#[derive(Debug, Clone)]
pub struct KFTrackState {
    state: TrackState,
}

impl KFTrackState {
    pub fn new(state: TrackState) -> Self {
        Self { state }
    }

    /// Read access to the wrapped state.
    #[inline]
    pub fn track_state(&self) -> &TrackState {
        &self.state
    }

    /// Consume the wrapper, returning the wrapped state.
    #[inline]
    pub fn into_track_state(self) -> TrackState {
        self.state
    }

    /// Update the state with a scalar wire measurement using the standard
    /// covariance form. Returns `false` (state untouched) when the hit's
    /// plane does not coincide with the state's plane within tolerance.
    pub fn update_with_hit_state(&mut self, hit: &HitState) -> bool {
        self.update_with_hit_state_using(hit, CovUpdateForm::Standard)
    }

    /// Update with an explicitly chosen covariance-update formula.
    pub fn update_with_hit_state_using(&mut self, hit: &HitState, form: CovUpdateForm) -> bool {
        if !planes_match(hit.plane(), self.state.plane(), PLANE_MATCH_TOL2) {
            return false;
        }

        let par = *self.state.parameters();
        let cov = *self.state.covariance();

        // scalar gain denominator: measurement variance plus prior variance
        // of the measured component
        let k = 1.0 / (hit.hit_meas_err2() + cov[(0, 0)]);
        let c0: Vector5<f64> = cov.column(0).into_owned();
        let resid = hit.hit_meas() - par[0];

        let new_par = par + c0 * (k * resid);
        let new_cov = match form {
            // cov - Similarity(cov, K) with K the single-entry gain matrix;
            // symmetric by construction
            CovUpdateForm::Standard => cov - c0 * c0.transpose() * k,
            CovUpdateForm::Joseph => {
                let gain = c0 * k;
                let mut h = RowVector5::zeros();
                h[0] = 1.0;
                let ikh = Matrix5::identity() - gain * h;
                ikh * cov * ikh.transpose() + gain * hit.hit_meas_err2() * gain.transpose()
            }
        };

        self.state.set_parameters(new_par);
        self.state.set_covariance(new_cov);
        true
    }

    /// Fuse the state with an independent estimate on the same plane.
    ///
    /// Information-form combination: with `S = cov1 + cov2` and gain
    /// `K = cov1 * S^-1`, the fused parameters are `par1 + K*(par2 - par1)`
    /// and the fused covariance is the symmetrized lower triangle of
    /// `K * cov2` (algebraically the Joseph-form result for consistent
    /// inputs, at lower cost). Returns `false` with the state untouched on a
    /// plane mismatch or when `S` is singular.
    pub fn combine_with_track_state(&mut self, other: &TrackState) -> bool {
        if !planes_match(other.plane(), self.state.plane(), PLANE_MATCH_TOL2) {
            return false;
        }

        let par1 = *self.state.parameters();
        let par2 = *other.parameters();
        let cov1 = *self.state.covariance();
        let cov2 = *other.covariance();

        let inv = match (cov1 + cov2).try_inverse() {
            Some(m) => m,
            None => return false,
        };
        let gain = cov1 * inv;

        self.state.set_parameters(par1 + gain * (par2 - par1));
        self.state.set_covariance(sym_lower(&(gain * cov2)));
        true
    }

    /// Delegated hit diagnostics.
    #[inline]
    pub fn residual(&self, hit: &HitState) -> f64 {
        self.state.residual(hit)
    }

    #[inline]
    pub fn combined_error2(&self, hit: &HitState) -> f64 {
        self.state.combined_error2(hit)
    }

    #[inline]
    pub fn chi2(&self, hit: &HitState) -> f64 {
        self.state.chi2(hit)
    }
}

impl From<TrackState> for KFTrackState {
    fn from(state: TrackState) -> Self {
        Self::new(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{Plane, WireId};
    use nalgebra::{Point3, Vector3};

    fn plane_at_origin() -> Plane {
        Plane::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0))
    }

    fn state_with_cov(cov00: f64) -> KFTrackState {
        let mut cov = Matrix5::identity() * 0.1;
        cov[(0, 0)] = cov00;
        KFTrackState::new(TrackState::new(
            Vector5::new(0.0, 0.0, 0.0, 0.0, 1.0),
            cov,
            plane_at_origin(),
            true,
            13,
        ))
    }

    #[test]
    fn test_update_moves_toward_measurement() {
        let mut kf = state_with_cov(0.04);
        let hit = HitState::new(0.1, 0.01, WireId::default(), plane_at_origin());
        assert!(kf.update_with_hit_state(&hit));
        let u = kf.track_state().parameters()[0];
        assert!(u > 0.0 && u < 0.1, "u = {} not between prior and hit", u);
    }

    #[test]
    fn test_update_shrinks_variance() {
        let mut kf = state_with_cov(0.04);
        let hit = HitState::new(0.0, 0.01, WireId::default(), plane_at_origin());
        assert!(kf.update_with_hit_state(&hit));
        assert!(kf.track_state().covariance()[(0, 0)] < 0.04);
    }

    #[test]
    fn test_joseph_form_matches_standard_for_good_inputs() {
        let hit = HitState::new(0.07, 0.02, WireId::default(), plane_at_origin());
        let mut a = state_with_cov(0.05);
        let mut b = state_with_cov(0.05);
        assert!(a.update_with_hit_state_using(&hit, CovUpdateForm::Standard));
        assert!(b.update_with_hit_state_using(&hit, CovUpdateForm::Joseph));
        for i in 0..5 {
            for j in 0..5 {
                let d = (a.track_state().covariance()[(i, j)]
                    - b.track_state().covariance()[(i, j)])
                .abs();
                assert!(d < 1e-12, "covariances differ at ({},{})", i, j);
            }
        }
    }

    #[test]
    fn test_plane_mismatch_rejected_without_mutation() {
        let mut kf = state_with_cov(0.04);
        let far_plane = Plane::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let hit = HitState::new(0.1, 0.01, WireId::default(), far_plane);
        let before = *kf.track_state().parameters();
        assert!(!kf.update_with_hit_state(&hit));
        assert_eq!(*kf.track_state().parameters(), before);
    }

    #[test]
    fn test_combine_with_self_halves_covariance() {
        let mut kf = state_with_cov(0.04);
        let copy = kf.track_state().clone();
        assert!(kf.combine_with_track_state(&copy));
        // equal estimates: parameters unchanged, covariance halved
        assert_eq!(kf.track_state().parameters()[0], 0.0);
        assert!((kf.track_state().covariance()[(0, 0)] - 0.02).abs() < 1e-12);
    }
}
