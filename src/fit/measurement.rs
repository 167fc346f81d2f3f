//! Measurement/prediction pairs for the global (non-incremental) track fit.
//!
//! The forward pass of a global fit stores, for every hit, the scalar
//! measurement together with the predicted [`TrackState`] at that hit
//! ([`TrackFitMeasurement`]). The backward/combination pass then replays
//! the stored pairs through [`KalmanFilterTrackMeasurement`], which applies
//! the same update/combine algebra as the incremental filter but operates
//! on the stored prediction instead of a live state.

use crate::common::constants::PLANE_MATCH_TOL2;
use crate::common::linalg::{planes_match, sym_lower};
use crate::fit::state::TrackState;
use nalgebra::Vector5;

/// One scalar hit measurement paired with the predicted track state at the
/// time the measurement was taken. Immutable once constructed.
#[derive(Debug, Clone)]
pub struct TrackFitMeasurement {
    hit_meas: f64,
    hit_meas_err2: f64,
    track_state: TrackState,
}

impl TrackFitMeasurement {
    pub fn new(hit_meas: f64, hit_meas_err2: f64, track_state: TrackState) -> Self {
        Self {
            hit_meas,
            hit_meas_err2,
            track_state,
        }
    }

    #[inline]
    pub fn hit_meas(&self) -> f64 {
        self.hit_meas
    }

    #[inline]
    pub fn hit_meas_err2(&self) -> f64 {
        self.hit_meas_err2
    }

    /// The predicted state at this measurement.
    #[inline]
    pub fn track_state(&self) -> &TrackState {
        &self.track_state
    }

    #[inline]
    pub fn residual(&self) -> f64 {
        self.hit_meas - self.track_state.parameters()[0]
    }

    #[inline]
    pub fn combined_error2(&self) -> f64 {
        self.hit_meas_err2 + self.track_state.covariance()[(0, 0)]
    }

    #[inline]
    pub fn chi2(&self) -> f64 {
        let r = self.residual();
        r * r / self.combined_error2()
    }
}

/// Single-measurement Kalman algebra over a stored prediction.
#[derive(Debug, Clone)]
pub struct KalmanFilterTrackMeasurement {
    measurement: TrackFitMeasurement,
}

impl KalmanFilterTrackMeasurement {
    pub fn new(measurement: TrackFitMeasurement) -> Self {
        Self { measurement }
    }

    #[inline]
    pub fn measurement(&self) -> &TrackFitMeasurement {
        &self.measurement
    }

    /// The stored prediction updated with the stored measurement (1D gain
    /// update of component 0). The pair shares one plane by construction,
    /// so no plane check is needed here.
    pub fn updated_state(&self) -> TrackState {
        let prediction = self.measurement.track_state();
        let par = *prediction.parameters();
        let cov = *prediction.covariance();

        let k = 1.0 / (self.measurement.hit_meas_err2() + cov[(0, 0)]);
        let c0: Vector5<f64> = cov.column(0).into_owned();
        let resid = self.measurement.hit_meas() - par[0];

        let mut state = prediction.clone();
        state.set_parameters(par + c0 * (k * resid));
        state.set_covariance(cov - c0 * c0.transpose() * k);
        state
    }

    /// Fuse the stored prediction with an independent estimate of the same
    /// quantity (information-form combination, same algebra as
    /// `KFTrackState::combine_with_track_state`).
    ///
    /// Returns `None` when the covariance sum is singular, or when the two
    /// states are not on the same plane.
    pub fn combine_with_state(&self, other: &TrackState) -> Option<TrackState> {
        let prediction = self.measurement.track_state();
        if !planes_match(other.plane(), prediction.plane(), PLANE_MATCH_TOL2) {
            return None;
        }

        let par1 = *prediction.parameters();
        let par2 = *other.parameters();
        let cov1 = *prediction.covariance();
        let cov2 = *other.covariance();

        let inv = (cov1 + cov2).try_inverse()?;
        let gain = cov1 * inv;

        let mut state = prediction.clone();
        state.set_parameters(par1 + gain * (par2 - par1));
        state.set_covariance(sym_lower(&(gain * cov2)));
        Some(state)
    }
}
