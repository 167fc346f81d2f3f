//! Track states, wire measurements, and the Kalman update/combination
//! operations that form the inner loop of a track fit.

pub mod hit;
pub mod kalman;
pub mod measurement;
pub mod state;

pub use hit::HitState;
pub use kalman::{CovUpdateForm, KFTrackState};
pub use measurement::{KalmanFilterTrackMeasurement, TrackFitMeasurement};
pub use state::{mass_for_pdg, TrackState};
