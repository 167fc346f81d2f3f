/*!
# lar-trackfit - Track-state Kalman filtering for liquid-argon TPCs

Rust implementation of the track-state representation, Kalman
update/combination algebra, and plane-to-plane propagation used by
liquid-argon TPC track fits.

## Features

- 5-parameter local track states with 5x5 covariance on rotated
  measurement planes
- 1D Kalman update against wire measurements and information-form
  combination of independent estimates
- Iterative plane-to-plane propagation with energy loss and
  multiple-scattering noise
- Wire-geometry surface adapters and a liquid-argon medium model

## Modules

- [`fit`] - Track states, hits, and the Kalman operations
- [`propagation`] - The plane-to-plane propagation engine
- [`geometry`] - Plane frames and wire geometry
- [`detector`] - Medium properties (dE/dx, density, radiation length)
- [`common`] - Low-level constants and matrix helpers

## Example

```rust
use lar_trackfit::detector::LarProperties;
use lar_trackfit::fit::{HitState, KFTrackState, TrackState};
use lar_trackfit::geometry::{Plane, WireId};
use lar_trackfit::propagation::{
    Direction, LarInteractor, PropagatorConfig, PropagatorToPlane,
};
use nalgebra::{Matrix5, Point3, Vector3, Vector5};

// shared, read-only services
let props = LarProperties::standard();
let interactor = LarInteractor::new(&props, 10.0);
let propagator = PropagatorToPlane::new(&props, &interactor, PropagatorConfig::default());

// a 1 GeV/c muon heading down the z axis
let seed = TrackState::new(
    Vector5::new(0.0, 0.0, 0.0, 0.0, 1.0),
    Matrix5::identity() * 0.1,
    Plane::new(Point3::origin(), Vector3::new(0.0, 0.0, 1.0)),
    true,
    13,
);

// propagate to a measurement plane and update with a hit there
let target = Plane::new(Point3::new(0.0, 0.0, 5.0), Vector3::new(0.0, 0.0, 1.0));
let (predicted, ok) = propagator.propagate_to_plane(&seed, &target, true, true, Direction::Forward);
assert!(ok);

let hit = HitState::new(0.02, 1e-4, WireId::default(), target);
let mut kf = KFTrackState::new(predicted);
assert!(kf.update_with_hit_state(&hit));
```
*/

// ============================================================================
// Core modules
// ============================================================================

/// Track states, wire measurements, and Kalman update/combination
pub mod fit;

/// Plane-to-plane propagation with material effects
pub mod propagation;

/// Plane frames and wire geometry adapters
pub mod geometry;

/// Detector and medium properties
pub mod detector;

/// Low-level utilities (constants, matrix helpers)
pub mod common;

// ============================================================================
// Re-exports for convenience
// ============================================================================

// Core types
pub use fit::{
    CovUpdateForm, HitState, KFTrackState, KalmanFilterTrackMeasurement, TrackFitMeasurement,
    TrackState,
};

// Geometry
pub use geometry::{wire_line, wire_plane, Plane, WireGeometry, WireId};

// Propagation
pub use propagation::{Direction, Interactor, LarInteractor, PropagatorConfig, PropagatorToPlane};

// Detector properties
pub use detector::{ConfigError, DetectorProperties, LarProperties, LarPropertiesConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
