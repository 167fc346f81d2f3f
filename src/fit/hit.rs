//! Scalar wire measurements.

use crate::geometry::{wire_plane, Plane, WireGeometry, WireId};

/// A single 1D wire measurement: drift-coordinate impact parameter with its
/// variance, tied to the wire it came from and the measurement plane built
/// from that wire's geometry.
///
/// Immutable once constructed. The plane must geometrically correspond to
/// the wire id (same wire, same drift convention); handing in a mismatched
/// plane is caller error. Use [`HitState::from_wire`] to build the plane
/// from a geometry provider.
#[derive(Debug, Clone)]
pub struct HitState {
    hit_meas: f64,
    hit_meas_err2: f64,
    wire_id: WireId,
    plane: Plane,
}

impl HitState {
    pub fn new(hit_meas: f64, hit_meas_err2: f64, wire_id: WireId, plane: Plane) -> Self {
        Self {
            hit_meas,
            hit_meas_err2,
            wire_id,
            plane,
        }
    }

    /// Build a hit on the measurement plane of `wire_id`, looked up through
    /// the injected geometry. `None` for unknown wires.
    pub fn from_wire(
        hit_meas: f64,
        hit_meas_err2: f64,
        wire_id: WireId,
        geometry: &impl WireGeometry,
    ) -> Option<Self> {
        let center = geometry.wire_center(wire_id)?;
        let theta_z = geometry.wire_theta_z(wire_id)?;
        Some(Self::new(
            hit_meas,
            hit_meas_err2,
            wire_id,
            wire_plane(&center, theta_z),
        ))
    }

    /// Measured value (drift distance).
    #[inline]
    pub fn hit_meas(&self) -> f64 {
        self.hit_meas
    }

    /// Measurement variance.
    #[inline]
    pub fn hit_meas_err2(&self) -> f64 {
        self.hit_meas_err2
    }

    #[inline]
    pub fn wire_id(&self) -> WireId {
        self.wire_id
    }

    #[inline]
    pub fn plane(&self) -> &Plane {
        &self.plane
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{GridView, LineGrid};
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_from_wire() {
        let grid = LineGrid::new(vec![GridView {
            theta_z: FRAC_PI_2,
            pitch: 0.3,
            n_wires: 100,
            origin: [0.0, 0.0, 0.0],
        }]);
        let hit = HitState::from_wire(25.0, 0.04, WireId::new(0, 0, 0, 7), &grid).unwrap();
        assert_eq!(hit.wire_id().wire, 7);
        // measurement plane origin sits at drift coordinate zero
        assert_eq!(hit.plane().position().x, 0.0);
        assert!(HitState::from_wire(25.0, 0.04, WireId::new(0, 0, 0, 100), &grid).is_none());
    }
}
