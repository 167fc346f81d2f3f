//! Wire identifiers, the wire-geometry provider seam, and the surface
//! adapters that build measurement planes from wires.
//!
//! The geometry lookup is injected through [`WireGeometry`] rather than
//! reached through a global service; implementations are read-only and must
//! be shareable across concurrent track fits.

use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::plane::Plane;

/// Identifies one sense wire in the detector.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct WireId {
    pub cryostat: u32,
    pub tpc: u32,
    pub plane: u32,
    pub wire: u32,
}

impl WireId {
    pub fn new(cryostat: u32, tpc: u32, plane: u32, wire: u32) -> Self {
        Self {
            cryostat,
            tpc,
            plane,
            wire,
        }
    }
}

impl fmt::Display for WireId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "C:{} T:{} P:{} W:{}",
            self.cryostat, self.tpc, self.plane, self.wire
        )
    }
}

/// Read-only wire geometry lookup.
///
/// `theta_z` is the azimuthal angle of the wire with respect to the z axis,
/// in the y-z plane.
pub trait WireGeometry: Sync {
    /// 3D center of the wire, or `None` for an unknown id.
    fn wire_center(&self, id: WireId) -> Option<Point3<f64>>;

    /// Wire angle with respect to the z axis, or `None` for an unknown id.
    fn wire_theta_z(&self, id: WireId) -> Option<f64>;
}

/// Build the measurement plane for a wire from its center and angle.
///
/// The plane contains the wire and the drift (x) axis; the frame rotation
/// about the drift axis is by `phi = pi/2 - theta_z`. Equivalently the wire
/// direction is `(0, sin theta_z, cos theta_z)` and the plane normal is
/// `(0, -cos theta_z, sin theta_z)`, so that the local `u` axis is the drift
/// axis and the local `v` axis is the wire axis. The plane origin sits at
/// drift coordinate zero: measured `u` values are absolute drift distances.
pub fn wire_plane(center: &Point3<f64>, theta_z: f64) -> Plane {
    let normal = Vector3::new(0.0, -theta_z.cos(), theta_z.sin());
    Plane::new(Point3::new(0.0, center.y, center.z), normal)
}

/// Line-surface variant of [`wire_plane`]: same orientation, origin placed
/// at the caller-supplied drift coordinate `x`. Used by 2D view fits where
/// the measurement is an impact parameter relative to a known drift offset.
pub fn wire_line(center: &Point3<f64>, theta_z: f64, x: f64) -> Plane {
    let normal = Vector3::new(0.0, -theta_z.cos(), theta_z.sin());
    Plane::new(Point3::new(x, center.y, center.z), normal)
}

/// Regular-pitch wire geometry for tests and examples.
///
/// Each view is a family of parallel wires at a common angle, spaced evenly
/// along the in-plane normal starting from a per-view origin.
#[derive(Debug, Clone)]
pub struct LineGrid {
    views: Vec<GridView>,
}

/// One wire view of a [`LineGrid`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridView {
    /// Wire angle with respect to the z axis.
    pub theta_z: f64,
    /// Wire spacing (cm).
    pub pitch: f64,
    /// Number of wires in the view.
    pub n_wires: u32,
    /// Center of wire 0.
    pub origin: [f64; 3],
}

impl LineGrid {
    pub fn new(views: Vec<GridView>) -> Self {
        Self { views }
    }
}

impl WireGeometry for LineGrid {
    fn wire_center(&self, id: WireId) -> Option<Point3<f64>> {
        let view = self.views.get(id.plane as usize)?;
        if id.wire >= view.n_wires {
            return None;
        }
        // wires advance along the in-plane normal to the wire direction
        let step = Vector3::new(0.0, -view.theta_z.cos(), view.theta_z.sin());
        let origin = Point3::new(view.origin[0], view.origin[1], view.origin[2]);
        Some(origin + f64::from(id.wire) * view.pitch * step)
    }

    fn wire_theta_z(&self, id: WireId) -> Option<f64> {
        let view = self.views.get(id.plane as usize)?;
        if id.wire >= view.n_wires {
            return None;
        }
        Some(view.theta_z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::FRAC_PI_2;

    #[test]
    fn test_wire_plane_axes() {
        // A vertical collection wire (theta_z = pi/2): wire along y,
        // measurement normal along z.
        let center = Point3::new(12.0, 0.0, 50.0);
        let plane = wire_plane(&center, FRAC_PI_2);
        let u = plane.direction_u();
        let v = plane.direction_v();
        assert_abs_diff_eq!(u.x, 1.0, epsilon = 1e-12); // drift axis
        assert_abs_diff_eq!(v.y, 1.0, epsilon = 1e-12); // wire axis
        assert_abs_diff_eq!(plane.position().x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_wire_plane_u_is_drift_for_any_angle() {
        let center = Point3::new(0.0, 10.0, 20.0);
        for theta in [0.2, 0.8, 1.3, 2.4] {
            let plane = wire_plane(&center, theta);
            let u = plane.direction_u();
            assert_abs_diff_eq!(u.x, 1.0, epsilon = 1e-12);
            // v axis is the wire direction (0, sin, cos)
            let v = plane.direction_v();
            assert_abs_diff_eq!(v.y, theta.sin(), epsilon = 1e-12);
            assert_abs_diff_eq!(v.z, theta.cos(), epsilon = 1e-12);
        }
    }

    #[test]
    fn test_wire_line_origin() {
        let center = Point3::new(0.0, 1.0, 2.0);
        let line = wire_line(&center, 0.5, 7.5);
        assert_abs_diff_eq!(line.position().x, 7.5, epsilon = 1e-12);
        assert_abs_diff_eq!(line.position().y, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_line_grid_lookup() {
        let grid = LineGrid::new(vec![GridView {
            theta_z: FRAC_PI_2,
            pitch: 0.3,
            n_wires: 10,
            origin: [0.0, 0.0, 0.0],
        }]);
        let c = grid.wire_center(WireId::new(0, 0, 0, 4)).unwrap();
        assert_abs_diff_eq!(c.z, 4.0 * 0.3, epsilon = 1e-12);
        assert!(grid.wire_center(WireId::new(0, 0, 0, 10)).is_none());
        assert!(grid.wire_center(WireId::new(0, 0, 1, 0)).is_none());
    }
}
