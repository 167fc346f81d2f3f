//! Local plane reference frames and the 5D-local / 6D-global conversions.
//!
//! A [`Plane`] is a 2D frame embedded in 3D space, defined by an origin point
//! and a unit normal `w`. Track states are expressed in the plane's local
//! coordinates as the 5-parameter vector
//!
//! ```text
//! (u, v, du/dw, dv/dw, q/p)
//! ```
//!
//! where `u`, `v` are transverse coordinates in the plane, `du/dw`, `dv/dw`
//! are direction slopes with respect to the normal, and `q/p` is the inverse
//! momentum signed by charge.
//!
//! The frame axes are fixed by the normal through the orientation angles
//! `alpha` and `beta`: with `w = (sinA, cosA*sinB, cosA*cosB)`,
//!
//! ```text
//! u = (cosA, -sinA*sinB, -sinA*cosB)
//! v = (0,     cosB,      -sinB)
//! ```
//!
//! which form a right-handed orthonormal triad `(u, v, w)`. For wire planes
//! built by [`crate::geometry::wire_plane`], `u` is the drift axis and `v`
//! the wire axis.

use nalgebra::{Matrix5, Matrix6, Matrix6x5, Point3, Vector3, Vector5};

/// A local 2D reference frame: origin position plus unit normal direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Plane {
    pos: Point3<f64>,
    dir: Vector3<f64>,
}

impl Plane {
    /// Create a plane from an origin point and a (not necessarily unit)
    /// normal direction.
    pub fn new(pos: Point3<f64>, dir: Vector3<f64>) -> Self {
        Self {
            pos,
            dir: dir.normalize(),
        }
    }

    /// Origin of the local frame.
    #[inline]
    pub fn position(&self) -> Point3<f64> {
        self.pos
    }

    /// Unit normal of the plane (the local `w` axis).
    #[inline]
    pub fn direction(&self) -> Vector3<f64> {
        self.dir
    }

    /// sin(alpha): the drift-axis component of the normal.
    #[inline]
    pub fn sin_alpha(&self) -> f64 {
        self.dir.x
    }

    /// cos(alpha): magnitude of the normal's projection onto the y-z plane.
    #[inline]
    pub fn cos_alpha(&self) -> f64 {
        self.dir.y.hypot(self.dir.z)
    }

    /// sin(beta); by convention 0 when the normal is along the drift axis.
    #[inline]
    pub fn sin_beta(&self) -> f64 {
        let ca = self.cos_alpha();
        if ca == 0.0 {
            0.0
        } else {
            self.dir.y / ca
        }
    }

    /// cos(beta); by convention 1 when the normal is along the drift axis.
    #[inline]
    pub fn cos_beta(&self) -> f64 {
        let ca = self.cos_alpha();
        if ca == 0.0 {
            1.0
        } else {
            self.dir.z / ca
        }
    }

    /// The local `u` axis in global coordinates.
    pub fn direction_u(&self) -> Vector3<f64> {
        let (sa, ca) = (self.sin_alpha(), self.cos_alpha());
        let (sb, cb) = (self.sin_beta(), self.cos_beta());
        Vector3::new(ca, -sa * sb, -sa * cb)
    }

    /// The local `v` axis in global coordinates.
    pub fn direction_v(&self) -> Vector3<f64> {
        let (sb, cb) = (self.sin_beta(), self.cos_beta());
        Vector3::new(0.0, cb, -sb)
    }

    /// Convert local 5-parameters into a global (position, momentum) pair.
    ///
    /// The sign of the momentum component along the normal is ambiguous in
    /// the slope parameterization; `track_along_plane_dir` resolves it
    /// (`true` means the momentum has positive dot product with the normal).
    pub fn local_to_global(
        &self,
        par: &Vector5<f64>,
        track_along_plane_dir: bool,
    ) -> (Point3<f64>, Vector3<f64>) {
        let uhat = self.direction_u();
        let vhat = self.direction_v();
        let what = self.dir;

        let pos = self.pos + par[0] * uhat + par[1] * vhat;

        let (a, b) = (par[2], par[3]);
        let p = 1.0 / par[4].abs();
        let sign = if track_along_plane_dir { 1.0 } else { -1.0 };
        let dw = sign / (1.0 + a * a + b * b).sqrt();
        let mom = p * (a * dw * uhat + b * dw * vhat + dw * what);

        (pos, mom)
    }

    /// Jacobian of [`Plane::local_to_global`] with respect to the local
    /// parameters: a 6x5 matrix with rows (x, y, z, px, py, pz) and columns
    /// (u, v, du/dw, dv/dw, q/p).
    pub fn local_to_global_jacobian(
        &self,
        par: &Vector5<f64>,
        track_along_plane_dir: bool,
    ) -> Matrix6x5<f64> {
        let uhat = self.direction_u();
        let vhat = self.direction_v();
        let what = self.dir;

        let (a, b, qop) = (par[2], par[3], par[4]);
        let p = 1.0 / qop.abs();
        let sign = if track_along_plane_dir { 1.0 } else { -1.0 };
        let n2 = 1.0 + a * a + b * b;
        let n = n2.sqrt();
        let n3 = n2 * n;

        // d(momentum)/d(du/dw) and d(momentum)/d(dv/dw), from differentiating
        // the normalized direction (a, b, 1)/n.
        let dmom_da = (p * sign / n3) * ((1.0 + b * b) * uhat - a * b * vhat - a * what);
        let dmom_db = (p * sign / n3) * (-a * b * uhat + (1.0 + a * a) * vhat - b * what);
        // d(momentum)/d(q/p): p = 1/|q/p| so dp/d(q/p) = -sign(q/p)/(q/p)^2.
        let dir3 = (sign / n) * (a * uhat + b * vhat + what);
        let dmom_dqop = (-qop.signum() / (qop * qop)) * dir3;

        let mut j = Matrix6x5::zeros();
        for r in 0..3 {
            j[(r, 0)] = uhat[r];
            j[(r, 1)] = vhat[r];
            j[(r + 3, 2)] = dmom_da[r];
            j[(r + 3, 3)] = dmom_db[r];
            j[(r + 3, 4)] = dmom_dqop[r];
        }
        j
    }

    /// Propagate a local 5x5 covariance to the global 6x6 covariance through
    /// the similarity transform `J * C * J^T`.
    pub fn local_to_global_covariance(
        &self,
        cov: &Matrix5<f64>,
        par: &Vector5<f64>,
        track_along_plane_dir: bool,
    ) -> Matrix6<f64> {
        let j = self.local_to_global_jacobian(par, track_along_plane_dir);
        j * cov * j.transpose()
    }

    /// Convert a global (position, momentum) pair into local 5-parameters.
    ///
    /// `charge_sign` (+1 or -1) fixes the sign of `q/p`. Returns `None` when
    /// the momentum lies exactly in the plane, where the slopes are
    /// undefined.
    pub fn global_to_local(
        &self,
        pos: &Point3<f64>,
        mom: &Vector3<f64>,
        charge_sign: f64,
    ) -> Option<Vector5<f64>> {
        let uhat = self.direction_u();
        let vhat = self.direction_v();
        let what = self.dir;

        let pw = mom.dot(&what);
        if pw == 0.0 {
            return None;
        }
        let d = pos - self.pos;
        Some(Vector5::new(
            d.dot(&uhat),
            d.dot(&vhat),
            mom.dot(&uhat) / pw,
            mom.dot(&vhat) / pw,
            charge_sign.signum() / mom.norm(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn tilted_plane() -> Plane {
        Plane::new(
            Point3::new(1.0, -2.0, 3.0),
            Vector3::new(0.3, -0.4, 0.866),
        )
    }

    #[test]
    fn test_axes_orthonormal() {
        let p = tilted_plane();
        let (u, v, w) = (p.direction_u(), p.direction_v(), p.direction());
        assert_abs_diff_eq!(u.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.norm(), 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u.dot(&v), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(u.dot(&w), 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(v.dot(&w), 0.0, epsilon = 1e-12);
        // right-handed: u x v = w
        assert_abs_diff_eq!((u.cross(&v) - w).norm(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_normal_convention() {
        // Normal along the drift axis: beta falls back to (sin, cos) = (0, 1).
        let p = Plane::new(Point3::origin(), Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(p.sin_beta(), 0.0);
        assert_eq!(p.cos_beta(), 1.0);
        assert_abs_diff_eq!(p.direction_u().norm(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_local_global_round_trip() {
        let plane = tilted_plane();
        let par = Vector5::new(0.7, -1.1, 0.2, -0.3, 1.0 / 2.5);
        let (pos, mom) = plane.local_to_global(&par, true);
        let back = plane.global_to_local(&pos, &mom, 1.0).unwrap();
        for i in 0..5 {
            assert_abs_diff_eq!(back[i], par[i], epsilon = 1e-12);
        }
        assert_abs_diff_eq!(mom.norm(), 2.5, epsilon = 1e-12);
        assert!(mom.dot(&plane.direction()) > 0.0);
    }

    #[test]
    fn test_direction_flag_flips_normal_component() {
        let plane = tilted_plane();
        let par = Vector5::new(0.0, 0.0, 0.1, 0.2, 1.0);
        let (_, mom_along) = plane.local_to_global(&par, true);
        let (_, mom_against) = plane.local_to_global(&par, false);
        assert!(mom_along.dot(&plane.direction()) > 0.0);
        assert!(mom_against.dot(&plane.direction()) < 0.0);
    }

    #[test]
    fn test_jacobian_against_finite_differences() {
        let plane = tilted_plane();
        let par = Vector5::new(0.5, -0.2, 0.3, -0.1, 1.0 / 1.7);
        let j = plane.local_to_global_jacobian(&par, true);

        let eps = 1e-7;
        for col in 0..5 {
            let mut up = par;
            let mut dn = par;
            up[col] += eps;
            dn[col] -= eps;
            let (pu, mu) = plane.local_to_global(&up, true);
            let (pd, md) = plane.local_to_global(&dn, true);
            for r in 0..3 {
                let dpos = (pu[r] - pd[r]) / (2.0 * eps);
                let dmom = (mu[r] - md[r]) / (2.0 * eps);
                assert_abs_diff_eq!(j[(r, col)], dpos, epsilon = 1e-5);
                assert_abs_diff_eq!(j[(r + 3, col)], dmom, epsilon = 1e-5);
            }
        }
    }
}
