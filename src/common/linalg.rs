//! Small symmetric-matrix helpers shared by the Kalman operations.

use nalgebra::Matrix5;

use crate::geometry::Plane;

/// Build a symmetric matrix from the lower triangle of `m`.
///
/// The upper triangle of `m` is discarded and replaced by the mirror of the
/// lower one. Used for the fused covariance of the information-form
/// combination, where `K * cov2` is symmetric only up to roundoff for
/// consistent inputs.
pub fn sym_lower(m: &Matrix5<f64>) -> Matrix5<f64> {
    let mut out = Matrix5::zeros();
    for i in 0..5 {
        for j in 0..=i {
            out[(i, j)] = m[(i, j)];
            out[(j, i)] = m[(i, j)];
        }
    }
    out
}

/// Force exact symmetry by averaging a matrix with its transpose.
pub fn symmetrize(m: &Matrix5<f64>) -> Matrix5<f64> {
    (m + m.transpose()) * 0.5
}

/// True iff the two planes coincide to within `tol2`, comparing the squared
/// distances of positions and directions independently.
pub fn planes_match(a: &Plane, b: &Plane, tol2: f64) -> bool {
    (a.position() - b.position()).norm_squared() <= tol2
        && (a.direction() - b.direction()).norm_squared() <= tol2
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    #[test]
    fn test_sym_lower() {
        let mut m = Matrix5::identity();
        m[(1, 0)] = 0.5;
        m[(0, 1)] = -3.0; // upper triangle must be ignored
        let s = sym_lower(&m);
        assert_eq!(s[(1, 0)], 0.5);
        assert_eq!(s[(0, 1)], 0.5);
        assert_eq!(s[(4, 4)], 1.0);
    }

    #[test]
    fn test_symmetrize_average() {
        let mut m = Matrix5::zeros();
        m[(0, 1)] = 2.0;
        let s = symmetrize(&m);
        assert_eq!(s[(0, 1)], 1.0);
        assert_eq!(s[(1, 0)], 1.0);
    }

    #[test]
    fn test_planes_match_tolerance() {
        let a = Plane::new(Point3::new(0.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let b = Plane::new(Point3::new(1e-4, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        let c = Plane::new(Point3::new(1.0, 0.0, 0.0), Vector3::new(0.0, 0.0, 1.0));
        assert!(planes_match(&a, &b, 1e-5));
        assert!(!planes_match(&a, &c, 1e-5));
    }
}
