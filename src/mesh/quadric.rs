//! Quadric error metric.
//!
//! A quadric accumulates the planes of the faces around a vertex. Evaluating
//! it at a point gives the sum of squared distances from the point to those
//! planes.

use std::ops::{Add, AddAssign};

use crate::math::Vec3;

/// Symmetric 4x4 matrix `sum(p * p^T)` for planes `p = [a, b, c, d]`,
/// stored as its upper triangle:
///
/// ```text
/// [0 1 2 3]
/// [  4 5 6]
/// [    7 8]
/// [      9]
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub(crate) struct Quadric {
    m: [f64; 10],
}

/// Determinant below which the 3x3 system is treated as singular.
const SINGULAR_EPSILON: f64 = 1e-10;

impl Quadric {
    /// Quadric of the plane `ax + by + cz + d = 0` with unit normal (a, b, c).
    pub fn from_plane(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self {
            m: [
                a * a,
                a * b,
                a * c,
                a * d,
                b * b,
                b * c,
                b * d,
                c * c,
                c * d,
                d * d,
            ],
        }
    }

    /// Quadric of the plane through three points, None if they are collinear.
    pub fn from_triangle(p1: Vec3, p2: Vec3, p3: Vec3) -> Option<Self> {
        let [x1, y1, z1] = to_f64(p1);
        let [x2, y2, z2] = to_f64(p2);
        let [x3, y3, z3] = to_f64(p3);
        let (ux, uy, uz) = (x2 - x1, y2 - y1, z2 - z1);
        let (vx, vy, vz) = (x3 - x1, y3 - y1, z3 - z1);
        let (nx, ny, nz) = (uy * vz - uz * vy, uz * vx - ux * vz, ux * vy - uy * vx);
        let len = (nx * nx + ny * ny + nz * nz).sqrt();
        if len < SINGULAR_EPSILON {
            return None;
        }
        let (a, b, c) = (nx / len, ny / len, nz / len);
        Some(Self::from_plane(a, b, c, -(a * x1 + b * y1 + c * z1)))
    }

    /// `v^T Q v` for `v = [x, y, z, 1]`.
    pub fn evaluate(&self, p: [f64; 3]) -> f64 {
        let m = &self.m;
        let [x, y, z] = p;
        m[0] * x * x
            + 2.0 * m[1] * x * y
            + 2.0 * m[2] * x * z
            + 2.0 * m[3] * x
            + m[4] * y * y
            + 2.0 * m[5] * y * z
            + 2.0 * m[6] * y
            + m[7] * z * z
            + 2.0 * m[8] * z
            + m[9]
    }

    /// Point minimizing the error, None when the 3x3 system is singular.
    ///
    /// Solves
    /// ```text
    /// [0 1 2] [x]   [-3]
    /// [1 4 5] [y] = [-6]
    /// [2 5 7] [z]   [-8]
    /// ```
    pub fn optimal_point(&self) -> Option<[f64; 3]> {
        let m = &self.m;
        let c00 = m[4] * m[7] - m[5] * m[5];
        let c01 = m[2] * m[5] - m[1] * m[7];
        let c02 = m[1] * m[5] - m[2] * m[4];
        let det = m[0] * c00 + m[1] * c01 + m[2] * c02;
        if det.abs() < SINGULAR_EPSILON {
            return None;
        }
        let c11 = m[0] * m[7] - m[2] * m[2];
        let c12 = m[1] * m[2] - m[0] * m[5];
        let c22 = m[0] * m[4] - m[1] * m[1];
        let (r0, r1, r2) = (-m[3], -m[6], -m[8]);
        let inv = 1.0 / det;
        Some([
            (c00 * r0 + c01 * r1 + c02 * r2) * inv,
            (c01 * r0 + c11 * r1 + c12 * r2) * inv,
            (c02 * r0 + c12 * r1 + c22 * r2) * inv,
        ])
    }
}

impl Add for Quadric {
    type Output = Quadric;

    fn add(mut self, rhs: Quadric) -> Self::Output {
        self += rhs;
        self
    }
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, rhs: Quadric) {
        for (a, b) in self.m.iter_mut().zip(rhs.m) {
            *a += b;
        }
    }
}

pub(crate) fn to_f64(p: Vec3) -> [f64; 3] {
    [p.x as f64, p.y as f64, p.z as f64]
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plane_error_is_squared_distance() {
        let q = Quadric::from_plane(0.0, 0.0, 1.0, 0.0);
        assert_relative_eq!(q.evaluate([1.0, 2.0, 0.0]), 0.0);
        assert_relative_eq!(q.evaluate([0.0, 0.0, 3.0]), 9.0);
    }

    #[test]
    fn three_planes_meet_at_optimal_point() {
        let q = Quadric::from_plane(1.0, 0.0, 0.0, -1.0)
            + Quadric::from_plane(0.0, 1.0, 0.0, -2.0)
            + Quadric::from_plane(0.0, 0.0, 1.0, -3.0);
        let p = q.optimal_point().expect("planes intersect in a point");
        assert_relative_eq!(p[0], 1.0, epsilon = 1e-9);
        assert_relative_eq!(p[1], 2.0, epsilon = 1e-9);
        assert_relative_eq!(p[2], 3.0, epsilon = 1e-9);
        assert_relative_eq!(q.evaluate(p), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn single_plane_is_singular() {
        let q = Quadric::from_plane(0.0, 0.0, 1.0, 0.0);
        assert!(q.optimal_point().is_none());
    }

    #[test]
    fn collinear_points_have_no_plane() {
        assert!(Quadric::from_triangle(Vec3::ZERO, Vec3::X, Vec3::X * 2.0).is_none());
    }
}
