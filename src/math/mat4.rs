//! 4x4 transformation matrix.
//!
//! # Convention
//! - Vectors are **column vectors** on the right: `Mat4 * Vec`
//! - Translation is stored in the **last column**
//! - Transforms chain **right-to-left**: `A * B * v` applies B first, then A
//! - Builder methods apply the new transform **after** the existing one:
//!   `m.translate(v)` is `Mat4::translation(v) * m`
//!
//! Projection builders follow the OpenGL conventions: right-handed view
//! space looking down -Z, clip-space depth in [-1, 1].
//!
//! # Example
//! ```
//! use softraster::math::{mat4::Mat4, vec3::Vec3};
//!
//! // scale first, then move
//! let m = Mat4::scaling(Vec3::splat(2.0)).translate(Vec3::new(1.0, 0.0, 0.0));
//! assert_eq!(m.mul_position(Vec3::ONE), Vec3::new(3.0, 2.0, 2.0));
//! ```

use std::ops::Mul;

use super::vec3::Vec3;
use super::vec4::Vec4;
use crate::bounds::BoundingBox;

/// 4x4 matrix stored as `data[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    data: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn new(data: [[f32; 4]; 4]) -> Self {
        Mat4 { data }
    }

    pub const fn identity() -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a translation matrix.
    pub fn translation(v: Vec3) -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, v.x],
            [0.0, 1.0, 0.0, v.y],
            [0.0, 0.0, 1.0, v.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a scale matrix.
    pub fn scaling(v: Vec3) -> Self {
        Mat4::new([
            [v.x, 0.0, 0.0, 0.0],
            [0.0, v.y, 0.0, 0.0],
            [0.0, 0.0, v.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a counter-clockwise rotation of `angle` radians around `axis`
    /// (right-hand rule).
    pub fn rotation(axis: Vec3, angle: f32) -> Self {
        let v = axis.normalize();
        let s = angle.sin();
        let c = angle.cos();
        let m = 1.0 - c;
        Mat4::new([
            [
                m * v.x * v.x + c,
                m * v.x * v.y - v.z * s,
                m * v.z * v.x + v.y * s,
                0.0,
            ],
            [
                m * v.x * v.y + v.z * s,
                m * v.y * v.y + c,
                m * v.y * v.z - v.x * s,
                0.0,
            ],
            [
                m * v.z * v.x - v.y * s,
                m * v.y * v.z + v.x * s,
                m * v.z * v.z + c,
                0.0,
            ],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates the rotation that turns direction `a` onto direction `b`.
    ///
    /// Both inputs are expected to be unit vectors.
    pub fn rotation_to(a: Vec3, b: Vec3) -> Self {
        let dot = b.dot(a);
        if dot >= 1.0 {
            Mat4::identity()
        } else if dot <= -1.0 {
            Mat4::rotation(a.perpendicular(), std::f32::consts::PI)
        } else {
            Mat4::rotation(a.cross(b).normalize(), dot.acos())
        }
    }

    /// Places a unit object: spins it `rotation` radians about Z, scales it
    /// by `size`, points its +Z along `up` and moves it to `position`.
    pub fn orient(position: Vec3, size: Vec3, up: Vec3, rotation: f32) -> Self {
        Mat4::rotation(Vec3::Z, rotation)
            .scale(size)
            .rotate_to(Vec3::Z, up)
            .translate(position)
    }

    /// Creates an OpenGL-style perspective frustum.
    pub fn frustum(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        let t1 = 2.0 * n;
        let t2 = r - l;
        let t3 = t - b;
        let t4 = f - n;
        Mat4::new([
            [t1 / t2, 0.0, (r + l) / t2, 0.0],
            [0.0, t1 / t3, (t + b) / t3, 0.0],
            [0.0, 0.0, (-f - n) / t4, (-t1 * f) / t4],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    /// Creates an OpenGL-style orthographic projection.
    pub fn orthographic(l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        Mat4::new([
            [2.0 / (r - l), 0.0, 0.0, -(r + l) / (r - l)],
            [0.0, 2.0 / (t - b), 0.0, -(t + b) / (t - b)],
            [0.0, 0.0, -2.0 / (f - n), -(f + n) / (f - n)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Creates a perspective projection.
    ///
    /// # Arguments
    ///
    /// * `fovy` - Vertical field of view in **degrees**.
    /// * `aspect` - Width divided by height.
    /// * `near`, `far` - Clipping plane distances (both > 0).
    pub fn perspective(fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        let ymax = near * (fovy.to_radians() / 2.0).tan();
        let xmax = ymax * aspect;
        Mat4::frustum(-xmax, xmax, -ymax, ymax, near, far)
    }

    /// Creates a right-handed view matrix.
    ///
    /// # Arguments
    ///
    /// * `eye` - The position of the camera.
    /// * `center` - The point the camera is looking at.
    /// * `up` - The up direction of the camera.
    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let z = (eye - center).normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        Self::new([
            [x.x, x.y, x.z, -x.dot(eye)],
            [y.x, y.y, y.z, -y.dot(eye)],
            [z.x, z.y, z.z, -z.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation-only view matrix for a camera facing `-forward`.
    pub fn look_at_direction(forward: Vec3, up: Vec3) -> Self {
        let z = forward.normalize();
        let x = up.cross(z).normalize();
        let y = z.cross(x);
        Self::new([
            [x.x, x.y, x.z, 0.0],
            [y.x, y.y, y.z, 0.0],
            [z.x, z.y, z.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Maps normalized device coordinates to a `w`x`h` pixel grid with the
    /// origin at the top-left corner, and depth from [-1, 1] to [0, 1].
    pub fn screen(w: u32, h: u32) -> Self {
        let w2 = w as f32 / 2.0;
        let h2 = h as f32 / 2.0;
        Self::new([
            [w2, 0.0, 0.0, w2],
            [0.0, -h2, 0.0, h2],
            [0.0, 0.0, 0.5, 0.5],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Maps normalized device coordinates to the rectangle `(x, y, w, h)`
    /// with Y pointing up.
    pub fn viewport(x: f32, y: f32, w: f32, h: f32) -> Self {
        let (l, b, r, t) = (x, y, x + w, y + h);
        Self::new([
            [(r - l) / 2.0, 0.0, 0.0, (r + l) / 2.0],
            [0.0, (t - b) / 2.0, 0.0, (t + b) / 2.0],
            [0.0, 0.0, 0.5, 0.5],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Returns `Mat4::translation(v) * self`.
    pub fn translate(&self, v: Vec3) -> Self {
        Mat4::translation(v) * *self
    }

    /// Returns `Mat4::scaling(v) * self`.
    pub fn scale(&self, v: Vec3) -> Self {
        Mat4::scaling(v) * *self
    }

    /// Returns `Mat4::rotation(axis, angle) * self`.
    pub fn rotate(&self, axis: Vec3, angle: f32) -> Self {
        Mat4::rotation(axis, angle) * *self
    }

    /// Returns `Mat4::rotation_to(a, b) * self`.
    pub fn rotate_to(&self, a: Vec3, b: Vec3) -> Self {
        Mat4::rotation_to(a, b) * *self
    }

    /// Returns `Mat4::perspective(..) * self`.
    pub fn perspective_by(&self, fovy: f32, aspect: f32, near: f32, far: f32) -> Self {
        Mat4::perspective(fovy, aspect, near, far) * *self
    }

    /// Returns `Mat4::orthographic(..) * self`.
    pub fn orthographic_by(&self, l: f32, r: f32, b: f32, t: f32, n: f32, f: f32) -> Self {
        Mat4::orthographic(l, r, b, t, n, f) * *self
    }

    /// Returns `Mat4::look_at(..) * self`.
    pub fn look_at_by(&self, eye: Vec3, center: Vec3, up: Vec3) -> Self {
        Mat4::look_at(eye, center, up) * *self
    }

    /// Transform a point, dropping the resulting w.
    pub fn mul_position(&self, v: Vec3) -> Vec3 {
        let m = &self.data;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z + m[0][3],
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z + m[1][3],
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z + m[2][3],
        )
    }

    /// Transform a point into homogeneous coordinates.
    pub fn mul_position_w(&self, v: Vec3) -> Vec4 {
        *self * Vec4::from(v)
    }

    /// Transform a direction (no translation) and normalize it.
    pub fn mul_direction(&self, v: Vec3) -> Vec3 {
        let m = &self.data;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
        .normalize()
    }

    /// Transform an axis-aligned box, returning the box enclosing the result.
    pub fn mul_box(&self, b: BoundingBox) -> BoundingBox {
        let m = &self.data;
        let r = Vec3::new(m[0][0], m[1][0], m[2][0]);
        let u = Vec3::new(m[0][1], m[1][1], m[2][1]);
        let f = Vec3::new(m[0][2], m[1][2], m[2][2]);
        let t = Vec3::new(m[0][3], m[1][3], m[2][3]);
        let (xa, xb) = (r * b.min.x, r * b.max.x);
        let (ya, yb) = (u * b.min.y, u * b.max.y);
        let (za, zb) = (f * b.min.z, f * b.max.z);
        let min = xa.min(xb) + ya.min(yb) + za.min(zb) + t;
        let max = xa.max(xb) + ya.max(yb) + za.max(zb) + t;
        BoundingBox::new(min, max)
    }

    pub fn transpose(&self) -> Self {
        let m = &self.data;
        let mut data = [[0.0f32; 4]; 4];
        for (row, values) in data.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = m[col][row];
            }
        }
        Mat4 { data }
    }

    /// Cofactors of the first row, shared by `determinant` and `inverse`.
    fn first_row_cofactors(&self) -> [f32; 4] {
        let m = &self.data;
        let c00 = m[1][1] * (m[2][2] * m[3][3] - m[2][3] * m[3][2])
            - m[1][2] * (m[2][1] * m[3][3] - m[2][3] * m[3][1])
            + m[1][3] * (m[2][1] * m[3][2] - m[2][2] * m[3][1]);

        let c01 = -(m[1][0] * (m[2][2] * m[3][3] - m[2][3] * m[3][2])
            - m[1][2] * (m[2][0] * m[3][3] - m[2][3] * m[3][0])
            + m[1][3] * (m[2][0] * m[3][2] - m[2][2] * m[3][0]));

        let c02 = m[1][0] * (m[2][1] * m[3][3] - m[2][3] * m[3][1])
            - m[1][1] * (m[2][0] * m[3][3] - m[2][3] * m[3][0])
            + m[1][3] * (m[2][0] * m[3][1] - m[2][1] * m[3][0]);

        let c03 = -(m[1][0] * (m[2][1] * m[3][2] - m[2][2] * m[3][1])
            - m[1][1] * (m[2][0] * m[3][2] - m[2][2] * m[3][0])
            + m[1][2] * (m[2][0] * m[3][1] - m[2][1] * m[3][0]));

        [c00, c01, c02, c03]
    }

    pub fn determinant(&self) -> f32 {
        let m = &self.data;
        let [c00, c01, c02, c03] = self.first_row_cofactors();
        m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02 + m[0][3] * c03
    }

    /// Computes the inverse of the matrix, if it exists.
    /// Returns `None` if the matrix is singular (determinant is zero).
    pub fn inverse(&self) -> Option<Mat4> {
        let m = &self.data;
        let [c00, c01, c02, c03] = self.first_row_cofactors();
        let det = m[0][0] * c00 + m[0][1] * c01 + m[0][2] * c02 + m[0][3] * c03;

        if det.abs() < f32::EPSILON * f32::EPSILON {
            return None;
        }

        let inv_det = 1.0 / det;

        let c10 = -(m[0][1] * (m[2][2] * m[3][3] - m[2][3] * m[3][2])
            - m[0][2] * (m[2][1] * m[3][3] - m[2][3] * m[3][1])
            + m[0][3] * (m[2][1] * m[3][2] - m[2][2] * m[3][1]));

        let c11 = m[0][0] * (m[2][2] * m[3][3] - m[2][3] * m[3][2])
            - m[0][2] * (m[2][0] * m[3][3] - m[2][3] * m[3][0])
            + m[0][3] * (m[2][0] * m[3][2] - m[2][2] * m[3][0]);

        let c12 = -(m[0][0] * (m[2][1] * m[3][3] - m[2][3] * m[3][1])
            - m[0][1] * (m[2][0] * m[3][3] - m[2][3] * m[3][0])
            + m[0][3] * (m[2][0] * m[3][1] - m[2][1] * m[3][0]));

        let c13 = m[0][0] * (m[2][1] * m[3][2] - m[2][2] * m[3][1])
            - m[0][1] * (m[2][0] * m[3][2] - m[2][2] * m[3][0])
            + m[0][2] * (m[2][0] * m[3][1] - m[2][1] * m[3][0]);

        let c20 = m[0][1] * (m[1][2] * m[3][3] - m[1][3] * m[3][2])
            - m[0][2] * (m[1][1] * m[3][3] - m[1][3] * m[3][1])
            + m[0][3] * (m[1][1] * m[3][2] - m[1][2] * m[3][1]);

        let c21 = -(m[0][0] * (m[1][2] * m[3][3] - m[1][3] * m[3][2])
            - m[0][2] * (m[1][0] * m[3][3] - m[1][3] * m[3][0])
            + m[0][3] * (m[1][0] * m[3][2] - m[1][2] * m[3][0]));

        let c22 = m[0][0] * (m[1][1] * m[3][3] - m[1][3] * m[3][1])
            - m[0][1] * (m[1][0] * m[3][3] - m[1][3] * m[3][0])
            + m[0][3] * (m[1][0] * m[3][1] - m[1][1] * m[3][0]);

        let c23 = -(m[0][0] * (m[1][1] * m[3][2] - m[1][2] * m[3][1])
            - m[0][1] * (m[1][0] * m[3][2] - m[1][2] * m[3][0])
            + m[0][2] * (m[1][0] * m[3][1] - m[1][1] * m[3][0]));

        let c30 = -(m[0][1] * (m[1][2] * m[2][3] - m[1][3] * m[2][2])
            - m[0][2] * (m[1][1] * m[2][3] - m[1][3] * m[2][1])
            + m[0][3] * (m[1][1] * m[2][2] - m[1][2] * m[2][1]));

        let c31 = m[0][0] * (m[1][2] * m[2][3] - m[1][3] * m[2][2])
            - m[0][2] * (m[1][0] * m[2][3] - m[1][3] * m[2][0])
            + m[0][3] * (m[1][0] * m[2][2] - m[1][2] * m[2][0]);

        let c32 = -(m[0][0] * (m[1][1] * m[2][3] - m[1][3] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][3] - m[1][3] * m[2][0])
            + m[0][3] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]));

        let c33 = m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
            - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
            + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0]);

        // The inverse is the transpose of the cofactor matrix divided by determinant
        Some(Mat4::new([
            [c00 * inv_det, c10 * inv_det, c20 * inv_det, c30 * inv_det],
            [c01 * inv_det, c11 * inv_det, c21 * inv_det, c31 * inv_det],
            [c02 * inv_det, c12 * inv_det, c22 * inv_det, c32 * inv_det],
            [c03 * inv_det, c13 * inv_det, c23 * inv_det, c33 * inv_det],
        ]))
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row][col]
    }
}

/// Matrix multiplication: Mat4 * Mat4.
///
/// `A * B * v` applies B first, then A.
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Self::Output {
        let mut result = [[0.0f32; 4]; 4];

        for (row, values) in result.iter_mut().enumerate() {
            for (col, value) in values.iter_mut().enumerate() {
                *value = self.data[row][0] * rhs.data[0][col]
                    + self.data[row][1] * rhs.data[1][col]
                    + self.data[row][2] * rhs.data[2][col]
                    + self.data[row][3] * rhs.data[3][col];
            }
        }

        Mat4::new(result)
    }
}

/// Transform a Vec4 by a matrix: Mat4 * Vec4 (column vector).
impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Self::Output {
        let m = &self.data;
        Vec4::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z + m[0][3] * v.w,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z + m[1][3] * v.w,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z + m[2][3] * v.w,
            m[3][0] * v.x + m[3][1] * v.y + m[3][2] * v.z + m[3][3] * v.w,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_2;

    fn assert_vec_eq(a: Vec3, b: Vec3) {
        assert_relative_eq!(a.x, b.x, epsilon = 1e-5);
        assert_relative_eq!(a.y, b.y, epsilon = 1e-5);
        assert_relative_eq!(a.z, b.z, epsilon = 1e-5);
    }

    #[test]
    fn builder_applies_later_transform_last() {
        let m = Mat4::identity()
            .scale(Vec3::splat(2.0))
            .translate(Vec3::new(1.0, 0.0, 0.0));
        assert_vec_eq(m.mul_position(Vec3::new(1.0, 1.0, 1.0)), Vec3::new(3.0, 2.0, 2.0));

        let m = Mat4::identity()
            .translate(Vec3::new(1.0, 0.0, 0.0))
            .scale(Vec3::splat(2.0));
        assert_vec_eq(m.mul_position(Vec3::new(1.0, 1.0, 1.0)), Vec3::new(4.0, 2.0, 2.0));
    }

    #[test]
    fn rotation_is_counter_clockwise() {
        let m = Mat4::rotation(Vec3::Z, FRAC_PI_2);
        assert_vec_eq(m.mul_position(Vec3::X), Vec3::Y);
    }

    #[test]
    fn rotation_to_aligns_directions() {
        let a = Vec3::new(1.0, 0.0, 0.0);
        let b = Vec3::new(0.0, 0.6, 0.8);
        assert_vec_eq(Mat4::rotation_to(a, b).mul_direction(a), b);
        assert_vec_eq(Mat4::rotation_to(a, -a).mul_direction(a), -a);
    }

    #[test]
    fn inverse_round_trips() {
        let m = Mat4::rotation(Vec3::new(1.0, 2.0, 3.0), 0.7)
            .scale(Vec3::new(2.0, 3.0, 4.0))
            .translate(Vec3::new(-1.0, 5.0, 2.0));
        let inv = m.inverse().expect("matrix should be invertible");
        let p = Vec3::new(0.3, -0.2, 0.9);
        assert_vec_eq(inv.mul_position(m.mul_position(p)), p);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Mat4::scaling(Vec3::new(1.0, 0.0, 1.0));
        assert!(m.inverse().is_none());
        assert_relative_eq!(m.determinant(), 0.0);
    }

    #[test]
    fn look_at_puts_center_on_negative_z() {
        let eye = Vec3::new(3.0, 3.0, 3.0);
        let view = Mat4::look_at(eye, Vec3::ZERO, Vec3::Z);
        let p = view.mul_position(Vec3::ZERO);
        assert_relative_eq!(p.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, -eye.length(), epsilon = 1e-5);
    }

    #[test]
    fn perspective_maps_near_and_far_to_clip_bounds() {
        let p = Mat4::perspective(60.0, 1.0, 1.0, 10.0);
        let near = p.mul_position_w(Vec3::new(0.0, 0.0, -1.0)).perspective_divide();
        let far = p.mul_position_w(Vec3::new(0.0, 0.0, -10.0)).perspective_divide();
        assert_relative_eq!(near.z, -1.0, epsilon = 1e-5);
        assert_relative_eq!(far.z, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn screen_flips_y_and_maps_depth() {
        let s = Mat4::screen(200, 100);
        assert_vec_eq(s.mul_position(Vec3::new(-1.0, 1.0, -1.0)), Vec3::new(0.0, 0.0, 0.0));
        assert_vec_eq(s.mul_position(Vec3::new(1.0, -1.0, 1.0)), Vec3::new(200.0, 100.0, 1.0));
    }

    #[test]
    fn mul_box_encloses_rotated_box() {
        let b = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        let r = Mat4::rotation(Vec3::Z, std::f32::consts::FRAC_PI_4).mul_box(b);
        assert_relative_eq!(r.max.x, 2.0f32.sqrt(), epsilon = 1e-5);
        assert_relative_eq!(r.max.z, 1.0, epsilon = 1e-5);
    }
}
