//! Mesh vertex and attribute interpolation.

use crate::color::Color;
use crate::math::{Vec2, Vec3, Vec4};

/// A vertex with the attributes the shaders consume.
///
/// `output` is scratch space holding the clip-space position produced by
/// [`Shader::vertex`](crate::render::shader::Shader::vertex); it is not
/// meaningful on input meshes.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub color: Color,
    pub texture: Vec2,
    pub output: Vec4,
}

impl Vertex {
    /// Vertex with only a position set: zero normal, transparent color.
    pub fn at(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Blends three vertices with barycentric `weights`.
    ///
    /// The blended normal is re-normalized unless it collapses to zero.
    pub fn interpolate(v1: &Vertex, v2: &Vertex, v3: &Vertex, weights: Vec3) -> Vertex {
        let (b0, b1, b2) = (weights.x, weights.y, weights.z);
        let normal = v1.normal * b0 + v2.normal * b1 + v3.normal * b2;
        Vertex {
            position: v1.position * b0 + v2.position * b1 + v3.position * b2,
            normal: normalize_or_zero(normal),
            color: v1.color * b0 + v2.color * b1 + v3.color * b2,
            texture: v1.texture * b0 + v2.texture * b1 + v3.texture * b2,
            output: v1.output * b0 + v2.output * b1 + v3.output * b2,
        }
    }

    /// Linear blend of every attribute, `t = 0` gives `self`.
    ///
    /// Used when clipping splits an edge. The normal is left unnormalized so
    /// that a later [`Vertex::interpolate`] sees barycentric-consistent data.
    pub fn lerp(&self, other: &Vertex, t: f32) -> Vertex {
        Vertex {
            position: self.position.lerp(other.position, t),
            normal: self.normal.lerp(other.normal, t),
            color: self.color.lerp(other.color, t),
            texture: self.texture.lerp(other.texture, t),
            output: self.output.lerp(other.output, t),
        }
    }
}

pub(crate) fn normalize_or_zero(v: Vec3) -> Vec3 {
    if v.length_squared() > 0.0 {
        v.normalize()
    } else {
        Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn interpolate_at_corner_returns_corner() {
        let mut a = Vertex::at(Vec3::new(1.0, 2.0, 3.0));
        a.normal = Vec3::Z;
        a.color = Color::WHITE;
        a.texture = Vec2::new(0.25, 0.75);
        let b = Vertex::at(Vec3::X);
        let c = Vertex::at(Vec3::Y);
        let v = Vertex::interpolate(&a, &b, &c, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(v.position, a.position);
        assert_eq!(v.normal, Vec3::Z);
        assert_eq!(v.color, Color::WHITE);
        assert_eq!(v.texture, a.texture);
    }

    #[test]
    fn interpolated_normal_is_unit_length() {
        let mut a = Vertex::at(Vec3::ZERO);
        let mut b = Vertex::at(Vec3::X);
        let c = Vertex::at(Vec3::Y);
        a.normal = Vec3::X;
        b.normal = Vec3::Y;
        let v = Vertex::interpolate(&a, &b, &c, Vec3::new(0.5, 0.5, 0.0));
        assert_relative_eq!(v.normal.length(), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn zero_normals_stay_zero() {
        let a = Vertex::at(Vec3::ZERO);
        let v = Vertex::interpolate(&a, &a, &a, Vec3::new(0.2, 0.3, 0.5));
        assert_eq!(v.normal, Vec3::ZERO);
    }
}
