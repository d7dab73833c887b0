//! Triangle primitive.

use crate::bounds::BoundingBox;
use crate::color::Color;
use crate::math::{Mat4, Vec3};
use crate::vertex::Vertex;

/// A triangle owning its three vertices.
///
/// Counter-clockwise winding (seen from the front) is the default front face.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Triangle {
    pub v1: Vertex,
    pub v2: Vertex,
    pub v3: Vertex,
}

impl Triangle {
    /// Creates a triangle, filling any zero vertex normal with the face
    /// normal. Explicit normals are never overwritten.
    pub fn new(v1: Vertex, v2: Vertex, v3: Vertex) -> Self {
        let mut t = Self { v1, v2, v3 };
        t.fix_normals();
        t
    }

    pub fn from_positions(p1: Vec3, p2: Vec3, p3: Vec3) -> Self {
        Self::new(Vertex::at(p1), Vertex::at(p2), Vertex::at(p3))
    }

    pub fn vertices(&self) -> [&Vertex; 3] {
        [&self.v1, &self.v2, &self.v3]
    }

    pub fn positions(&self) -> [Vec3; 3] {
        [self.v1.position, self.v2.position, self.v3.position]
    }

    /// Unit face normal from the counter-clockwise winding. NaN for a
    /// degenerate triangle.
    pub fn normal(&self) -> Vec3 {
        let e1 = self.v2.position - self.v1.position;
        let e2 = self.v3.position - self.v1.position;
        e1.cross(e2).normalize()
    }

    pub fn area(&self) -> f32 {
        let e1 = self.v2.position - self.v1.position;
        let e2 = self.v3.position - self.v1.position;
        e1.cross(e2).length() / 2.0
    }

    /// True when two positions coincide or any component is not finite.
    pub fn is_degenerate(&self) -> bool {
        let [p1, p2, p3] = self.positions();
        p1.is_degenerate()
            || p2.is_degenerate()
            || p3.is_degenerate()
            || p1 == p2
            || p2 == p3
            || p1 == p3
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::for_points(&self.positions())
    }

    /// Replaces zero vertex normals with the face normal.
    pub fn fix_normals(&mut self) {
        let n = self.normal();
        if n.is_degenerate() {
            return;
        }
        for v in [&mut self.v1, &mut self.v2, &mut self.v3] {
            if v.normal == Vec3::ZERO {
                v.normal = n;
            }
        }
    }

    /// Transforms positions as points and normals as directions.
    pub fn transform(&mut self, matrix: &Mat4) {
        for v in [&mut self.v1, &mut self.v2, &mut self.v3] {
            v.position = matrix.mul_position(v.position);
            if v.normal != Vec3::ZERO {
                v.normal = matrix.mul_direction(v.normal);
            }
        }
    }

    /// Flips the facing: swaps the first and last vertex and negates normals.
    pub fn reverse_winding(&mut self) {
        std::mem::swap(&mut self.v1, &mut self.v3);
        for v in [&mut self.v1, &mut self.v2, &mut self.v3] {
            v.normal = -v.normal;
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.v1.color = color;
        self.v2.color = color;
        self.v3.color = color;
    }
}
