//! Line segment primitive.

use crate::bounds::BoundingBox;
use crate::color::Color;
use crate::math::{Mat4, Vec3};
use crate::vertex::Vertex;

/// A line segment between two vertices.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Line {
    pub v1: Vertex,
    pub v2: Vertex,
}

impl Line {
    pub fn new(v1: Vertex, v2: Vertex) -> Self {
        Self { v1, v2 }
    }

    pub fn from_positions(p1: Vec3, p2: Vec3) -> Self {
        Self::new(Vertex::at(p1), Vertex::at(p2))
    }

    pub fn length(&self) -> f32 {
        self.v1.position.distance(self.v2.position)
    }

    pub fn bounding_box(&self) -> BoundingBox {
        BoundingBox::for_points(&[self.v1.position, self.v2.position])
    }

    pub fn transform(&mut self, matrix: &Mat4) {
        for v in [&mut self.v1, &mut self.v2] {
            v.position = matrix.mul_position(v.position);
            if v.normal != Vec3::ZERO {
                v.normal = matrix.mul_direction(v.normal);
            }
        }
    }

    pub fn set_color(&mut self, color: Color) {
        self.v1.color = color;
        self.v2.color = color;
    }
}
