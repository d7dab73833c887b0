//! Axis-aligned bounding box.

use crate::math::vec3::Vec3;

/// Axis-aligned box spanning `min` to `max` (inclusive).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. An empty slice gives a zero box.
    pub fn for_points(points: &[Vec3]) -> Self {
        let Some((first, rest)) = points.split_first() else {
            return Self::default();
        };
        rest.iter()
            .fold(Self::new(*first, *first), |b, &p| Self::new(b.min.min(p), b.max.max(p)))
    }

    /// Smallest box containing every box. An empty slice gives a zero box.
    pub fn for_boxes(boxes: &[BoundingBox]) -> Self {
        let Some((first, rest)) = boxes.split_first() else {
            return Self::default();
        };
        rest.iter().fold(*first, |b, other| b.extend(*other))
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec3 {
        self.anchor(Vec3::splat(0.5))
    }

    /// Point at the relative position `anchor` inside the box:
    /// `(0,0,0)` is `min`, `(1,1,1)` is `max`.
    pub fn anchor(&self, anchor: Vec3) -> Vec3 {
        self.min + self.size().mul_elem(anchor)
    }

    pub fn extend(&self, other: BoundingBox) -> Self {
        Self::new(self.min.min(other.min), self.max.max(other.max))
    }

    pub fn contains(&self, p: Vec3) -> bool {
        self.min.x <= p.x
            && self.max.x >= p.x
            && self.min.y <= p.y
            && self.max.y >= p.y
            && self.min.z <= p.z
            && self.max.z >= p.z
    }

    pub fn intersects(&self, other: BoundingBox) -> bool {
        !(self.min.x > other.max.x
            || self.max.x < other.min.x
            || self.min.y > other.max.y
            || self.max.y < other.min.y
            || self.min.z > other.max.z
            || self.max.z < other.min.z)
    }

    /// Grows (or shrinks, for negative `x`) the box by `x` on every side.
    pub fn offset(&self, x: f32) -> Self {
        Self::new(self.min - Vec3::splat(x), self.max + Vec3::splat(x))
    }

    pub fn translate(&self, v: Vec3) -> Self {
        Self::new(self.min + v, self.max + v)
    }
}
