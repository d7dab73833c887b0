//! Triangle meshes and the algorithms that post-process them.
//!
//! A [`Mesh`] owns its triangles and lines by value. Cloning is a deep
//! copy; nothing is shared between meshes.
//!
//! - [`shapes`]: procedural generators (cube, sphere, cylinder, ...)
//! - [`loader`]: OBJ and STL import
//! - [`edges`]: welded edge adjacency and sharp-edge extraction
//! - [`smooth`]: vertex normal smoothing
//! - [`simplify`]: quadric error metric edge collapse
//! - [`silhouette`]: view-dependent outline extraction

pub mod edges;
pub mod loader;
mod quadric;
pub mod shapes;
pub mod silhouette;
pub mod simplify;
pub mod smooth;

pub use loader::{load_mesh, load_obj, load_stl};
pub use simplify::{SimplifyOptions, SimplifyReport};

use crate::bounds::BoundingBox;
use crate::color::Color;
use crate::line::Line;
use crate::math::{Mat4, Vec3};
use crate::triangle::Triangle;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
    pub lines: Vec<Line>,
}

impl Mesh {
    pub fn new(triangles: Vec<Triangle>, lines: Vec<Line>) -> Self {
        Self { triangles, lines }
    }

    pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
        Self::new(triangles, Vec::new())
    }

    pub fn from_lines(lines: Vec<Line>) -> Self {
        Self::new(Vec::new(), lines)
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty() && self.lines.is_empty()
    }

    /// Deep copy; same as `clone()`.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Append copies of another mesh's triangles and lines.
    pub fn add(&mut self, other: &Mesh) {
        self.triangles.extend_from_slice(&other.triangles);
        self.lines.extend_from_slice(&other.lines);
    }

    pub fn bounding_box(&self) -> BoundingBox {
        let boxes: Vec<BoundingBox> = self
            .triangles
            .iter()
            .map(Triangle::bounding_box)
            .chain(self.lines.iter().map(Line::bounding_box))
            .collect();
        BoundingBox::for_boxes(&boxes)
    }

    pub fn surface_area(&self) -> f32 {
        self.triangles.iter().map(Triangle::area).sum()
    }

    pub fn transform(&mut self, matrix: &Mat4) {
        for t in &mut self.triangles {
            t.transform(matrix);
        }
        for l in &mut self.lines {
            l.transform(matrix);
        }
    }

    /// Uniformly scale and move the mesh so it fits inside `target`. The
    /// leftover space on each axis is distributed by `anchor` (0 puts the
    /// mesh against `target.min`, 1 against `target.max`).
    ///
    /// Returns the matrix that was applied.
    pub fn fit_inside(&mut self, target: BoundingBox, anchor: Vec3) -> Mat4 {
        let bounds = self.bounding_box();
        let ratio = target.size().div_elem(bounds.size());
        // flat axes divide by zero; only finite ratios constrain the scale
        let scale = [ratio.x, ratio.y, ratio.z]
            .into_iter()
            .filter(|r| r.is_finite())
            .fold(f32::INFINITY, f32::min);
        let scale = if scale.is_finite() { scale } else { 1.0 };
        let extra = target.size() - bounds.size() * scale;
        let matrix = Mat4::translation(-bounds.min)
            .scale(Vec3::splat(scale))
            .translate(target.min + extra.mul_elem(anchor));
        self.transform(&matrix);
        matrix
    }

    /// Translate the mesh so that the point at `anchor` of its bounding box
    /// lands on `position`. Returns the matrix that was applied.
    pub fn move_to(&mut self, position: Vec3, anchor: Vec3) -> Mat4 {
        let matrix = Mat4::translation(position - self.bounding_box().anchor(anchor));
        self.transform(&matrix);
        matrix
    }

    /// Fit inside the [-1, 1] cube, centered.
    pub fn bi_unit_cube(&mut self) -> Mat4 {
        let target = BoundingBox::new(Vec3::splat(-1.0), Vec3::splat(1.0));
        self.fit_inside(target, Vec3::splat(0.5))
    }

    /// Fit inside a unit cube centered on the origin.
    pub fn unit_cube(&mut self) -> Mat4 {
        let fit = self.fit_inside(BoundingBox::new(Vec3::ZERO, Vec3::ONE), Vec3::ZERO);
        let center = self.move_to(Vec3::ZERO, Vec3::splat(0.5));
        center * fit
    }

    pub fn reverse_winding(&mut self) {
        for t in &mut self.triangles {
            t.reverse_winding();
        }
    }

    pub fn set_color(&mut self, color: Color) {
        for t in &mut self.triangles {
            t.set_color(color);
        }
        for l in &mut self.lines {
            l.set_color(color);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn add_appends_copies() {
        let mut a = shapes::cube();
        let b = shapes::plane();
        a.add(&b);
        assert_eq!(a.triangles.len(), 14);
        assert_eq!(b.triangles.len(), 2);
    }

    #[test]
    fn bi_unit_cube_centers_and_scales() {
        let mut m = shapes::cube();
        m.transform(&Mat4::scaling(Vec3::new(4.0, 2.0, 1.0)).translate(Vec3::new(10.0, 0.0, 0.0)));
        m.bi_unit_cube();
        let b = m.bounding_box();
        assert_relative_eq!(b.min.x, -1.0, epsilon = 1e-5);
        assert_relative_eq!(b.max.x, 1.0, epsilon = 1e-5);
        assert_relative_eq!(b.max.y, 0.5, epsilon = 1e-5);
        assert_relative_eq!(b.center().y, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn move_to_uses_anchor() {
        let mut m = shapes::cube();
        m.move_to(Vec3::new(1.0, 1.0, 1.0), Vec3::ZERO);
        assert_relative_eq!(m.bounding_box().min.x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn cube_surface_area() {
        assert_relative_eq!(shapes::cube().surface_area(), 6.0, epsilon = 1e-5);
    }
}
