//! Clip-space clipping against the homogeneous clip cube.
//!
//! The clip volume is defined by:
//!
//! ```text
//! -w <= x <= w
//! -w <= y <= w
//! -w <= z <= w   (OpenGL-style [-1, 1] depth range)
//! ```
//!
//! Vertices are clipped on their `output` (clip-space) position. Every other
//! attribute is blended with the same parameter so that a vertex created on
//! a plane carries the attributes of the point it replaces.

use crate::vertex::Vertex;

/// The 6 planes of the canonical clip-space cube.
///
/// Each plane is defined implicitly by a linear inequality on (x, y, z, w).
/// The signed distance is positive when inside the clip volume.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClipPlane {
    /// x >= -w
    Left,
    /// x <= w
    Right,
    /// y >= -w
    Bottom,
    /// y <= w
    Top,
    /// z >= -w
    Near,
    /// z <= w
    Far,
}

impl ClipPlane {
    pub const ALL: [ClipPlane; 6] = [
        ClipPlane::Left,
        ClipPlane::Right,
        ClipPlane::Bottom,
        ClipPlane::Top,
        ClipPlane::Near,
        ClipPlane::Far,
    ];

    /// Returns the signed distance from a vertex to this plane.
    /// Positive = inside the clip volume, Negative = outside.
    pub fn signed_distance(&self, v: &Vertex) -> f32 {
        let p = v.output;
        match self {
            Self::Left => p.w + p.x,   // x >= -w  =>  w + x >= 0
            Self::Right => p.w - p.x,  // x <= w   =>  w - x >= 0
            Self::Bottom => p.w + p.y, // y >= -w  =>  w + y >= 0
            Self::Top => p.w - p.y,    // y <= w   =>  w - y >= 0
            Self::Near => p.w + p.z,   // z >= -w  =>  w + z >= 0
            Self::Far => p.w - p.z,    // z <= w   =>  w - z >= 0
        }
    }
}

/// A convex polygon in clip space.
///
/// Intermediate representation during clipping. After clipping against all
/// planes it is fan-triangulated back into triangles for rasterization.
#[derive(Clone, Debug, Default)]
pub struct ClipSpacePolygon {
    pub vertices: Vec<Vertex>,
}

impl ClipSpacePolygon {
    pub fn from_triangle(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: vec![v0, v1, v2],
        }
    }

    /// Returns true if the polygon has been completely clipped away.
    pub fn is_empty(&self) -> bool {
        self.vertices.len() < 3
    }

    /// Clip this polygon against a single plane using the Sutherland-Hodgman algorithm.
    pub fn clip_against_plane(&self, plane: ClipPlane) -> Self {
        if self.is_empty() {
            return Self::default();
        }

        let n = self.vertices.len();
        let mut output = Vec::with_capacity(n + 1);

        for i in 0..n {
            let current = &self.vertices[i];
            let next = &self.vertices[(i + 1) % n];

            let d1 = plane.signed_distance(current);
            let d2 = plane.signed_distance(next);

            let current_inside = d1 >= 0.0;
            let next_inside = d2 >= 0.0;

            if current_inside {
                output.push(*current);

                if !next_inside {
                    // leaving the volume
                    output.push(current.lerp(next, d1 / (d1 - d2)));
                }
            } else if next_inside {
                // entering the volume
                output.push(current.lerp(next, d1 / (d1 - d2)));
            }
        }

        Self { vertices: output }
    }

    /// Fan triangulation of this convex polygon: `n` vertices give `n - 2`
    /// triangles, all sharing the first vertex.
    pub fn triangulate(&self) -> impl Iterator<Item = [Vertex; 3]> + '_ {
        (1..self.vertices.len().saturating_sub(1))
            .map(move |i| [self.vertices[0], self.vertices[i], self.vertices[i + 1]])
    }
}

/// Clips polygons against the six planes of the clip cube.
///
/// Stateless; the planes are fixed in clip space and do not depend on the
/// projection.
#[derive(Clone, Copy, Debug, Default)]
pub struct ClipSpaceClipper;

impl ClipSpaceClipper {
    pub fn new() -> Self {
        Self
    }

    /// Clip a polygon against all 6 planes.
    ///
    /// Returns the clipped polygon, which is empty if the input was entirely
    /// outside the clip volume.
    pub fn clip_polygon(&self, polygon: ClipSpacePolygon) -> ClipSpacePolygon {
        let mut result = polygon;

        for plane in ClipPlane::ALL {
            if result.is_empty() {
                break;
            }
            result = result.clip_against_plane(plane);
        }

        result
    }
}

/// Clips a triangle whose vertices carry clip-space `output` positions.
///
/// Returns zero triangles when fully outside, the input unchanged when fully
/// inside, and otherwise the fan triangulation of the clipped polygon.
pub fn clip_triangle(v1: &Vertex, v2: &Vertex, v3: &Vertex) -> Vec<[Vertex; 3]> {
    if !(v1.output.outside() || v2.output.outside() || v3.output.outside()) {
        return vec![[*v1, *v2, *v3]];
    }
    let polygon = ClipSpaceClipper::new()
        .clip_polygon(ClipSpacePolygon::from_triangle(*v1, *v2, *v3));
    polygon.triangulate().collect()
}

/// Clips a segment against the six planes.
///
/// Each plane narrows the parameter interval `[t0, t1]` along the segment;
/// the segment is rejected once the interval is empty.
pub fn clip_line(v1: &Vertex, v2: &Vertex) -> Option<(Vertex, Vertex)> {
    if !(v1.output.outside() || v2.output.outside()) {
        return Some((*v1, *v2));
    }

    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;
    for plane in ClipPlane::ALL {
        let d1 = plane.signed_distance(v1);
        let d2 = plane.signed_distance(v2);
        match (d1 >= 0.0, d2 >= 0.0) {
            (true, true) => {}
            (false, false) => return None,
            (true, false) => t1 = t1.min(d1 / (d1 - d2)),
            (false, true) => t0 = t0.max(d1 / (d1 - d2)),
        }
        if t0 > t1 {
            return None;
        }
    }

    Some((v1.lerp(v2, t0), v1.lerp(v2, t1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Vec4;
    use approx::assert_relative_eq;

    fn clip_vertex(x: f32, y: f32, z: f32) -> Vertex {
        Vertex {
            output: Vec4::new(x, y, z, 1.0),
            ..Vertex::default()
        }
    }

    #[test]
    fn inside_triangle_is_untouched() {
        let (a, b, c) = (
            clip_vertex(-0.5, -0.5, 0.0),
            clip_vertex(0.5, -0.5, 0.0),
            clip_vertex(0.0, 0.5, 0.0),
        );
        let out = clip_triangle(&a, &b, &c);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0], [a, b, c]);
    }

    #[test]
    fn outside_triangle_is_dropped() {
        let out = clip_triangle(
            &clip_vertex(2.0, 0.0, 0.0),
            &clip_vertex(3.0, 0.0, 0.0),
            &clip_vertex(2.0, 1.0, 0.0),
        );
        assert!(out.is_empty());
    }

    #[test]
    fn straddling_triangle_stays_inside_volume() {
        let out = clip_triangle(
            &clip_vertex(-2.0, -0.5, 0.0),
            &clip_vertex(2.0, -0.5, 0.0),
            &clip_vertex(0.0, 2.0, 0.0),
        );
        assert!(out.len() >= 2);
        for tri in &out {
            for v in tri {
                assert!(v.output.x >= -1.0 - 1e-5 && v.output.x <= 1.0 + 1e-5);
                assert!(v.output.y >= -1.0 - 1e-5 && v.output.y <= 1.0 + 1e-5);
            }
        }
    }

    #[test]
    fn clip_line_interpolates_attributes() {
        let mut a = clip_vertex(-2.0, 0.0, 0.0);
        let mut b = clip_vertex(2.0, 0.0, 0.0);
        a.texture.x = 0.0;
        b.texture.x = 1.0;
        let (c, d) = clip_line(&a, &b).expect("segment crosses the volume");
        assert_relative_eq!(c.output.x, -1.0);
        assert_relative_eq!(d.output.x, 1.0);
        assert_relative_eq!(c.texture.x, 0.25);
        assert_relative_eq!(d.texture.x, 0.75);
    }

    #[test]
    fn clip_line_rejects_outside_segment() {
        assert!(clip_line(&clip_vertex(2.0, 0.0, 0.0), &clip_vertex(3.0, 5.0, 0.0)).is_none());
        // both endpoints outside on different planes, missing the volume
        assert!(clip_line(&clip_vertex(0.0, 3.0, 0.0), &clip_vertex(3.0, 0.0, 0.0)).is_none());
    }
}
