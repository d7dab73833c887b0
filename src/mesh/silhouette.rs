//! View-dependent outline extraction.

use crate::line::Line;
use crate::math::Vec3;
use crate::vertex::Vertex;

use super::edges::EdgeMap;
use super::Mesh;

/// Minimum `(eye - p)·n` for a face to count as facing the eye. Faces seen
/// exactly edge-on are treated as facing away.
pub const DEFAULT_EPSILON: f32 = 1e-6;

impl Mesh {
    /// Outline of the mesh as seen from `eye`, as a line-only mesh.
    ///
    /// An edge is emitted when its incident faces disagree on facing the
    /// eye, or when it borders a single face. Each edge appears once.
    /// Endpoints are moved `offset` units toward the eye so that the lines
    /// win the depth test against the surface they outline.
    pub fn silhouette(&self, eye: Vec3, offset: f32) -> Mesh {
        self.silhouette_with_epsilon(eye, offset, DEFAULT_EPSILON)
    }

    pub fn silhouette_with_epsilon(&self, eye: Vec3, offset: f32, epsilon: f32) -> Mesh {
        let facing: Vec<bool> = self
            .triangles
            .iter()
            .map(|t| (eye - t.v1.position).dot(t.normal()) > epsilon)
            .collect();

        let toward_eye = |p: Vec3| {
            let d = (eye - p).normalize();
            if offset == 0.0 || d.is_degenerate() {
                p
            } else {
                p + d * offset
            }
        };

        let map = EdgeMap::new(&self.triangles);
        let lines = map
            .edges
            .iter()
            .filter(|edge| {
                edge.is_boundary() || {
                    let first = facing[edge.triangles[0]];
                    edge.triangles[1..].iter().any(|&t| facing[t] != first)
                }
            })
            .map(|edge| {
                let (p1, p2) = map.segment(edge);
                Line::new(Vertex::at(toward_eye(p1)), Vertex::at(toward_eye(p2)))
            })
            .collect();
        Mesh::from_lines(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::shapes;
    use approx::assert_relative_eq;
    use std::collections::HashSet;

    #[test]
    fn cube_from_corner_is_a_hexagon() {
        let outline = shapes::cube().silhouette(Vec3::new(3.0, 3.0, 3.0), 0.0);
        assert_eq!(outline.lines.len(), 6);
        assert!(outline.triangles.is_empty());
    }

    #[test]
    fn cube_from_above_outlines_top_face() {
        let outline = shapes::cube().silhouette(Vec3::new(0.0, 0.0, 5.0), 0.0);
        assert_eq!(outline.lines.len(), 4);
        for line in &outline.lines {
            assert_relative_eq!(line.v1.position.z, 0.5);
            assert_relative_eq!(line.v2.position.z, 0.5);
        }
    }

    #[test]
    fn offset_moves_lines_toward_eye() {
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let outline = shapes::cube().silhouette(eye, 0.01);
        for line in &outline.lines {
            assert!(line.v1.position.z > 0.5);
            assert!(line.v1.position.distance(eye) < Vec3::new(0.5, 0.5, 0.5).distance(eye));
        }
    }

    #[test]
    fn plane_boundary_always_emitted() {
        let plane = shapes::plane();
        assert_eq!(plane.silhouette(Vec3::new(0.0, 0.0, 3.0), 0.0).lines.len(), 4);
        assert_eq!(plane.silhouette(Vec3::new(0.0, 0.0, -3.0), 0.0).lines.len(), 4);
    }

    #[test]
    fn sphere_outline_traces_the_rim() {
        let sphere = shapes::icosphere(3);
        let eye = Vec3::new(0.0, 0.0, 5.0);
        let outline = sphere.silhouette(eye, 0.0);
        assert!(!outline.lines.is_empty());

        let mut seen = HashSet::new();
        for line in &outline.lines {
            for p in [line.v1.position, line.v2.position] {
                // tangent points from the eye lie on the plane z = 1/5
                assert!((p.z - 0.2).abs() < 0.2, "{p:?}");
            }
            let (a, b) = (line.v1.position.to_bits(), line.v2.position.to_bits());
            assert!(seen.insert(if a < b { (a, b) } else { (b, a) }));
        }

        let bounds = outline.bounding_box();
        assert!(bounds.min.x < -0.9 && bounds.max.x > 0.9);
        assert!(bounds.min.y < -0.9 && bounds.max.y > 0.9);
    }
}
