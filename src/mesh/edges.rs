//! Edge adjacency over welded vertex positions.
//!
//! Triangles own their vertices by value, so adjacency is recovered by
//! welding bit-identical positions into integer vertex ids. Each undirected
//! edge then records the triangles that use it: one for a boundary edge,
//! two for a manifold interior edge, more for a non-manifold edge.

use std::collections::HashMap;

use crate::line::Line;
use crate::math::Vec3;
use crate::triangle::Triangle;
use crate::vertex::Vertex;

use super::Mesh;

/// Triangle corners mapped to welded vertex ids.
#[derive(Clone, Debug, Default)]
pub struct Welded {
    /// Unique positions, indexed by vertex id.
    pub positions: Vec<Vec3>,
    /// Vertex ids of each triangle's corners, in triangle order.
    pub faces: Vec<[usize; 3]>,
}

impl Welded {
    pub fn new(triangles: &[Triangle]) -> Self {
        let mut ids: HashMap<[u32; 3], usize> = HashMap::new();
        let mut positions = Vec::new();
        let mut id_of = |p: Vec3| {
            *ids.entry(p.to_bits()).or_insert_with(|| {
                positions.push(p);
                positions.len() - 1
            })
        };
        let faces = triangles
            .iter()
            .map(|t| [id_of(t.v1.position), id_of(t.v2.position), id_of(t.v3.position)])
            .collect();
        Self { positions, faces }
    }

    /// Triangles incident to each vertex id.
    pub fn vertex_faces(&self) -> Vec<Vec<usize>> {
        let mut incident = vec![Vec::new(); self.positions.len()];
        for (f, face) in self.faces.iter().enumerate() {
            for &v in face {
                if !incident[v].contains(&f) {
                    incident[v].push(f);
                }
            }
        }
        incident
    }
}

/// Orders an edge's endpoints so both directions map to the same key.
pub(crate) const fn normalize_edge(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// An undirected edge and the triangles that share it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub triangles: Vec<usize>,
}

impl Edge {
    pub fn is_boundary(&self) -> bool {
        self.triangles.len() == 1
    }
}

/// Edge adjacency of a triangle list. Edges are kept in first-seen order so
/// that derived output is deterministic.
#[derive(Clone, Debug, Default)]
pub struct EdgeMap {
    pub welded: Welded,
    pub edges: Vec<Edge>,
    index: HashMap<(usize, usize), usize>,
}

impl EdgeMap {
    pub fn new(triangles: &[Triangle]) -> Self {
        let welded = Welded::new(triangles);
        let mut edges: Vec<Edge> = Vec::new();
        let mut index = HashMap::new();
        for (t, face) in welded.faces.iter().enumerate() {
            for i in 0..3 {
                let (a, b) = normalize_edge(face[i], face[(i + 1) % 3]);
                if a == b {
                    continue;
                }
                let e = *index.entry((a, b)).or_insert_with(|| {
                    edges.push(Edge {
                        a,
                        b,
                        triangles: Vec::new(),
                    });
                    edges.len() - 1
                });
                if !edges[e].triangles.contains(&t) {
                    edges[e].triangles.push(t);
                }
            }
        }
        Self {
            welded,
            edges,
            index,
        }
    }

    pub fn get(&self, a: usize, b: usize) -> Option<&Edge> {
        self.index.get(&normalize_edge(a, b)).map(|&e| &self.edges[e])
    }

    /// Endpoint positions of an edge.
    pub fn segment(&self, edge: &Edge) -> (Vec3, Vec3) {
        (self.welded.positions[edge.a], self.welded.positions[edge.b])
    }
}

impl Mesh {
    /// Feature lines along edges whose two faces' normals differ by more
    /// than `angle` radians.
    pub fn sharp_edges(&self, angle: f32) -> Mesh {
        let map = EdgeMap::new(&self.triangles);
        let lines = map
            .edges
            .iter()
            .filter(|edge| edge.triangles.len() == 2)
            .filter(|edge| {
                let n1 = self.triangles[edge.triangles[0]].normal();
                let n2 = self.triangles[edge.triangles[1]].normal();
                let dot = n1.dot(n2);
                dot.is_finite() && dot.clamp(-1.0, 1.0).acos() > angle
            })
            .map(|edge| {
                let (p1, p2) = map.segment(edge);
                Line::new(Vertex::at(p1), Vertex::at(p2))
            })
            .collect();
        Mesh::from_lines(lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::shapes;

    #[test]
    fn cube_is_closed_manifold() {
        let map = EdgeMap::new(&shapes::cube().triangles);
        assert_eq!(map.welded.positions.len(), 8);
        // 12 box edges + 6 face diagonals
        assert_eq!(map.edges.len(), 18);
        assert!(map.edges.iter().all(|e| e.triangles.len() == 2));
    }

    #[test]
    fn plane_has_boundary() {
        let map = EdgeMap::new(&shapes::plane().triangles);
        assert_eq!(map.edges.iter().filter(|e| e.is_boundary()).count(), 4);
    }

    #[test]
    fn sharp_edges_skip_face_diagonals() {
        let lines = shapes::cube().sharp_edges(60f32.to_radians());
        assert_eq!(lines.lines.len(), 12);
        assert!(lines.triangles.is_empty());
    }
}
