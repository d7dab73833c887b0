//! Mesh simplification by quadric error metric edge collapse.
//!
//! The triangle soup is welded into an indexed arena. Every edge is scored
//! by the quadric error of its best collapse point and pushed onto a
//! min-heap; the cheapest valid collapse is applied until the triangle
//! count reaches the target. Vertices and faces are never removed from the
//! arena, only marked dead, so indices stay stable for the whole run.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fmt;

use tracing::{info, trace};

use crate::error::{Error, Result};
use crate::math::Vec3;
use crate::triangle::Triangle;
use crate::vertex::Vertex;

use super::edges::{normalize_edge, Welded};
use super::quadric::{to_f64, Quadric};
use super::Mesh;

/// Parameters for [`Mesh::simplify_with`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimplifyOptions {
    /// Fraction of the original triangle count to keep, in (0, 1].
    pub factor: f32,
    /// A collapse is rejected when any surviving face normal rotates by
    /// more than this many degrees.
    pub max_normal_flip_degrees: f32,
    /// Never collapse boundary edges or edges joining two boundary vertices.
    pub preserve_boundary: bool,
}

impl Default for SimplifyOptions {
    fn default() -> Self {
        Self {
            factor: 0.5,
            max_normal_flip_degrees: 89.9,
            preserve_boundary: true,
        }
    }
}

impl SimplifyOptions {
    pub fn new(factor: f32) -> Self {
        Self {
            factor,
            ..Self::default()
        }
    }

    pub fn with_max_normal_flip_degrees(mut self, degrees: f32) -> Self {
        self.max_normal_flip_degrees = degrees;
        self
    }

    pub fn with_preserve_boundary(mut self, preserve: bool) -> Self {
        self.preserve_boundary = preserve;
        self
    }
}

/// Outcome of a simplification run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimplifyReport {
    pub original: usize,
    pub simplified: usize,
    pub collapses: usize,
    pub rejected: usize,
}

impl SimplifyReport {
    pub fn reduction_ratio(&self) -> f64 {
        if self.original == 0 {
            return 0.0;
        }
        1.0 - self.simplified as f64 / self.original as f64
    }
}

impl fmt::Display for SimplifyReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {} triangles ({} collapses, {} rejected)",
            self.original, self.simplified, self.collapses, self.rejected
        )
    }
}

impl Mesh {
    /// Simplify to roughly `factor` of the current triangle count with
    /// default options.
    pub fn simplify(&mut self, factor: f32) -> Result<SimplifyReport> {
        self.simplify_with(&SimplifyOptions::new(factor))
    }

    /// Simplify the triangles in place. Lines are left untouched.
    ///
    /// Surviving triangles get flat face normals. Colors and texture
    /// coordinates are blended along each collapsed edge.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidSimplifyFactor`] when `factor` is not a finite
    /// positive number. The mesh is not modified in that case.
    pub fn simplify_with(&mut self, options: &SimplifyOptions) -> Result<SimplifyReport> {
        let factor = options.factor;
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidSimplifyFactor(factor));
        }
        let original = self.triangles.len();
        if factor >= 1.0 || original == 0 {
            return Ok(SimplifyReport {
                original,
                simplified: original,
                ..SimplifyReport::default()
            });
        }

        let target = (original as f64 * factor as f64).ceil() as usize;
        info!(original, target, "simplifying mesh");

        let mut arena = Arena::new(&self.triangles, options);
        let report = arena.run(target, original);
        self.triangles = arena.into_triangles();

        info!(
            simplified = report.simplified,
            collapses = report.collapses,
            rejected = report.rejected,
            "simplification complete"
        );
        Ok(report)
    }
}

/// An edge collapse waiting in the heap.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    cost: f64,
    a: usize,
    b: usize,
    target: [f64; 3],
    /// Endpoint versions when the candidate was scored.
    versions: (u32, u32),
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    // reversed: BinaryHeap pops the cheapest edge first, ties by index
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| (other.a, other.b).cmp(&(self.a, self.b)))
    }
}

/// Why a popped candidate was not collapsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rejection {
    NonManifold,
    Boundary,
    Link,
    NormalFlip,
}

struct Arena {
    positions: Vec<[f64; 3]>,
    /// Color and texture of the first corner welded into each vertex.
    attributes: Vec<Vertex>,
    alive: Vec<bool>,
    versions: Vec<u32>,
    quadrics: Vec<Quadric>,
    vertex_faces: Vec<Vec<usize>>,
    faces: Vec<[usize; 3]>,
    face_alive: Vec<bool>,
    active: usize,
    min_cos: f64,
    preserve_boundary: bool,
    heap: BinaryHeap<Candidate>,
}

impl Arena {
    fn new(triangles: &[Triangle], options: &SimplifyOptions) -> Self {
        let welded = Welded::new(triangles);
        let count = welded.positions.len();

        let mut attributes = vec![Vertex::default(); count];
        let mut seen = vec![false; count];
        for (t, face) in triangles.iter().zip(&welded.faces) {
            for (vertex, &id) in t.vertices().into_iter().zip(face) {
                if !seen[id] {
                    seen[id] = true;
                    attributes[id] = *vertex;
                }
            }
        }

        let mut quadrics = vec![Quadric::default(); count];
        let mut vertex_faces = vec![Vec::new(); count];
        let mut face_alive = Vec::with_capacity(welded.faces.len());
        for (f, face) in welded.faces.iter().enumerate() {
            let [a, b, c] = *face;
            let valid = a != b && b != c && a != c;
            face_alive.push(valid);
            if !valid {
                continue;
            }
            let [p1, p2, p3] = [a, b, c].map(|v| welded.positions[v]);
            let q = Quadric::from_triangle(p1, p2, p3);
            for &v in face {
                if let Some(q) = q {
                    quadrics[v] += q;
                }
                vertex_faces[v].push(f);
            }
        }
        let active = face_alive.iter().filter(|&&alive| alive).count();

        let max_angle = options.max_normal_flip_degrees.clamp(0.0, 180.0) as f64;
        let mut arena = Self {
            positions: welded.positions.iter().copied().map(to_f64).collect(),
            attributes,
            alive: vec![true; count],
            versions: vec![0; count],
            quadrics,
            vertex_faces,
            faces: welded.faces,
            face_alive,
            active,
            min_cos: max_angle.to_radians().cos(),
            preserve_boundary: options.preserve_boundary,
            heap: BinaryHeap::new(),
        };

        let mut edges = HashSet::new();
        for (f, face) in arena.faces.iter().enumerate() {
            if !arena.face_alive[f] {
                continue;
            }
            for i in 0..3 {
                edges.insert(normalize_edge(face[i], face[(i + 1) % 3]));
            }
        }
        // sorted so the heap is filled in the same order on every run
        let mut edges: Vec<_> = edges.into_iter().collect();
        edges.sort_unstable();
        for (a, b) in edges {
            arena.push(a, b);
        }
        arena
    }

    fn run(&mut self, target: usize, original: usize) -> SimplifyReport {
        let mut collapses = 0;
        let mut rejected = 0;
        while self.active > target {
            let Some(candidate) = self.heap.pop() else {
                break;
            };
            let (a, b) = (candidate.a, candidate.b);
            if !self.alive[a]
                || !self.alive[b]
                || candidate.versions != (self.versions[a], self.versions[b])
            {
                continue;
            }
            if let Err(reason) = self.check(&candidate) {
                trace!(a, b, ?reason, "collapse rejected");
                rejected += 1;
                continue;
            }
            self.collapse(&candidate);
            collapses += 1;
        }
        SimplifyReport {
            original,
            simplified: self.active,
            collapses,
            rejected,
        }
    }

    /// Scores the collapse of `a`-`b` and queues it.
    fn push(&mut self, a: usize, b: usize) {
        let (a, b) = normalize_edge(a, b);
        let q = self.quadrics[a] + self.quadrics[b];
        let (pa, pb) = (self.positions[a], self.positions[b]);
        let mid = [
            (pa[0] + pb[0]) / 2.0,
            (pa[1] + pb[1]) / 2.0,
            (pa[2] + pb[2]) / 2.0,
        ];
        let length = distance(pa, pb);

        // a preserved boundary vertex stays where it is
        let pinned = if self.preserve_boundary {
            match (self.is_boundary_vertex(a), self.is_boundary_vertex(b)) {
                (true, false) => Some(pa),
                (false, true) => Some(pb),
                _ => None,
            }
        } else {
            None
        };
        // the optimum of a nearly flat quadric can lie far off the surface
        let optimal = q
            .optimal_point()
            .filter(|p| p.iter().all(|c| c.is_finite()) && distance(*p, mid) <= length);
        let (target, cost) = match pinned.or(optimal) {
            Some(p) => (p, q.evaluate(p)),
            None => [mid, pa, pb]
                .into_iter()
                .map(|p| (p, q.evaluate(p)))
                .fold((mid, f64::INFINITY), |best, next| {
                    if next.1 < best.1 {
                        next
                    } else {
                        best
                    }
                }),
        };

        self.heap.push(Candidate {
            cost,
            a,
            b,
            target,
            versions: (self.versions[a], self.versions[b]),
        });
    }

    fn live_faces(&self, v: usize) -> impl Iterator<Item = usize> + '_ {
        self.vertex_faces[v]
            .iter()
            .copied()
            .filter(|&f| self.face_alive[f])
    }

    fn neighbors(&self, v: usize) -> HashSet<usize> {
        self.live_faces(v)
            .flat_map(|f| self.faces[f])
            .filter(|&n| n != v)
            .collect()
    }

    fn shared_faces(&self, a: usize, b: usize) -> usize {
        self.live_faces(a)
            .filter(|&f| self.faces[f].contains(&b))
            .count()
    }

    fn is_boundary_vertex(&self, v: usize) -> bool {
        self.neighbors(v)
            .into_iter()
            .any(|n| self.shared_faces(v, n) == 1)
    }

    fn check(&self, candidate: &Candidate) -> std::result::Result<(), Rejection> {
        let (a, b) = (candidate.a, candidate.b);
        let shared = self.shared_faces(a, b);
        if shared > 2 {
            return Err(Rejection::NonManifold);
        }
        if self.preserve_boundary
            && (shared < 2 || (self.is_boundary_vertex(a) && self.is_boundary_vertex(b)))
        {
            return Err(Rejection::Boundary);
        }

        let common = self.neighbors(a).intersection(&self.neighbors(b)).count();
        if common > shared {
            return Err(Rejection::Link);
        }

        for v in [a, b] {
            for f in self.live_faces(v) {
                let face = self.faces[f];
                if face.contains(&a) && face.contains(&b) {
                    continue;
                }
                let [p1, p2, p3] = face.map(|i| self.positions[i]);
                let Some(before) = face_normal(p1, p2, p3) else {
                    continue;
                };
                let [q1, q2, q3] = face.map(|i| {
                    if i == a || i == b {
                        candidate.target
                    } else {
                        self.positions[i]
                    }
                });
                match face_normal(q1, q2, q3) {
                    Some(after) if dot(before, after) >= self.min_cos => {}
                    _ => return Err(Rejection::NormalFlip),
                }
            }
        }
        Ok(())
    }

    /// Merges `b` into `a` at the candidate's target.
    fn collapse(&mut self, candidate: &Candidate) {
        let (a, b) = (candidate.a, candidate.b);
        let (pa, pb) = (self.positions[a], self.positions[b]);

        // attribute blend weight: target projected onto the edge
        let edge = sub(pb, pa);
        let length_squared = dot(edge, edge);
        let t = if length_squared > 0.0 {
            (dot(sub(candidate.target, pa), edge) / length_squared).clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.attributes[a] = self.attributes[a].lerp(&self.attributes[b], t as f32);
        self.positions[a] = candidate.target;
        let qb = self.quadrics[b];
        self.quadrics[a] += qb;
        self.alive[b] = false;

        let moved = std::mem::take(&mut self.vertex_faces[b]);
        for f in moved {
            if !self.face_alive[f] {
                continue;
            }
            if self.faces[f].contains(&a) {
                self.face_alive[f] = false;
                self.active -= 1;
            } else {
                for v in &mut self.faces[f] {
                    if *v == b {
                        *v = a;
                    }
                }
                self.vertex_faces[a].push(f);
            }
        }
        let face_alive = &self.face_alive;
        self.vertex_faces[a].retain(|&f| face_alive[f]);

        self.versions[a] = self.versions[a].wrapping_add(1);
        self.versions[b] = self.versions[b].wrapping_add(1);

        let mut neighbors: Vec<usize> = self.neighbors(a).into_iter().collect();
        neighbors.sort_unstable();
        for n in neighbors {
            self.push(a, n);
        }
    }

    fn into_triangles(self) -> Vec<Triangle> {
        let corner = |i: usize| {
            let [x, y, z] = self.positions[i];
            let attributes = &self.attributes[i];
            Vertex {
                position: Vec3::new(x as f32, y as f32, z as f32),
                color: attributes.color,
                texture: attributes.texture,
                ..Vertex::default()
            }
        };
        self.faces
            .iter()
            .zip(&self.face_alive)
            .filter(|&(_, &alive)| alive)
            .map(|(&[a, b, c], _)| Triangle::new(corner(a), corner(b), corner(c)))
            .collect()
    }
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

fn distance(a: [f64; 3], b: [f64; 3]) -> f64 {
    let d = sub(a, b);
    dot(d, d).sqrt()
}

fn face_normal(p1: [f64; 3], p2: [f64; 3], p3: [f64; 3]) -> Option<[f64; 3]> {
    let (u, v) = (sub(p2, p1), sub(p3, p1));
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = dot(n, n).sqrt();
    if len < 1e-12 {
        return None;
    }
    Some([n[0] / len, n[1] / len, n[2] / len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::mesh::edges::EdgeMap;
    use crate::mesh::shapes;

    #[test]
    fn invalid_factor_leaves_mesh_untouched() {
        let mut sphere = shapes::sphere(8);
        let before = sphere.clone();
        for factor in [0.0, -0.5, f32::NAN, f32::INFINITY] {
            assert!(matches!(
                sphere.simplify(factor),
                Err(Error::InvalidSimplifyFactor(_))
            ));
        }
        assert_eq!(sphere, before);
    }

    #[test]
    fn factor_one_is_a_no_op() {
        let mut sphere = shapes::sphere(8);
        let before = sphere.clone();
        let report = sphere.simplify(1.0).expect("valid factor");
        assert_eq!(report.collapses, 0);
        assert_eq!(report.simplified, report.original);
        assert_eq!(sphere, before);
    }

    #[test]
    fn sphere_halves_near_target() {
        let mut sphere = shapes::sphere(16);
        assert_eq!(sphere.triangles.len(), 960);
        let report = sphere.simplify(0.5).expect("valid factor");
        assert_eq!(report.simplified, sphere.triangles.len());
        assert!((450..=550).contains(&report.simplified), "{report}");
        assert!(report.collapses > 0);
    }

    #[test]
    fn simplified_sphere_stays_closed() {
        let mut sphere = shapes::sphere(12);
        sphere.simplify(0.3).expect("valid factor");
        let map = EdgeMap::new(&sphere.triangles);
        assert!(map.edges.iter().all(|e| e.triangles.len() == 2));
    }

    #[test]
    fn preserved_boundary_keeps_plane() {
        let mut plane = shapes::plane();
        let report = plane.simplify(0.1).expect("valid factor");
        assert_eq!(plane.triangles.len(), 2);
        assert!(report.rejected > 0);
        assert_eq!(report.collapses, 0);
    }

    #[test]
    fn colors_survive_collapse() {
        let mut sphere = shapes::sphere(8);
        sphere.set_color(Color::new(1.0, 0.0, 0.0, 1.0));
        sphere.simplify(0.5).expect("valid factor");
        for t in &sphere.triangles {
            assert_eq!(t.v1.color, Color::new(1.0, 0.0, 0.0, 1.0));
        }
    }

    #[test]
    fn lines_are_kept() {
        let mut mesh = shapes::sphere(8);
        mesh.add(&shapes::cube().sharp_edges(1.0));
        let lines = mesh.lines.len();
        mesh.simplify(0.5).expect("valid factor");
        assert_eq!(mesh.lines.len(), lines);
    }

    #[test]
    fn edge_shared_by_three_faces_is_kept() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(1.0, 0.0, 0.0);
        let mut fins = Mesh::from_triangles(vec![
            Triangle::from_positions(a, b, Vec3::new(0.5, 1.0, 0.0)),
            Triangle::from_positions(a, b, Vec3::new(0.5, -0.5, 0.8)),
            Triangle::from_positions(a, b, Vec3::new(0.5, -0.5, -0.8)),
        ]);
        let options = SimplifyOptions::new(0.5).with_preserve_boundary(false);
        let report = fins.simplify_with(&options).expect("valid factor");

        assert!(report.rejected > 0, "{report}");
        assert_eq!(fins.triangles.len(), 2);
        for t in &fins.triangles {
            let positions = t.positions();
            assert!(positions.contains(&a) && positions.contains(&b));
        }
    }

    #[test]
    fn zero_flip_angle_rejects_every_collapse() {
        let mut sphere = shapes::icosphere(2);
        let original = sphere.triangles.len();
        let options = SimplifyOptions::new(0.5).with_max_normal_flip_degrees(0.0);
        let report = sphere.simplify_with(&options).expect("valid factor");

        assert_eq!(report.collapses, 0);
        assert!(report.rejected > 0);
        assert_eq!(sphere.triangles.len(), original);
    }

    #[test]
    fn heap_pops_cheapest_first() {
        let mut heap = BinaryHeap::new();
        for (cost, a) in [(3.0, 0), (1.0, 1), (2.0, 2)] {
            heap.push(Candidate {
                cost,
                a,
                b: 9,
                target: [0.0; 3],
                versions: (0, 0),
            });
        }
        let order: Vec<usize> = std::iter::from_fn(|| heap.pop().map(|c| c.a)).collect();
        assert_eq!(order, vec![1, 2, 0]);
    }
}
