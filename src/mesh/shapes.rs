//! Procedural mesh generators.
//!
//! All generators produce closed, counter-clockwise (outward facing)
//! triangles. Shared corners are computed once and reused so that welding
//! by position recovers the exact topology.

use std::collections::{HashMap, HashSet};
use std::f32::consts::{PI, TAU};

use crate::color::Color;
use crate::math::{Vec2, Vec3};
use crate::triangle::Triangle;
use crate::vertex::Vertex;

use super::Mesh;

fn textured(position: Vec3, uv: Vec2) -> Vertex {
    Vertex {
        texture: uv,
        ..Vertex::at(position)
    }
}

/// Two triangles for the quad `p1 p2 p3 p4` (counter-clockwise).
fn quad(p1: Vec3, p2: Vec3, p3: Vec3, p4: Vec3) -> [Triangle; 2] {
    let (t1, t2, t3, t4) = (
        Vec2::new(0.0, 0.0),
        Vec2::new(1.0, 0.0),
        Vec2::new(1.0, 1.0),
        Vec2::new(0.0, 1.0),
    );
    [
        Triangle::new(textured(p1, t1), textured(p2, t2), textured(p3, t3)),
        Triangle::new(textured(p1, t1), textured(p3, t3), textured(p4, t4)),
    ]
}

/// Axis pairs `(u, v)` with `u x v` pointing along each face normal.
const CUBE_FACES: [(Vec3, Vec3, Vec3); 6] = [
    (Vec3::X, Vec3::Y, Vec3::Z),
    (Vec3::new(-1.0, 0.0, 0.0), Vec3::Z, Vec3::Y),
    (Vec3::Y, Vec3::Z, Vec3::X),
    (Vec3::new(0.0, -1.0, 0.0), Vec3::X, Vec3::Z),
    (Vec3::Z, Vec3::X, Vec3::Y),
    (Vec3::new(0.0, 0.0, -1.0), Vec3::Y, Vec3::X),
];

/// One face of an axis-aligned unit cube centered on `center`.
fn cube_face(center: Vec3, normal: Vec3, u: Vec3, v: Vec3) -> [Triangle; 2] {
    let c = center + normal * 0.5;
    let (u, v) = (u * 0.5, v * 0.5);
    quad(c - u - v, c + u - v, c + u + v, c - u + v)
}

/// Unit cube spanning [-0.5, 0.5] on every axis, 12 triangles.
pub fn cube() -> Mesh {
    let triangles = CUBE_FACES
        .iter()
        .flat_map(|&(n, u, v)| cube_face(Vec3::ZERO, n, u, v))
        .collect();
    Mesh::from_triangles(triangles)
}

/// Unit square in the XY plane spanning [-0.5, 0.5], facing +Z.
pub fn plane() -> Mesh {
    let (n, u, v) = CUBE_FACES[4];
    let triangles = cube_face(-n * 0.5, n, u, v).to_vec();
    Mesh::from_triangles(triangles)
}

/// UV sphere of radius 1 with `detail` latitude bands (at least 2) and
/// twice as many longitude segments: `4 * detail * (detail - 1)` triangles.
///
/// Vertex normals point radially, so the sphere renders smooth.
pub fn sphere(detail: u32) -> Mesh {
    let lat = detail.max(2) as usize;
    let lon = 2 * lat;
    let ring = |i: usize, j: usize| {
        let theta = PI * i as f32 / lat as f32;
        let phi = TAU * (j % lon) as f32 / lon as f32;
        Vec3::new(theta.sin() * phi.cos(), theta.sin() * phi.sin(), theta.cos())
    };
    let vertex = |i: usize, j: usize| {
        let p = match i {
            0 => Vec3::Z,
            i if i == lat => -Vec3::Z,
            _ => ring(i, j),
        };
        let uv = Vec2::new(j as f32 / lon as f32, 1.0 - i as f32 / lat as f32);
        Vertex {
            normal: p,
            ..textured(p, uv)
        }
    };

    let mut triangles = Vec::with_capacity(2 * lon * (lat - 1));
    for i in 0..lat {
        for j in 0..lon {
            let (a, b) = (vertex(i, j), vertex(i + 1, j));
            let (c, d) = (vertex(i + 1, j + 1), vertex(i, j + 1));
            if i == 0 {
                triangles.push(Triangle::new(a, b, c));
            } else if i + 1 == lat {
                triangles.push(Triangle::new(a, b, d));
            } else {
                triangles.push(Triangle::new(a, b, c));
                triangles.push(Triangle::new(a, c, d));
            }
        }
    }
    Mesh::from_triangles(triangles)
}

/// Geodesic sphere of radius 1: an icosahedron subdivided `detail` times,
/// `20 * 4^detail` triangles.
pub fn icosphere(detail: u32) -> Mesh {
    let t = (1.0 + 5f32.sqrt()) / 2.0;
    let mut positions: Vec<Vec3> = [
        (-1.0, t, 0.0),
        (1.0, t, 0.0),
        (-1.0, -t, 0.0),
        (1.0, -t, 0.0),
        (0.0, -1.0, t),
        (0.0, 1.0, t),
        (0.0, -1.0, -t),
        (0.0, 1.0, -t),
        (t, 0.0, -1.0),
        (t, 0.0, 1.0),
        (-t, 0.0, -1.0),
        (-t, 0.0, 1.0),
    ]
    .into_iter()
    .map(|(x, y, z)| Vec3::new(x, y, z).normalize())
    .collect();

    let mut faces: Vec<[usize; 3]> = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    for _ in 0..detail {
        let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
        let mut midpoint = |a: usize, b: usize, positions: &mut Vec<Vec3>| {
            let key = if a < b { (a, b) } else { (b, a) };
            *midpoints.entry(key).or_insert_with(|| {
                positions.push(((positions[a] + positions[b]) * 0.5).normalize());
                positions.len() - 1
            })
        };
        let mut next = Vec::with_capacity(faces.len() * 4);
        for [a, b, c] in faces {
            let ab = midpoint(a, b, &mut positions);
            let bc = midpoint(b, c, &mut positions);
            let ca = midpoint(c, a, &mut positions);
            next.extend([[a, ab, ca], [b, bc, ab], [c, ca, bc], [ab, bc, ca]]);
        }
        faces = next;
    }

    let vertex = |i: usize| Vertex {
        normal: positions[i],
        ..Vertex::at(positions[i])
    };
    let triangles = faces
        .iter()
        .map(|&[a, b, c]| Triangle::new(vertex(a), vertex(b), vertex(c)))
        .collect();
    Mesh::from_triangles(triangles)
}

/// Points on the unit circle every `step` degrees (rounded to divide 360).
fn circle(step: u32, z: f32) -> Vec<Vec3> {
    let n = 360u32.div_ceil(step.clamp(1, 120)) as usize;
    (0..n)
        .map(|k| {
            let a = TAU * k as f32 / n as f32;
            Vec3::new(a.cos(), a.sin(), z)
        })
        .collect()
}

/// Cylinder of radius 1 along Z from -1 to 1, one side quad every `step`
/// degrees, optionally closed with end caps.
pub fn cylinder(step: u32, capped: bool) -> Mesh {
    let bottom = circle(step, -1.0);
    let top = circle(step, 1.0);
    let n = bottom.len();
    let mut triangles = Vec::with_capacity(n * 4);
    for k in 0..n {
        let l = (k + 1) % n;
        triangles.extend(quad(bottom[k], bottom[l], top[l], top[k]));
        if capped {
            triangles.push(Triangle::from_positions(Vec3::Z, top[k], top[l]));
            triangles.push(Triangle::from_positions(-Vec3::Z, bottom[l], bottom[k]));
        }
    }
    Mesh::from_triangles(triangles)
}

/// Cone of radius 1 with its base at z = -1 and apex at z = 1, one side
/// triangle every `step` degrees, optionally closed at the base.
pub fn cone(step: u32, capped: bool) -> Mesh {
    let base = circle(step, -1.0);
    let n = base.len();
    let mut triangles = Vec::with_capacity(n * 2);
    for k in 0..n {
        let l = (k + 1) % n;
        triangles.push(Triangle::from_positions(base[k], base[l], Vec3::Z));
        if capped {
            triangles.push(Triangle::from_positions(-Vec3::Z, base[l], base[k]));
        }
    }
    Mesh::from_triangles(triangles)
}

/// A colored unit cell of a voxel grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Voxel {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub color: Color,
}

impl Voxel {
    pub fn new(x: i32, y: i32, z: i32, color: Color) -> Self {
        Self { x, y, z, color }
    }
}

/// One unit cube per voxel, centered on its integer coordinates. Faces
/// between two occupied cells are left out.
pub fn voxels(voxels: &[Voxel]) -> Mesh {
    let occupied: HashSet<(i32, i32, i32)> = voxels.iter().map(|v| (v.x, v.y, v.z)).collect();
    let mut triangles = Vec::new();
    for v in voxels {
        let center = Vec3::new(v.x as f32, v.y as f32, v.z as f32);
        for &(n, u, w) in &CUBE_FACES {
            let neighbour = (v.x + n.x as i32, v.y + n.y as i32, v.z + n.z as i32);
            if occupied.contains(&neighbour) {
                continue;
            }
            for mut t in cube_face(center, n, u, w) {
                t.set_color(v.color);
                triangles.push(t);
            }
        }
    }
    Mesh::from_triangles(triangles)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::edges::EdgeMap;

    fn is_closed(mesh: &Mesh) -> bool {
        EdgeMap::new(&mesh.triangles)
            .edges
            .iter()
            .all(|e| e.triangles.len() == 2)
    }

    fn faces_outward(mesh: &Mesh) -> bool {
        let center = mesh.bounding_box().center();
        mesh.triangles.iter().all(|t| {
            let centroid = (t.v1.position + t.v2.position + t.v3.position) / 3.0;
            t.normal().dot(centroid - center) > 0.0
        })
    }

    #[test]
    fn cube_and_sphere_are_closed_and_outward() {
        for mesh in [cube(), sphere(8), icosphere(2), cylinder(30, true), cone(30, true)] {
            assert!(is_closed(&mesh));
            assert!(faces_outward(&mesh));
        }
    }

    #[test]
    fn triangle_counts() {
        assert_eq!(cube().triangles.len(), 12);
        assert_eq!(sphere(16).triangles.len(), 960);
        assert_eq!(icosphere(1).triangles.len(), 80);
        assert_eq!(cylinder(10, false).triangles.len(), 72);
        assert_eq!(cone(10, true).triangles.len(), 72);
    }

    #[test]
    fn voxels_cull_shared_faces() {
        let c = Color::WHITE;
        let mesh = voxels(&[Voxel::new(0, 0, 0, c), Voxel::new(1, 0, 0, c)]);
        assert_eq!(mesh.triangles.len(), 20);
        assert!(is_closed(&mesh));
    }
}
