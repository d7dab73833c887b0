//! Mesh import from OBJ (`tobj`) and STL (`stl_io`) files.
//!
//! Loaders only check that the data is well formed. Degenerate triangles
//! are kept and left to the rasterizer to skip.

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use tracing::{debug, warn};

use crate::color::Color;
use crate::error::{Error, Result};
use crate::math::{Vec2, Vec3};
use crate::triangle::Triangle;
use crate::vertex::{normalize_or_zero, Vertex};

use super::Mesh;

/// Load a mesh, picking the format from the file extension.
pub fn load_mesh(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|s| s.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "obj" => load_obj(path),
        "stl" => load_stl(path),
        _ => Err(Error::UnsupportedFormat(ext)),
    }
}

/// Load every object of an OBJ file into one mesh. Faces are triangulated;
/// normals, texture coordinates and vertex colors are carried over when
/// the file provides them.
pub fn load_obj(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let options = tobj::LoadOptions {
        triangulate: true,
        single_index: true,
        ..Default::default()
    };
    let (models, _materials) = tobj::load_obj(path, &options).map_err(|e| Error::Load {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let mut triangles = Vec::new();
    for model in &models {
        let mesh = &model.mesh;
        let corner = |i: u32| -> Option<Vertex> {
            let i = i as usize;
            let position = vec3_at(&mesh.positions, i)?;
            let normal = vec3_at(&mesh.normals, i).map_or(Vec3::ZERO, normalize_or_zero);
            let texture = mesh
                .texcoords
                .get(2 * i..2 * i + 2)
                .map_or(Vec2::ZERO, |uv| Vec2::new(uv[0], uv[1]));
            let color = vec3_at(&mesh.vertex_color, i)
                .map_or(Color::WHITE, |c| Color::opaque(c.x, c.y, c.z));
            Some(Vertex {
                position,
                normal,
                color,
                texture,
                ..Vertex::default()
            })
        };

        for face in mesh.indices.chunks_exact(3) {
            let (Some(v1), Some(v2), Some(v3)) = (corner(face[0]), corner(face[1]), corner(face[2]))
            else {
                return Err(Error::Load {
                    path: path.to_path_buf(),
                    message: format!("face index out of range in object {:?}", model.name),
                });
            };
            triangles.push(Triangle::new(v1, v2, v3));
        }
    }

    finish(path, Mesh::from_triangles(triangles))
}

/// Load an ASCII or binary STL file.
pub fn load_stl(path: impl AsRef<Path>) -> Result<Mesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    let mesh = read_stl(&mut reader).map_err(|e| match e {
        Error::Load { message, .. } => Error::Load {
            path: path.to_path_buf(),
            message,
        },
        other => other,
    })?;
    finish(path, mesh)
}

/// Parse STL data from any seekable reader.
pub fn read_stl<R: Read + Seek>(reader: &mut R) -> Result<Mesh> {
    let stl = stl_io::read_stl(reader).map_err(|e| Error::Load {
        path: Default::default(),
        message: format!("STL parse error: {e}"),
    })?;

    let mut triangles = Vec::with_capacity(stl.faces.len());
    for face in &stl.faces {
        let [nx, ny, nz]: [f32; 3] = face.normal.into();
        let normal = normalize_or_zero(Vec3::new(nx, ny, nz));
        let mut corners = [Vertex::default(); 3];
        for (corner, &index) in corners.iter_mut().zip(&face.vertices) {
            let [x, y, z]: [f32; 3] = stl.vertices[index].into();
            *corner = Vertex {
                position: Vec3::new(x, y, z),
                normal,
                color: Color::WHITE,
                ..Vertex::default()
            };
        }
        let [v1, v2, v3] = corners;
        triangles.push(Triangle::new(v1, v2, v3));
    }
    Ok(Mesh::from_triangles(triangles))
}

fn vec3_at(data: &[f32], i: usize) -> Option<Vec3> {
    data.get(3 * i..3 * i + 3)
        .map(|v| Vec3::new(v[0], v[1], v[2]))
}

fn finish(path: &Path, mesh: Mesh) -> Result<Mesh> {
    if mesh.triangles.is_empty() {
        warn!(path = %path.display(), "mesh file contains no triangles");
    } else {
        debug!(path = %path.display(), triangles = mesh.triangles.len(), "mesh loaded");
    }
    Ok(mesh)
}
