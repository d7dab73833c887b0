//! Vertex normal smoothing.
//!
//! Corners that share a position (bit-identical after welding) receive the
//! average of the face normals around that position. The thresholded
//! variant only averages faces whose normals are within an angle of the
//! corner's own face, so hard creases stay hard.

use crate::math::Vec3;
use crate::vertex::normalize_or_zero;

use super::edges::Welded;
use super::Mesh;

impl Mesh {
    /// Replace every vertex normal with the average of the normals of all
    /// triangles sharing that vertex position.
    pub fn smooth_normals(&mut self) {
        let welded = Welded::new(&self.triangles);
        let face_normals = self.face_normals();

        let mut sums = vec![Vec3::ZERO; welded.positions.len()];
        for (face, normal) in welded.faces.iter().zip(&face_normals) {
            if let Some(n) = normal {
                for &v in face {
                    sums[v] += *n;
                }
            }
        }

        for (t, face) in self.triangles.iter_mut().zip(&welded.faces) {
            for (vertex, &id) in [&mut t.v1, &mut t.v2, &mut t.v3].into_iter().zip(face) {
                let n = normalize_or_zero(sums[id]);
                if n != Vec3::ZERO {
                    vertex.normal = n;
                }
            }
        }
    }

    /// Like [`Mesh::smooth_normals`], but each corner only averages faces
    /// whose normal is within `radians` of its own triangle's normal.
    pub fn smooth_normals_threshold(&mut self, radians: f32) {
        let welded = Welded::new(&self.triangles);
        let face_normals = self.face_normals();
        let incident = welded.vertex_faces();

        for (f, t) in self.triangles.iter_mut().enumerate() {
            let Some(own) = face_normals[f] else {
                continue;
            };
            let face = welded.faces[f];
            for (vertex, id) in [&mut t.v1, &mut t.v2, &mut t.v3].into_iter().zip(face) {
                let sum = incident[id]
                    .iter()
                    .filter_map(|&g| face_normals[g])
                    .filter(|n| own.dot(*n).clamp(-1.0, 1.0).acos() <= radians)
                    .fold(Vec3::ZERO, |acc, n| acc + n);
                let n = normalize_or_zero(sum);
                if n != Vec3::ZERO {
                    vertex.normal = n;
                }
            }
        }
    }

    /// Unit face normals, None for degenerate triangles.
    fn face_normals(&self) -> Vec<Option<Vec3>> {
        self.triangles
            .iter()
            .map(|t| Some(t.normal()).filter(|n| !n.is_degenerate()))
            .collect()
    }
}
