//! A CPU software rasterizer with mesh post-processing.
//!
//! Triangles and lines are clipped in homogeneous clip space, projected,
//! and filled with perspective-correct attribute interpolation and a depth
//! test. Shading is pluggable through the [`Shader`] trait. Meshes can be
//! loaded from OBJ/STL, simplified by quadric edge collapse, smoothed, and
//! reduced to a view-dependent silhouette.
//!
//! Antialiasing is done by rendering at a multiple of the output size and
//! downsampling the image afterwards; the rasterizer itself does no
//! coverage blending.
//!
//! # Quick Start
//!
//! ```
//! use softraster::prelude::*;
//!
//! let mut ctx = Context::new(128, 128)?;
//! let eye = Vec3::new(3.0, 3.0, 3.0);
//! let matrix = Mat4::look_at(eye, Vec3::ZERO, Vec3::Z).perspective_by(40.0, 1.0, 0.1, 100.0);
//! ctx.set_shader(PhongShader::new(matrix, Vec3::new(-0.75, 1.0, 0.25), eye));
//!
//! let stats = ctx.draw_mesh(&shapes::cube());
//! assert!(stats.updated_pixels > 0);
//! let image = ctx.into_image();
//! # Ok::<(), softraster::Error>(())
//! ```

pub mod bounds;
pub mod clipper;
pub mod color;
pub mod error;
pub mod line;
pub mod math;
pub mod mesh;
pub mod render;
pub mod texture;
pub mod triangle;
pub mod vertex;

pub use bounds::BoundingBox;
pub use color::Color;
pub use error::{Error, Result};
pub use line::Line;
pub use mesh::{load_mesh, Mesh, SimplifyOptions, SimplifyReport};
pub use render::{
    Context, Cull, FrontFace, PhongShader, RenderOptions, RenderStats, Shader,
    SolidColorShader, TextureShader,
};
pub use texture::Texture;
pub use triangle::Triangle;
pub use vertex::Vertex;

/// Prelude module for convenient imports.
///
/// ```
/// use softraster::prelude::*;
/// ```
pub mod prelude {
    // Geometry
    pub use crate::bounds::BoundingBox;
    pub use crate::line::Line;
    pub use crate::mesh::{shapes, Mesh, SimplifyOptions};
    pub use crate::triangle::Triangle;
    pub use crate::vertex::Vertex;

    // Math
    pub use crate::color::Color;
    pub use crate::math::{Mat4, Vec2, Vec3, Vec4};

    // Rendering
    pub use crate::render::{
        Context, Cull, FrontFace, PhongShader, RenderOptions, RenderStats, Shader,
        SolidColorShader, TextureShader,
    };
    pub use crate::texture::Texture;
}
