//! Error types for the rendering and mesh-processing entry points.
//!
//! Per-primitive geometric problems (degenerate or fully clipped triangles)
//! are not errors: they are counted in [`RenderStats`](crate::RenderStats)
//! and skipped.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring a render target, parsing input
/// or processing a mesh.
#[derive(Debug, Error)]
pub enum Error {
    /// Render target dimensions must both be non-zero.
    #[error("invalid render target dimensions {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Simplification factor must be finite and greater than zero.
    #[error("invalid simplification factor {0}: must be finite and > 0")]
    InvalidSimplifyFactor(f32),

    /// A color string could not be parsed.
    #[error("invalid color {0:?}")]
    InvalidColor(String),

    /// A mesh file could not be read or parsed.
    #[error("failed to load {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// The file extension is not one of the supported mesh formats.
    #[error("unsupported mesh format: {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using the crate [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
