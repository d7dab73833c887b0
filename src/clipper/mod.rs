//! Clipping against the canonical view volume.
//!
//! Clipping happens in homogeneous clip space (after the vertex shader,
//! before the perspective divide) using the Sutherland-Hodgman algorithm for
//! triangles and a parametric test for lines.

pub mod clip_space;

pub use clip_space::{clip_line, clip_triangle, ClipPlane, ClipSpaceClipper, ClipSpacePolygon};
