//! Rasterization pipeline: frame buffer, rasterizer, shaders and the
//! rendering context that drives them.

pub mod context;
pub mod framebuffer;
pub mod options;
pub(crate) mod rasterizer;
pub mod shader;
pub mod stats;

pub use context::Context;
pub use framebuffer::FrameBuffer;
pub use options::{Cull, FrontFace, RenderOptions};
pub use shader::{PhongShader, Shader, SolidColorShader, TextureShader};
pub use stats::RenderStats;
