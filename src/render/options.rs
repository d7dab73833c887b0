//! Draw configuration for a [`Context`](super::Context).

use crate::color::Color;

/// Which faces to discard before rasterization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Cull {
    #[default]
    None,
    Front,
    Back,
}

/// Winding order, as seen by the camera, that marks a front face.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FrontFace {
    #[default]
    Ccw,
    Cw,
}

/// Per-draw configuration.
///
/// Fields are public; the `with_*` setters allow building a configuration
/// in one expression:
///
/// ```
/// use softraster::{Color, RenderOptions};
///
/// let options = RenderOptions::default()
///     .with_clear_color(Color::WHITE)
///     .with_line_width(3.0)
///     .with_depth_bias(-1e-5);
/// assert!(options.read_depth);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderOptions {
    /// Color used by [`Context::clear_color_buffer`](super::Context::clear_color_buffer).
    pub clear_color: Color,
    /// Draw triangle edges as lines instead of filling.
    pub wireframe: bool,
    /// Line width in pixels.
    pub line_width: f32,
    /// Added to the interpolated depth before the depth comparison.
    /// Negative values pull geometry toward the camera.
    pub depth_bias: f32,
    pub read_depth: bool,
    pub write_depth: bool,
    pub write_color: bool,
    /// Blend translucent fragments over the stored color.
    pub alpha_blend: bool,
    pub cull: Cull,
    pub front_face: FrontFace,
    /// Height in rows of the bands rendered in parallel by the batch draw
    /// calls.
    pub tile_rows: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            wireframe: false,
            line_width: 2.0,
            depth_bias: 0.0,
            read_depth: true,
            write_depth: true,
            write_color: true,
            alpha_blend: true,
            cull: Cull::None,
            front_face: FrontFace::Ccw,
            tile_rows: 32,
        }
    }
}

impl RenderOptions {
    pub fn with_clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_wireframe(mut self, wireframe: bool) -> Self {
        self.wireframe = wireframe;
        self
    }

    pub fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }

    pub fn with_depth_bias(mut self, bias: f32) -> Self {
        self.depth_bias = bias;
        self
    }

    /// Enable or disable both reading and writing the depth buffer.
    pub fn with_depth_test(mut self, enabled: bool) -> Self {
        self.read_depth = enabled;
        self.write_depth = enabled;
        self
    }

    pub fn with_write_color(mut self, enabled: bool) -> Self {
        self.write_color = enabled;
        self
    }

    pub fn with_alpha_blend(mut self, enabled: bool) -> Self {
        self.alpha_blend = enabled;
        self
    }

    pub fn with_cull(mut self, cull: Cull) -> Self {
        self.cull = cull;
        self
    }

    pub fn with_front_face(mut self, front_face: FrontFace) -> Self {
        self.front_face = front_face;
        self
    }

    pub fn with_tile_rows(mut self, rows: u32) -> Self {
        self.tile_rows = rows;
        self
    }

    /// Whether a triangle with the given screen winding is discarded.
    pub(crate) fn culls(&self, ccw: bool) -> bool {
        let front = ccw == (self.front_face == FrontFace::Ccw);
        match self.cull {
            Cull::None => false,
            Cull::Front => front,
            Cull::Back => !front,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn culling_respects_front_face() {
        let back = RenderOptions::default().with_cull(Cull::Back);
        assert!(!back.culls(true));
        assert!(back.culls(false));
        let cw = back.with_front_face(FrontFace::Cw);
        assert!(cw.culls(true));
        assert!(!RenderOptions::default().culls(false));
    }
}
