use std::path::Path;

use image::RgbaImage;

use crate::color::Color;
use crate::error::Result;

/// Represents a 2D texture for texture mapping.
#[derive(Clone, Debug)]
pub struct Texture {
    data: Vec<Color>, // Row-major texels, top row first.
    width: u32,
    height: u32,
}

impl Texture {
    /// Load a texture from an image file (PNG, JPG, etc.)
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let img = image::open(path)?.to_rgba8();
        Ok(Self::from_image(&img))
    }

    pub fn from_image(img: &RgbaImage) -> Self {
        let (width, height) = img.dimensions();
        let data = img.pixels().map(|p| Color::from_rgba8(*p)).collect();
        Self {
            data,
            width,
            height,
        }
    }

    /// Single-texel texture, handy as a constant-color placeholder.
    pub fn solid(color: Color) -> Self {
        Self {
            data: vec![color],
            width: 1,
            height: 1,
        }
    }

    /// Clamp UVs to [0, 1] and flip V so that v = 0 is the bottom row.
    #[inline]
    fn clamp(u: f32, v: f32) -> (f32, f32) {
        (u.clamp(0.0, 1.0), (1.0 - v).clamp(0.0, 1.0))
    }

    #[inline]
    fn texel(&self, x: u32, y: u32) -> Color {
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        self.data[(y * self.width + x) as usize]
    }

    /// Sample the texture at UV coordinates using nearest-neighbor filtering.
    ///
    /// # UV Coordinate Convention
    /// - UV coordinates are in [0,1] range
    /// - (0,0) = bottom-left in OBJ convention, but textures are stored top-left origin
    /// - V is flipped to correct for this: v_corrected = 1.0 - v
    ///
    /// # Boundary
    /// UVs outside [0,1] are clamped, so u = 1 and v = 1 hit the last
    /// column and the top row rather than wrapping around.
    #[inline]
    pub fn sample(&self, u: f32, v: f32) -> Color {
        if self.data.is_empty() {
            return Color::TRANSPARENT;
        }
        let (u, v) = Self::clamp(u, v);
        let x = (u * self.width as f32) as u32;
        let y = (v * self.height as f32) as u32;
        self.texel(x, y)
    }

    /// Sample with bilinear filtering between the four nearest texels.
    ///
    /// Uses the same clamping and V flip as [`Texture::sample`]; neighbours
    /// past the last row or column are clamped to the edge.
    pub fn bilinear_sample(&self, u: f32, v: f32) -> Color {
        if self.data.is_empty() {
            return Color::TRANSPARENT;
        }
        let (u, v) = Self::clamp(u, v);
        let x = u * (self.width - 1) as f32;
        let y = v * (self.height - 1) as f32;
        let (x0, y0) = (x.floor() as u32, y.floor() as u32);
        let (fx, fy) = (x - x0 as f32, y - y0 as f32);

        let top = self.texel(x0, y0).lerp(self.texel(x0 + 1, y0), fx);
        let bottom = self.texel(x0, y0 + 1).lerp(self.texel(x0 + 1, y0 + 1), fx);
        top.lerp(bottom, fy)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}
