//! Frame buffer view for 2D pixel access.
//!
//! A [`FrameBuffer`] borrows a horizontal band of the context's color and
//! depth buffers. Bands handed to different workers are disjoint slices, so
//! two workers can never write the same pixel.

use crate::color::Color;

/// A view into a band of rows of the color and depth buffers.
///
/// Coordinates are absolute frame coordinates; only rows in
/// `row_start()..row_end()` are addressable.
///
/// # Depth Buffer
///
/// Stores screen-space depth in [0, 1]; smaller values are nearer to the
/// camera. Cleared to `f32::INFINITY`.
pub struct FrameBuffer<'a> {
    color_buffer: &'a mut [u8], // RGBA8, straight alpha
    depth_buffer: &'a mut [f32],
    width: u32,
    y0: u32,
    rows: u32,
}

impl<'a> FrameBuffer<'a> {
    /// Create a view over `rows = depth_buffer.len() / width` rows starting
    /// at frame row `y0`.
    pub fn new(color_buffer: &'a mut [u8], depth_buffer: &'a mut [f32], width: u32, y0: u32) -> Self {
        let rows = if width == 0 {
            0
        } else {
            (depth_buffer.len() / width as usize) as u32
        };
        debug_assert_eq!(
            color_buffer.len(),
            depth_buffer.len() * 4,
            "Color buffer size doesn't match depth buffer"
        );
        Self {
            color_buffer,
            depth_buffer,
            width,
            y0,
            rows,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    /// First frame row covered by this view.
    pub fn row_start(&self) -> u32 {
        self.y0
    }

    /// One past the last frame row covered by this view.
    pub fn row_end(&self) -> u32 {
        self.y0 + self.rows
    }

    #[inline]
    fn index(&self, x: u32, y: u32) -> Option<usize> {
        if x < self.width && y >= self.y0 && y < self.row_end() {
            Some(((y - self.y0) * self.width + x) as usize)
        } else {
            None
        }
    }

    /// Stored depth at (x, y), or None if outside the view.
    #[inline]
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        self.index(x, y).map(|i| self.depth_buffer[i])
    }

    #[inline]
    pub fn set_depth(&mut self, x: u32, y: u32, depth: f32) {
        if let Some(i) = self.index(x, y) {
            self.depth_buffer[i] = depth;
        }
    }

    /// Get the color at (x, y), or None if outside the view.
    #[inline]
    pub fn color(&self, x: u32, y: u32) -> Option<Color> {
        self.index(x, y).map(|i| {
            let p = &self.color_buffer[i * 4..i * 4 + 4];
            Color::from_rgba8(image::Rgba([p[0], p[1], p[2], p[3]]))
        })
    }

    /// Write a color, blending over the stored color when `blend` is set
    /// and the color is translucent.
    ///
    /// Blending uses straight alpha: `src * a + dst * (1 - a)` for color
    /// channels and `a + dst_a * (1 - a)` for alpha.
    #[inline]
    pub fn write_color(&mut self, x: u32, y: u32, color: Color, blend: bool) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let out = if blend && color.a < 1.0 {
            let p = &self.color_buffer[i * 4..i * 4 + 4];
            let dst = Color::from_rgba8(image::Rgba([p[0], p[1], p[2], p[3]]));
            let a = color.a.clamp(0.0, 1.0);
            let mut mixed = color * a + dst * (1.0 - a);
            mixed.a = a + dst.a * (1.0 - a);
            mixed
        } else {
            color
        };
        self.color_buffer[i * 4..i * 4 + 4].copy_from_slice(&out.to_rgba8().0);
    }
}
