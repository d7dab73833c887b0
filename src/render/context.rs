//! Rendering context.
//!
//! [`Context`] owns the color and depth buffers of one render target plus
//! the current shader and draw configuration. Draw calls run the whole
//! pipeline:
//!
//! 1. the shader's vertex stage maps each vertex to clip space
//! 2. primitives crossing the view volume are clipped
//! 3. the perspective divide and viewport map clip space to pixels
//! 4. the rasterizer fills pixels with depth testing and fragment shading
//!
//! The batch calls ([`Context::draw_triangles`], [`Context::draw_lines`],
//! [`Context::draw_mesh`]) split the frame into horizontal bands of
//! [`RenderOptions::tile_rows`] rows and render the bands in parallel.
//! Every band walks the full primitive list in submission order, clamped to
//! its own rows, so the output is identical to the sequential path.

use image::{GrayImage, Luma, RgbaImage};
use rayon::prelude::*;
use tracing::{debug, trace};

use super::framebuffer::FrameBuffer;
use super::options::RenderOptions;
use super::rasterizer::{rasterize_triangle, ScreenTriangle, ScreenVertex, Setup};
use super::shader::{Shader, SolidColorShader};
use super::stats::RenderStats;
use crate::clipper::{clip_line, clip_triangle};
use crate::color::Color;
use crate::error::{Error, Result};
use crate::line::Line;
use crate::math::{Mat4, Vec3};
use crate::mesh::Mesh;
use crate::triangle::Triangle;
use crate::vertex::Vertex;

/// A render target with its shader and draw configuration.
pub struct Context {
    width: u32,
    height: u32,
    color_buffer: RgbaImage,
    depth_buffer: Vec<f32>,
    screen_matrix: Mat4,
    shader: Box<dyn Shader>,
    pub options: RenderOptions,
}

impl Context {
    /// Create a context with cleared buffers and a white solid-color shader
    /// that passes positions through unchanged.
    ///
    /// # Errors
    /// [`Error::InvalidDimensions`] if either dimension is zero.
    pub fn new(width: u32, height: u32) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(Error::InvalidDimensions { width, height });
        }
        let options = RenderOptions::default();
        let clear = options.clear_color.to_rgba8();
        Ok(Self {
            width,
            height,
            color_buffer: RgbaImage::from_pixel(width, height, clear),
            depth_buffer: vec![f32::INFINITY; width as usize * height as usize],
            screen_matrix: Mat4::screen(width, height),
            shader: Box::new(SolidColorShader::new(Mat4::identity(), Color::WHITE)),
            options,
        })
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_shader<S: Shader + 'static>(&mut self, shader: S) {
        self.shader = Box::new(shader);
    }

    pub fn shader(&self) -> &dyn Shader {
        self.shader.as_ref()
    }

    /// Fill the color buffer with `options.clear_color`.
    pub fn clear_color_buffer(&mut self) {
        self.clear_color_buffer_with(self.options.clear_color);
    }

    pub fn clear_color_buffer_with(&mut self, color: Color) {
        let pixel = color.to_rgba8();
        for p in self.color_buffer.pixels_mut() {
            *p = pixel;
        }
    }

    /// Reset every depth to `f32::INFINITY` (farther than anything).
    pub fn clear_depth_buffer(&mut self) {
        self.clear_depth_buffer_with(f32::INFINITY);
    }

    pub fn clear_depth_buffer_with(&mut self, value: f32) {
        self.depth_buffer.fill(value);
    }

    /// Draw one triangle on the calling thread.
    pub fn draw_triangle(&mut self, triangle: &Triangle) -> RenderStats {
        let mut prims = Vec::new();
        let mut stats = prepare_triangle(
            self.shader.as_ref(),
            &self.screen_matrix,
            &self.options,
            triangle,
            &mut prims,
        );
        stats += self.rasterize(&prims, false);
        debug!(
            covered = stats.total_pixels,
            updated = stats.updated_pixels,
            "draw_triangle"
        );
        stats
    }

    /// Draw a batch of triangles, rendering bands of the frame in parallel.
    pub fn draw_triangles(&mut self, triangles: &[Triangle]) -> RenderStats {
        let shader = self.shader.as_ref();
        let screen = &self.screen_matrix;
        let options = &self.options;
        let prepared: Vec<(Vec<ScreenTriangle>, RenderStats)> = triangles
            .par_iter()
            .map(|t| {
                let mut prims = Vec::new();
                let stats = prepare_triangle(shader, screen, options, t, &mut prims);
                (prims, stats)
            })
            .collect();

        let (prims, mut stats) = flatten(prepared);
        stats += self.rasterize(&prims, true);
        debug!(
            triangles = stats.triangles,
            clipped = stats.clipped,
            skipped = stats.skipped,
            covered = stats.total_pixels,
            updated = stats.updated_pixels,
            "draw_triangles"
        );
        stats
    }

    /// Draw one line as a quad of `options.line_width` pixels.
    pub fn draw_line(&mut self, line: &Line) -> RenderStats {
        let mut prims = Vec::new();
        let mut stats = prepare_line(
            self.shader.as_ref(),
            &self.screen_matrix,
            &self.options,
            line,
            &mut prims,
        );
        stats += self.rasterize(&prims, false);
        debug!(
            covered = stats.total_pixels,
            updated = stats.updated_pixels,
            "draw_line"
        );
        stats
    }

    /// Draw a batch of lines, rendering bands of the frame in parallel.
    pub fn draw_lines(&mut self, lines: &[Line]) -> RenderStats {
        let shader = self.shader.as_ref();
        let screen = &self.screen_matrix;
        let options = &self.options;
        let prepared: Vec<(Vec<ScreenTriangle>, RenderStats)> = lines
            .par_iter()
            .map(|l| {
                let mut prims = Vec::new();
                let stats = prepare_line(shader, screen, options, l, &mut prims);
                (prims, stats)
            })
            .collect();

        let (prims, mut stats) = flatten(prepared);
        stats += self.rasterize(&prims, true);
        debug!(
            lines = stats.triangles,
            clipped = stats.clipped,
            covered = stats.total_pixels,
            updated = stats.updated_pixels,
            "draw_lines"
        );
        stats
    }

    /// Draw the mesh triangles, then its lines.
    pub fn draw_mesh(&mut self, mesh: &Mesh) -> RenderStats {
        let mut stats = self.draw_triangles(&mesh.triangles);
        if !mesh.lines.is_empty() {
            stats += self.draw_lines(&mesh.lines);
        }
        stats
    }

    /// Rasterize prepared triangles, in bands of `tile_rows` rows when
    /// `parallel`, otherwise as a single band.
    fn rasterize(&mut self, prims: &[ScreenTriangle], parallel: bool) -> RenderStats {
        if prims.is_empty() {
            return RenderStats::default();
        }
        let width = self.width;
        let band_rows = if parallel {
            self.options.tile_rows.clamp(1, self.height)
        } else {
            self.height
        } as usize;
        let band_pixels = band_rows * width as usize;

        let shader = self.shader.as_ref();
        let options = &self.options;
        let color: &mut [u8] = &mut self.color_buffer;
        let depth = self.depth_buffer.as_mut_slice();

        let render_band = |(i, (color, depth)): (usize, (&mut [u8], &mut [f32]))| {
            let mut buffer = FrameBuffer::new(color, depth, width, (i * band_rows) as u32);
            prims
                .iter()
                .map(|t| rasterize_triangle(t, &mut buffer, shader, options))
                .sum::<RenderStats>()
        };

        if parallel {
            color
                .par_chunks_mut(band_pixels * 4)
                .zip(depth.par_chunks_mut(band_pixels))
                .enumerate()
                .map(render_band)
                .sum()
        } else {
            color
                .chunks_mut(band_pixels * 4)
                .zip(depth.chunks_mut(band_pixels))
                .enumerate()
                .map(render_band)
                .sum()
        }
    }

    /// The color buffer, 8-bit straight alpha.
    pub fn image(&self) -> &RgbaImage {
        &self.color_buffer
    }

    pub fn into_image(self) -> RgbaImage {
        self.color_buffer
    }

    /// Stored depth at (x, y), or None outside the buffer.
    pub fn depth(&self, x: u32, y: u32) -> Option<f32> {
        if x < self.width && y < self.height {
            Some(self.depth_buffer[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Row-major depth values, `f32::INFINITY` where nothing was drawn.
    pub fn depth_buffer(&self) -> &[f32] {
        &self.depth_buffer
    }

    /// Depth buffer as a grayscale image: the nearest drawn depth is black,
    /// the farthest white; pixels never drawn are white.
    pub fn depth_image(&self) -> GrayImage {
        let (lo, hi) = self
            .depth_buffer
            .iter()
            .filter(|d| d.is_finite())
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &d| {
                (lo.min(d), hi.max(d))
            });
        let range = hi - lo;
        GrayImage::from_fn(self.width, self.height, |x, y| {
            let d = self.depth_buffer[(y * self.width + x) as usize];
            let t = if !d.is_finite() {
                1.0
            } else if range > 0.0 {
                (d - lo) / range
            } else {
                0.0
            };
            Luma([(t * 255.0).round() as u8])
        })
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn flatten(prepared: Vec<(Vec<ScreenTriangle>, RenderStats)>) -> (Vec<ScreenTriangle>, RenderStats) {
    let mut stats = RenderStats::default();
    let mut prims = Vec::with_capacity(prepared.iter().map(|(p, _)| p.len()).sum());
    for (p, s) in prepared {
        prims.extend(p);
        stats += s;
    }
    (prims, stats)
}

fn shade_vertex(shader: &dyn Shader, v: &Vertex) -> Vertex {
    Vertex {
        output: shader.vertex(v),
        ..*v
    }
}

/// Vertex stage, clipping and screen setup for one triangle. Screen
/// triangles are appended to `out`; the returned stats count the triangle
/// and whether it was clipped away or skipped.
fn prepare_triangle(
    shader: &dyn Shader,
    screen: &Mat4,
    options: &RenderOptions,
    triangle: &Triangle,
    out: &mut Vec<ScreenTriangle>,
) -> RenderStats {
    let mut stats = RenderStats {
        triangles: 1,
        ..Default::default()
    };

    if options.wireframe {
        let Triangle { v1, v2, v3 } = triangle;
        let before = out.len();
        let mut clipped_edges = 0;
        for (a, b) in [(v1, v2), (v2, v3), (v3, v1)] {
            let edge = prepare_line(shader, screen, options, &Line::new(*a, *b), out);
            clipped_edges += edge.clipped;
        }
        // the triangle counts once, and only when no edge was drawn
        if out.len() == before {
            if clipped_edges == 3 {
                stats.clipped += 1;
            } else {
                stats.skipped += 1;
            }
        }
        return stats;
    }

    let v1 = shade_vertex(shader, &triangle.v1);
    let v2 = shade_vertex(shader, &triangle.v2);
    let v3 = shade_vertex(shader, &triangle.v3);
    if v1.output.is_degenerate() || v2.output.is_degenerate() || v3.output.is_degenerate() {
        trace!("skipping triangle with non-finite clip coordinates");
        stats.skipped += 1;
        return stats;
    }

    let pieces = clip_triangle(&v1, &v2, &v3);
    if pieces.is_empty() {
        stats.clipped += 1;
        return stats;
    }

    let before = out.len();
    for [a, b, c] in &pieces {
        let projected = (
            ScreenVertex::project(a, screen),
            ScreenVertex::project(b, screen),
            ScreenVertex::project(c, screen),
        );
        let (Some(a), Some(b), Some(c)) = projected else {
            continue;
        };
        match ScreenTriangle::new(a, b, c) {
            Setup::Ready(t) if !options.culls(t.ccw) => out.push(t),
            _ => {}
        }
    }
    if out.len() == before {
        trace!("triangle culled or degenerate after projection");
        stats.skipped += 1;
    }
    stats
}

/// Vertex stage, clipping and quad expansion for one line.
fn prepare_line(
    shader: &dyn Shader,
    screen: &Mat4,
    options: &RenderOptions,
    line: &Line,
    out: &mut Vec<ScreenTriangle>,
) -> RenderStats {
    let mut stats = RenderStats {
        triangles: 1,
        ..Default::default()
    };

    let v1 = shade_vertex(shader, &line.v1);
    let v2 = shade_vertex(shader, &line.v2);
    if v1.output.is_degenerate() || v2.output.is_degenerate() {
        trace!("skipping line with non-finite clip coordinates");
        stats.skipped += 1;
        return stats;
    }

    let Some((v1, v2)) = clip_line(&v1, &v2) else {
        stats.clipped += 1;
        return stats;
    };
    let (Some(s1), Some(s2)) = (
        ScreenVertex::project(&v1, screen),
        ScreenVertex::project(&v2, screen),
    ) else {
        stats.skipped += 1;
        return stats;
    };

    let dx = s2.position.x - s1.position.x;
    let dy = s2.position.y - s1.position.y;
    let length = (dx * dx + dy * dy).sqrt();
    if length == 0.0 {
        stats.skipped += 1;
        return stats;
    }
    // perpendicular in screen space, half the line width long
    let half = options.line_width / 2.0 / length;
    let offset = Vec3::new(-dy * half, dx * half, 0.0);
    let shifted = |s: &ScreenVertex, d: Vec3| ScreenVertex {
        position: s.position + d,
        ..*s
    };
    let a1 = shifted(&s1, offset);
    let b1 = shifted(&s1, -offset);
    let a2 = shifted(&s2, offset);
    let b2 = shifted(&s2, -offset);

    let before = out.len();
    for setup in [ScreenTriangle::new(a1, b1, b2), ScreenTriangle::new(a1, b2, a2)] {
        if let Setup::Ready(t) = setup {
            out.push(t);
        }
    }
    if out.len() == before {
        stats.skipped += 1;
    }
    stats
}
