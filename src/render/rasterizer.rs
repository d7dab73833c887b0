//! Edge function-based triangle rasterization.
//!
//! The rasterizer iterates over the pixels of a triangle's bounding box and
//! tests each pixel center against three edge equations.
//!
//! # Edge Function
//!
//! For an edge from point A to point B, the edge function at point P is:
//!
//! ```text
//! E(P) = (P.x - A.x) * (B.y - A.y) - (P.y - A.y) * (B.x - A.x)
//! ```
//!
//! Triangles are reordered so that `E(v0, v1, v2) > 0`; a pixel is then
//! inside when all three edge functions are positive. The edge function of
//! the edge opposite vertex i, divided by the total area, is the barycentric
//! weight of vertex i.
//!
//! # Shared Edges
//!
//! Each edge function is evaluated with its endpoints in a canonical
//! (lexicographic) order and negated when the triangle walks the edge the
//! other way. Two triangles sharing an edge therefore compute exactly
//! opposite values at every pixel, and a pixel center lying exactly on the
//! edge is given to one triangle by the top-left rule: with the orientation
//! above, an edge owns its zero-valued pixels when it goes down the screen,
//! or is horizontal and goes left.
//!
//! # Perspective Correction
//!
//! Screen-space weights `b_i` are not linear in world space. Every vertex
//! attribute is interpolated with `b_i / w_i`, renormalized to sum to one.
//! Depth is the perspective-correct `z_clip / w_clip`, which reduces to the
//! plain screen-space blend of the per-vertex NDC depths.
//!
//! # References
//!
//! - Juan Pineda, "A Parallel Algorithm for Polygon Rasterization" (1988)
//! - Scratchapixel: <https://www.scratchapixel.com/lessons/3d-basic-rendering/rasterization-practical-implementation>

use super::framebuffer::FrameBuffer;
use super::options::RenderOptions;
use super::shader::Shader;
use super::stats::RenderStats;
use crate::math::{Mat4, Vec3};
use crate::vertex::Vertex;

/// A clipped vertex mapped to pixel coordinates.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScreenVertex {
    /// x, y in pixels (y down), z depth in [0, 1].
    pub position: Vec3,
    /// 1 / clip-space w.
    pub inv_w: f32,
    /// Attributes handed to the fragment stage.
    pub vertex: Vertex,
}

impl ScreenVertex {
    /// Perspective divide and viewport mapping. None for non-finite input.
    pub fn project(v: &Vertex, screen: &Mat4) -> Option<Self> {
        let w = v.output.w;
        let ndc = v.output.perspective_divide();
        let position = screen.mul_position(ndc);
        let inv_w = 1.0 / w;
        if position.is_degenerate() || !inv_w.is_finite() {
            return None;
        }
        Some(Self {
            position,
            inv_w,
            vertex: *v,
        })
    }
}

/// Result of setting up a screen triangle.
pub(crate) enum Setup {
    Ready(ScreenTriangle),
    /// Zero screen area; contributes no pixels.
    Degenerate,
}

/// A triangle ready for rasterization, with positive edge-function area.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ScreenTriangle {
    pub v: [ScreenVertex; 3],
    /// True when the submitted order was counter-clockwise in NDC (y up).
    pub ccw: bool,
    area: f32,
}

impl ScreenTriangle {
    pub fn new(a: ScreenVertex, b: ScreenVertex, c: ScreenVertex) -> Setup {
        let area = edge_function(a.position, b.position, c.position);
        if area == 0.0 || !area.is_finite() {
            return Setup::Degenerate;
        }
        // y is flipped by the viewport, so NDC counter-clockwise shows up
        // as positive area here
        if area > 0.0 {
            Setup::Ready(Self {
                v: [a, b, c],
                ccw: true,
                area,
            })
        } else {
            Setup::Ready(Self {
                v: [a, c, b],
                ccw: false,
                area: -area,
            })
        }
    }
}

/// Computes the edge function value for point P relative to edge (A -> B).
///
/// The edge function is the signed area of the parallelogram formed by
/// vectors (B - A) and (P - A):
///
/// ```text
/// E(P) = (P.x - A.x) * (B.y - A.y) - (P.y - A.y) * (B.x - A.x)
/// ```
#[inline]
pub(crate) fn edge_function(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

/// Edge function evaluated with the endpoints in a fixed order, so that
/// `canonical_edge(a, b, p) == -canonical_edge(b, a, p)` exactly.
#[inline]
fn canonical_edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    if (a.x, a.y) < (b.x, b.y) {
        edge_function(a, b, p)
    } else {
        -edge_function(b, a, p)
    }
}

/// Top-left rule: does edge (A -> B) own pixel centers lying exactly on it?
#[inline]
fn owns_edge(a: Vec3, b: Vec3) -> bool {
    let dy = b.y - a.y;
    let dx = b.x - a.x;
    dy > 0.0 || (dy == 0.0 && dx < 0.0)
}

/// Rasterize one screen triangle into the rows covered by `buffer`.
///
/// Returns the covered and written pixel counts.
pub(crate) fn rasterize_triangle(
    tri: &ScreenTriangle,
    buffer: &mut FrameBuffer,
    shader: &dyn Shader,
    options: &RenderOptions,
) -> RenderStats {
    let mut stats = RenderStats::default();
    let [s0, s1, s2] = &tri.v;
    let (p0, p1, p2) = (s0.position, s1.position, s2.position);

    // ─────────────────────────────────────────────────────────────────────
    // Step 1: Bounding box, clamped to the band
    // ─────────────────────────────────────────────────────────────────────
    let min_x = p0.x.min(p1.x).min(p2.x).floor().max(0.0);
    let max_x = p0.x.max(p1.x).max(p2.x).ceil().min(buffer.width() as f32 - 1.0);
    let min_y = p0.y.min(p1.y).min(p2.y).floor().max(buffer.row_start() as f32);
    let max_y = p0.y.max(p1.y).max(p2.y).ceil().min(buffer.row_end() as f32 - 1.0);
    if min_x > max_x || min_y > max_y {
        return stats;
    }
    let (min_x, max_x, min_y, max_y) = (min_x as u32, max_x as u32, min_y as u32, max_y as u32);

    let inv_area = 1.0 / tri.area;
    let owns = [owns_edge(p1, p2), owns_edge(p2, p0), owns_edge(p0, p1)];
    let inside = |w: f32, owned: bool| w > 0.0 || (w == 0.0 && owned);

    // ─────────────────────────────────────────────────────────────────────
    // Step 2: Iterate over all pixel centers in the bounding box
    // ─────────────────────────────────────────────────────────────────────
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);

            let w0 = canonical_edge(p1, p2, p);
            let w1 = canonical_edge(p2, p0, p);
            let w2 = canonical_edge(p0, p1, p);
            if !(inside(w0, owns[0]) && inside(w1, owns[1]) && inside(w2, owns[2])) {
                continue;
            }
            stats.total_pixels += 1;

            // Screen-space weights. NDC depth is affine in screen space, so
            // this equals clip z over clip w with perspective-correct weights.
            let (l0, l1, l2) = (w0 * inv_area, w1 * inv_area, w2 * inv_area);
            let z = l0 * p0.z + l1 * p1.z + l2 * p2.z;

            // Perspective-correct weights for the attributes
            let b0 = l0 * s0.inv_w;
            let b1 = l1 * s1.inv_w;
            let b2 = l2 * s2.inv_w;
            let sum = b0 + b1 + b2;
            if sum == 0.0 || !sum.is_finite() {
                continue;
            }
            let (b0, b1, b2) = (b0 / sum, b1 / sum, b2 / sum);

            if options.read_depth {
                match buffer.depth(x, y) {
                    Some(stored) if z + options.depth_bias <= stored => {}
                    _ => continue,
                }
            }

            let vertex =
                Vertex::interpolate(&s0.vertex, &s1.vertex, &s2.vertex, Vec3::new(b0, b1, b2));
            let color = shader.fragment(&vertex);

            if options.write_color {
                buffer.write_color(x, y, color, options.alpha_blend);
            }
            if options.write_depth {
                buffer.set_depth(x, y, z);
            }
            stats.updated_pixels += 1;
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Color;
    use crate::render::shader::SolidColorShader;

    fn sv(x: f32, y: f32) -> ScreenVertex {
        ScreenVertex {
            position: Vec3::new(x, y, 0.5),
            inv_w: 1.0,
            vertex: Vertex::default(),
        }
    }

    fn fill(tris: &[ScreenTriangle], w: u32, h: u32) -> (Vec<u8>, u64) {
        let mut color = vec![0u8; (w * h * 4) as usize];
        let mut depth = vec![f32::INFINITY; (w * h) as usize];
        let shader = SolidColorShader::new(Mat4::identity(), Color::WHITE);
        let options = RenderOptions::default().with_depth_test(false);
        let mut fb = FrameBuffer::new(&mut color, &mut depth, w, 0);
        let covered = tris
            .iter()
            .map(|t| rasterize_triangle(t, &mut fb, &shader, &options).total_pixels)
            .sum();
        (color, covered)
    }

    fn ready(setup: Setup) -> ScreenTriangle {
        match setup {
            Setup::Ready(t) => t,
            Setup::Degenerate => panic!("triangle should not be degenerate"),
        }
    }

    #[test]
    fn canonical_edge_is_antisymmetric() {
        let a = Vec3::new(0.3, 7.1, 0.0);
        let b = Vec3::new(11.7, 2.2, 0.0);
        let p = Vec3::new(5.5, 4.5, 0.0);
        assert_eq!(canonical_edge(a, b, p), -canonical_edge(b, a, p));
    }

    #[test]
    fn zero_area_is_degenerate() {
        assert!(matches!(
            ScreenTriangle::new(sv(0.0, 0.0), sv(5.0, 5.0), sv(10.0, 10.0)),
            Setup::Degenerate
        ));
    }

    #[test]
    fn winding_is_normalized() {
        let t = ready(ScreenTriangle::new(sv(0.0, 0.0), sv(0.0, 10.0), sv(10.0, 0.0)));
        let r = ready(ScreenTriangle::new(sv(0.0, 0.0), sv(10.0, 0.0), sv(0.0, 10.0)));
        assert_ne!(t.ccw, r.ccw);
        assert_eq!(t.area, r.area);
    }

    #[test]
    fn shared_edge_pixels_are_drawn_once() {
        // Diagonal passes exactly through pixel centers.
        let a = ready(ScreenTriangle::new(sv(0.0, 0.0), sv(8.0, 8.0), sv(8.0, 0.0)));
        let b = ready(ScreenTriangle::new(sv(0.0, 0.0), sv(0.0, 8.0), sv(8.0, 8.0)));
        let (_, covered_a) = fill(&[a], 8, 8);
        let (_, covered_b) = fill(&[b], 8, 8);
        let (color, covered) = fill(&[a, b], 8, 8);
        assert_eq!(covered_a + covered_b, 64);
        assert_eq!(covered, 64);
        assert!(color.chunks(4).all(|p| p == [255, 255, 255, 255]));
    }

    #[test]
    fn depth_test_rejects_farther_pixels() {
        let mut color = vec![0u8; 4 * 4 * 4];
        let mut depth = vec![0.25f32; 16];
        let shader = SolidColorShader::new(Mat4::identity(), Color::WHITE);
        let options = RenderOptions::default();
        let mut fb = FrameBuffer::new(&mut color, &mut depth, 4, 0);
        let t = ready(ScreenTriangle::new(sv(0.0, 0.0), sv(4.0, 0.0), sv(0.0, 4.0)));
        let stats = rasterize_triangle(&t, &mut fb, &shader, &options);
        assert!(stats.total_pixels > 0);
        assert_eq!(stats.updated_pixels, 0);
    }
}
