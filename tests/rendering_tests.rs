// Rendering pipeline tests: depth, coverage and scene-level checks run
// through the public Context API.

use approx::assert_relative_eq;
use softraster::prelude::*;

fn pixel_space(w: u32, h: u32) -> Mat4 {
    Mat4::orthographic(0.0, w as f32, h as f32, 0.0, -1.0, 1.0)
}

fn camera(eye: Vec3, fovy: f32, w: u32, h: u32) -> Mat4 {
    Mat4::look_at(eye, Vec3::ZERO, Vec3::Z).perspective_by(fovy, w as f32 / h as f32, 1.0, 10.0)
}

/// Screen position of a world point, same mapping as the context.
fn to_screen(matrix: &Mat4, w: u32, h: u32, p: Vec3) -> Vec3 {
    let ndc = matrix.mul_position_w(p).perspective_divide();
    Mat4::screen(w, h).mul_position(ndc)
}

/// Bounding box (min_x, min_y, max_x, max_y) of pixels that differ from
/// the background.
fn drawn_bounds(ctx: &Context, background: [u8; 4]) -> Option<(u32, u32, u32, u32)> {
    let mut bounds: Option<(u32, u32, u32, u32)> = None;
    for (x, y, p) in ctx.image().enumerate_pixels() {
        if p.0 == background {
            continue;
        }
        bounds = Some(match bounds {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        });
    }
    bounds
}

fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (p.x - a.x) * (b.y - a.y) - (p.y - a.y) * (b.x - a.x)
}

#[test]
fn centroid_depth_matches_projected_plane() {
    let (w, h) = (64, 64);
    let matrix = Mat4::look_at(Vec3::new(0.0, 0.0, 3.0), Vec3::ZERO, Vec3::Y)
        .perspective_by(60.0, 1.0, 0.5, 10.0);
    let corners = [
        Vec3::new(-1.0, -1.0, 0.0),
        Vec3::new(1.0, -1.0, -1.0),
        Vec3::new(0.0, 1.0, 0.5),
    ];
    let mut ctx = Context::new(w, h).expect("valid size");
    ctx.set_shader(SolidColorShader::new(matrix, Color::WHITE));
    let stats = ctx.draw_triangle(&Triangle::from_positions(corners[0], corners[1], corners[2]));
    assert_eq!(stats.clipped, 0);
    assert!(stats.updated_pixels > 0);

    let [s0, s1, s2] = corners.map(|c| to_screen(&matrix, w, h, c));
    let centroid = (s0 + s1 + s2) / 3.0;
    let (x, y) = (centroid.x.floor() as u32, centroid.y.floor() as u32);
    let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
    let area = edge(s0, s1, s2);
    let expected =
        (edge(s1, s2, p) * s0.z + edge(s2, s0, p) * s1.z + edge(s0, s1, p) * s2.z) / area;

    let depth = ctx.depth(x, y).expect("pixel in range");
    assert_relative_eq!(depth, expected, epsilon = 1e-5);
}

#[test]
fn shared_diagonal_is_shaded_exactly_once() {
    let size = 40;
    let mut ctx = Context::new(size, size)
        .expect("valid size")
        .with_options(RenderOptions::default().with_depth_test(false));
    ctx.set_shader(SolidColorShader::new(
        pixel_space(size, size),
        Color::new(1.0, 1.0, 1.0, 0.5),
    ));

    // the diagonal passes through every pixel center (i + 0.5, i + 0.5)
    let s = size as f32;
    let a = Triangle::from_positions(Vec3::ZERO, Vec3::new(s, 0.0, 0.0), Vec3::new(s, s, 0.0));
    let b = Triangle::from_positions(Vec3::ZERO, Vec3::new(s, s, 0.0), Vec3::new(0.0, s, 0.0));
    let total = ctx.draw_triangle(&a) + ctx.draw_triangle(&b);

    assert_eq!(total.total_pixels, (size * size) as u64);
    // a pixel blended twice would be brighter than the rest
    let first = *ctx.image().get_pixel(0, 0);
    assert!(ctx.image().pixels().all(|p| *p == first));
    assert_ne!(first.0, [0, 0, 0, 255]);
}

#[test]
fn redrawing_the_same_triangle_changes_nothing() {
    let (w, h) = (48, 48);
    let matrix = camera(Vec3::new(0.0, -3.0, 1.0), 50.0, w, h);
    let mut ctx = Context::new(w, h).expect("valid size");
    ctx.set_shader(SolidColorShader::new(matrix, Color::opaque(0.2, 0.6, 1.0)));
    let t = Triangle::from_positions(
        Vec3::new(-1.0, 0.0, -0.5),
        Vec3::new(1.0, 0.5, -0.5),
        Vec3::new(0.0, 0.0, 1.0),
    );

    let first = ctx.draw_triangle(&t);
    let color = ctx.image().clone();
    let depth = ctx.depth_buffer().to_vec();
    let second = ctx.draw_triangle(&t);

    assert_eq!(second.updated_pixels, first.updated_pixels);
    assert_eq!(ctx.image().as_raw(), color.as_raw());
    assert_eq!(ctx.depth_buffer(), depth.as_slice());
}

#[test]
fn positive_bias_loses_against_coincident_surface() {
    let size = 16;
    let mut ctx = Context::new(size, size).expect("valid size");
    let t = Triangle::from_positions(
        Vec3::ZERO,
        Vec3::new(16.0, 0.0, 0.0),
        Vec3::new(0.0, 16.0, 0.0),
    );
    ctx.set_shader(SolidColorShader::new(pixel_space(size, size), Color::opaque(1.0, 0.0, 0.0)));
    ctx.draw_triangle(&t);

    ctx.options.depth_bias = 1e-3;
    ctx.set_shader(SolidColorShader::new(pixel_space(size, size), Color::opaque(0.0, 1.0, 0.0)));
    let stats = ctx.draw_triangle(&t);
    assert_eq!(stats.updated_pixels, 0);
    assert_eq!(ctx.image().get_pixel(2, 2).0, [255, 0, 0, 255]);

    ctx.options.depth_bias = -1e-3;
    let stats = ctx.draw_triangle(&t);
    assert_eq!(stats.updated_pixels, stats.total_pixels);
    assert_eq!(ctx.image().get_pixel(2, 2).0, [0, 255, 0, 255]);
}

#[test]
fn near_plane_crossing_triangle_is_clipped_not_dropped() {
    let (w, h) = (32, 32);
    let eye = Vec3::new(0.0, -2.0, 0.0);
    let matrix = Mat4::look_at(eye, Vec3::ZERO, Vec3::Z).perspective_by(90.0, 1.0, 1.0, 10.0);
    let mut ctx = Context::new(w, h).expect("valid size");
    ctx.set_shader(SolidColorShader::new(matrix, Color::WHITE));

    // one corner sits behind the camera
    let t = Triangle::from_positions(
        Vec3::new(-1.0, 1.0, -0.5),
        Vec3::new(1.0, 1.0, -0.5),
        Vec3::new(0.0, -4.0, 0.5),
    );
    let stats = ctx.draw_triangle(&t);
    assert_eq!(stats.clipped, 0);
    assert_eq!(stats.skipped, 0);
    assert!(stats.updated_pixels > 0);
    assert!(ctx
        .depth_buffer()
        .iter()
        .all(|&d| d.is_infinite() || (-1e-5..=1.0 + 1e-5).contains(&d)));
}

#[test]
fn cube_scene_is_centered() {
    let (w, h) = (256, 256);
    let eye = Vec3::new(3.0, 3.0, 3.0);
    let matrix = camera(eye, 40.0, w, h);
    let mut ctx = Context::new(w, h).expect("valid size");
    ctx.set_shader(SolidColorShader::new(matrix, Color::WHITE));
    let cube = shapes::cube();
    let stats = ctx.draw_mesh(&cube);
    assert_eq!(stats.triangles, 12);

    let (x0, y0, x1, y1) = drawn_bounds(&ctx, [0, 0, 0, 255]).expect("cube is visible");
    let center_x = (x0 + x1 + 1) as f32 / 2.0;
    let center_y = (y0 + y1 + 1) as f32 / 2.0;
    // perspective pushes the nearer bottom corner further out, so the box
    // sits a few pixels low
    assert!((center_x - 128.0).abs() <= 1.0, "center x {center_x}");
    assert!((center_y - 128.0).abs() <= 4.0, "center y {center_y}");

    // the drawn box matches the projected corners to within a pixel
    let corners: Vec<Vec3> = cube
        .triangles
        .iter()
        .flat_map(|t| t.positions())
        .map(|p| to_screen(&matrix, w, h, p))
        .collect();
    let min_x = corners.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = corners.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = corners.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = corners.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    assert!((x0 as f32 - min_x).abs() <= 1.0);
    assert!((x1 as f32 + 1.0 - max_x).abs() <= 1.0);
    assert!((y0 as f32 - min_y).abs() <= 1.0);
    assert!((y1 as f32 + 1.0 - max_y).abs() <= 1.0);

    let fraction = stats.updated_pixels as f32 / (w * h) as f32;
    assert!(fraction > 0.1 && fraction < 0.5, "fraction {fraction}");
}

#[test]
fn parallel_draw_matches_sequential() {
    let (w, h) = (96, 80);
    let eye = Vec3::new(2.5, -3.0, 1.5);
    let matrix = camera(eye, 45.0, w, h);
    let mut sphere = shapes::sphere(12);
    sphere.add(&shapes::cube());
    let shader = PhongShader::new(matrix, Vec3::new(-0.5, 1.0, 0.3).normalize(), eye);

    let mut seq = Context::new(w, h).expect("valid size");
    seq.set_shader(shader.clone());
    let mut seq_stats = RenderStats::default();
    for t in &sphere.triangles {
        seq_stats += seq.draw_triangle(t);
    }

    let mut par = Context::new(w, h)
        .expect("valid size")
        .with_options(RenderOptions::default().with_tile_rows(5));
    par.set_shader(shader);
    let par_stats = par.draw_triangles(&sphere.triangles);

    assert_eq!(seq_stats, par_stats);
    assert_eq!(seq.image().as_raw(), par.image().as_raw());
    assert_eq!(seq.depth_buffer(), par.depth_buffer());
}

#[test]
fn wireframe_draws_less_than_fill() {
    let (w, h) = (128, 128);
    let matrix = camera(Vec3::new(3.0, 3.0, 3.0), 40.0, w, h);

    let mut filled = Context::new(w, h).expect("valid size");
    filled.set_shader(SolidColorShader::new(matrix, Color::WHITE));
    let fill = filled.draw_mesh(&shapes::cube());

    let mut wire = Context::new(w, h)
        .expect("valid size")
        .with_options(RenderOptions::default().with_wireframe(true).with_line_width(1.0));
    wire.set_shader(SolidColorShader::new(matrix, Color::WHITE));
    let lines = wire.draw_mesh(&shapes::cube());

    assert_eq!(lines.triangles, 12);
    assert!(lines.updated_pixels > 0);
    assert!(lines.updated_pixels < fill.updated_pixels);
}

#[test]
fn silhouette_traces_rendered_sphere() {
    let (w, h) = (128, 128);
    let eye = Vec3::new(0.0, -4.0, 1.0);
    let matrix = camera(eye, 40.0, w, h);
    let sphere = shapes::icosphere(3);

    let mut ctx = Context::new(w, h).expect("valid size");
    ctx.set_shader(SolidColorShader::new(matrix, Color::gray(0.5)));
    let surface = ctx.draw_mesh(&sphere);
    let (x0, y0, x1, y1) = drawn_bounds(&ctx, [0, 0, 0, 255]).expect("sphere is visible");

    let outline = sphere.silhouette(eye, 0.01);
    ctx.set_shader(SolidColorShader::new(matrix, Color::WHITE));
    ctx.options.depth_bias = -1e-4;
    let lines = ctx.draw_lines(&outline.lines);
    // the outer half of each line lies over the background
    assert!(lines.coverage_ratio() > 0.25, "{lines:?}");
    assert!(surface.updated_pixels > 0);

    // outline endpoints trace the rendered disc
    let projected: Vec<Vec3> = outline
        .lines
        .iter()
        .flat_map(|l| [l.v1.position, l.v2.position])
        .map(|p| to_screen(&matrix, w, h, p))
        .collect();
    let min_x = projected.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
    let max_x = projected.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
    let min_y = projected.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
    let max_y = projected.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);
    assert!((min_x - x0 as f32).abs() <= 2.0);
    assert!((max_x - (x1 + 1) as f32).abs() <= 2.0);
    assert!((min_y - y0 as f32).abs() <= 2.0);
    assert!((max_y - (y1 + 1) as f32).abs() <= 2.0);
}
