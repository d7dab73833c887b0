//! Command line renderer: draws a mesh file or a built-in shape to a PNG.
//!
//! ```text
//! softraster model.stl -o out.png --simplify 0.25 --silhouette
//! softraster --shape sphere --scale 4 --width 512 --height 512
//! ```

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use image::imageops::{self, FilterType};
use tracing::info;

use softraster::mesh::{load_mesh, shapes};
use softraster::prelude::*;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Shape {
    Cube,
    Sphere,
    Icosphere,
    Cylinder,
    Cone,
}

impl Shape {
    fn build(self) -> Mesh {
        match self {
            Shape::Cube => shapes::cube(),
            Shape::Sphere => shapes::sphere(24),
            Shape::Icosphere => shapes::icosphere(3),
            Shape::Cylinder => shapes::cylinder(48, true),
            Shape::Cone => shapes::cone(48, true),
        }
    }
}

/// Render a mesh with Phong shading.
#[derive(Parser, Debug)]
#[command(name = "softraster")]
#[command(about = "CPU software rasterizer", long_about = None)]
#[command(version)]
struct Args {
    /// OBJ or STL file to render; a built-in shape is used when omitted
    input: Option<PathBuf>,

    /// Built-in shape to render without an input file
    #[arg(long, value_enum, default_value_t = Shape::Cube)]
    shape: Shape,

    /// Output PNG path
    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,

    #[arg(long, default_value_t = 1024)]
    width: u32,

    #[arg(long, default_value_t = 1024)]
    height: u32,

    /// Supersampling factor; the image is rendered this many times larger
    /// and downsampled
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u32).range(1..=8))]
    scale: u32,

    /// Camera position as x,y,z
    #[arg(long, default_value = "3,3,3", value_parser = parse_vec3)]
    eye: Vec3,

    /// Point the camera looks at as x,y,z
    #[arg(long, default_value = "0,0,0", value_parser = parse_vec3)]
    center: Vec3,

    /// Vertical field of view in degrees
    #[arg(long, default_value_t = 40.0)]
    fovy: f32,

    /// Object color as hex
    #[arg(long, default_value = "#80ffa6", value_parser = parse_color)]
    color: Color,

    /// Background color as hex
    #[arg(long, default_value = "#000000", value_parser = parse_color)]
    background: Color,

    /// Smooth normals across edges sharper than this many degrees
    #[arg(long)]
    smooth: Option<f32>,

    /// Keep this fraction of the triangles
    #[arg(long)]
    simplify: Option<f32>,

    /// Draw edges instead of filled triangles
    #[arg(long)]
    wireframe: bool,

    /// Overlay the silhouette seen from the eye
    #[arg(long)]
    silhouette: bool,

    /// Line width in output pixels
    #[arg(long, default_value_t = 1.5)]
    line_width: f32,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>().map_err(|e| format!("{p:?}: {e}")))
        .collect::<Result<_, _>>()?;
    match parts[..] {
        [x, y, z] => Ok(Vec3::new(x, y, z)),
        _ => Err(format!("expected x,y,z, got {s:?}")),
    }
}

fn parse_color(s: &str) -> Result<Color, String> {
    Color::hex(s).map_err(|e| e.to_string())
}

fn main() -> softraster::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut mesh = match &args.input {
        Some(path) => load_mesh(path)?,
        None => args.shape.build(),
    };
    mesh.bi_unit_cube();
    if let Some(degrees) = args.smooth {
        mesh.smooth_normals_threshold(degrees.to_radians());
    }
    if let Some(factor) = args.simplify {
        let report = mesh.simplify(factor)?;
        info!(%report, "simplified");
    }

    let (width, height) = (args.width * args.scale, args.height * args.scale);
    let options = RenderOptions::default()
        .with_clear_color(args.background)
        .with_wireframe(args.wireframe)
        .with_line_width(args.line_width * args.scale as f32);
    let mut ctx = Context::new(width, height)?.with_options(options);
    ctx.clear_color_buffer();

    let aspect = width as f32 / height as f32;
    let matrix = Mat4::look_at(args.eye, args.center, Vec3::Z)
        .perspective_by(args.fovy, aspect, 0.01, 100.0);
    let light = Vec3::new(-0.75, 1.0, 0.25).normalize();
    ctx.set_shader(PhongShader::new(matrix, light, args.eye).with_object_color(args.color));
    let mut stats = ctx.draw_mesh(&mesh);

    if args.silhouette {
        let outline = mesh.silhouette(args.eye, 1e-3);
        ctx.set_shader(SolidColorShader::new(matrix, Color::WHITE));
        ctx.options.depth_bias = -1e-5;
        ctx.options.wireframe = false;
        stats += ctx.draw_lines(&outline.lines);
    }
    info!(
        triangles = stats.triangles,
        clipped = stats.clipped,
        updated = stats.updated_pixels,
        coverage = stats.coverage_ratio(),
        "rendered"
    );

    let mut image = ctx.into_image();
    if args.scale > 1 {
        image = imageops::resize(&image, args.width, args.height, FilterType::Lanczos3);
    }
    image.save(&args.output)?;
    info!(path = %args.output.display(), "saved");
    Ok(())
}
