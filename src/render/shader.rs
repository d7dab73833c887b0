//! Programmable shading stages.
//!
//! The rasterizer owns the fixed-function work (clipping, projection, edge
//! tests, depth test, attribute interpolation). A [`Shader`] supplies the
//! two programmable stages, like a GPU vertex/fragment shader pair:
//!
//! - [`Shader::vertex`] maps a mesh vertex to a clip-space position.
//! - [`Shader::fragment`] turns the perspective-correct interpolated vertex
//!   at a pixel into a color.
//!
//! Shaders must be `Send + Sync`: bands of the frame are shaded
//! concurrently and share one shader by reference.

use std::sync::Arc;

use crate::color::Color;
use crate::math::{Mat4, Vec3, Vec4};
use crate::texture::Texture;
use crate::vertex::Vertex;

/// Per-vertex and per-pixel programmable stages.
pub trait Shader: Send + Sync {
    /// Transform a vertex into homogeneous clip space.
    fn vertex(&self, v: &Vertex) -> Vec4;

    /// Compute the color of a pixel from its interpolated vertex.
    fn fragment(&self, v: &Vertex) -> Color;
}

/// Fills every pixel with one color.
#[derive(Clone, Debug)]
pub struct SolidColorShader {
    pub matrix: Mat4,
    pub color: Color,
}

impl SolidColorShader {
    pub fn new(matrix: Mat4, color: Color) -> Self {
        Self { matrix, color }
    }
}

impl Shader for SolidColorShader {
    fn vertex(&self, v: &Vertex) -> Vec4 {
        self.matrix.mul_position_w(v.position)
    }

    #[inline]
    fn fragment(&self, _v: &Vertex) -> Color {
        self.color
    }
}

/// Samples a texture at the interpolated UV, no lighting.
#[derive(Clone, Debug)]
pub struct TextureShader {
    pub matrix: Mat4,
    pub texture: Arc<Texture>,
}

impl TextureShader {
    pub fn new(matrix: Mat4, texture: Arc<Texture>) -> Self {
        Self { matrix, texture }
    }
}

impl Shader for TextureShader {
    fn vertex(&self, v: &Vertex) -> Vec4 {
        self.matrix.mul_position_w(v.position)
    }

    #[inline]
    fn fragment(&self, v: &Vertex) -> Color {
        self.texture.sample(v.texture.x, v.texture.y)
    }
}

/// Blinn-Phong lighting with a single directional light.
///
/// `light_direction` points from the surface toward the light. The base
/// color is `object_color`, or the interpolated vertex color when
/// `object_color` is fully transparent, modulated by `texture` when set.
#[derive(Clone, Debug)]
pub struct PhongShader {
    pub matrix: Mat4,
    pub light_direction: Vec3,
    pub camera_position: Vec3,
    pub object_color: Color,
    pub ambient_color: Color,
    pub diffuse_color: Color,
    pub specular_color: Color,
    pub texture: Option<Arc<Texture>>,
    pub specular_power: f32,
}

impl PhongShader {
    /// Shader with a neutral white material: gray ambient, gray diffuse,
    /// white specular highlights of power 32.
    pub fn new(matrix: Mat4, light_direction: Vec3, camera_position: Vec3) -> Self {
        Self {
            matrix,
            light_direction: light_direction.normalize(),
            camera_position,
            object_color: Color::WHITE,
            ambient_color: Color::gray(0.2),
            diffuse_color: Color::gray(0.8),
            specular_color: Color::gray(1.0),
            texture: None,
            specular_power: 32.0,
        }
    }

    pub fn with_object_color(mut self, color: Color) -> Self {
        self.object_color = color;
        self
    }

    pub fn with_texture(mut self, texture: Arc<Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_specular_power(mut self, power: f32) -> Self {
        self.specular_power = power;
        self
    }
}

impl Shader for PhongShader {
    fn vertex(&self, v: &Vertex) -> Vec4 {
        self.matrix.mul_position_w(v.position)
    }

    fn fragment(&self, v: &Vertex) -> Color {
        let mut color = if self.object_color.is_transparent() {
            v.color
        } else {
            self.object_color
        };
        if let Some(texture) = &self.texture {
            color = color * texture.bilinear_sample(v.texture.x, v.texture.y);
        }

        let mut light = self.ambient_color;
        let diffuse = v.normal.dot(self.light_direction).max(0.0);
        light = light + self.diffuse_color * diffuse;

        if diffuse > 0.0 && self.specular_power > 0.0 {
            let view = (self.camera_position - v.position).normalize();
            let half = (self.light_direction + view).normalize();
            let specular = v.normal.dot(half).max(0.0);
            if specular > 0.0 {
                light = light + self.specular_color * specular.powf(self.specular_power);
            }
        }

        (color * light).min(Color::WHITE).with_alpha(color.a)
    }
}
