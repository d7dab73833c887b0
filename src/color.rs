//! Floating point RGBA color.
//!
//! Components are unclamped while shading so that lighting terms can
//! exceed 1.0 before being combined; they are clamped only when written to
//! an 8-bit image.

use std::ops::{Add, Div, Mul, Sub};

use image::Rgba;

use crate::error::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0, 1.0);
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0, 1.0);
    pub const TRANSPARENT: Self = Self::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Fully opaque color.
    pub const fn opaque(r: f32, g: f32, b: f32) -> Self {
        Self::new(r, g, b, 1.0)
    }

    pub const fn gray(v: f32) -> Self {
        Self::new(v, v, v, 1.0)
    }

    pub const fn with_alpha(self, a: f32) -> Self {
        Self::new(self.r, self.g, self.b, a)
    }

    /// Parses `#rgb`, `#rgba`, `#rrggbb` or `#rrggbbaa` (the `#` is optional).
    ///
    /// # Example
    /// ```
    /// use softraster::Color;
    ///
    /// let c = Color::hex("#ff8000").unwrap();
    /// assert_eq!(c.to_rgba8().0, [255, 128, 0, 255]);
    /// ```
    pub fn hex(s: &str) -> Result<Self> {
        let digits = s.trim().trim_start_matches('#');
        let invalid = || Error::InvalidColor(s.to_string());
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        let channel = |range: std::ops::Range<usize>| -> Result<f32> {
            let part = &digits[range];
            let value = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            // single digit channels repeat the digit: "f" means "ff"
            let value = if part.len() == 1 { value * 17 } else { value };
            Ok(value as f32 / 255.0)
        };

        match digits.len() {
            3 => Ok(Self::opaque(channel(0..1)?, channel(1..2)?, channel(2..3)?)),
            4 => Ok(Self::new(
                channel(0..1)?,
                channel(1..2)?,
                channel(2..3)?,
                channel(3..4)?,
            )),
            6 => Ok(Self::opaque(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
            8 => Ok(Self::new(
                channel(0..2)?,
                channel(2..4)?,
                channel(4..6)?,
                channel(6..8)?,
            )),
            _ => Err(invalid()),
        }
    }

    /// Converts to 8-bit straight alpha, clamping each channel to [0, 1].
    pub fn to_rgba8(self) -> Rgba<u8> {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        Rgba([q(self.r), q(self.g), q(self.b), q(self.a)])
    }

    pub fn from_rgba8(p: Rgba<u8>) -> Self {
        let [r, g, b, a] = p.0;
        Self::new(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    pub fn lerp(self, other: Self, t: f32) -> Self {
        self + (other - self) * t
    }

    /// Raises each color channel to `exp`; alpha is kept.
    pub fn pow(self, exp: f32) -> Self {
        Self::new(self.r.powf(exp), self.g.powf(exp), self.b.powf(exp), self.a)
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(
            self.r.min(other.r),
            self.g.min(other.g),
            self.b.min(other.b),
            self.a.min(other.a),
        )
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(
            self.r.max(other.r),
            self.g.max(other.g),
            self.b.max(other.b),
            self.a.max(other.a),
        )
    }

    pub fn is_transparent(&self) -> bool {
        self.a == 0.0
    }
}

impl Add<Color> for Color {
    type Output = Color;

    fn add(self, rhs: Color) -> Self::Output {
        Self::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b, self.a + rhs.a)
    }
}

impl Sub<Color> for Color {
    type Output = Color;

    fn sub(self, rhs: Color) -> Self::Output {
        Self::new(self.r - rhs.r, self.g - rhs.g, self.b - rhs.b, self.a - rhs.a)
    }
}

/// Component-wise product, used to modulate a color by light or texture.
impl Mul<Color> for Color {
    type Output = Color;

    fn mul(self, rhs: Color) -> Self::Output {
        Self::new(self.r * rhs.r, self.g * rhs.g, self.b * rhs.b, self.a * rhs.a)
    }
}

impl Mul<f32> for Color {
    type Output = Color;

    fn mul(self, rhs: f32) -> Self::Output {
        Self::new(self.r * rhs, self.g * rhs, self.b * rhs, self.a * rhs)
    }
}

impl Div<Color> for Color {
    type Output = Color;

    fn div(self, rhs: Color) -> Self::Output {
        Self::new(self.r / rhs.r, self.g / rhs.g, self.b / rhs.b, self.a / rhs.a)
    }
}

impl Div<f32> for Color {
    type Output = Color;

    fn div(self, rhs: f32) -> Self::Output {
        Self::new(self.r / rhs, self.g / rhs, self.b / rhs, self.a / rhs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn hex_accepts_all_lengths() {
        assert_eq!(Color::hex("fff").unwrap(), Color::WHITE);
        assert_eq!(Color::hex("#000f").unwrap(), Color::BLACK);
        assert_eq!(Color::hex("#00000000").unwrap(), Color::TRANSPARENT);
        let c = Color::hex("336699").unwrap();
        assert_relative_eq!(c.r, 0.2);
        assert_relative_eq!(c.g, 0.4);
        assert_relative_eq!(c.b, 0.6);
    }

    #[test]
    fn hex_rejects_bad_input() {
        assert!(matches!(Color::hex("#12"), Err(Error::InvalidColor(_))));
        assert!(matches!(Color::hex("#gggggg"), Err(Error::InvalidColor(_))));
        assert!(matches!(Color::hex("#ffé"), Err(Error::InvalidColor(_))));
    }

    #[test]
    fn to_rgba8_clamps() {
        let c = Color::new(1.5, -0.2, 0.5, 1.0);
        assert_eq!(c.to_rgba8().0, [255, 0, 128, 255]);
    }

    #[test]
    fn pow_keeps_alpha() {
        let c = Color::new(0.5, 0.25, 1.0, 0.5).pow(2.0);
        assert_relative_eq!(c.r, 0.25);
        assert_relative_eq!(c.a, 0.5);
    }
}
