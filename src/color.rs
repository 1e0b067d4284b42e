//! Colours.
//!
//! A single straight-alpha RGBA type with `f64` channels in `[0, 1]`, the
//! only colour representation crossing the backend boundary.

/// RGBA color with f64 components in range [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 0.5, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::new(0.0, 0.0, 0.0, 0.0);

    pub const fn new(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour.
    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Colour from a packed `0xRRGGBB` value, opaque.
    pub fn from_hex(rgb: u32) -> Self {
        let ch = |shift: u32| f64::from((rgb >> shift) & 0xFF) / 255.0;
        Self::rgb(ch(16), ch(8), ch(0))
    }

    /// Same colour with opacity `a`, clamped to `[0, 1]`.
    pub fn with_opacity(self, a: f64) -> Self {
        Self {
            a: a.clamp(0.0, 1.0),
            ..self
        }
    }

    /// Interpolate between `self` and `c` by parameter `k`.
    pub fn gradient(&self, c: &Color, k: f64) -> Color {
        Color {
            r: self.r + (c.r - self.r) * k,
            g: self.g + (c.g - self.g) * k,
            b: self.b + (c.b - self.b) * k,
            a: self.a + (c.a - self.a) * k,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}
