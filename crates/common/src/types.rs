use serde::{Deserialize, Serialize};

/// Packed `0xAARRGGBB` color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    /// Harness background.
    pub const BACKGROUND: Color = Color(0xff30_3030);
    pub const TRANSPARENT: Color = Color(0x0000_0000);
    pub const WHITE: Color = Color(0xffff_ffff);
    pub const BLACK: Color = Color(0xff00_0000);

    pub const fn from_argb(argb: u32) -> Self {
        Self(argb)
    }

    pub const fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((a as u32) << 24) | ((r as u32) << 16) | ((g as u32) << 8) | b as u32)
    }

    pub const fn a(self) -> u8 {
        (self.0 >> 24) as u8
    }

    pub const fn r(self) -> u8 {
        (self.0 >> 16) as u8
    }

    pub const fn g(self) -> u8 {
        (self.0 >> 8) as u8
    }

    pub const fn b(self) -> u8 {
        self.0 as u8
    }

    pub const fn to_rgba8(self) -> [u8; 4] {
        [self.r(), self.g(), self.b(), self.a()]
    }

    /// Normalized `[r, g, b, a]` components.
    pub fn to_f64_rgba(self) -> [f64; 4] {
        let [r, g, b, a] = self.to_rgba8();
        [
            r as f64 / 255.0,
            g as f64 / 255.0,
            b as f64 / 255.0,
            a as f64 / 255.0,
        ]
    }

    /// Scales alpha by `opacity`, clamped to `[0, 1]`.
    pub fn with_opacity(self, opacity: f32) -> Self {
        let opacity = opacity.clamp(0.0, 1.0);
        let a = (self.a() as f32 * opacity).round() as u8;
        Self((self.0 & 0x00ff_ffff) | ((a as u32) << 24))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BACKGROUND
    }
}

/// Axis-aligned bounds in artboard space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl Aabb {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    /// True when either extent is zero, negative or not finite.
    pub fn is_degenerate(&self) -> bool {
        let (w, h) = (self.width(), self.height());
        !(w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0)
    }

    pub fn to_rect(&self) -> kurbo::Rect {
        kurbo::Rect::new(
            self.min_x as f64,
            self.min_y as f64,
            self.max_x as f64,
            self.max_y as f64,
        )
    }
}

/// Backing-pixel dimensions of a surface or target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PixelSize {
    pub width: u32,
    pub height: u32,
}

impl PixelSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes needed for a tightly packed RGBA8 image of this size.
    pub fn rgba_len(&self) -> usize {
        self.width as usize * self.height as usize * 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_channels_unpack() {
        let c = Color::BACKGROUND;
        assert_eq!(c.a(), 0xff);
        assert_eq!(c.r(), 0x30);
        assert_eq!(c.to_rgba8(), [0x30, 0x30, 0x30, 0xff]);
        assert_eq!(Color::from_rgba8(0x30, 0x30, 0x30, 0xff), c);
    }

    #[test]
    fn color_opacity_scales_alpha_only() {
        let c = Color::from_rgba8(10, 20, 30, 200).with_opacity(0.5);
        assert_eq!(c.to_rgba8(), [10, 20, 30, 100]);
        assert_eq!(Color::WHITE.with_opacity(4.0), Color::WHITE);
    }

    #[test]
    fn aabb_degenerate() {
        assert!(!Aabb::from_size(10.0, 10.0).is_degenerate());
        assert!(Aabb::from_size(0.0, 10.0).is_degenerate());
        assert!(Aabb::from_size(10.0, f32::NAN).is_degenerate());
    }

    #[test]
    fn pixel_size_rgba_len() {
        assert_eq!(PixelSize::new(3, 2).rgba_len(), 24);
        assert!(PixelSize::new(0, 2).is_empty());
    }
}
