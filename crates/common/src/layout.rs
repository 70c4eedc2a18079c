use crate::types::Aabb;
use kurbo::{Affine, Vec2};
use serde::{Deserialize, Serialize};

/// How content bounds are scaled into a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Fit {
    Fill,
    /// Uniform scale so the whole content is visible.
    #[default]
    Contain,
    Cover,
    FitWidth,
    FitHeight,
    None,
    ScaleDown,
}

/// Anchor inside the frame, each axis in `[-1, 1]` (`0` is centered).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    pub x: f32,
    pub y: f32,
}

impl Alignment {
    pub const TOP_LEFT: Alignment = Alignment::new(-1.0, -1.0);
    pub const CENTER: Alignment = Alignment::new(0.0, 0.0);
    pub const BOTTOM_RIGHT: Alignment = Alignment::new(1.0, 1.0);

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::CENTER
    }
}

/// Transform mapping `content` into `frame` with the given fit and alignment.
///
/// Degenerate content or frame bounds produce the identity transform.
pub fn compute_alignment(fit: Fit, alignment: Alignment, frame: Aabb, content: Aabb) -> Affine {
    if frame.is_degenerate() || content.is_degenerate() {
        return Affine::IDENTITY;
    }

    let (cw, ch) = (content.width() as f64, content.height() as f64);
    let (fw, fh) = (frame.width() as f64, frame.height() as f64);
    let (ax, ay) = (alignment.x as f64, alignment.y as f64);

    let content_origin = Vec2::new(
        -(content.min_x as f64) - cw / 2.0 - ax * cw / 2.0,
        -(content.min_y as f64) - ch / 2.0 - ay * ch / 2.0,
    );

    let (sx, sy) = match fit {
        Fit::Fill => (fw / cw, fh / ch),
        Fit::Contain => {
            let s = (fw / cw).min(fh / ch);
            (s, s)
        }
        Fit::Cover => {
            let s = (fw / cw).max(fh / ch);
            (s, s)
        }
        Fit::FitWidth => (fw / cw, fw / cw),
        Fit::FitHeight => (fh / ch, fh / ch),
        Fit::None => (1.0, 1.0),
        Fit::ScaleDown => {
            let s = (fw / cw).min(fh / ch).min(1.0);
            (s, s)
        }
    };

    let frame_anchor = Vec2::new(
        frame.min_x as f64 + fw / 2.0 + ax * fw / 2.0,
        frame.min_y as f64 + fh / 2.0 + ay * fh / 2.0,
    );

    Affine::translate(frame_anchor) * Affine::scale_non_uniform(sx, sy) * Affine::translate(content_origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Point;

    fn map(a: Affine, x: f64, y: f64) -> Point {
        a * Point::new(x, y)
    }

    #[test]
    fn contain_centers_square_in_wide_frame() {
        let a = compute_alignment(
            Fit::Contain,
            Alignment::CENTER,
            Aabb::from_size(200.0, 100.0),
            Aabb::from_size(100.0, 100.0),
        );
        let [sx, _, _, sy, tx, ty] = a.as_coeffs();
        assert_eq!(sx, 1.0);
        assert_eq!(sy, 1.0);
        assert_eq!(tx, 50.0);
        assert_eq!(ty, 0.0);
        assert_eq!(map(a, 100.0, 100.0), Point::new(150.0, 100.0));
    }

    #[test]
    fn contain_scales_down_large_content() {
        let a = compute_alignment(
            Fit::Contain,
            Alignment::CENTER,
            Aabb::from_size(100.0, 100.0),
            Aabb::from_size(400.0, 200.0),
        );
        assert_eq!(map(a, 0.0, 0.0), Point::new(0.0, 25.0));
        assert_eq!(map(a, 400.0, 200.0), Point::new(100.0, 75.0));
    }

    #[test]
    fn degenerate_content_is_identity() {
        let a = compute_alignment(
            Fit::Contain,
            Alignment::CENTER,
            Aabb::from_size(200.0, 100.0),
            Aabb::from_size(0.0, 100.0),
        );
        assert_eq!(a, Affine::IDENTITY);

        let a = compute_alignment(
            Fit::Cover,
            Alignment::CENTER,
            Aabb::from_size(0.0, 0.0),
            Aabb::from_size(10.0, 10.0),
        );
        assert_eq!(a, Affine::IDENTITY);
    }

    #[test]
    fn top_left_alignment_pins_origin() {
        let a = compute_alignment(
            Fit::None,
            Alignment::TOP_LEFT,
            Aabb::from_size(300.0, 300.0),
            Aabb::new(10.0, 10.0, 60.0, 60.0),
        );
        assert_eq!(map(a, 10.0, 10.0), Point::new(0.0, 0.0));
    }
}
