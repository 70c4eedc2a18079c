//! Conversions from the workspace geometry types into `vello_cpu`'s.

use kurbo::{Affine, BezPath, PathEl};
use pathfiddle_common::Color;
use pathfiddle_render::FillRule;

pub(crate) fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

pub(crate) fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use vello_cpu::kurbo::Point;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(Point::new(p.x, p.y)),
            PathEl::LineTo(p) => out.line_to(Point::new(p.x, p.y)),
            PathEl::QuadTo(p1, p2) => out.quad_to(Point::new(p1.x, p1.y), Point::new(p2.x, p2.y)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(
                Point::new(p1.x, p1.y),
                Point::new(p2.x, p2.y),
                Point::new(p3.x, p3.y),
            ),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

pub(crate) fn color_to_cpu(color: Color) -> vello_cpu::peniko::Color {
    let [r, g, b, a] = color.to_rgba8();
    vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
}

pub(crate) fn fill_to_cpu(rule: FillRule) -> vello_cpu::peniko::Fill {
    match rule {
        FillRule::NonZero => vello_cpu::peniko::Fill::NonZero,
        FillRule::EvenOdd => vello_cpu::peniko::Fill::EvenOdd,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_elements_survive_conversion() {
        let mut path = BezPath::new();
        path.move_to((0.0, 0.0));
        path.line_to((10.0, 0.0));
        path.quad_to((10.0, 5.0), (5.0, 10.0));
        path.curve_to((3.0, 10.0), (0.0, 8.0), (0.0, 5.0));
        path.close_path();
        assert_eq!(bezpath_to_cpu(&path).elements().len(), path.elements().len());
    }

    #[test]
    fn affine_coefficients_match() {
        let a = Affine::translate((3.0, 4.0)) * Affine::scale(2.0);
        assert_eq!(affine_to_cpu(a).as_coeffs(), a.as_coeffs());
    }
}
