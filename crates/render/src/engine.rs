//! Engine-facing seams: drawable resources, the recording renderer contract,
//! and read-only views of a backend's context and target.

use crate::options::FrameDescriptor;
use kurbo::{Affine, BezPath, Rect};
use pathfiddle_common::Color;
use std::cell::Cell;
use std::rc::Rc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillRule {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PaintStyle {
    Fill,
    Stroke { width: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Paint {
    pub color: Color,
    pub style: PaintStyle,
}

impl Paint {
    pub fn fill(color: Color) -> Self {
        Self {
            color,
            style: PaintStyle::Fill,
        }
    }

    pub fn stroke(color: Color, width: f64) -> Self {
        Self {
            color,
            style: PaintStyle::Stroke { width },
        }
    }
}

/// Immutable path geometry created by a [`ResourceFactory`].
#[derive(Debug, Clone)]
pub struct RenderPath {
    id: u64,
    path: Rc<BezPath>,
    fill_rule: FillRule,
}

impl RenderPath {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn bez_path(&self) -> &BezPath {
        &self.path
    }

    pub fn shared_path(&self) -> Rc<BezPath> {
        Rc::clone(&self.path)
    }

    pub fn fill_rule(&self) -> FillRule {
        self.fill_rule
    }
}

/// Paint created by a [`ResourceFactory`].
#[derive(Debug, Clone)]
pub struct RenderPaint {
    id: u64,
    paint: Paint,
}

impl RenderPaint {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn paint(&self) -> &Paint {
        &self.paint
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FactoryStats {
    pub paths: u64,
    pub paints: u64,
}

/// Constructs engine-side drawable resources. Stable for a backend's lifetime.
pub trait ResourceFactory {
    fn make_path(&self, path: BezPath, fill_rule: FillRule) -> RenderPath;
    fn make_paint(&self, paint: Paint) -> RenderPaint;
    fn stats(&self) -> FactoryStats;
}

/// Factory that hands out sequential ids and counts what it created.
#[derive(Debug, Default)]
pub struct CountingFactory {
    next_id: Cell<u64>,
    paths: Cell<u64>,
    paints: Cell<u64>,
}

impl CountingFactory {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_id(&self) -> u64 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        id
    }
}

impl ResourceFactory for CountingFactory {
    fn make_path(&self, path: BezPath, fill_rule: FillRule) -> RenderPath {
        self.paths.set(self.paths.get() + 1);
        RenderPath {
            id: self.next_id(),
            path: Rc::new(path),
            fill_rule,
        }
    }

    fn make_paint(&self, paint: Paint) -> RenderPaint {
        self.paints.set(self.paints.get() + 1);
        RenderPaint {
            id: self.next_id(),
            paint,
        }
    }

    fn stats(&self) -> FactoryStats {
        FactoryStats {
            paths: self.paths.get(),
            paints: self.paints.get(),
        }
    }
}

/// Records drawing for the backend's current frame.
///
/// `save`/`restore` bracket transform, opacity and clip state.
pub trait Renderer {
    fn save(&mut self);
    fn restore(&mut self);
    /// Post-multiplies the current transform.
    fn transform(&mut self, affine: Affine);
    /// Multiplies the current opacity.
    fn modulate_opacity(&mut self, opacity: f32);
    fn clip_rect(&mut self, rect: Rect);
    fn clip_path(&mut self, path: &RenderPath);
    fn draw_path(&mut self, path: &RenderPath, paint: &RenderPaint);
    fn width(&self) -> u32;
    fn height(&self) -> u32;
}

/// Read-only view of a GPU engine's frame context.
pub trait RenderContext {
    fn engine_name(&self) -> &'static str;
    /// Descriptor of the open frame, if any.
    fn frame_descriptor(&self) -> Option<&FrameDescriptor>;
    fn raster_ordering_enabled(&self) -> bool;
    fn frames_rendered(&self) -> u64;
}

/// The primary surface a backend draws into.
pub trait RenderTarget {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    fn sample_count(&self) -> u32;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_counts_and_ids() {
        let f = CountingFactory::new();
        let p = f.make_path(BezPath::new(), FillRule::EvenOdd);
        let a = f.make_paint(Paint::fill(Color::WHITE));
        let b = f.make_paint(Paint::stroke(Color::BLACK, 2.0));
        assert_eq!(p.fill_rule(), FillRule::EvenOdd);
        assert_ne!(a.id(), b.id());
        assert_ne!(p.id(), a.id());
        assert_eq!(f.stats(), FactoryStats { paths: 1, paints: 2 });
        assert_eq!(b.paint().style, PaintStyle::Stroke { width: 2.0 });
    }

    #[test]
    fn render_path_clones_share_geometry() {
        let f = CountingFactory::new();
        let mut bez = BezPath::new();
        bez.move_to((0.0, 0.0));
        bez.line_to((1.0, 1.0));
        let p = f.make_path(bez, FillRule::NonZero);
        let q = p.clone();
        assert!(Rc::ptr_eq(&p.shared_path(), &q.shared_path()));
        assert_eq!(f.stats().paths, 1);
    }
}
