//! Frame recording shared between a backend and the renderers it hands out.
//!
//! A [`RecordingRenderer`] appends [`DrawCommand`]s to a [`SharedRecording`];
//! the owning backend drains and resolves them against the frame's
//! [`FrameDescriptor`] when it flushes.

use crate::engine::{FillRule, Paint, PaintStyle, RenderPaint, RenderPath, Renderer};
use crate::options::FrameDescriptor;
use kurbo::{Affine, BezPath, Rect, Shape};
use pathfiddle_common::Color;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone)]
pub enum DrawCommand {
    Draw {
        path: Rc<BezPath>,
        fill_rule: FillRule,
        paint: Paint,
        transform: Affine,
        opacity: f32,
    },
    PushClip {
        path: Rc<BezPath>,
        fill_rule: FillRule,
        transform: Affine,
    },
    PopClip,
}

#[derive(Debug, Default)]
pub struct FrameRecording {
    commands: Vec<DrawCommand>,
}

impl FrameRecording {
    pub fn push(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Removes and returns everything recorded so far.
    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

/// Single-threaded handle; the `Rc` keeps recording off other threads.
pub type SharedRecording = Rc<RefCell<FrameRecording>>;

pub fn shared_recording() -> SharedRecording {
    Rc::new(RefCell::new(FrameRecording::default()))
}

#[derive(Debug, Clone, Copy)]
struct SaveState {
    transform: Affine,
    opacity: f32,
    clips: usize,
}

impl Default for SaveState {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            opacity: 1.0,
            clips: 0,
        }
    }
}

/// [`Renderer`] that records into a backend's shared frame recording.
#[derive(Debug)]
pub struct RecordingRenderer {
    recording: SharedRecording,
    state: SaveState,
    stack: Vec<SaveState>,
    width: u32,
    height: u32,
}

impl RecordingRenderer {
    pub fn new(recording: SharedRecording, width: u32, height: u32) -> Self {
        Self {
            recording,
            state: SaveState::default(),
            stack: Vec::new(),
            width,
            height,
        }
    }

    pub fn current_transform(&self) -> Affine {
        self.state.transform
    }

    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    fn push_clip(&mut self, path: Rc<BezPath>, fill_rule: FillRule) {
        self.recording.borrow_mut().push(DrawCommand::PushClip {
            path,
            fill_rule,
            transform: self.state.transform,
        });
        self.state.clips += 1;
    }
}

impl Renderer for RecordingRenderer {
    fn save(&mut self) {
        self.stack.push(self.state);
        self.state.clips = 0;
    }

    fn restore(&mut self) {
        let Some(previous) = self.stack.pop() else {
            tracing::warn!("restore without matching save");
            return;
        };
        let mut recording = self.recording.borrow_mut();
        for _ in 0..self.state.clips {
            recording.push(DrawCommand::PopClip);
        }
        self.state = previous;
    }

    fn transform(&mut self, affine: Affine) {
        self.state.transform *= affine;
    }

    fn modulate_opacity(&mut self, opacity: f32) {
        self.state.opacity *= opacity.clamp(0.0, 1.0);
    }

    fn clip_rect(&mut self, rect: Rect) {
        self.push_clip(Rc::new(rect.to_path(0.1)), FillRule::NonZero);
    }

    fn clip_path(&mut self, path: &RenderPath) {
        self.push_clip(path.shared_path(), path.fill_rule());
    }

    fn draw_path(&mut self, path: &RenderPath, paint: &RenderPaint) {
        self.recording.borrow_mut().push(DrawCommand::Draw {
            path: path.shared_path(),
            fill_rule: path.fill_rule(),
            paint: *paint.paint(),
            transform: self.state.transform,
            opacity: self.state.opacity,
        });
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }
}

/// A command after applying the frame's fill/stroke/wireframe flags.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedOp<'a> {
    Fill {
        path: &'a BezPath,
        rule: FillRule,
        transform: Affine,
        color: Color,
    },
    Stroke {
        path: &'a BezPath,
        width: f64,
        transform: Affine,
        color: Color,
    },
    PushClip {
        path: &'a BezPath,
        rule: FillRule,
        transform: Affine,
    },
    PopClip,
}

/// Stroke width that maps to one device pixel under `transform`.
pub fn hairline_width(transform: Affine) -> f64 {
    let det = transform.determinant().abs();
    if det > f64::EPSILON { 1.0 / det.sqrt() } else { 1.0 }
}

/// Resolves recorded commands for one flush.
///
/// Unbalanced clip pops are dropped and clips left open are closed at the
/// end, so the output is always balanced.
pub fn resolve_commands<'a>(commands: &'a [DrawCommand], frame: &FrameDescriptor) -> Vec<ResolvedOp<'a>> {
    let mut out = Vec::with_capacity(commands.len());
    let mut depth = 0usize;

    for command in commands {
        match command {
            DrawCommand::Draw {
                path,
                fill_rule,
                paint,
                transform,
                opacity,
            } => {
                let color = paint.color.with_opacity(*opacity);
                if color.a() == 0 {
                    continue;
                }
                let transform = *transform;
                match paint.style {
                    PaintStyle::Fill if frame.fills_disabled => {}
                    PaintStyle::Stroke { .. } if frame.strokes_disabled => {}
                    _ if frame.wireframe => out.push(ResolvedOp::Stroke {
                        path,
                        width: hairline_width(transform),
                        transform,
                        color,
                    }),
                    PaintStyle::Fill => out.push(ResolvedOp::Fill {
                        path,
                        rule: if frame.clockwise_fill_override {
                            FillRule::NonZero
                        } else {
                            *fill_rule
                        },
                        transform,
                        color,
                    }),
                    PaintStyle::Stroke { width } => out.push(ResolvedOp::Stroke {
                        path,
                        width,
                        transform,
                        color,
                    }),
                }
            }
            DrawCommand::PushClip {
                path,
                fill_rule,
                transform,
            } => {
                depth += 1;
                out.push(ResolvedOp::PushClip {
                    path,
                    rule: *fill_rule,
                    transform: *transform,
                });
            }
            DrawCommand::PopClip => {
                if depth > 0 {
                    depth -= 1;
                    out.push(ResolvedOp::PopClip);
                }
            }
        }
    }

    out.extend(std::iter::repeat_n(ResolvedOp::PopClip, depth));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{CountingFactory, ResourceFactory};

    fn square(factory: &CountingFactory, rule: FillRule) -> RenderPath {
        factory.make_path(Rect::new(0.0, 0.0, 10.0, 10.0).to_path(0.1), rule)
    }

    #[test]
    fn renderer_records_transform_and_opacity() {
        let recording = shared_recording();
        let factory = CountingFactory::new();
        let path = square(&factory, FillRule::NonZero);
        let paint = factory.make_paint(Paint::fill(Color::WHITE));

        let mut r = RecordingRenderer::new(recording.clone(), 100, 100);
        r.save();
        r.transform(Affine::translate((5.0, 0.0)));
        r.modulate_opacity(0.5);
        r.draw_path(&path, &paint);
        r.restore();
        r.draw_path(&path, &paint);

        let rec = recording.borrow();
        assert_eq!(rec.len(), 2);
        match &rec.commands()[0] {
            DrawCommand::Draw {
                transform, opacity, ..
            } => {
                assert_eq!(*transform, Affine::translate((5.0, 0.0)));
                assert_eq!(*opacity, 0.5);
            }
            other => panic!("unexpected {other:?}"),
        }
        match &rec.commands()[1] {
            DrawCommand::Draw {
                transform, opacity, ..
            } => {
                assert_eq!(*transform, Affine::IDENTITY);
                assert_eq!(*opacity, 1.0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn restore_pops_clips_pushed_since_save() {
        let recording = shared_recording();
        let mut r = RecordingRenderer::new(recording.clone(), 10, 10);
        r.save();
        r.clip_rect(Rect::new(0.0, 0.0, 5.0, 5.0));
        r.clip_rect(Rect::new(0.0, 0.0, 2.0, 2.0));
        r.restore();
        assert_eq!(r.save_depth(), 0);

        let rec = recording.borrow();
        let pops = rec
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::PopClip))
            .count();
        assert_eq!(pops, 2);
    }

    #[test]
    fn unmatched_restore_is_ignored() {
        let recording = shared_recording();
        let mut r = RecordingRenderer::new(recording.clone(), 10, 10);
        r.transform(Affine::scale(2.0));
        r.restore();
        assert_eq!(r.current_transform(), Affine::scale(2.0));
        assert!(recording.borrow().is_empty());
    }

    #[test]
    fn resolve_applies_frame_flags() {
        let factory = CountingFactory::new();
        let path = square(&factory, FillRule::EvenOdd);
        let fill = factory.make_paint(Paint::fill(Color::WHITE));
        let stroke = factory.make_paint(Paint::stroke(Color::BLACK, 3.0));

        let recording = shared_recording();
        let mut r = RecordingRenderer::new(recording.clone(), 10, 10);
        r.draw_path(&path, &fill);
        r.draw_path(&path, &stroke);
        let rec = recording.borrow();

        let plain = resolve_commands(rec.commands(), &FrameDescriptor::default());
        assert_eq!(plain.len(), 2);
        assert!(matches!(plain[0], ResolvedOp::Fill { rule: FillRule::EvenOdd, .. }));
        assert!(matches!(plain[1], ResolvedOp::Stroke { width, .. } if width == 3.0));

        let cw = FrameDescriptor {
            clockwise_fill_override: true,
            strokes_disabled: true,
            ..FrameDescriptor::default()
        };
        let ops = resolve_commands(rec.commands(), &cw);
        assert_eq!(ops.len(), 1);
        assert!(matches!(ops[0], ResolvedOp::Fill { rule: FillRule::NonZero, .. }));

        let wire = FrameDescriptor {
            wireframe: true,
            ..FrameDescriptor::default()
        };
        let ops = resolve_commands(rec.commands(), &wire);
        assert!(ops.iter().all(|op| matches!(op, ResolvedOp::Stroke { width, .. } if *width == 1.0)));

        let no_fill = FrameDescriptor {
            fills_disabled: true,
            ..FrameDescriptor::default()
        };
        assert_eq!(resolve_commands(rec.commands(), &no_fill).len(), 1);
    }

    #[test]
    fn resolve_balances_clips() {
        let clip = Rc::new(Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1));
        let commands = vec![
            DrawCommand::PopClip,
            DrawCommand::PushClip {
                path: clip.clone(),
                fill_rule: FillRule::NonZero,
                transform: Affine::IDENTITY,
            },
            DrawCommand::PushClip {
                path: clip,
                fill_rule: FillRule::NonZero,
                transform: Affine::IDENTITY,
            },
        ];
        let ops = resolve_commands(&commands, &FrameDescriptor::default());
        assert_eq!(ops.len(), 4);
        assert_eq!(ops[2], ResolvedOp::PopClip);
        assert_eq!(ops[3], ResolvedOp::PopClip);
    }

    #[test]
    fn hairline_tracks_scale() {
        assert_eq!(hairline_width(Affine::scale(4.0)), 0.25);
        assert_eq!(hairline_width(Affine::scale(0.0)), 1.0);
    }
}
