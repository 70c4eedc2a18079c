use crate::convert::{affine_to_cpu, bezpath_to_cpu, color_to_cpu, fill_to_cpu};
use pathfiddle_common::Color;
use pathfiddle_render::magnifier::{ZOOM_SURFACE_BYTES, composite_zoom_rgba, pointer_to_backing, zoom_layout};
use pathfiddle_render::{
    Backend, BackendError, BackendOptions, BackendStats, CountingFactory, DrawCommand, EngineKind, FlushTarget,
    FrameDescriptor, FrameGuard, FramePresenter, HostSurface, Magnifier, RecordingRenderer, RenderContext,
    RenderTarget, Renderer, ResolvedOp, ResourceFactory, SharedRecording, TargetId, resolve_commands,
    shared_recording,
};
use std::collections::BTreeMap;
use std::rc::Rc;
use vello_cpu::Pixmap;

/// Largest target edge `vello_cpu` can address.
pub const MAX_TARGET_EDGE: u32 = u16::MAX as u32;

struct PrimaryTarget {
    pixmap: Pixmap,
    sample_count: u32,
}

impl RenderTarget for PrimaryTarget {
    fn width(&self) -> u32 {
        self.pixmap.width() as u32
    }

    fn height(&self) -> u32 {
        self.pixmap.height() as u32
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

fn target_edges(width: u32, height: u32) -> Result<(u16, u16), BackendError> {
    match (u16::try_from(width), u16::try_from(height)) {
        (Ok(w), Ok(h)) => Ok((w, h)),
        _ => Err(BackendError::TargetTooLarge {
            width,
            height,
            limit: MAX_TARGET_EDGE,
        }),
    }
}

/// Software backend: records through [`RecordingRenderer`]s and rasterizes
/// with `vello_cpu` on flush.
///
/// Frames go to an optional [`FramePresenter`]; without one the backend runs
/// headless and frames are only observable through readback.
pub struct CpuBackend {
    options: BackendOptions,
    factory: CountingFactory,
    recording: SharedRecording,
    ctx: Option<vello_cpu::RenderContext>,
    primary: Option<PrimaryTarget>,
    /// Everything flushed to the primary target this frame.
    primary_commands: Vec<DrawCommand>,
    offscreen: BTreeMap<TargetId, Pixmap>,
    next_target: u32,
    magnifier: Magnifier<Vec<u8>>,
    presenter: Option<Box<dyn FramePresenter>>,
    frame: FrameGuard,
    present_buf: Vec<u8>,
    flushes: u64,
    readbacks: u64,
}

impl CpuBackend {
    pub fn new(options: BackendOptions) -> Self {
        tracing::info!(
            retina = options.retina_display,
            read_pixels = options.enable_read_pixels,
            "CPU backend created"
        );
        Self {
            options,
            factory: CountingFactory::new(),
            recording: shared_recording(),
            ctx: None,
            primary: None,
            primary_commands: Vec::new(),
            offscreen: BTreeMap::new(),
            next_target: 1,
            magnifier: Magnifier::Off,
            presenter: None,
            frame: FrameGuard::default(),
            present_buf: Vec::new(),
            flushes: 0,
            readbacks: 0,
        }
    }

    pub fn with_presenter(mut self, presenter: Box<dyn FramePresenter>) -> Self {
        self.presenter = Some(presenter);
        self
    }

    pub fn options(&self) -> &BackendOptions {
        &self.options
    }

    /// Rasterizes `commands` into `pixmap`, replacing its contents.
    fn rasterize(
        ctx_slot: &mut Option<vello_cpu::RenderContext>,
        pixmap: &mut Pixmap,
        commands: &[DrawCommand],
        frame: &FrameDescriptor,
        clear: Color,
    ) {
        let (width, height) = (pixmap.width(), pixmap.height());
        let mut ctx = match ctx_slot.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();

        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color_to_cpu(clear));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, width as f64, height as f64));

        for op in resolve_commands(commands, frame) {
            match op {
                ResolvedOp::Fill {
                    path,
                    rule,
                    transform,
                    color,
                } => {
                    ctx.set_transform(affine_to_cpu(transform));
                    ctx.set_fill_rule(fill_to_cpu(rule));
                    ctx.set_paint(color_to_cpu(color));
                    ctx.fill_path(&bezpath_to_cpu(path));
                }
                ResolvedOp::Stroke {
                    path,
                    width,
                    transform,
                    color,
                } => {
                    ctx.set_transform(affine_to_cpu(transform));
                    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
                    ctx.set_paint(color_to_cpu(color));
                    ctx.stroke_path(&bezpath_to_cpu(path));
                }
                ResolvedOp::PushClip { path, rule, transform } => {
                    ctx.set_transform(affine_to_cpu(transform));
                    ctx.set_fill_rule(fill_to_cpu(rule));
                    ctx.push_clip_layer(&bezpath_to_cpu(path));
                }
                ResolvedOp::PopClip => ctx.pop_layer(),
            }
        }

        ctx.flush();
        ctx.render_to_pixmap(pixmap);
        *ctx_slot = Some(ctx);
    }

    fn present(&mut self, surface: &dyn HostSurface) -> Result<(), BackendError> {
        let Some(primary) = &self.primary else {
            return Ok(());
        };
        let (width, height) = (primary.pixmap.width() as u32, primary.pixmap.height() as u32);

        self.present_buf.clear();
        self.present_buf.extend_from_slice(primary.pixmap.data_as_u8_slice());

        if let Some(zoom) = self.magnifier.surface_mut() {
            let scale = if self.options.retina_display {
                surface.scale_factor() as f32
            } else {
                1.0
            };
            let pointer = surface.cursor_position().map(|p| pointer_to_backing(p, scale));
            if let Some(layout) = zoom_layout(pointer, width, height) {
                composite_zoom_rgba(&mut self.present_buf, width, &layout, zoom);
            }
        }

        match &mut self.presenter {
            Some(presenter) => presenter.present(&self.present_buf, width, height),
            None => Ok(()),
        }
    }
}

impl Backend for CpuBackend {
    fn label(&self) -> String {
        EngineKind::VelloCpu.label().to_string()
    }

    fn dpi_scale(&self, surface: &dyn HostSurface) -> f32 {
        if self.options.retina_display {
            surface.scale_factor() as f32
        } else {
            1.0
        }
    }

    fn factory(&self) -> &dyn ResourceFactory {
        &self.factory
    }

    fn render_context(&mut self) -> Option<&mut dyn RenderContext> {
        None
    }

    fn render_target(&self) -> Option<&dyn RenderTarget> {
        self.primary.as_ref().map(|t| t as &dyn RenderTarget)
    }

    fn on_size_changed(
        &mut self,
        _surface: &dyn HostSurface,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<(), BackendError> {
        if let Some(primary) = &self.primary
            && primary.width() == width
            && primary.height() == height
            && primary.sample_count == sample_count
        {
            return Ok(());
        }

        let (w, h) = target_edges(width, height)?;
        if let Some(presenter) = &mut self.presenter {
            presenter.resize(width, height)?;
        }
        self.primary = Some(PrimaryTarget {
            pixmap: Pixmap::new(w, h),
            sample_count,
        });
        tracing::debug!(width, height, sample_count, "CPU target resized");
        Ok(())
    }

    fn make_renderer(&mut self, width: u32, height: u32) -> Box<dyn Renderer> {
        Box::new(RecordingRenderer::new(Rc::clone(&self.recording), width, height))
    }

    fn toggle_zoom_window(&mut self) -> Result<(), BackendError> {
        self.magnifier
            .toggle(|| Ok::<_, BackendError>(vec![0u8; ZOOM_SURFACE_BYTES]))
            .map(|_| ())
    }

    fn zoom_window_enabled(&self) -> bool {
        self.magnifier.is_on()
    }

    fn begin(&mut self, frame: FrameDescriptor) -> Result<(), BackendError> {
        self.frame.begin(frame)?;
        self.recording.borrow_mut().clear();
        self.primary_commands.clear();
        Ok(())
    }

    fn flush(&mut self, target: FlushTarget) -> Result<(), BackendError> {
        let frame = *self.frame.current()?;
        let commands = self.recording.borrow_mut().take();
        match target {
            FlushTarget::Primary => {
                let primary = self
                    .primary
                    .as_mut()
                    .ok_or(BackendError::FrameState("flush before the first on_size_changed"))?;
                self.primary_commands.extend(commands);
                Self::rasterize(
                    &mut self.ctx,
                    &mut primary.pixmap,
                    &self.primary_commands,
                    &frame,
                    frame.clear_color,
                );
            }
            FlushTarget::Offscreen(id) => {
                let pixmap = self.offscreen.get_mut(&id).ok_or(BackendError::UnknownTarget(id))?;
                Self::rasterize(&mut self.ctx, pixmap, &commands, &frame, Color::TRANSPARENT);
            }
        }
        self.flushes += 1;
        Ok(())
    }

    fn end(&mut self, surface: &dyn HostSurface, pixels: Option<&mut Vec<u8>>) -> Result<(), BackendError> {
        let read_pixels = self.options.enable_read_pixels;
        let result = self.flush(FlushTarget::Primary).and_then(|()| {
            if pixels.is_some() && !read_pixels {
                return Err(BackendError::ReadPixelsDisabled);
            }
            if let (Some(out), Some(primary)) = (pixels, &self.primary) {
                out.clear();
                out.extend_from_slice(primary.pixmap.data_as_u8_slice());
                self.readbacks += 1;
            }
            self.present(surface)
        });
        self.frame.end()?;
        result
    }

    fn create_offscreen_target(&mut self, width: u32, height: u32) -> Result<TargetId, BackendError> {
        let (w, h) = target_edges(width, height)?;
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.offscreen.insert(id, Pixmap::new(w, h));
        tracing::debug!(%id, width, height, "offscreen target created");
        Ok(id)
    }

    fn release_offscreen_target(&mut self, id: TargetId) -> bool {
        self.offscreen.remove(&id).is_some()
    }

    fn read_offscreen_pixels(&mut self, id: TargetId, pixels: &mut Vec<u8>) -> Result<(), BackendError> {
        let pixmap = self.offscreen.get(&id).ok_or(BackendError::UnknownTarget(id))?;
        pixels.clear();
        pixels.extend_from_slice(pixmap.data_as_u8_slice());
        self.readbacks += 1;
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            live_allocations: usize::from(self.primary.is_some())
                + self.offscreen.len()
                + usize::from(self.magnifier.is_on()),
            offscreen_targets: self.offscreen.len(),
            frames: self.frame.frames(),
            flushes: self.flushes,
            readbacks: self.readbacks,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::{Rect, Shape};
    use pathfiddle_render::{FillRule, HeadlessSurface, Paint};
    use std::cell::RefCell;

    fn backend(width: u32, height: u32) -> (CpuBackend, HeadlessSurface) {
        let surface = HeadlessSurface::new(width, height);
        let mut b = CpuBackend::new(BackendOptions::default());
        b.on_size_changed(&surface, width, height, 0).unwrap();
        (b, surface)
    }

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * width + x) * 4) as usize;
        [buf[i], buf[i + 1], buf[i + 2], buf[i + 3]]
    }

    #[test]
    fn readback_has_target_size_and_clear_color() {
        let (mut b, surface) = backend(8, 4);
        let mut frame = FrameDescriptor::new(8, 4);
        frame.clear_color = Color::from_rgba8(10, 20, 30, 255);
        b.begin(frame).unwrap();
        let mut pixels = Vec::new();
        b.end(&surface, Some(&mut pixels)).unwrap();
        assert_eq!(pixels.len(), 8 * 4 * 4);
        assert_eq!(pixel(&pixels, 8, 3, 2), [10, 20, 30, 255]);
        assert_eq!(b.stats().readbacks, 1);
    }

    #[test]
    fn readback_refused_when_disabled() {
        let surface = HeadlessSurface::new(8, 4);
        let mut b = CpuBackend::new(BackendOptions {
            enable_read_pixels: false,
            ..BackendOptions::default()
        });
        b.on_size_changed(&surface, 8, 4, 0).unwrap();
        b.begin(FrameDescriptor::new(8, 4)).unwrap();
        let mut pixels = Vec::new();
        let err = b.end(&surface, Some(&mut pixels)).unwrap_err();
        assert!(matches!(err, BackendError::ReadPixelsDisabled));
        assert!(pixels.is_empty());
        assert_eq!(b.stats().readbacks, 0);

        b.begin(FrameDescriptor::new(8, 4)).unwrap();
        b.end(&surface, None).unwrap();
    }

    #[test]
    fn draws_fill_recorded_path() {
        let (mut b, surface) = backend(16, 16);
        let path = b
            .factory()
            .make_path(Rect::new(0.0, 0.0, 8.0, 16.0).to_path(0.1), FillRule::NonZero);
        let paint = b.factory().make_paint(Paint::fill(Color::WHITE));

        b.begin(FrameDescriptor::new(16, 16)).unwrap();
        let mut r = b.make_renderer(16, 16);
        r.draw_path(&path, &paint);
        let mut pixels = Vec::new();
        b.end(&surface, Some(&mut pixels)).unwrap();

        assert_eq!(pixel(&pixels, 16, 2, 8), [255, 255, 255, 255]);
        assert_eq!(pixel(&pixels, 16, 12, 8), Color::BACKGROUND.to_rgba8());
    }

    #[test]
    fn fills_disabled_leaves_background() {
        let (mut b, surface) = backend(16, 16);
        let path = b
            .factory()
            .make_path(Rect::new(0.0, 0.0, 16.0, 16.0).to_path(0.1), FillRule::NonZero);
        let paint = b.factory().make_paint(Paint::fill(Color::WHITE));

        let mut frame = FrameDescriptor::new(16, 16);
        frame.fills_disabled = true;
        b.begin(frame).unwrap();
        b.make_renderer(16, 16).draw_path(&path, &paint);
        let mut pixels = Vec::new();
        b.end(&surface, Some(&mut pixels)).unwrap();
        assert_eq!(pixel(&pixels, 16, 8, 8), Color::BACKGROUND.to_rgba8());
    }

    #[test]
    fn resize_is_idempotent() {
        let (mut b, surface) = backend(32, 32);
        b.on_size_changed(&surface, 32, 32, 0).unwrap();
        assert_eq!(b.stats().live_allocations, 1);
        b.on_size_changed(&surface, 64, 16, 4).unwrap();
        let target = b.render_target().unwrap();
        assert_eq!((target.width(), target.height(), target.sample_count()), (64, 16, 4));
    }

    #[test]
    fn oversized_target_rejected() {
        let surface = HeadlessSurface::new(1, 1);
        let mut b = CpuBackend::new(BackendOptions::default());
        let err = b.on_size_changed(&surface, 70_000, 10, 0).unwrap_err();
        assert!(matches!(err, BackendError::TargetTooLarge { limit: MAX_TARGET_EDGE, .. }));
        assert!(b.render_target().is_none());
    }

    #[test]
    fn double_zoom_toggle_restores_allocations() {
        let (mut b, _) = backend(32, 32);
        let before = b.stats().live_allocations;
        b.toggle_zoom_window().unwrap();
        assert!(b.zoom_window_enabled());
        assert_eq!(b.stats().live_allocations, before + 1);
        b.toggle_zoom_window().unwrap();
        assert!(!b.zoom_window_enabled());
        assert_eq!(b.stats().live_allocations, before);
    }

    #[test]
    fn begin_twice_is_an_error_and_end_closes() {
        let (mut b, surface) = backend(4, 4);
        b.begin(FrameDescriptor::new(4, 4)).unwrap();
        assert!(matches!(b.begin(FrameDescriptor::new(4, 4)), Err(BackendError::FrameState(_))));
        b.end(&surface, None).unwrap();
        assert!(b.end(&surface, None).is_err());
        b.begin(FrameDescriptor::new(4, 4)).unwrap();
        b.end(&surface, None).unwrap();
        assert_eq!(b.stats().frames, 2);
    }

    #[test]
    fn offscreen_targets_flush_and_release() {
        let (mut b, _) = backend(4, 4);
        let id = b.create_offscreen_target(2, 2).unwrap();
        let path = b
            .factory()
            .make_path(Rect::new(0.0, 0.0, 2.0, 2.0).to_path(0.1), FillRule::NonZero);
        let paint = b.factory().make_paint(Paint::fill(Color::BLACK));

        b.begin(FrameDescriptor::new(4, 4)).unwrap();
        b.make_renderer(2, 2).draw_path(&path, &paint);
        b.flush(FlushTarget::Offscreen(id)).unwrap();

        let mut pixels = Vec::new();
        b.read_offscreen_pixels(id, &mut pixels).unwrap();
        assert_eq!(pixels.len(), 2 * 2 * 4);
        assert_eq!(pixel(&pixels, 2, 1, 1), [0, 0, 0, 255]);

        assert!(b.release_offscreen_target(id));
        assert!(!b.release_offscreen_target(id));
        assert!(matches!(
            b.flush(FlushTarget::Offscreen(id)),
            Err(BackendError::UnknownTarget(_))
        ));
    }

    struct CountingPresenter(Rc<RefCell<Vec<(u32, u32)>>>);

    impl FramePresenter for CountingPresenter {
        fn resize(&mut self, _width: u32, _height: u32) -> Result<(), BackendError> {
            Ok(())
        }

        fn present(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<(), BackendError> {
            assert_eq!(rgba.len(), (width * height * 4) as usize);
            self.0.borrow_mut().push((width, height));
            Ok(())
        }
    }

    #[test]
    fn presenter_receives_frames_with_zoom_overlay() {
        let presented = Rc::new(RefCell::new(Vec::new()));
        let mut surface = HeadlessSurface::new(600, 400);
        surface.cursor = Some((300.0, 200.0));
        let mut b = CpuBackend::new(BackendOptions::default())
            .with_presenter(Box::new(CountingPresenter(Rc::clone(&presented))));
        b.on_size_changed(&surface, 600, 400, 0).unwrap();
        b.toggle_zoom_window().unwrap();

        b.begin(FrameDescriptor::new(600, 400)).unwrap();
        let mut pixels = Vec::new();
        b.end(&surface, Some(&mut pixels)).unwrap();

        assert_eq!(*presented.borrow(), vec![(600, 400)]);
        // readback never includes the overlay
        assert_eq!(pixel(&pixels, 600, 0, 399), Color::BACKGROUND.to_rgba8());
    }
}
