use crate::context::GpuContext;
use crate::magnifier::ZoomSurface;
use crate::readback::read_texture_rgba;
use pathfiddle_common::Color;
use pathfiddle_render::magnifier::{pointer_to_backing, zoom_layout};
use pathfiddle_render::{
    Backend, BackendError, BackendOptions, BackendStats, CountingFactory, DrawCommand, EngineKind, FillRule,
    FlushTarget, FrameDescriptor, FrameGuard, HostSurface, Magnifier, RecordingRenderer, RenderContext, RenderTarget,
    Renderer, ResolvedOp, ResourceFactory, SharedRecording, TargetId, resolve_commands, shared_recording,
};
use std::collections::BTreeMap;
use std::num::NonZeroUsize;
use std::rc::Rc;
use vello::peniko::{BlendMode, Fill};
use wgpu::util::TextureBlitter;

/// Format vello renders into; its compute pipeline needs storage binding.
const TARGET_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Rgba8Unorm;

struct GpuTarget {
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    width: u32,
    height: u32,
    sample_count: u32,
}

impl GpuTarget {
    fn new(device: &wgpu::Device, label: &str, width: u32, height: u32, sample_count: u32) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: TARGET_FORMAT,
            usage: wgpu::TextureUsages::STORAGE_BINDING
                | wgpu::TextureUsages::TEXTURE_BINDING
                | wgpu::TextureUsages::RENDER_ATTACHMENT
                | wgpu::TextureUsages::COPY_SRC
                | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            texture,
            view,
            width,
            height,
            sample_count,
        }
    }
}

impl RenderTarget for GpuTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn sample_count(&self) -> u32 {
        self.sample_count
    }
}

/// Engine-side frame state exposed through [`RenderContext`].
#[derive(Debug, Default)]
pub struct VelloContext {
    frame: Option<FrameDescriptor>,
    raster_ordering: bool,
    frames: u64,
}

impl RenderContext for VelloContext {
    fn engine_name(&self) -> &'static str {
        "vello"
    }

    fn frame_descriptor(&self) -> Option<&FrameDescriptor> {
        self.frame.as_ref()
    }

    fn raster_ordering_enabled(&self) -> bool {
        self.raster_ordering
    }

    fn frames_rendered(&self) -> u64 {
        self.frames
    }
}

/// Antialiasing mode for a requested MSAA sample count.
pub fn aa_config(msaa_sample_count: u32) -> vello::AaConfig {
    match msaa_sample_count {
        0 | 1 => vello::AaConfig::Area,
        2..=8 => vello::AaConfig::Msaa8,
        _ => vello::AaConfig::Msaa16,
    }
}

pub fn renderer_options(options: &BackendOptions) -> vello::RendererOptions {
    vello::RendererOptions {
        antialiasing_support: vello::AaSupport::all(),
        num_init_threads: if options.synchronous_shader_compilations {
            NonZeroUsize::new(1)
        } else {
            None
        },
        ..Default::default()
    }
}

fn peniko_color(color: Color) -> vello::peniko::Color {
    let [r, g, b, a] = color.to_rgba8();
    vello::peniko::Color::from_rgba8(r, g, b, a)
}

fn peniko_fill(rule: FillRule) -> Fill {
    match rule {
        FillRule::NonZero => Fill::NonZero,
        FillRule::EvenOdd => Fill::EvenOdd,
    }
}

/// Builds a vello scene from recorded commands.
fn encode_scene(scene: &mut vello::Scene, commands: &[DrawCommand], frame: &FrameDescriptor) {
    scene.reset();
    for op in resolve_commands(commands, frame) {
        match op {
            ResolvedOp::Fill {
                path,
                rule,
                transform,
                color,
            } => scene.fill(peniko_fill(rule), transform, peniko_color(color), None, path),
            ResolvedOp::Stroke {
                path,
                width,
                transform,
                color,
            } => scene.stroke(&kurbo::Stroke::new(width), transform, peniko_color(color), None, path),
            ResolvedOp::PushClip { path, rule, transform } => {
                scene.push_layer(peniko_fill(rule), BlendMode::default(), 1.0, transform, path)
            }
            ResolvedOp::PopClip => scene.pop_layer(),
        }
    }
}

/// GPU backend: vello compute rasterization on wgpu.
///
/// Field order is drop order; every texture goes before `ctx`, which owns
/// the device.
pub struct VelloBackend {
    zoom: Magnifier<ZoomSurface>,
    primary: Option<GpuTarget>,
    /// Stand-in swapchain image when running headless.
    headless_present: Option<GpuTarget>,
    offscreen: BTreeMap<TargetId, GpuTarget>,
    blitter: TextureBlitter,
    renderer: vello::Renderer,
    scene: vello::Scene,
    recording: SharedRecording,
    primary_commands: Vec<DrawCommand>,
    factory: CountingFactory,
    context: VelloContext,
    frame: FrameGuard,
    options: BackendOptions,
    next_target: u32,
    flushes: u64,
    readbacks: u64,
    ctx: GpuContext,
}

impl VelloBackend {
    pub fn new(ctx: GpuContext, options: BackendOptions) -> Result<Self, BackendError> {
        let renderer = vello::Renderer::new(&ctx.device, renderer_options(&options))
            .map_err(|e| BackendError::Engine(format!("vello renderer init failed: {e}")))?;
        let blitter = TextureBlitter::new(&ctx.device, ctx.present_format());
        tracing::info!(
            api = %ctx.api(),
            headless = ctx.is_headless(),
            sync_shaders = options.synchronous_shader_compilations,
            "vello backend created"
        );
        Ok(Self {
            zoom: Magnifier::Off,
            primary: None,
            headless_present: None,
            offscreen: BTreeMap::new(),
            blitter,
            renderer,
            scene: vello::Scene::new(),
            recording: shared_recording(),
            primary_commands: Vec::new(),
            factory: CountingFactory::new(),
            context: VelloContext::default(),
            frame: FrameGuard::default(),
            options,
            next_target: 1,
            flushes: 0,
            readbacks: 0,
            ctx,
        })
    }

    fn check_size(&self, width: u32, height: u32) -> Result<(), BackendError> {
        let limit = self.ctx.max_texture_dimension();
        if width > limit || height > limit {
            return Err(BackendError::TargetTooLarge { width, height, limit });
        }
        Ok(())
    }

    fn render_scene(&mut self, target: FlushTarget, base: Color) -> Result<(), BackendError> {
        let view = match target {
            FlushTarget::Primary => self
                .primary
                .as_ref()
                .ok_or(BackendError::FrameState("flush before the first on_size_changed"))?,
            FlushTarget::Offscreen(id) => self.offscreen.get(&id).ok_or(BackendError::UnknownTarget(id))?,
        };
        let msaa = self.frame.current()?.msaa_sample_count;
        self.renderer
            .render_to_texture(
                &self.ctx.device,
                &self.ctx.queue,
                &self.scene,
                &view.view,
                &vello::RenderParams {
                    base_color: peniko_color(base),
                    width: view.width,
                    height: view.height,
                    antialiasing_method: aa_config(msaa),
                },
            )
            .map_err(|e| BackendError::Engine(format!("vello render failed: {e}")))
    }

    fn present(&mut self, surface: &dyn HostSurface) -> Result<(), BackendError> {
        let Some(primary) = &self.primary else {
            return Ok(());
        };

        let swapchain = self.ctx.acquire()?;
        let swapchain_view = swapchain
            .as_ref()
            .map(|t| t.texture.create_view(&wgpu::TextureViewDescriptor::default()));
        let dest = match (&swapchain_view, &self.headless_present) {
            (Some(view), _) => view,
            (None, Some(headless)) if self.ctx.is_headless() => &headless.view,
            _ => return Ok(()),
        };

        let device = &self.ctx.device;
        let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("present_encoder"),
        });
        self.blitter.copy(device, &mut encoder, &primary.view, dest);

        if let Some(zoom) = self.zoom.surface() {
            let scale = self.dpi_scale(surface);
            let pointer = surface.cursor_position().map(|p| pointer_to_backing(p, scale));
            if let Some(layout) = zoom_layout(pointer, primary.width, primary.height) {
                zoom.encode(device, &mut encoder, &primary.texture, dest, &layout);
            }
        }

        self.ctx.queue.submit(Some(encoder.finish()));
        if let Some(frame) = swapchain {
            frame.present();
        }
        Ok(())
    }
}

impl Backend for VelloBackend {
    fn label(&self) -> String {
        EngineKind::Vello.label().to_string()
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
        Some(&mut self.context)
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
            && primary.width == width
            && primary.height == height
            && primary.sample_count == sample_count
        {
            return Ok(());
        }
        self.check_size(width, height)?;
        if width == 0 || height == 0 {
            self.primary = None;
            self.headless_present = None;
            return Ok(());
        }

        self.ctx.resize_surface(width, height);
        let device = &self.ctx.device;
        self.primary = Some(GpuTarget::new(device, "primary_target", width, height, sample_count));
        if self.ctx.is_headless() {
            self.headless_present = Some(GpuTarget::new(device, "headless_present", width, height, 1));
        }
        tracing::debug!(width, height, sample_count, "vello target resized");
        Ok(())
    }

    fn make_renderer(&mut self, width: u32, height: u32) -> Box<dyn Renderer> {
        Box::new(RecordingRenderer::new(Rc::clone(&self.recording), width, height))
    }

    fn toggle_zoom_window(&mut self) -> Result<(), BackendError> {
        let device = &self.ctx.device;
        let present_format = self.ctx.present_format();
        self.zoom
            .toggle(|| Ok::<_, BackendError>(ZoomSurface::new(device, TARGET_FORMAT, present_format)))
            .map(|_| ())
    }

    fn zoom_window_enabled(&self) -> bool {
        self.zoom.is_on()
    }

    fn begin(&mut self, frame: FrameDescriptor) -> Result<(), BackendError> {
        self.frame.begin(frame)?;
        self.recording.borrow_mut().clear();
        self.primary_commands.clear();
        self.context.frame = Some(frame);
        self.context.raster_ordering = !(self.options.disable_raster_ordering || frame.disable_raster_ordering);
        Ok(())
    }

    fn flush(&mut self, target: FlushTarget) -> Result<(), BackendError> {
        let frame = *self.frame.current()?;
        let commands = self.recording.borrow_mut().take();
        let base = match target {
            FlushTarget::Primary => {
                self.primary_commands.extend(commands);
                encode_scene(&mut self.scene, &self.primary_commands, &frame);
                frame.clear_color
            }
            FlushTarget::Offscreen(_) => {
                encode_scene(&mut self.scene, &commands, &frame);
                Color::TRANSPARENT
            }
        };
        self.render_scene(target, base)?;
        self.flushes += 1;
        Ok(())
    }

    fn end(&mut self, surface: &dyn HostSurface, pixels: Option<&mut Vec<u8>>) -> Result<(), BackendError> {
        let _span = tracing::debug_span!("vello_end").entered();
        let read_pixels = self.options.enable_read_pixels;
        let result = self.flush(FlushTarget::Primary).and_then(|()| {
            if pixels.is_some() && !read_pixels {
                return Err(BackendError::ReadPixelsDisabled);
            }
            if let (Some(out), Some(primary)) = (pixels, &self.primary) {
                read_texture_rgba(
                    &self.ctx.device,
                    &self.ctx.queue,
                    &primary.texture,
                    primary.width,
                    primary.height,
                    out,
                )?;
                self.readbacks += 1;
            }
            self.present(surface)
        });
        self.frame.end()?;
        self.context.frame = None;
        self.context.frames += 1;
        result
    }

    fn create_offscreen_target(&mut self, width: u32, height: u32) -> Result<TargetId, BackendError> {
        self.check_size(width, height)?;
        if width == 0 || height == 0 {
            return Err(BackendError::TargetTooLarge {
                width,
                height,
                limit: self.ctx.max_texture_dimension(),
            });
        }
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.offscreen
            .insert(id, GpuTarget::new(&self.ctx.device, "offscreen_target", width, height, 0));
        tracing::debug!(%id, width, height, "offscreen target created");
        Ok(id)
    }

    fn release_offscreen_target(&mut self, id: TargetId) -> bool {
        self.offscreen.remove(&id).is_some()
    }

    fn read_offscreen_pixels(&mut self, id: TargetId, pixels: &mut Vec<u8>) -> Result<(), BackendError> {
        let target = self.offscreen.get(&id).ok_or(BackendError::UnknownTarget(id))?;
        read_texture_rgba(
            &self.ctx.device,
            &self.ctx.queue,
            &target.texture,
            target.width,
            target.height,
            pixels,
        )?;
        self.readbacks += 1;
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            live_allocations: usize::from(self.primary.is_some())
                + self.offscreen.len()
                + if self.zoom.is_on() { ZoomSurface::ALLOCATIONS } else { 0 },
            offscreen_targets: self.offscreen.len(),
            frames: self.frame.frames(),
            flushes: self.flushes,
            readbacks: self.readbacks,
        }
    }

    fn tick(&mut self) {
        if let Err(e) = self.ctx.device.poll(wgpu::PollType::Poll) {
            tracing::warn!("device poll failed: {e}");
        }
    }

    fn hotload_shaders(&mut self) -> Result<(), BackendError> {
        self.renderer = vello::Renderer::new(&self.ctx.device, renderer_options(&self.options))
            .map_err(|e| BackendError::Engine(format!("vello renderer rebuild failed: {e}")))?;
        tracing::info!("vello pipelines rebuilt");
        Ok(())
    }
}

impl Drop for VelloBackend {
    fn drop(&mut self) {
        self.zoom = Magnifier::Off;
        self.offscreen.clear();
        self.headless_present = None;
        self.primary = None;
        tracing::debug!("vello backend released");
    }
}
