use crate::config::HarnessConfig;
use crate::scenes::SceneManager;
use pathfiddle_common::{Aabb, PixelSize};
use pathfiddle_render::{Backend, BackendError, HostSurface, Renderer};
use std::time::{Duration, Instant};

const FIRST_FRAME_DELTA: f32 = 1.0 / 60.0;
const FPS_WINDOW: Duration = Duration::from_secs(2);

/// Host input the controller reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    /// The surface changed size; the host should tick immediately.
    Resized,
    Quit,
    ToggleZoom,
    HotloadShaders,
    /// Read back the next finished frame.
    CaptureFrame,
}

/// Pixels read back from a finished frame, RGBA8 top to bottom.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capture {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Ready,
}

/// Window title: `[fps FPS] (xN instances) | label (msaaN) | W x H`.
///
/// The FPS part is omitted while zero and the instance count while one.
/// `(atomic)` replaces the MSAA part when raster ordering is forced off.
pub fn format_title(fps: f64, instances: u32, label: &str, msaa: u32, atomic: bool, size: PixelSize) -> String {
    let mut title = String::new();
    if fps != 0.0 {
        title.push_str(&format!("[{fps:.1} FPS] "));
    }
    if instances > 1 {
        title.push_str(&format!("(x{instances} instances) "));
    }
    if !title.is_empty() {
        title.push_str("| ");
    }
    title.push_str(label);
    if msaa > 0 {
        title.push_str(&format!(" (msaa{msaa})"));
    } else if atomic {
        title.push_str(" (atomic)");
    }
    title.push_str(&format!(" | {} x {}", size.width, size.height));
    title
}

fn run_shader_rebuild(command: &str) {
    let (shell, flag) = if cfg!(target_os = "windows") {
        ("cmd", "/C")
    } else {
        ("sh", "-c")
    };
    match std::process::Command::new(shell).arg(flag).arg(command).status() {
        Ok(status) if status.success() => tracing::info!(command, "shader rebuild finished"),
        Ok(status) => tracing::warn!(command, %status, "shader rebuild failed"),
        Err(e) => tracing::warn!(command, "shader rebuild could not start: {e}"),
    }
}

/// Per-tick driver for one harness session.
///
/// Fields drop in declaration order: scenes, renderer, backend.
pub struct FrameController {
    scenes: SceneManager,
    renderer: Option<Box<dyn Renderer>>,
    backend: Option<Box<dyn Backend>>,
    config: HarnessConfig,
    state: ControllerState,
    running: bool,
    last_size: Option<PixelSize>,
    last_tick: Option<Instant>,
    title_stale: bool,
    hotload_pending: bool,
    capture_pending: bool,
    load_failures: u32,
    fps: f64,
    fps_frames: u32,
    fps_last: Option<Instant>,
    frames: u64,
}

impl FrameController {
    pub fn new(config: HarnessConfig) -> Self {
        Self {
            scenes: SceneManager::new(config.animation, config.state_machine),
            renderer: None,
            backend: None,
            config,
            state: ControllerState::Uninitialized,
            running: true,
            last_size: None,
            last_tick: None,
            title_stale: true,
            hotload_pending: false,
            capture_pending: false,
            load_failures: 0,
            fps: 0.0,
            fps_frames: 0,
            fps_last: None,
            frames: 0,
        }
    }

    /// Takes ownership of the session's backend.
    pub fn init(&mut self, backend: Box<dyn Backend>) {
        tracing::info!(label = %backend.label(), "frame controller ready");
        self.backend = Some(backend);
        self.state = ControllerState::Ready;
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn config(&self) -> &HarnessConfig {
        &self.config
    }

    pub fn scenes(&self) -> &SceneManager {
        &self.scenes
    }

    pub fn scenes_mut(&mut self) -> &mut SceneManager {
        &mut self.scenes
    }

    pub fn backend(&self) -> Option<&dyn Backend> {
        self.backend.as_deref()
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Applies a host event. Zoom toggling errors are fatal to the session.
    pub fn handle_event(&mut self, event: HostEvent) -> Result<(), BackendError> {
        tracing::debug!(?event, "host event");
        match event {
            HostEvent::Resized => {}
            HostEvent::Quit => self.running = false,
            HostEvent::ToggleZoom => {
                if let Some(backend) = &mut self.backend {
                    backend.toggle_zoom_window()?;
                    tracing::info!(enabled = backend.zoom_window_enabled(), "zoom window toggled");
                }
            }
            HostEvent::HotloadShaders => self.hotload_pending = true,
            HostEvent::CaptureFrame if !self.config.options.enable_read_pixels => {
                tracing::warn!("capture ignored: pixel readback is disabled");
            }
            HostEvent::CaptureFrame => self.capture_pending = true,
        }
        Ok(())
    }

    /// Renders one frame. Returns the capture requested by the last
    /// `CaptureFrame` event, if this frame fulfilled it.
    pub fn tick(&mut self, surface: &mut dyn HostSurface, now: Instant) -> Result<Option<Capture>, BackendError> {
        if self.state != ControllerState::Ready || !self.running {
            return Ok(None);
        }
        let Some(backend) = self.backend.as_mut() else {
            return Ok(None);
        };
        let _span = tracing::info_span!("frame", n = self.frames).entered();

        let dt = match self.last_tick {
            Some(last) => now.saturating_duration_since(last).as_secs_f32(),
            None => FIRST_FRAME_DELTA,
        };
        self.last_tick = Some(now);

        let size = if self.config.options.retina_display {
            surface.pixel_size()
        } else {
            surface.logical_size()
        };
        if size.is_empty() {
            return Ok(None);
        }
        let (width, height) = (size.width, size.height);
        let msaa = self.config.msaa_sample_count;
        let atomic = self.config.selection.atomic;

        if self.last_size != Some(size) {
            tracing::info!(width, height, "size changed");
            backend.on_size_changed(surface, width, height, msaa)?;
            self.renderer = Some(backend.make_renderer(width, height));
            self.last_size = Some(size);
            self.title_stale = true;
            self.scenes.resize_artboard(width as f32, height as f32);
        }

        if self.title_stale {
            surface.set_title(&format_title(0.0, 1, &backend.label(), msaa, atomic, size));
            self.title_stale = false;
        }

        if !self.scenes.has_document()
            && let Some(path) = &self.config.document_path
        {
            match self.scenes.load_file(path, backend.factory()) {
                Ok(doc) => {
                    tracing::info!(path = %path.display(), artboards = doc.artboard_count(), "loaded document");
                    self.load_failures = 0;
                }
                Err(e) if self.load_failures == 0 => {
                    tracing::warn!(path = %path.display(), "failed to load document: {e}");
                    self.load_failures += 1;
                }
                Err(e) => {
                    tracing::debug!(path = %path.display(), attempts = self.load_failures, "document still unloadable: {e}");
                    self.load_failures += 1;
                }
            }
        }

        if self.hotload_pending {
            self.hotload_pending = false;
            if let Some(command) = &self.config.shader_rebuild_command {
                run_shader_rebuild(command);
            }
            if let Err(e) = backend.hotload_shaders() {
                tracing::warn!("shader hot reload failed: {e}");
            }
        }

        backend.begin(self.config.frame_descriptor(width, height))?;

        let has_document = self.scenes.has_document();
        if has_document {
            if self.scenes.artboard_count() != 1 || self.scenes.scene_count() != 1 {
                self.scenes.rebuild_scenes(width as f32, height as f32);
            } else {
                self.scenes.advance(dt);
            }
            if let Some(renderer) = self.renderer.as_deref_mut() {
                self.scenes
                    .draw(renderer, Aabb::from_size(width as f32, height as f32));
            }
        }

        let mut pixels = self.capture_pending.then(Vec::new);
        backend.end(surface, pixels.as_mut())?;
        self.frames += 1;

        if has_document {
            self.fps_frames += 1;
            let elapsed = self.fps_last.map(|t| now.saturating_duration_since(t));
            if elapsed.is_none_or(|e| e > FPS_WINDOW) {
                self.fps = elapsed.map_or(0.0, |e| self.fps_frames as f64 / e.as_secs_f64());
                surface.set_title(&format_title(self.fps, 1, &backend.label(), msaa, atomic, size));
                self.fps_frames = 0;
                self.fps_last = Some(now);
            }
        }

        backend.tick();

        let capture = pixels.map(|pixels| {
            self.capture_pending = false;
            tracing::info!(width, height, bytes = pixels.len(), "frame captured");
            Capture { width, height, pixels }
        });
        Ok(capture)
    }

    /// Drops scenes, renderer and backend in that order.
    pub fn shutdown(&mut self) {
        self.scenes = SceneManager::default();
        self.renderer = None;
        if let Some(backend) = self.backend.take() {
            tracing::info!(frames = self.frames, label = %backend.label(), "shutting down");
        }
        self.state = ControllerState::Uninitialized;
    }
}
