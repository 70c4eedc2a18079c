use crate::engine::{RenderContext, RenderTarget, Renderer, ResourceFactory};
use crate::options::{BackendStats, FrameDescriptor};
use crate::surface::HostSurface;
use std::fmt;

/// Errors from backend setup and frame control.
///
/// Setup errors are fatal to the harness; there is no degraded mode.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("{0} backend is not available in this build")]
    Unsupported(String),
    #[error("no GPU adapter found{}", filter_suffix(.0))]
    NoAdapter(Option<String>),
    #[error("device request failed: {0}")]
    Device(String),
    #[error("surface error: {0}")]
    Surface(String),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("target {width}x{height} exceeds the engine limit of {limit}")]
    TargetTooLarge { width: u32, height: u32, limit: u32 },
    #[error("frame state error: {0}")]
    FrameState(&'static str),
    #[error("unknown offscreen target {0}")]
    UnknownTarget(TargetId),
    #[error("pixel readback failed: {0}")]
    Readback(String),
    #[error("pixel readback is disabled for this backend")]
    ReadPixelsDisabled,
}

fn filter_suffix(filter: &Option<String>) -> String {
    match filter {
        Some(f) => format!(" matching \"{f}\""),
        None => String::new(),
    }
}

/// Handle to an offscreen render target owned by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u32);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Destination of a flush.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTarget {
    Primary,
    Offscreen(TargetId),
}

/// Uniform frame-control contract over one engine/API pairing.
///
/// Call order per frame is `begin`, drawing through a renderer from
/// `make_renderer`, optional offscreen `flush`es, then `end`. All calls happen
/// on one thread.
pub trait Backend {
    /// Engine label used in the window title.
    fn label(&self) -> String;

    /// Backing-pixel / logical-size ratio for `surface`.
    fn dpi_scale(&self, surface: &dyn HostSurface) -> f32;

    fn factory(&self) -> &dyn ResourceFactory;

    /// `None` for engines without a GPU context.
    fn render_context(&mut self) -> Option<&mut dyn RenderContext>;

    /// `None` until the first `on_size_changed`.
    fn render_target(&self) -> Option<&dyn RenderTarget>;

    /// Reallocates size-dependent state. A no-op for an unchanged size and
    /// sample count.
    fn on_size_changed(
        &mut self,
        surface: &dyn HostSurface,
        width: u32,
        height: u32,
        sample_count: u32,
    ) -> Result<(), BackendError>;

    fn make_renderer(&mut self, width: u32, height: u32) -> Box<dyn Renderer>;

    /// Flips the magnifier on or off, allocating or releasing its surface.
    fn toggle_zoom_window(&mut self) -> Result<(), BackendError>;

    fn zoom_window_enabled(&self) -> bool;

    /// Opens a frame. Fails if a frame is already open.
    fn begin(&mut self, frame: FrameDescriptor) -> Result<(), BackendError>;

    /// Submits recorded drawing to the primary or an offscreen target.
    fn flush(&mut self, target: FlushTarget) -> Result<(), BackendError>;

    /// Flushes the primary target, reads it back into `pixels` when given,
    /// composites the magnifier and presents.
    fn end(
        &mut self,
        surface: &dyn HostSurface,
        pixels: Option<&mut Vec<u8>>,
    ) -> Result<(), BackendError>;

    fn create_offscreen_target(&mut self, width: u32, height: u32) -> Result<TargetId, BackendError>;

    /// Returns false if `id` was not live.
    fn release_offscreen_target(&mut self, id: TargetId) -> bool;

    fn read_offscreen_pixels(&mut self, id: TargetId, pixels: &mut Vec<u8>) -> Result<(), BackendError>;

    fn stats(&self) -> BackendStats;

    /// Per-frame bookkeeping after `end`.
    fn tick(&mut self) {}

    /// Rebuilds engine shaders/pipelines.
    fn hotload_shaders(&mut self) -> Result<(), BackendError> {
        Ok(())
    }
}

/// Presents finished RGBA8 frames for engines that rasterize on the CPU.
pub trait FramePresenter {
    fn resize(&mut self, width: u32, height: u32) -> Result<(), BackendError>;
    fn present(&mut self, rgba: &[u8], width: u32, height: u32) -> Result<(), BackendError>;
}

/// Shared begin/end bookkeeping.
#[derive(Debug, Default)]
pub struct FrameGuard {
    open: Option<FrameDescriptor>,
    frames: u64,
}

impl FrameGuard {
    pub fn begin(&mut self, frame: FrameDescriptor) -> Result<(), BackendError> {
        if self.open.is_some() {
            return Err(BackendError::FrameState("begin called while a frame is open"));
        }
        self.open = Some(frame);
        Ok(())
    }

    pub fn current(&self) -> Result<&FrameDescriptor, BackendError> {
        self.open
            .as_ref()
            .ok_or(BackendError::FrameState("no frame is open"))
    }

    pub fn descriptor(&self) -> Option<&FrameDescriptor> {
        self.open.as_ref()
    }

    pub fn end(&mut self) -> Result<FrameDescriptor, BackendError> {
        let frame = self
            .open
            .take()
            .ok_or(BackendError::FrameState("end called without begin"))?;
        self.frames += 1;
        Ok(frame)
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_guard_rejects_double_begin() {
        let mut g = FrameGuard::default();
        g.begin(FrameDescriptor::new(1, 1)).unwrap();
        assert!(matches!(
            g.begin(FrameDescriptor::new(1, 1)),
            Err(BackendError::FrameState(_))
        ));
        g.end().unwrap();
        assert_eq!(g.frames(), 1);
        assert!(g.end().is_err());
        assert!(g.current().is_err());
    }

    #[test]
    fn error_messages() {
        let e = BackendError::NoAdapter(Some("nvidia".into()));
        assert_eq!(e.to_string(), "no GPU adapter found matching \"nvidia\"");
        assert_eq!(BackendError::NoAdapter(None).to_string(), "no GPU adapter found");
        let e = BackendError::UnknownTarget(TargetId(3));
        assert_eq!(e.to_string(), "unknown offscreen target #3");
    }
}
