//! Backend-agnostic render contract for the pathfiddle harness.
//!
//! One [`Backend`] trait covers every engine/API pairing. Backends hand out
//! [`Renderer`]s that record into a shared per-frame [`FrameRecording`];
//! the backend resolves and submits that recording when it flushes.
//!
//! # Invariants
//! - A backend owns every GPU resource it allocates and releases them before
//!   its device.
//! - `on_size_changed` with an unchanged size and sample count is a no-op.
//! - The magnifier is either off or on with exactly one intermediate surface.
//! - Recording state is `Rc`-shared and never crosses threads.

mod api;
mod backend;
mod engine;
pub mod magnifier;
mod options;
mod recording;
mod surface;

pub use api::{ApiKind, BackendSelection, EngineKind, LoaderOverride, UnknownSelector};
pub use backend::{Backend, BackendError, FlushTarget, FrameGuard, FramePresenter, TargetId};
pub use engine::{
    CountingFactory, FactoryStats, FillRule, Paint, PaintStyle, RenderContext, RenderPaint, RenderPath,
    RenderTarget, Renderer, ResourceFactory,
};
pub use magnifier::{Magnifier, ZoomLayout};
pub use options::{BackendOptions, BackendStats, FrameDescriptor};
pub use recording::{
    DrawCommand, FrameRecording, RecordingRenderer, ResolvedOp, SharedRecording, hairline_width,
    resolve_commands, shared_recording,
};
pub use surface::{HeadlessSurface, HostSurface};

pub fn crate_info() -> &'static str {
    "pathfiddle-render v0.1.0"
}
