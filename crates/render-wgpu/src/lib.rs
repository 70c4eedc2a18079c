//! wgpu backends for the pathfiddle harness.
//!
//! [`VelloBackend`] rasterizes with vello's compute pipeline and presents
//! through a window surface or a headless stand-in texture.
//! [`SurfacePresenter`] puts CPU-rasterized frames on screen.
//!
//! # Invariants
//! - Textures and pipelines are dropped before the device that created them.
//! - A lost or outdated surface is reconfigured and the frame is skipped.
//! - Readback returns tightly packed RGBA8 rows, top to bottom.

mod context;
mod magnifier;
mod presenter;
mod readback;
mod shaders;
mod vello_backend;

pub use context::{GpuContext, instance_flags, wgpu_backends};
pub use presenter::SurfacePresenter;
pub use vello_backend::{VelloBackend, VelloContext, aa_config, renderer_options};

pub fn crate_info() -> &'static str {
    "pathfiddle-render-wgpu v0.1.0"
}
