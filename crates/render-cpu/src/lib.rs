//! Software backend for the pathfiddle harness.
//!
//! Rasterizes recorded frames with `vello_cpu` into premultiplied RGBA8
//! pixmaps and hands finished frames to an optional presenter.
//!
//! # Invariants
//! - Target edges never exceed [`MAX_TARGET_EDGE`].
//! - Readback returns the frame before the magnifier overlay is composited.

mod backend;
mod convert;

pub use backend::{CpuBackend, MAX_TARGET_EDGE};

pub fn crate_info() -> &'static str {
    "pathfiddle-render-cpu v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render-cpu"));
    }
}
