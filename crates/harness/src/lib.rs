//! Session driver for the pathfiddle harness.
//!
//! [`create_backend`] picks one backend for the requested API and engine;
//! [`FrameController`] owns it together with a [`SceneManager`] and runs the
//! per-tick lifecycle: resize, title, document load, hot reload, draw, present.
//!
//! # Invariants
//! - `on_size_changed` runs exactly once per distinct surface size.
//! - After a scene rebuild there is exactly one artboard and one scene.
//! - A failed document load leaves the previous state untouched.
//! - Scenes and renderer are dropped before the backend.

mod args;
mod config;
mod controller;
mod factory;
mod scenes;

pub use args::HarnessArgs;
pub use config::HarnessConfig;
pub use controller::{Capture, ControllerState, FrameController, HostEvent, format_title};
pub use factory::create_backend;
pub use scenes::SceneManager;

pub fn crate_info() -> &'static str {
    "pathfiddle-harness v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("harness"));
    }
}
