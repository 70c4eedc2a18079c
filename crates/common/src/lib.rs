//! Shared types for pathfiddle.
//!
//! # Invariants
//! - Colors are packed `0xAARRGGBB`.
//! - Alignment never divides by zero: degenerate bounds map to identity.

mod layout;
mod types;

pub use layout::{Alignment, Fit, compute_alignment};
pub use types::{Aabb, Color, PixelSize};

pub fn crate_info() -> &'static str {
    "pathfiddle-common v0.1.0"
}
