//! Document runtime for the pathfiddle harness.
//!
//! Imports a binary document into shareable artboard definitions, then
//! hands out independent [`ArtboardInstance`]s driven by [`Scene`]s:
//! keyframed animations, state machines, or a static fallback.
//!
//! # Invariants
//! - Import fails as a whole; a partially imported document is never returned.
//! - Render resources are created once per import and shared by instances.
//! - Resizing an artboard instance changes its bounds only, never its shapes.
//! - Scenes and view models are single-threaded (`Rc`).

mod animation;
mod artboard;
mod document;
mod format;
mod model;
mod sample;
mod scene;
mod state_machine;
mod view_model;

pub use animation::{AnimationInstance, sample_keyframes};
pub use artboard::ArtboardInstance;
pub use document::Document;
pub use format::{DocumentError, Encoding, FORMAT_VERSION, MAGIC, decode, encode};
pub use model::{
    AnimationData, ArtboardData, ConditionData, DocumentData, FillData, FillRuleData, KeyframeData, LoopMode,
    PropertyData, ShapeData, ShapeProperty, ShapeTransform, StateData, StateMachineData, StrokeData, TrackData,
    TransitionData, ViewModelData,
};
pub use sample::sample_document;
pub use scene::{Scene, SceneKind, StaticScene};
pub use state_machine::StateMachineInstance;
pub use view_model::{SharedViewModel, ViewModelInstance};

pub fn crate_info() -> &'static str {
    "pathfiddle-document v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("document"));
    }

    #[test]
    fn sample_imports_through_bytes() {
        let bytes = encode(&sample_document(), Encoding::default()).unwrap();
        let doc = Document::import(&bytes, &pathfiddle_render::CountingFactory::new()).unwrap();
        let ab = doc.artboard_default().unwrap();
        assert_eq!(ab.animation_count(), 3);
        assert_eq!(ab.state_machine_count(), 1);
        assert_eq!(ab.name(), "Fiddle");
    }
}
