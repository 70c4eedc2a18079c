use crate::artboard::ArtboardInstance;
use crate::view_model::SharedViewModel;
use pathfiddle_render::Renderer;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneKind {
    StateMachine,
    Animation,
    Static,
}

impl fmt::Display for SceneKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SceneKind::StateMachine => "state machine",
            SceneKind::Animation => "animation",
            SceneKind::Static => "static",
        })
    }
}

/// A time-advanceable drawable unit driving one artboard.
pub trait Scene {
    fn name(&self) -> &str;

    fn kind(&self) -> SceneKind;

    /// Advances by `seconds` and writes the result into `artboard`.
    /// Returns false once further advancing changes nothing.
    fn advance_and_apply(&mut self, artboard: &mut ArtboardInstance, seconds: f32) -> bool;

    fn bind_view_model_instance(&mut self, view_model: SharedViewModel);

    /// `None` for scenes without a fixed length.
    fn duration_secs(&self) -> Option<f32> {
        None
    }

    fn draw(&self, artboard: &ArtboardInstance, renderer: &mut dyn Renderer) {
        artboard.draw(renderer);
    }
}

/// Fallback scene for artboards with no animations or state machines.
#[derive(Debug, Clone, Default)]
pub struct StaticScene {
    view_model: Option<SharedViewModel>,
}

impl StaticScene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn view_model(&self) -> Option<&SharedViewModel> {
        self.view_model.as_ref()
    }
}

impl Scene for StaticScene {
    fn name(&self) -> &str {
        "static"
    }

    fn kind(&self) -> SceneKind {
        SceneKind::Static
    }

    fn advance_and_apply(&mut self, _artboard: &mut ArtboardInstance, _seconds: f32) -> bool {
        false
    }

    fn bind_view_model_instance(&mut self, view_model: SharedViewModel) {
        self.view_model = Some(view_model);
    }

    fn duration_secs(&self) -> Option<f32> {
        Some(0.0)
    }
}
