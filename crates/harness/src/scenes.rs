use kurbo::Affine;
use pathfiddle_common::{Aabb, Alignment, Fit, compute_alignment};
use pathfiddle_document::{
    ArtboardInstance, Document, DocumentError, Scene, SceneKind, SharedViewModel, StaticScene, ViewModelInstance,
};
use pathfiddle_render::{Renderer, ResourceFactory};
use std::path::Path;
use std::rc::Rc;

/// Picks the scene for `artboard`: explicit state machine, explicit
/// animation, first state machine, first animation, then static.
fn select_scene(artboard: &ArtboardInstance, state_machine: Option<usize>, animation: Option<usize>) -> Box<dyn Scene> {
    if let Some(index) = state_machine {
        match artboard.state_machine_at(index) {
            Some(sm) => return Box::new(sm),
            None => tracing::warn!(
                index,
                count = artboard.state_machine_count(),
                "state machine index out of range"
            ),
        }
    }
    if let Some(index) = animation {
        match artboard.animation_at(index) {
            Some(anim) => return Box::new(anim),
            None => tracing::warn!(index, count = artboard.animation_count(), "animation index out of range"),
        }
    }
    if let Some(sm) = artboard.state_machine_at(0) {
        return Box::new(sm);
    }
    if let Some(anim) = artboard.animation_at(0) {
        return Box::new(anim);
    }
    Box::new(StaticScene::new())
}

/// Owns the loaded document and the live artboard/scene/view-model triple.
///
/// Fields drop in declaration order: scene, artboard, view model, document.
#[derive(Default)]
pub struct SceneManager {
    scene: Option<Box<dyn Scene>>,
    artboard: Option<ArtboardInstance>,
    view_model: Option<SharedViewModel>,
    document: Option<Document>,
    animation: Option<usize>,
    state_machine: Option<usize>,
}

impl SceneManager {
    pub fn new(animation: Option<usize>, state_machine: Option<usize>) -> Self {
        Self {
            animation,
            state_machine,
            ..Self::default()
        }
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn has_document(&self) -> bool {
        self.document.is_some()
    }

    /// Imports `bytes`, replacing the current document and dropping its
    /// scenes. On error nothing changes.
    pub fn load(&mut self, bytes: &[u8], factory: &dyn ResourceFactory) -> Result<&Document, DocumentError> {
        if bytes.is_empty() {
            return Err(DocumentError::Empty);
        }
        let document = Document::import(bytes, factory)?;
        self.clear_scene();
        tracing::info!(
            artboards = document.artboard_count(),
            view_models = document.view_model_count(),
            "document loaded"
        );
        Ok(self.document.insert(document))
    }

    pub fn load_file(&mut self, path: &Path, factory: &dyn ResourceFactory) -> Result<&Document, DocumentError> {
        let bytes = std::fs::read(path)?;
        self.load(&bytes, factory)
    }

    fn clear_scene(&mut self) {
        self.scene = None;
        self.artboard = None;
        self.view_model = None;
    }

    /// Re-instantiates the default artboard at `width`x`height` and selects
    /// its scene. Without a document this only clears.
    pub fn rebuild_scenes(&mut self, width: f32, height: f32) {
        self.clear_scene();
        let Some(document) = &self.document else {
            return;
        };
        let Some(mut artboard) = document.artboard_default() else {
            return;
        };
        artboard.set_width(width);
        artboard.set_height(height);

        let mut scene = select_scene(&artboard, self.state_machine, self.animation);
        let view_model = document
            .create_view_model_instance_for(&artboard)
            .map(ViewModelInstance::into_shared);
        if let Some(vm) = &view_model {
            artboard.bind_view_model_instance(Some(Rc::clone(vm)));
            scene.bind_view_model_instance(Rc::clone(vm));
        }

        tracing::info!(
            artboard = artboard.name(),
            scene = scene.name(),
            kind = %scene.kind(),
            width,
            height,
            "scene rebuilt"
        );
        self.view_model = view_model;
        self.artboard = Some(artboard);
        self.scene = Some(scene);
    }

    /// Advances the live scene; false when there is none or it has settled.
    pub fn advance(&mut self, seconds: f32) -> bool {
        match (&mut self.scene, &mut self.artboard) {
            (Some(scene), Some(artboard)) => scene.advance_and_apply(artboard, seconds),
            _ => false,
        }
    }

    pub fn resize_artboard(&mut self, width: f32, height: f32) {
        if let Some(artboard) = &mut self.artboard {
            artboard.set_width(width);
            artboard.set_height(height);
        }
    }

    /// Contain/center transform from artboard bounds into `frame`.
    pub fn alignment(&self, frame: Aabb) -> Affine {
        match &self.artboard {
            Some(artboard) => compute_alignment(Fit::Contain, Alignment::CENTER, frame, artboard.bounds()),
            None => Affine::IDENTITY,
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer, frame: Aabb) {
        let (Some(scene), Some(artboard)) = (&self.scene, &self.artboard) else {
            return;
        };
        renderer.save();
        renderer.transform(self.alignment(frame));
        scene.draw(artboard, renderer);
        renderer.restore();
    }

    pub fn artboard(&self) -> Option<&ArtboardInstance> {
        self.artboard.as_ref()
    }

    pub fn view_model(&self) -> Option<&SharedViewModel> {
        self.view_model.as_ref()
    }

    pub fn artboard_count(&self) -> usize {
        usize::from(self.artboard.is_some())
    }

    pub fn scene_count(&self) -> usize {
        usize::from(self.scene.is_some())
    }

    pub fn scene_kind(&self) -> Option<SceneKind> {
        self.scene.as_ref().map(|s| s.kind())
    }

    pub fn scene_name(&self) -> Option<&str> {
        self.scene.as_ref().map(|s| s.name())
    }
}
