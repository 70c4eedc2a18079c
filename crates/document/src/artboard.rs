use crate::animation::AnimationInstance;
use crate::model::{AnimationData, ShapeProperty, ShapeTransform, StateMachineData};
use crate::state_machine::StateMachineInstance;
use crate::view_model::SharedViewModel;
use kurbo::{Affine, Rect};
use pathfiddle_common::Aabb;
use pathfiddle_render::{RenderPaint, RenderPath, Renderer};
use std::rc::Rc;

/// Immutable shape resources built once at import.
#[derive(Debug)]
pub(crate) struct ShapeTemplate {
    pub(crate) name: String,
    pub(crate) path: RenderPath,
    pub(crate) fill: Option<RenderPaint>,
    pub(crate) stroke: Option<RenderPaint>,
    pub(crate) base: ShapeTransform,
    pub(crate) opacity_binding: Option<String>,
}

/// Imported artboard shared by every instance made from it.
#[derive(Debug)]
pub(crate) struct ArtboardDefinition {
    pub(crate) name: String,
    pub(crate) width: f32,
    pub(crate) height: f32,
    pub(crate) clip: bool,
    /// Unit square filled with the background paint, scaled to the artboard.
    pub(crate) background: Option<(RenderPath, RenderPaint)>,
    pub(crate) view_model: Option<usize>,
    pub(crate) shapes: Vec<ShapeTemplate>,
    pub(crate) animations: Vec<Rc<AnimationData>>,
    pub(crate) state_machines: Vec<Rc<StateMachineData>>,
}

/// A live, resizable copy of an artboard with its own animated pose.
#[derive(Debug, Clone)]
pub struct ArtboardInstance {
    def: Rc<ArtboardDefinition>,
    width: f32,
    height: f32,
    poses: Vec<ShapeTransform>,
    view_model: Option<SharedViewModel>,
}

impl ArtboardInstance {
    pub(crate) fn new(def: Rc<ArtboardDefinition>) -> Self {
        let poses = def.shapes.iter().map(|s| s.base).collect();
        Self {
            width: def.width,
            height: def.height,
            poses,
            view_model: None,
            def,
        }
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn set_width(&mut self, width: f32) {
        self.width = width;
    }

    pub fn set_height(&mut self, height: f32) {
        self.height = height;
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_size(self.width, self.height)
    }

    /// Index of the view model this artboard declares, if any.
    pub fn view_model_id(&self) -> Option<usize> {
        self.def.view_model
    }

    pub fn bind_view_model_instance(&mut self, view_model: Option<SharedViewModel>) {
        self.view_model = view_model;
    }

    pub fn view_model_instance(&self) -> Option<&SharedViewModel> {
        self.view_model.as_ref()
    }

    pub fn animation_count(&self) -> usize {
        self.def.animations.len()
    }

    pub fn state_machine_count(&self) -> usize {
        self.def.state_machines.len()
    }

    pub fn animation_at(&self, index: usize) -> Option<AnimationInstance> {
        self.def
            .animations
            .get(index)
            .map(|a| AnimationInstance::new(Rc::clone(a)))
    }

    pub fn animation_named(&self, name: &str) -> Option<AnimationInstance> {
        let index = self.def.animations.iter().position(|a| a.name == name)?;
        self.animation_at(index)
    }

    pub fn state_machine_at(&self, index: usize) -> Option<StateMachineInstance> {
        self.def
            .state_machines
            .get(index)
            .map(|sm| StateMachineInstance::new(Rc::clone(sm), self.def.animations.clone()))
    }

    pub fn shape_count(&self) -> usize {
        self.poses.len()
    }

    pub fn shape_name(&self, index: usize) -> Option<&str> {
        self.def.shapes.get(index).map(|s| s.name.as_str())
    }

    pub fn pose(&self, index: usize) -> Option<&ShapeTransform> {
        self.poses.get(index)
    }

    pub(crate) fn set_property(&mut self, shape: usize, property: ShapeProperty, value: f32) {
        let Some(pose) = self.poses.get_mut(shape) else {
            return;
        };
        match property {
            ShapeProperty::X => pose.x = value,
            ShapeProperty::Y => pose.y = value,
            ShapeProperty::Rotation => pose.rotation = value,
            ShapeProperty::ScaleX => pose.scale_x = value,
            ShapeProperty::ScaleY => pose.scale_y = value,
            ShapeProperty::Opacity => pose.opacity = value,
        }
    }

    /// Restores every shape to its imported transform.
    pub fn reset_pose(&mut self) {
        for (pose, shape) in self.poses.iter_mut().zip(&self.def.shapes) {
            *pose = shape.base;
        }
    }

    fn bound_opacity(&self, shape: &ShapeTemplate) -> f32 {
        match (&shape.opacity_binding, &self.view_model) {
            (Some(property), Some(vm)) => vm.borrow().number(property).unwrap_or(1.0).clamp(0.0, 1.0),
            _ => 1.0,
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        renderer.save();
        if self.def.clip {
            renderer.clip_rect(Rect::new(0.0, 0.0, self.width as f64, self.height as f64));
        }
        if let Some((unit, paint)) = &self.def.background {
            renderer.save();
            renderer.transform(Affine::scale_non_uniform(self.width as f64, self.height as f64));
            renderer.draw_path(unit, paint);
            renderer.restore();
        }

        for (shape, pose) in self.def.shapes.iter().zip(&self.poses) {
            let opacity = pose.opacity.clamp(0.0, 1.0) * self.bound_opacity(shape);
            if opacity <= 0.0 {
                continue;
            }
            renderer.save();
            renderer.transform(
                Affine::translate((pose.x as f64, pose.y as f64))
                    * Affine::rotate(pose.rotation as f64)
                    * Affine::scale_non_uniform(pose.scale_x as f64, pose.scale_y as f64),
            );
            renderer.modulate_opacity(opacity);
            if let Some(fill) = &shape.fill {
                renderer.draw_path(&shape.path, fill);
            }
            if let Some(stroke) = &shape.stroke {
                renderer.draw_path(&shape.path, stroke);
            }
            renderer.restore();
        }
        renderer.restore();
    }
}

#[cfg(test)]
mod tests {
    use crate::document::Document;
    use crate::model::ShapeProperty;
    use crate::sample::sample_document;
    use crate::view_model::ViewModelInstance;
    use pathfiddle_render::{
        CountingFactory, DrawCommand, FrameDescriptor, RecordingRenderer, ResolvedOp, resolve_commands,
        shared_recording,
    };

    fn sample_artboard() -> crate::ArtboardInstance {
        let factory = CountingFactory::new();
        let doc = Document::from_data(sample_document(), &factory).unwrap();
        doc.artboard_default().unwrap()
    }

    #[test]
    fn resize_changes_bounds_only() {
        let mut ab = sample_artboard();
        let shapes = ab.shape_count();
        ab.set_width(800.0);
        ab.set_height(0.0);
        assert_eq!(ab.bounds().width(), 800.0);
        assert!(ab.bounds().is_degenerate());
        assert_eq!(ab.shape_count(), shapes);
    }

    #[test]
    fn set_property_and_reset_pose() {
        let mut ab = sample_artboard();
        let base = *ab.pose(1).unwrap();
        ab.set_property(1, ShapeProperty::X, 7.0);
        assert_eq!(ab.pose(1).unwrap().x, 7.0);
        ab.set_property(99, ShapeProperty::X, 7.0);
        ab.reset_pose();
        assert_eq!(*ab.pose(1).unwrap(), base);
    }

    #[test]
    fn draw_records_clip_background_and_shapes() {
        let ab = sample_artboard();
        let recording = shared_recording();
        let mut r = RecordingRenderer::new(recording.clone(), 400, 300);
        ab.draw(&mut r);
        assert_eq!(r.save_depth(), 0);

        let rec = recording.borrow();
        assert!(matches!(rec.commands()[0], DrawCommand::PushClip { .. }));
        assert!(matches!(rec.commands().last(), Some(DrawCommand::PopClip)));

        let ops = resolve_commands(rec.commands(), &FrameDescriptor::default());
        let draws = ops
            .iter()
            .filter(|op| matches!(op, ResolvedOp::Fill { .. } | ResolvedOp::Stroke { .. }))
            .count();
        // background + ground + ball fill/stroke + star
        assert_eq!(draws, 5);
    }

    #[test]
    fn opacity_binding_hides_shape() {
        let mut ab = sample_artboard();
        let mut vm = ViewModelInstance::from_data(&sample_document().view_models[0]);
        assert!(vm.set_number("glow", 0.0));
        ab.bind_view_model_instance(Some(vm.into_shared()));

        let recording = shared_recording();
        let mut r = RecordingRenderer::new(recording.clone(), 400, 300);
        ab.draw(&mut r);
        let ops = resolve_commands(recording.borrow().commands(), &FrameDescriptor::default())
            .into_iter()
            .filter(|op| matches!(op, ResolvedOp::Fill { .. } | ResolvedOp::Stroke { .. }))
            .count();
        assert_eq!(ops, 3);
    }
}
