use crate::artboard::{ArtboardDefinition, ArtboardInstance, ShapeTemplate};
use crate::format::{DocumentError, Encoding, decode, encode};
use crate::model::{ArtboardData, ConditionData, DocumentData, FillRuleData, ShapeData, ViewModelData};
use crate::sample::sample_document;
use crate::view_model::ViewModelInstance;
use kurbo::{BezPath, Rect, Shape};
use pathfiddle_render::{FillRule, Paint, ResourceFactory};
use std::path::Path;
use std::rc::Rc;

/// An imported document. Render resources are created once through the
/// factory and shared by every artboard instance.
#[derive(Debug)]
pub struct Document {
    artboards: Vec<Rc<ArtboardDefinition>>,
    view_models: Vec<ViewModelData>,
    source: DocumentData,
}

impl Document {
    /// Decodes and imports a serialized document.
    pub fn import(bytes: &[u8], factory: &dyn ResourceFactory) -> Result<Self, DocumentError> {
        Self::from_data(decode(bytes)?, factory)
    }

    pub fn read_file(path: impl AsRef<Path>, factory: &dyn ResourceFactory) -> Result<Self, DocumentError> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::import(&bytes, factory)
    }

    /// The built-in demo document.
    pub fn sample(factory: &dyn ResourceFactory) -> Result<Self, DocumentError> {
        Self::from_data(sample_document(), factory)
    }

    pub fn from_data(data: DocumentData, factory: &dyn ResourceFactory) -> Result<Self, DocumentError> {
        if data.artboards.is_empty() {
            return Err(DocumentError::NoArtboards);
        }
        let artboards = data
            .artboards
            .iter()
            .cloned()
            .map(|ab| import_artboard(ab, data.view_models.len(), factory).map(Rc::new))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            artboards = artboards.len(),
            view_models = data.view_models.len(),
            "document imported"
        );
        Ok(Self {
            artboards,
            view_models: data.view_models.clone(),
            source: data,
        })
    }

    /// Re-encodes the document as imported.
    pub fn to_bytes(&self, encoding: Encoding) -> Result<Vec<u8>, DocumentError> {
        encode(&self.source, encoding)
    }

    pub fn artboard_count(&self) -> usize {
        self.artboards.len()
    }

    pub fn artboard_names(&self) -> impl Iterator<Item = &str> {
        self.artboards.iter().map(|a| a.name.as_str())
    }

    /// Instance of the first artboard.
    pub fn artboard_default(&self) -> Option<ArtboardInstance> {
        self.artboard_at(0)
    }

    pub fn artboard_at(&self, index: usize) -> Option<ArtboardInstance> {
        self.artboards
            .get(index)
            .map(|def| ArtboardInstance::new(Rc::clone(def)))
    }

    pub fn artboard_named(&self, name: &str) -> Option<ArtboardInstance> {
        self.artboards
            .iter()
            .find(|a| a.name == name)
            .map(|def| ArtboardInstance::new(Rc::clone(def)))
    }

    pub fn view_model_count(&self) -> usize {
        self.view_models.len()
    }

    pub fn create_view_model_instance(&self, index: usize) -> Option<ViewModelInstance> {
        self.view_models.get(index).map(ViewModelInstance::from_data)
    }

    /// Default view model for an artboard: the one it declares, else the
    /// document's first.
    pub fn create_view_model_instance_for(&self, artboard: &ArtboardInstance) -> Option<ViewModelInstance> {
        let index = artboard.view_model_id().unwrap_or(0);
        self.create_view_model_instance(index)
    }
}

fn invalid(artboard: &str, what: impl std::fmt::Display) -> DocumentError {
    DocumentError::Invalid(format!("artboard \"{artboard}\": {what}"))
}

fn import_artboard(
    data: ArtboardData,
    view_model_count: usize,
    factory: &dyn ResourceFactory,
) -> Result<ArtboardDefinition, DocumentError> {
    let name = data.name.as_str();
    if !(data.width.is_finite() && data.height.is_finite()) || data.width < 0.0 || data.height < 0.0 {
        return Err(invalid(name, format_args!("bad size {}x{}", data.width, data.height)));
    }
    if let Some(vm) = data.view_model
        && vm >= view_model_count
    {
        return Err(invalid(name, format_args!("view model {vm} out of range")));
    }

    let shape_count = data.shapes.len();
    for anim in &data.animations {
        if !anim.duration.is_finite() || anim.duration < 0.0 {
            return Err(invalid(name, format_args!("animation \"{}\" has bad duration", anim.name)));
        }
        for track in &anim.tracks {
            if track.shape >= shape_count {
                return Err(invalid(
                    name,
                    format_args!("animation \"{}\" targets missing shape {}", anim.name, track.shape),
                ));
            }
            if track.keyframes.windows(2).any(|w| w[1].time < w[0].time) {
                return Err(invalid(name, format_args!("animation \"{}\" has unsorted keyframes", anim.name)));
            }
        }
    }

    let animation_count = data.animations.len();
    for sm in &data.state_machines {
        let state_count = sm.states.len();
        if state_count == 0 || sm.initial_state >= state_count {
            return Err(invalid(name, format_args!("state machine \"{}\" has no valid initial state", sm.name)));
        }
        if sm.states.iter().any(|s| s.animation.is_some_and(|a| a >= animation_count)) {
            return Err(invalid(name, format_args!("state machine \"{}\" names a missing animation", sm.name)));
        }
        if sm.transitions.iter().any(|t| t.from >= state_count || t.to >= state_count) {
            return Err(invalid(name, format_args!("state machine \"{}\" has a dangling transition", sm.name)));
        }
        if sm.transitions.iter().any(|t| match &t.condition {
            ConditionData::NumberAbove { property, .. } | ConditionData::NumberBelow { property, .. } => {
                property.is_empty()
            }
            ConditionData::AnimationComplete => false,
        }) {
            return Err(invalid(name, format_args!("state machine \"{}\" has an unnamed condition", sm.name)));
        }
    }

    let background = data.background.map(|color| {
        let unit = Rect::new(0.0, 0.0, 1.0, 1.0).to_path(0.1);
        (
            factory.make_path(unit, FillRule::NonZero),
            factory.make_paint(Paint::fill(color)),
        )
    });

    let shapes = data
        .shapes
        .into_iter()
        .map(|shape| import_shape(shape, factory))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ArtboardDefinition {
        name: data.name,
        width: data.width,
        height: data.height,
        clip: data.clip,
        background,
        view_model: data.view_model,
        shapes,
        animations: data.animations.into_iter().map(Rc::new).collect(),
        state_machines: data.state_machines.into_iter().map(Rc::new).collect(),
    })
}

fn import_shape(shape: ShapeData, factory: &dyn ResourceFactory) -> Result<ShapeTemplate, DocumentError> {
    let bez = BezPath::from_svg(&shape.path).map_err(|e| DocumentError::PathData {
        shape: shape.name.clone(),
        reason: e.to_string(),
    })?;
    let rule = match shape.fill.map(|f| f.rule).unwrap_or_default() {
        FillRuleData::NonZero => FillRule::NonZero,
        FillRuleData::EvenOdd => FillRule::EvenOdd,
    };
    Ok(ShapeTemplate {
        path: factory.make_path(bez, rule),
        fill: shape.fill.map(|f| factory.make_paint(Paint::fill(f.color))),
        stroke: shape
            .stroke
            .map(|s| factory.make_paint(Paint::stroke(s.color, s.width as f64))),
        base: shape.transform,
        opacity_binding: shape.opacity_binding,
        name: shape.name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{StateData, StateMachineData, TransitionData};
    use pathfiddle_render::CountingFactory;
    use std::io::Write;

    #[test]
    fn import_builds_resources_once() {
        let factory = CountingFactory::new();
        let doc = Document::from_data(sample_document(), &factory).unwrap();
        let before = factory.stats();
        assert_eq!(doc.artboard_count(), 1);
        assert_eq!(doc.artboard_names().collect::<Vec<_>>(), ["Fiddle"]);

        let a = doc.artboard_default().unwrap();
        let b = doc.artboard_named("Fiddle").unwrap();
        assert_eq!(a.width(), 400.0);
        assert_eq!(b.height(), 300.0);
        assert_eq!(factory.stats(), before);
        assert!(doc.artboard_at(1).is_none());
        assert!(doc.artboard_named("nope").is_none());
    }

    #[test]
    fn to_bytes_reimports_identically() {
        let factory = CountingFactory::new();
        let doc = Document::sample(&factory).unwrap();
        let bytes = doc.to_bytes(Encoding::Cbor).unwrap();
        let again = Document::import(&bytes, &factory).unwrap();
        assert_eq!(again.to_bytes(Encoding::Cbor).unwrap(), bytes);
        assert_eq!(again.artboard_count(), doc.artboard_count());
    }

    #[test]
    fn zero_artboards_rejected() {
        let factory = CountingFactory::new();
        let err = Document::from_data(DocumentData::default(), &factory).unwrap_err();
        assert!(matches!(err, DocumentError::NoArtboards));
    }

    #[test]
    fn bad_path_data_rejected() {
        let mut data = sample_document();
        data.artboards[0].shapes[0].path = "L 10 10".into();
        let err = Document::from_data(data, &CountingFactory::new()).unwrap_err();
        assert!(matches!(err, DocumentError::PathData { ref shape, .. } if shape == "ground"));
    }

    #[test]
    fn dangling_references_rejected() {
        let factory = CountingFactory::new();

        let mut data = sample_document();
        data.artboards[0].animations[0].tracks[0].shape = 42;
        assert!(matches!(Document::from_data(data, &factory), Err(DocumentError::Invalid(_))));

        let mut data = sample_document();
        data.artboards[0].view_model = Some(5);
        assert!(matches!(Document::from_data(data, &factory), Err(DocumentError::Invalid(_))));

        let mut data = sample_document();
        data.artboards[0].state_machines.push(StateMachineData {
            name: "broken".into(),
            initial_state: 0,
            states: vec![StateData {
                name: "only".into(),
                animation: None,
            }],
            transitions: vec![TransitionData {
                from: 0,
                to: 3,
                condition: ConditionData::AnimationComplete,
            }],
        });
        assert!(matches!(Document::from_data(data, &factory), Err(DocumentError::Invalid(_))));
    }

    #[test]
    fn view_model_defaults() {
        let factory = CountingFactory::new();
        let doc = Document::from_data(sample_document(), &factory).unwrap();
        let ab = doc.artboard_default().unwrap();
        let vm = doc.create_view_model_instance_for(&ab).unwrap();
        assert_eq!(vm.name(), "Controls");
        assert_eq!(vm.number("energy"), Some(1.0));
        assert!(doc.create_view_model_instance(3).is_none());
    }

    #[test]
    fn read_file_round_trips_through_disk() {
        let bytes = encode(&sample_document(), Encoding::CborZstd).unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let doc = Document::read_file(file.path(), &CountingFactory::new()).unwrap();
        assert_eq!(doc.view_model_count(), 1);

        let missing = file.path().with_extension("missing");
        assert!(matches!(
            Document::read_file(missing, &CountingFactory::new()),
            Err(DocumentError::Io(_))
        ));
    }
}
