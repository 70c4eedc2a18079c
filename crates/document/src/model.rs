use pathfiddle_common::Color;
use serde::{Deserialize, Serialize};

/// Serialized document contents.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DocumentData {
    pub artboards: Vec<ArtboardData>,
    #[serde(default)]
    pub view_models: Vec<ViewModelData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewModelData {
    pub name: String,
    pub properties: Vec<PropertyData>,
}

/// Numeric view-model property with its initial value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyData {
    pub name: String,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtboardData {
    pub name: String,
    pub width: f32,
    pub height: f32,
    #[serde(default = "default_true")]
    pub clip: bool,
    pub background: Option<Color>,
    /// Index into `DocumentData::view_models`.
    pub view_model: Option<usize>,
    pub shapes: Vec<ShapeData>,
    #[serde(default)]
    pub animations: Vec<AnimationData>,
    #[serde(default)]
    pub state_machines: Vec<StateMachineData>,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShapeData {
    pub name: String,
    /// SVG path data in shape-local coordinates.
    pub path: String,
    pub fill: Option<FillData>,
    pub stroke: Option<StrokeData>,
    #[serde(default)]
    pub transform: ShapeTransform,
    /// View-model property multiplied into the shape's opacity.
    pub opacity_binding: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FillData {
    pub color: Color,
    #[serde(default)]
    pub rule: FillRuleData,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FillRuleData {
    #[default]
    NonZero,
    EvenOdd,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StrokeData {
    pub color: Color,
    pub width: f32,
}

/// Animatable shape properties. Rotation is in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShapeTransform {
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub scale_x: f32,
    pub scale_y: f32,
    pub opacity: f32,
}

impl Default for ShapeTransform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            opacity: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeProperty {
    X,
    Y,
    Rotation,
    ScaleX,
    ScaleY,
    Opacity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LoopMode {
    OneShot,
    #[default]
    Loop,
    PingPong,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationData {
    pub name: String,
    /// Seconds.
    pub duration: f32,
    #[serde(default)]
    pub loop_mode: LoopMode,
    pub tracks: Vec<TrackData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrackData {
    /// Index into the artboard's shapes.
    pub shape: usize,
    pub property: ShapeProperty,
    pub keyframes: Vec<KeyframeData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KeyframeData {
    pub time: f32,
    pub value: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateMachineData {
    pub name: String,
    #[serde(default)]
    pub initial_state: usize,
    pub states: Vec<StateData>,
    #[serde(default)]
    pub transitions: Vec<TransitionData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateData {
    pub name: String,
    /// Index into the artboard's animations; `None` holds the current pose.
    pub animation: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitionData {
    pub from: usize,
    pub to: usize,
    pub condition: ConditionData,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ConditionData {
    /// The source state's one-shot animation reached its end.
    AnimationComplete,
    NumberAbove { property: String, value: f32 },
    NumberBelow { property: String, value: f32 },
}
