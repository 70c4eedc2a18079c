use crate::model::*;
use pathfiddle_common::Color;
use std::f32::consts::TAU;

fn keys(pairs: &[(f32, f32)]) -> Vec<KeyframeData> {
    pairs
        .iter()
        .map(|&(time, value)| KeyframeData { time, value })
        .collect()
}

/// Built-in demo document: one artboard exercising fills, strokes, the
/// even-odd rule, every loop mode, a state machine and a view model.
pub fn sample_document() -> DocumentData {
    let ground = ShapeData {
        name: "ground".into(),
        path: "M0 260 L400 260 L400 300 L0 300 Z".into(),
        fill: Some(FillData {
            color: Color(0xff3c6e47),
            rule: FillRuleData::NonZero,
        }),
        stroke: None,
        transform: ShapeTransform::default(),
        opacity_binding: None,
    };
    let ball = ShapeData {
        name: "ball".into(),
        path: "M20 0 A20 20 0 1 1 -20 0 A20 20 0 1 1 20 0 Z".into(),
        fill: Some(FillData {
            color: Color(0xffe8a33d),
            rule: FillRuleData::NonZero,
        }),
        stroke: Some(StrokeData {
            color: Color::WHITE,
            width: 2.0,
        }),
        transform: ShapeTransform {
            x: 200.0,
            y: 100.0,
            ..Default::default()
        },
        opacity_binding: Some("glow".into()),
    };
    let star = ShapeData {
        name: "star".into(),
        path: "M0 -30 L17.6 24.3 L-28.5 -9.3 L28.5 -9.3 L-17.6 24.3 Z".into(),
        fill: Some(FillData {
            color: Color(0xff5b8def),
            rule: FillRuleData::EvenOdd,
        }),
        stroke: None,
        transform: ShapeTransform {
            x: 80.0,
            y: 80.0,
            ..Default::default()
        },
        opacity_binding: None,
    };

    let bounce = AnimationData {
        name: "bounce".into(),
        duration: 1.0,
        loop_mode: LoopMode::Loop,
        tracks: vec![
            TrackData {
                shape: 1,
                property: ShapeProperty::Y,
                keyframes: keys(&[(0.0, 100.0), (0.5, 240.0), (1.0, 100.0)]),
            },
            TrackData {
                shape: 1,
                property: ShapeProperty::ScaleY,
                keyframes: keys(&[(0.0, 1.0), (0.45, 1.0), (0.5, 0.7), (0.55, 1.0), (1.0, 1.0)]),
            },
        ],
    };
    let spin = AnimationData {
        name: "spin".into(),
        duration: 2.0,
        loop_mode: LoopMode::Loop,
        tracks: vec![TrackData {
            shape: 2,
            property: ShapeProperty::Rotation,
            keyframes: keys(&[(0.0, 0.0), (2.0, TAU)]),
        }],
    };
    let fade = AnimationData {
        name: "fade".into(),
        duration: 0.5,
        loop_mode: LoopMode::OneShot,
        tracks: vec![TrackData {
            shape: 1,
            property: ShapeProperty::Opacity,
            keyframes: keys(&[(0.0, 1.0), (0.5, 0.3)]),
        }],
    };

    let main = StateMachineData {
        name: "main".into(),
        initial_state: 0,
        states: vec![
            StateData {
                name: "idle".into(),
                animation: Some(1),
            },
            StateData {
                name: "bounce".into(),
                animation: Some(0),
            },
            StateData {
                name: "fade".into(),
                animation: Some(2),
            },
        ],
        transitions: vec![
            TransitionData {
                from: 0,
                to: 1,
                condition: ConditionData::NumberAbove {
                    property: "energy".into(),
                    value: 0.5,
                },
            },
            TransitionData {
                from: 1,
                to: 2,
                condition: ConditionData::NumberBelow {
                    property: "energy".into(),
                    value: 0.5,
                },
            },
            TransitionData {
                from: 2,
                to: 0,
                condition: ConditionData::AnimationComplete,
            },
        ],
    };

    DocumentData {
        artboards: vec![ArtboardData {
            name: "Fiddle".into(),
            width: 400.0,
            height: 300.0,
            clip: true,
            background: Some(Color(0xff1e1e24)),
            view_model: Some(0),
            shapes: vec![ground, ball, star],
            animations: vec![bounce, spin, fade],
            state_machines: vec![main],
        }],
        view_models: vec![ViewModelData {
            name: "Controls".into(),
            properties: vec![
                PropertyData {
                    name: "energy".into(),
                    value: 1.0,
                },
                PropertyData {
                    name: "glow".into(),
                    value: 1.0,
                },
            ],
        }],
    }
}
