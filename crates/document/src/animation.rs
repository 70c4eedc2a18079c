use crate::artboard::ArtboardInstance;
use crate::model::{AnimationData, KeyframeData, LoopMode};
use crate::scene::{Scene, SceneKind};
use crate::view_model::SharedViewModel;
use std::rc::Rc;

/// Playback state of one keyframed animation.
#[derive(Debug, Clone)]
pub struct AnimationInstance {
    animation: Rc<AnimationData>,
    time: f32,
    direction: f32,
    complete: bool,
}

impl AnimationInstance {
    pub fn new(animation: Rc<AnimationData>) -> Self {
        Self {
            animation,
            time: 0.0,
            direction: 1.0,
            complete: false,
        }
    }

    pub fn duration(&self) -> f32 {
        self.animation.duration
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn loop_mode(&self) -> LoopMode {
        self.animation.loop_mode
    }

    /// Only one-shot animations complete.
    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// Moves the playhead by `seconds`. Returns false once a one-shot has
    /// finished.
    pub fn advance(&mut self, seconds: f32) -> bool {
        let duration = self.animation.duration;
        if duration <= 0.0 {
            self.time = 0.0;
            self.complete = self.animation.loop_mode == LoopMode::OneShot;
            return !self.complete;
        }

        match self.animation.loop_mode {
            LoopMode::OneShot => {
                self.time = (self.time + seconds).min(duration);
                self.complete = self.time >= duration;
            }
            LoopMode::Loop => {
                self.time = (self.time + seconds).rem_euclid(duration);
            }
            LoopMode::PingPong => {
                let period = duration * 2.0;
                let phase = if self.direction > 0.0 {
                    self.time
                } else {
                    period - self.time
                };
                let phase = (phase + seconds).rem_euclid(period);
                if phase <= duration {
                    self.time = phase;
                    self.direction = 1.0;
                } else {
                    self.time = period - phase;
                    self.direction = -1.0;
                }
            }
        }
        !self.complete
    }

    /// Writes the pose at the current time into `artboard`.
    pub fn apply(&self, artboard: &mut ArtboardInstance) {
        for track in &self.animation.tracks {
            if let Some(value) = sample_keyframes(&track.keyframes, self.time) {
                artboard.set_property(track.shape, track.property, value);
            }
        }
    }
}

/// Linear interpolation over time-sorted keyframes, holding the end values.
pub fn sample_keyframes(keyframes: &[KeyframeData], time: f32) -> Option<f32> {
    let first = keyframes.first()?;
    let last = keyframes.last()?;
    if time <= first.time {
        return Some(first.value);
    }
    if time >= last.time {
        return Some(last.value);
    }
    let next = keyframes.iter().position(|k| k.time > time)?;
    let (a, b) = (keyframes[next - 1], keyframes[next]);
    let span = b.time - a.time;
    if span <= f32::EPSILON {
        return Some(b.value);
    }
    let t = (time - a.time) / span;
    Some(a.value + (b.value - a.value) * t)
}

impl Scene for AnimationInstance {
    fn name(&self) -> &str {
        &self.animation.name
    }

    fn kind(&self) -> SceneKind {
        SceneKind::Animation
    }

    fn advance_and_apply(&mut self, artboard: &mut ArtboardInstance, seconds: f32) -> bool {
        let playing = self.advance(seconds);
        self.apply(artboard);
        playing
    }

    fn bind_view_model_instance(&mut self, _view_model: SharedViewModel) {}

    fn duration_secs(&self) -> Option<f32> {
        Some(self.animation.duration)
    }
}
