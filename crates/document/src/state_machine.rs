use crate::animation::AnimationInstance;
use crate::artboard::ArtboardInstance;
use crate::model::{AnimationData, ConditionData, StateMachineData};
use crate::scene::{Scene, SceneKind};
use crate::view_model::SharedViewModel;
use std::rc::Rc;

/// Running state machine: one active state, each playing at most one
/// animation, with transitions evaluated after every advance.
#[derive(Debug, Clone)]
pub struct StateMachineInstance {
    machine: Rc<StateMachineData>,
    animations: Vec<Rc<AnimationData>>,
    current: usize,
    player: Option<AnimationInstance>,
    view_model: Option<SharedViewModel>,
    transitions_taken: u64,
    entered: bool,
}

impl StateMachineInstance {
    pub(crate) fn new(machine: Rc<StateMachineData>, animations: Vec<Rc<AnimationData>>) -> Self {
        let mut sm = Self {
            current: machine.initial_state,
            machine,
            animations,
            player: None,
            view_model: None,
            transitions_taken: 0,
            entered: false,
        };
        sm.player = sm.player_for(sm.current);
        sm
    }

    fn player_for(&self, state: usize) -> Option<AnimationInstance> {
        let index = self.machine.states.get(state)?.animation?;
        self.animations
            .get(index)
            .map(|a| AnimationInstance::new(Rc::clone(a)))
    }

    pub fn current_state(&self) -> usize {
        self.current
    }

    pub fn current_state_name(&self) -> &str {
        self.machine
            .states
            .get(self.current)
            .map(|s| s.name.as_str())
            .unwrap_or("")
    }

    pub fn transitions_taken(&self) -> u64 {
        self.transitions_taken
    }

    fn condition_met(&self, condition: &ConditionData) -> bool {
        let number = |property: &str| {
            self.view_model
                .as_ref()
                .and_then(|vm| vm.borrow().number(property))
        };
        match condition {
            ConditionData::AnimationComplete => self.player.as_ref().is_none_or(|p| p.is_complete()),
            ConditionData::NumberAbove { property, value } => number(property).is_some_and(|n| n > *value),
            ConditionData::NumberBelow { property, value } => number(property).is_some_and(|n| n < *value),
        }
    }

    fn enter(&mut self, state: usize, artboard: &mut ArtboardInstance) {
        tracing::debug!(
            machine = %self.machine.name,
            from = self.current,
            to = state,
            "state transition"
        );
        self.current = state;
        self.player = self.player_for(state);
        self.transitions_taken += 1;
        if let Some(player) = &self.player {
            player.apply(artboard);
        }
    }
}

impl Scene for StateMachineInstance {
    fn name(&self) -> &str {
        &self.machine.name
    }

    fn kind(&self) -> SceneKind {
        SceneKind::StateMachine
    }

    fn advance_and_apply(&mut self, artboard: &mut ArtboardInstance, seconds: f32) -> bool {
        let mut changed = !self.entered;
        self.entered = true;

        if let Some(player) = &mut self.player {
            changed |= player.advance(seconds);
            player.apply(artboard);
        }

        let next = self
            .machine
            .transitions
            .iter()
            .find(|t| t.from == self.current && self.condition_met(&t.condition))
            .map(|t| t.to);
        if let Some(to) = next {
            self.enter(to, artboard);
            changed = true;
        }
        changed
    }

    fn bind_view_model_instance(&mut self, view_model: SharedViewModel) {
        self.view_model = Some(view_model);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::sample::sample_document;
    use pathfiddle_render::CountingFactory;

    fn setup() -> (ArtboardInstance, StateMachineInstance, SharedViewModel) {
        let factory = CountingFactory::new();
        let doc = Document::from_data(sample_document(), &factory).unwrap();
        let mut artboard = doc.artboard_default().unwrap();
        let sm = artboard.state_machine_at(0).unwrap();
        let vm = doc
            .create_view_model_instance_for(&artboard)
            .unwrap()
            .into_shared();
        artboard.bind_view_model_instance(Some(Rc::clone(&vm)));
        (artboard, sm, vm)
    }

    #[test]
    fn starts_in_initial_state() {
        let (_, sm, _) = setup();
        assert_eq!(sm.current_state_name(), "idle");
        assert_eq!(sm.kind(), SceneKind::StateMachine);
    }

    #[test]
    fn number_condition_drives_transition() {
        let (mut artboard, mut sm, vm) = setup();
        sm.bind_view_model_instance(Rc::clone(&vm));

        vm.borrow_mut().set_number("energy", 0.0);
        sm.advance_and_apply(&mut artboard, 0.1);
        assert_eq!(sm.current_state_name(), "idle");

        vm.borrow_mut().set_number("energy", 1.0);
        sm.advance_and_apply(&mut artboard, 0.1);
        assert_eq!(sm.current_state_name(), "bounce");
        assert_eq!(sm.transitions_taken(), 1);
    }

    #[test]
    fn completion_condition_returns_to_idle() {
        let (mut artboard, mut sm, vm) = setup();
        sm.bind_view_model_instance(Rc::clone(&vm));

        sm.advance_and_apply(&mut artboard, 0.1);
        assert_eq!(sm.current_state_name(), "bounce");
        vm.borrow_mut().set_number("energy", 0.0);
        sm.advance_and_apply(&mut artboard, 0.1);
        assert_eq!(sm.current_state_name(), "fade");

        sm.advance_and_apply(&mut artboard, 10.0);
        assert_eq!(sm.current_state_name(), "idle");
    }

    #[test]
    fn unbound_view_model_blocks_number_conditions() {
        let (mut artboard, mut sm, _) = setup();
        sm.advance_and_apply(&mut artboard, 0.1);
        assert_eq!(sm.current_state_name(), "idle");
    }

    #[test]
    fn applies_animation_pose() {
        let (mut artboard, mut sm, _) = setup();
        let star = (0..artboard.shape_count())
            .find(|&i| artboard.shape_name(i) == Some("star"))
            .unwrap();
        sm.advance_and_apply(&mut artboard, 1.0);
        assert!(artboard.pose(star).unwrap().rotation > 0.0);
    }
}
