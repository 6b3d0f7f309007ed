use bevy::prelude::*;
use std::collections::HashMap;

use crate::planting::core::CapabilityInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlayerAction {
    MoveForward,
    MoveBackward,
    MoveLeft,
    MoveRight,
    /// Held to turn a single placement into a grid.
    MassAction,
    Place,
    Cultivate,
    NextPlant,
    RotateLeft,
    RotateRight,
}

#[derive(Default, Resource)]
pub struct ActionState {
    pressed: HashMap<PlayerAction, bool>,
}

impl ActionState {
    pub fn set(&mut self, action: PlayerAction, is_pressed: bool) {
        self.pressed.insert(action, is_pressed);
    }

    pub fn pressed(&self, action: PlayerAction) -> bool {
        *self.pressed.get(&action).unwrap_or(&false)
    }
}

impl CapabilityInput for ActionState {
    fn is_capability_key_held(&self) -> bool {
        self.pressed(PlayerAction::MassAction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mass_action_drives_capability_key() {
        let mut state = ActionState::default();
        assert!(!state.is_capability_key_held());
        state.set(PlayerAction::MassAction, true);
        assert!(state.is_capability_key_held());
        state.set(PlayerAction::Place, true);
        state.set(PlayerAction::MassAction, false);
        assert!(!state.is_capability_key_held());
    }
}
