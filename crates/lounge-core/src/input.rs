use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::entity::{AttackKind, Direction};

/// Directional key, independent of keyboard layout or on-screen d-pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveDir {
    Up,
    Down,
    Left,
    Right,
}

impl MoveDir {
    /// Sprite direction shown while walking this way (screen-up shows the back).
    pub fn facing(self) -> Direction {
        match self {
            MoveDir::Up => Direction::Back,
            MoveDir::Down => Direction::Front,
            MoveDir::Left => Direction::Left,
            MoveDir::Right => Direction::Right,
        }
    }

    /// Unit vector in y-down screen space.
    pub fn unit(self) -> Vec2 {
        match self {
            MoveDir::Up => Vec2::new(0.0, -1.0),
            MoveDir::Down => Vec2::new(0.0, 1.0),
            MoveDir::Left => Vec2::new(-1.0, 0.0),
            MoveDir::Right => Vec2::new(1.0, 0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputAction {
    Move,
    Attack(AttackKind),
    Jump,
    Dodge,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputPhase {
    Start,
    End,
}

/// Normalized input event fed to the local motion controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputEvent {
    pub action: InputAction,
    pub direction: Option<MoveDir>,
    pub phase: InputPhase,
}

impl InputEvent {
    pub fn press(dir: MoveDir) -> Self {
        Self {
            action: InputAction::Move,
            direction: Some(dir),
            phase: InputPhase::Start,
        }
    }

    pub fn release(dir: MoveDir) -> Self {
        Self {
            action: InputAction::Move,
            direction: Some(dir),
            phase: InputPhase::End,
        }
    }

    pub fn attack(kind: AttackKind) -> Self {
        Self {
            action: InputAction::Attack(kind),
            direction: None,
            phase: InputPhase::Start,
        }
    }

    pub fn jump() -> Self {
        Self {
            action: InputAction::Jump,
            direction: None,
            phase: InputPhase::Start,
        }
    }

    pub fn dodge() -> Self {
        Self {
            action: InputAction::Dodge,
            direction: None,
            phase: InputPhase::Start,
        }
    }
}

/// Set of currently held directional keys.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeldInput {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
}

impl HeldInput {
    /// Fold a move event into the held set. Returns whether anything changed.
    pub fn apply(&mut self, event: &InputEvent) -> bool {
        let (InputAction::Move, Some(dir)) = (event.action, event.direction) else {
            return false;
        };
        let pressed = event.phase == InputPhase::Start;
        let slot = match dir {
            MoveDir::Up => &mut self.up,
            MoveDir::Down => &mut self.down,
            MoveDir::Left => &mut self.left,
            MoveDir::Right => &mut self.right,
        };
        let changed = *slot != pressed;
        *slot = pressed;
        changed
    }

    pub fn any(&self) -> bool {
        self.up || self.down || self.left || self.right
    }

    /// Single direction for grid-stepped movement: up > down > left > right.
    pub fn priority_dir(&self) -> Option<MoveDir> {
        if self.up {
            Some(MoveDir::Up)
        } else if self.down {
            Some(MoveDir::Down)
        } else if self.left {
            Some(MoveDir::Left)
        } else if self.right {
            Some(MoveDir::Right)
        } else {
            None
        }
    }

    /// Horizontal axis in [-1, 1]. Left wins when both are held.
    pub fn horizontal(&self) -> f32 {
        if self.left {
            -1.0
        } else if self.right {
            1.0
        } else {
            0.0
        }
    }

    /// Vertical axis in y-down space. Up wins when both are held.
    pub fn vertical(&self) -> f32 {
        if self.up {
            -1.0
        } else if self.down {
            1.0
        } else {
            0.0
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_prefers_up_then_down_then_left() {
        let mut held = HeldInput::default();
        held.apply(&InputEvent::press(MoveDir::Right));
        held.apply(&InputEvent::press(MoveDir::Left));
        assert_eq!(held.priority_dir(), Some(MoveDir::Left));
        held.apply(&InputEvent::press(MoveDir::Down));
        assert_eq!(held.priority_dir(), Some(MoveDir::Down));
        held.apply(&InputEvent::press(MoveDir::Up));
        assert_eq!(held.priority_dir(), Some(MoveDir::Up));
        held.apply(&InputEvent::release(MoveDir::Up));
        assert_eq!(held.priority_dir(), Some(MoveDir::Down));
    }

    #[test]
    fn non_move_events_are_ignored() {
        let mut held = HeldInput::default();
        assert!(!held.apply(&InputEvent::jump()));
        assert!(!held.any());
    }

    #[test]
    fn repeated_press_reports_no_change() {
        let mut held = HeldInput::default();
        assert!(held.apply(&InputEvent::press(MoveDir::Up)));
        assert!(!held.apply(&InputEvent::press(MoveDir::Up)));
    }
}
