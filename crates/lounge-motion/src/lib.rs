pub mod action;
pub mod free_roam;
pub mod grid_step;
pub mod publish;
pub mod remote;
pub mod roster;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use lounge_core::entity::{Action, Direction, Facing};

/// What the render surface needs to draw one entity this frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderState {
    pub position: Vec2,
    /// Vertical lift from a grid-step hop, in render units.
    pub hop: f32,
    pub direction: Direction,
    pub facing: Facing,
    pub action: Action,
    pub frame: u32,
}

impl RenderState {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            hop: 0.0,
            direction: Direction::Front,
            facing: Facing::Right,
            action: Action::Idle,
            frame: 1,
        }
    }
}
