//! Remote fighters, driven only by published snapshots.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use lounge_core::animation::{AnimationTable, Animator};
use lounge_core::collision::Aabb;
use lounge_core::entity::{Action, Facing};
use lounge_core::net::snapshot::RemoteSnapshot;
use lounge_core::player::PlayerId;

const BODY_SIZE: Vec2 = Vec2::new(24.0, 24.0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteFighter {
    pub id: PlayerId,
    pub sprite: String,
    pub name: String,
    pub pos: Vec2,
    pub size: Vec2,
    pub facing: Facing,
    pub health: Option<i32>,
    pub dead: bool,
    /// Published action and frame; after death the death strip plays locally.
    pub animator: Animator,
    pub last_timestamp: u64,
}

impl RemoteFighter {
    pub fn from_snapshot(snapshot: &RemoteSnapshot) -> Self {
        let mut fighter = Self {
            id: snapshot.id,
            sprite: snapshot.sprite.clone(),
            name: snapshot.name.clone(),
            pos: snapshot.position,
            size: BODY_SIZE,
            facing: snapshot.facing,
            health: None,
            dead: false,
            animator: Animator::default(),
            last_timestamp: 0,
        };
        fighter.apply(snapshot);
        fighter
    }

    /// Mirror a newer snapshot. Returns `true` the first time death is seen.
    pub fn apply(&mut self, snapshot: &RemoteSnapshot) -> bool {
        if self.last_timestamp != 0 && snapshot.timestamp_ms <= self.last_timestamp {
            return false;
        }
        self.last_timestamp = snapshot.timestamp_ms;
        if let Some(hp) = snapshot.health {
            self.health = Some(hp.max(0));
        }
        let died = self.health == Some(0) || snapshot.action == Action::Dead;
        if self.dead {
            return false;
        }
        if died {
            self.dead = true;
            self.pos = snapshot.position;
            self.animator.restart(Action::Dead);
            tracing::info!(player_id = self.id, "Remote fighter died");
            return true;
        }
        self.pos = snapshot.position;
        self.facing = snapshot.facing;
        self.animator.action = snapshot.action;
        self.animator.frame = snapshot.frame;
        self.animator.elapsed = 0.0;
        false
    }

    /// Only the death strip is animated locally; everything else follows
    /// the snapshots.
    pub fn tick(&mut self, table: &AnimationTable, ticks: f32) {
        if self.dead {
            self.animator.advance(&table.get(Action::Dead), ticks);
        }
    }

    pub fn action(&self) -> Action {
        self.animator.action
    }

    pub fn frame(&self) -> u32 {
        self.animator.frame
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }

    /// Hurt, dodging and dead fighters cannot be hit.
    pub fn is_hittable(&self) -> bool {
        !self.dead && !matches!(self.animator.action, Action::Hurt | Action::Dodge | Action::Dead)
    }
}
