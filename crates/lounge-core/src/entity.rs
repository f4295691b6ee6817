use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::net::damage::DamageEvent;
use crate::player::PlayerId;

/// Four-way facing used by top-down avatars, plus the idle pose.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Front,
    Back,
    Left,
    Right,
    Idle,
}

impl Direction {
    pub fn is_idle(self) -> bool {
        matches!(self, Direction::Idle)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Front => "front",
            Direction::Back => "back",
            Direction::Left => "left",
            Direction::Right => "right",
            Direction::Idle => "idle",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "front" => Some(Direction::Front),
            "back" => Some(Direction::Back),
            "left" => Some(Direction::Left),
            "right" => Some(Direction::Right),
            "idle" => Some(Direction::Idle),
            _ => None,
        }
    }
}

/// Two-way facing used by side-scrolling bodies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Facing {
    Left,
    #[default]
    Right,
}

impl Facing {
    /// +1 for right, -1 for left.
    pub fn sign(self) -> f32 {
        match self {
            Facing::Left => -1.0,
            Facing::Right => 1.0,
        }
    }
}

/// Melee attack flavors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttackKind {
    Bite,
    Kick,
}

/// Discrete animation/behavior state of an entity.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    #[default]
    Idle,
    Move,
    Jump,
    Bite,
    Kick,
    Dodge,
    Hurt,
    Dead,
}

impl Action {
    pub const ALL: [Action; 8] = [
        Action::Idle,
        Action::Move,
        Action::Jump,
        Action::Bite,
        Action::Kick,
        Action::Dodge,
        Action::Hurt,
        Action::Dead,
    ];

    pub fn is_attack(self) -> bool {
        matches!(self, Action::Bite | Action::Kick)
    }

    /// Sheet name segment used when loading sprite strips.
    pub fn sheet_name(self) -> &'static str {
        match self {
            Action::Idle => "idle",
            Action::Move => "move",
            Action::Jump => "jump",
            Action::Bite => "bite",
            Action::Kick => "kick",
            Action::Dodge => "avoid",
            Action::Hurt => "hurt",
            Action::Dead => "dead",
        }
    }
}

impl From<AttackKind> for Action {
    fn from(kind: AttackKind) -> Self {
        match kind {
            AttackKind::Bite => Action::Bite,
            AttackKind::Kick => Action::Kick,
        }
    }
}

/// Result of offering a damage event to a [`Health`] pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DamageOutcome {
    Applied { remaining: i32, killed: bool },
    Duplicate,
    AlreadyDead,
}

/// Health pool that applies each attack instance at most once.
///
/// Attack instances are identified by `(attacker, attack_seq)`; replays of the
/// same event (store re-delivery, reconnect) are ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Health {
    current: i32,
    max: i32,
    seen: BTreeSet<(PlayerId, u32)>,
}

impl Health {
    pub fn new(max: i32) -> Self {
        Self {
            current: max.max(0),
            max: max.max(0),
            seen: BTreeSet::new(),
        }
    }

    pub fn current(&self) -> i32 {
        self.current
    }

    pub fn max(&self) -> i32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.current <= 0
    }

    pub fn has_seen(&self, event: &DamageEvent) -> bool {
        self.seen.contains(&(event.attacker, event.attack_seq))
    }

    /// Apply a damage event. Health never drops below zero.
    pub fn apply(&mut self, event: &DamageEvent) -> DamageOutcome {
        if self.is_dead() {
            return DamageOutcome::AlreadyDead;
        }
        if !self.seen.insert((event.attacker, event.attack_seq)) {
            return DamageOutcome::Duplicate;
        }
        self.current = (self.current - event.amount.max(0)).max(0);
        DamageOutcome::Applied {
            remaining: self.current,
            killed: self.current == 0,
        }
    }

    /// Record an event as handled without changing health (e.g. it arrived while
    /// the owner was invulnerable).
    pub fn mark_seen(&mut self, event: &DamageEvent) {
        self.seen.insert((event.attacker, event.attack_seq));
    }

    /// Explicit reset for a new round.
    pub fn reset(&mut self) {
        self.current = self.max;
        self.seen.clear();
    }
}
