//! Priority-ordered action state for side-scrolling characters.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use lounge_core::animation::{AnimationTable, Animator};
use lounge_core::entity::{Action, AttackKind};

/// Attack frames during which the hitbox is live.
pub const HIT_WINDOW: RangeInclusive<u32> = 1..=3;

/// Seconds a dodge keeps the character un-hittable.
pub const DODGE_DURATION: f32 = 1.0;

/// Action flags plus the animation cursor they drive.
///
/// Display priority is dead > hurt > attacking > dodging > airborne >
/// moving > idle. One-shot states clear their flag when their strip ends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActionController {
    animator: Animator,
    attack: Option<AttackKind>,
    /// Incremented for every accepted attack; names the attack instance.
    attack_seq: u32,
    has_hit: bool,
    hurt: bool,
    dead: bool,
    dodging: bool,
    dodge_remaining: f32,
}

impl ActionController {
    pub fn action(&self) -> Action {
        self.animator.action
    }

    pub fn frame(&self) -> u32 {
        self.animator.frame
    }

    pub fn attack(&self) -> Option<AttackKind> {
        self.attack
    }

    pub fn attack_seq(&self) -> u32 {
        self.attack_seq
    }

    pub fn is_attacking(&self) -> bool {
        self.attack.is_some()
    }

    pub fn is_hurt(&self) -> bool {
        self.hurt
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    /// Un-hittable while the dodge timer runs.
    pub fn is_invulnerable(&self) -> bool {
        self.dodge_remaining > 0.0
    }

    /// Start an attack. Rejected while another attack is in flight, while
    /// hurt, or once dead.
    pub fn start_attack(&mut self, kind: AttackKind) -> bool {
        if self.attack.is_some() || self.hurt || self.dead {
            tracing::trace!(?kind, "Attack rejected");
            return false;
        }
        self.attack = Some(kind);
        self.attack_seq = self.attack_seq.wrapping_add(1);
        self.has_hit = false;
        self.animator.restart(kind.into());
        true
    }

    pub fn start_dodge(&mut self) -> bool {
        if self.dodging || self.is_invulnerable() || self.hurt || self.dead {
            return false;
        }
        self.dodging = true;
        self.dodge_remaining = DODGE_DURATION;
        if self.attack.is_none() {
            self.animator.restart(Action::Dodge);
        }
        true
    }

    /// Whether the current attack may still land a hit this frame.
    pub fn hit_window_open(&self) -> bool {
        self.attack.is_some() && !self.has_hit && HIT_WINDOW.contains(&self.animator.frame)
    }

    /// Consume the current attack's single hit. Returns its sequence number.
    pub fn register_hit(&mut self) -> Option<u32> {
        if !self.hit_window_open() {
            return None;
        }
        self.has_hit = true;
        Some(self.attack_seq)
    }

    /// Enter the hurt state. Interrupts any attack.
    pub fn take_hurt(&mut self) {
        if self.dead {
            return;
        }
        self.hurt = true;
        self.attack = None;
        self.has_hit = false;
        self.animator.restart(Action::Hurt);
    }

    /// Terminal: the death strip plays once and holds its last frame.
    pub fn die(&mut self) {
        if self.dead {
            return;
        }
        self.dead = true;
        self.hurt = false;
        self.attack = None;
        self.dodging = false;
        self.dodge_remaining = 0.0;
        self.animator.restart(Action::Dead);
    }

    /// Reset to a fresh idle state (new round).
    pub fn reset(&mut self) {
        *self = Self {
            attack_seq: self.attack_seq,
            ..Self::default()
        };
    }

    /// Highest-priority action for the current flags.
    pub fn derive(&self, airborne: bool, moving: bool) -> Action {
        if self.dead {
            Action::Dead
        } else if self.hurt {
            Action::Hurt
        } else if let Some(kind) = self.attack {
            kind.into()
        } else if self.dodging {
            Action::Dodge
        } else if airborne {
            Action::Jump
        } else if moving {
            Action::Move
        } else {
            Action::Idle
        }
    }

    /// Advance timers and the animation by one tick (`dt` seconds, `ticks`
    /// 60 Hz frames).
    pub fn tick(&mut self, table: &AnimationTable, airborne: bool, moving: bool, dt: f32, ticks: f32) {
        if self.dodge_remaining > 0.0 {
            self.dodge_remaining = (self.dodge_remaining - dt).max(0.0);
        }

        let action = self.derive(airborne, moving);
        self.animator.set(action);
        let completed = self.animator.advance(&table.get(action), ticks);
        if !completed {
            return;
        }
        match action {
            Action::Hurt => self.hurt = false,
            Action::Bite | Action::Kick => {
                self.attack = None;
                self.has_hit = false;
            },
            Action::Dodge => self.dodging = false,
            _ => {},
        }
    }
}
