//! The locally simulated fighter and its attack hitbox.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use lounge_core::animation::AnimationTable;
use lounge_core::collision::Aabb;
use lounge_core::entity::{Action, AttackKind, DamageOutcome, Facing, Health};
use lounge_core::grid::{Body, SolidityMap, step_body};
use lounge_core::input::{HeldInput, InputAction, InputEvent, InputPhase, MoveDir};
use lounge_core::net::damage::DamageEvent;
use lounge_core::player::PlayerId;
use lounge_motion::action::ActionController;

use crate::config::FighterConfig;
use crate::mirror::RemoteFighter;

/// Result of offering incoming damage to the local fighter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitReaction {
    Ignored,
    Hurt { remaining: i32 },
    Killed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocalFighter {
    pub id: PlayerId,
    pub body: Body,
    pub facing: Facing,
    pub controller: ActionController,
    pub health: Health,
    held: HeldInput,
    jump_requested: bool,
}

impl LocalFighter {
    pub fn new(id: PlayerId, cfg: &FighterConfig) -> Self {
        Self {
            id,
            body: Body::new(Vec2::from(cfg.spawn), Vec2::from(cfg.body_size)),
            facing: Facing::Right,
            controller: ActionController::default(),
            health: Health::new(cfg.max_health),
            held: HeldInput::default(),
            jump_requested: false,
        }
    }

    pub fn is_dead(&self) -> bool {
        self.controller.is_dead()
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        match event.action {
            InputAction::Move => {
                self.held.apply(event);
                if event.phase == InputPhase::Start {
                    match event.direction {
                        Some(MoveDir::Left) => self.facing = Facing::Left,
                        Some(MoveDir::Right) => self.facing = Facing::Right,
                        _ => {},
                    }
                }
            },
            InputAction::Jump if event.phase == InputPhase::Start => self.jump_requested = true,
            InputAction::Attack(kind) if event.phase == InputPhase::Start => {
                self.start_attack(kind);
            },
            InputAction::Dodge if event.phase == InputPhase::Start => {
                self.controller.start_dodge();
            },
            _ => {},
        }
    }

    pub fn start_attack(&mut self, kind: AttackKind) -> bool {
        self.controller.start_attack(kind)
    }

    /// Area an attack can land in, ahead of the fighter along its facing.
    pub fn hitbox(&self, cfg: &FighterConfig) -> Aabb {
        let x = match self.facing {
            Facing::Right => self.body.pos.x + self.body.size.x,
            Facing::Left => self.body.pos.x - cfg.hitbox_width,
        };
        Aabb::new(
            x,
            self.body.pos.y + cfg.hitbox_inset,
            cfg.hitbox_width,
            self.body.size.y - 2.0 * cfg.hitbox_inset,
        )
    }

    /// One 60 Hz tick: movement, collision, hit detection and animation.
    /// Returns the damage event for the first target hit by this attack.
    pub fn step<'a, M, I>(
        &mut self,
        map: &M,
        table: &AnimationTable,
        targets: I,
        cfg: &FighterConfig,
        dt: f32,
    ) -> Option<DamageEvent>
    where
        M: SolidityMap + ?Sized,
        I: IntoIterator<Item = &'a RemoteFighter>,
    {
        let jump = std::mem::take(&mut self.jump_requested) || self.held.up;
        if self.is_dead() {
            self.controller.tick(table, !self.body.grounded, false, dt, 1.0);
            return None;
        }

        // Attacks ignore input and gravity until the strip ends.
        if !self.controller.is_attacking() {
            self.body.vel.x = self.held.horizontal() * cfg.speed;
            if jump && self.body.grounded {
                self.body.vel.y = cfg.jump_strength;
                self.body.grounded = false;
            }
            self.body.vel.y += cfg.gravity;
        }
        step_body(&mut self.body, map);

        let hit = self.detect_hit(targets, cfg);

        let moving = self.body.vel.x != 0.0;
        self.controller.tick(table, !self.body.grounded, moving, dt, 1.0);
        hit
    }

    fn detect_hit<'a, I>(&mut self, targets: I, cfg: &FighterConfig) -> Option<DamageEvent>
    where
        I: IntoIterator<Item = &'a RemoteFighter>,
    {
        if !self.controller.hit_window_open() {
            return None;
        }
        let hitbox = self.hitbox(cfg);
        let target = targets
            .into_iter()
            .filter(|t| t.id != self.id && t.is_hittable())
            .find(|t| hitbox.overlaps(&t.bounds()))?;
        let attack_seq = self.controller.register_hit()?;
        tracing::debug!(
            attacker = self.id,
            target_id = target.id,
            attack_seq,
            "Attack landed"
        );
        Some(DamageEvent {
            attacker: self.id,
            target: target.id,
            attack_seq,
            amount: cfg.damage,
        })
    }

    /// Apply damage another participant reported. Events are ignored while
    /// hurt, dodging or dead, and each attack instance counts once.
    pub fn receive(&mut self, event: &DamageEvent) -> HitReaction {
        if event.target != self.id {
            return HitReaction::Ignored;
        }
        if self.controller.is_hurt() || self.controller.is_invulnerable() || self.is_dead() {
            self.health.mark_seen(event);
            tracing::debug!(attacker = event.attacker, "Damage ignored");
            return HitReaction::Ignored;
        }
        match self.health.apply(event) {
            DamageOutcome::Applied { killed: true, .. } => {
                self.controller.die();
                HitReaction::Killed
            },
            DamageOutcome::Applied { remaining, .. } => {
                self.controller.take_hurt();
                HitReaction::Hurt { remaining }
            },
            DamageOutcome::Duplicate | DamageOutcome::AlreadyDead => HitReaction::Ignored,
        }
    }

    pub fn action(&self) -> Action {
        self.controller.action()
    }
}
