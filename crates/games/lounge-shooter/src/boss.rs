//! Boss state machine: entrance, fight, enrage and defeat.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use lounge_core::collision::Aabb;

use crate::config::ShooterConfig;
use crate::patterns::{self, FireContext, Pattern, Volley};

pub const MAX_TIER: u8 = 4;

/// Per-tier boss statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierStats {
    pub hp: i32,
    /// Seconds between volleys.
    pub fire_interval: f32,
    /// Entrance speed, units per tick.
    pub speed: f32,
    /// Patterns the boss cycles through.
    pub patterns: usize,
    /// Seconds of fighting before the boss enrages.
    pub enrage_after: f32,
}

impl TierStats {
    /// Tiers past the last one reuse its stats.
    pub fn for_tier(tier: u8) -> Self {
        match tier {
            0 | 1 => Self {
                hp: 400,
                fire_interval: 1.5,
                speed: 2.0,
                patterns: 3,
                enrage_after: 60.0,
            },
            2 => Self {
                hp: 600,
                fire_interval: 1.2,
                speed: 2.5,
                patterns: 4,
                enrage_after: 75.0,
            },
            3 => Self {
                hp: 800,
                fire_interval: 1.0,
                speed: 3.0,
                patterns: 5,
                enrage_after: 90.0,
            },
            _ => Self {
                hp: 1000,
                fire_interval: 0.8,
                speed: 3.5,
                patterns: 5,
                enrage_after: 120.0,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BossPhase {
    /// Flying in; cannot be hurt and does not fire.
    Entering { remaining: f32 },
    Vulnerable { fighting: f32 },
    /// Terminal until defeat.
    Enraged,
    Defeated,
}

/// What a player bullet did to the boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitOutcome {
    Ignored,
    Damaged { hp: i32 },
    Defeated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Boss {
    pub tier: u8,
    pub hp: i32,
    pub max_hp: i32,
    /// Top-left corner.
    pub pos: Vec2,
    pub size: f32,
    pub target_x: f32,
    pub phase: BossPhase,
    pub fire_interval: f32,
    pub move_speed: f32,
    pub pattern_index: usize,
    pub pattern_count: usize,
    pub pattern_timer: f32,
    pub fire_timer: f32,
    /// Seconds since the boss became vulnerable.
    pub fight_time: f32,
    /// +1 moving down, -1 moving up.
    pub heading: f32,
}

impl Boss {
    /// A boss of `tier` just off the right edge, vertically centred.
    pub fn new(tier: u8, cfg: &ShooterConfig) -> Self {
        let tier = tier.clamp(1, MAX_TIER);
        let stats = TierStats::for_tier(tier);
        let size = cfg.boss_size;
        Self {
            tier,
            hp: stats.hp,
            max_hp: stats.hp,
            pos: Vec2::new(cfg.width + size, (cfg.height - size) / 2.0),
            size,
            target_x: cfg.width - size - cfg.boss_margin,
            phase: BossPhase::Entering {
                remaining: cfg.entrance_duration,
            },
            fire_interval: stats.fire_interval,
            move_speed: stats.speed,
            pattern_index: 0,
            pattern_count: stats.patterns,
            pattern_timer: 0.0,
            fire_timer: 0.0,
            fight_time: 0.0,
            heading: 1.0,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos.x, self.pos.y, self.size, self.size)
    }

    pub fn is_vulnerable(&self) -> bool {
        matches!(self.phase, BossPhase::Vulnerable { .. } | BossPhase::Enraged)
    }

    pub fn is_enraged(&self) -> bool {
        self.phase == BossPhase::Enraged
    }

    pub fn is_entering(&self) -> bool {
        matches!(self.phase, BossPhase::Entering { .. })
    }

    pub fn pattern(&self) -> Pattern {
        Pattern::CYCLE[self.pattern_index % Pattern::CYCLE.len()]
    }

    /// Seconds each pattern lasts before the next one.
    pub fn pattern_period(&self, cfg: &ShooterConfig) -> f32 {
        if self.is_enraged() {
            cfg.enraged_pattern_period
        } else {
            (cfg.base_pattern_period - 0.5 * f32::from(self.tier)).max(2.0)
        }
    }

    fn enrage(&mut self) {
        self.phase = BossPhase::Enraged;
        self.fire_interval *= 0.3;
        self.move_speed *= 2.0;
        tracing::info!(tier = self.tier, "Boss enraged");
    }

    /// Advance timers and movement by one tick of `dt` seconds. Returns the
    /// volley fired this tick, if any.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        ship_center: Vec2,
        rng: &mut R,
        cfg: &ShooterConfig,
    ) -> Volley {
        match &mut self.phase {
            BossPhase::Defeated => return Volley::new(),
            BossPhase::Entering { remaining } => {
                *remaining -= dt;
                if *remaining <= 0.0 {
                    self.phase = BossPhase::Vulnerable { fighting: 0.0 };
                    self.pattern_timer = 0.0;
                    self.fire_timer = 0.0;
                }
            },
            BossPhase::Vulnerable { fighting } => {
                *fighting += dt;
                if *fighting >= TierStats::for_tier(self.tier).enrage_after {
                    self.enrage();
                }
            },
            BossPhase::Enraged => {},
        }
        if self.is_vulnerable() {
            self.fight_time += dt;
        }

        self.fly(rng, cfg);
        if !self.is_vulnerable() {
            return Volley::new();
        }

        self.pattern_timer += dt;
        if self.pattern_timer > self.pattern_period(cfg) {
            self.pattern_index = (self.pattern_index + 1) % self.pattern_count.max(1);
            self.pattern_timer = 0.0;
            self.fire_timer = 0.0;
        }
        self.fire_timer += dt;
        if self.fire_timer <= self.fire_interval {
            return Volley::new();
        }
        self.fire_timer = 0.0;
        let ctx = FireContext {
            origin: Vec2::new(self.pos.x, self.pos.y + self.size / 2.0),
            target: ship_center,
            tier: self.tier,
            enraged: self.is_enraged(),
            elapsed: self.fight_time,
            field_height: cfg.height,
        };
        patterns::fire(self.pattern(), &ctx)
    }

    fn fly<R: Rng + ?Sized>(&mut self, rng: &mut R, cfg: &ShooterConfig) {
        if self.pos.x > self.target_x {
            self.pos.x = (self.pos.x - self.move_speed).max(self.target_x);
        }
        if !self.is_vulnerable() || self.pos.x > self.target_x {
            return;
        }
        let rage = if self.is_enraged() { 2.0 } else { 1.0 };
        let sway = (1.0 + 0.5 * f32::from(self.tier)) * rage;
        self.pos.y += self.heading * sway;
        let floor = cfg.height - self.size;
        if self.pos.y <= 0.0 || self.pos.y >= floor {
            self.pos.y = self.pos.y.clamp(0.0, floor.max(0.0));
            self.heading = -self.heading;
        }

        // High tiers also drift sideways now and then.
        let drift_chance = if self.is_enraged() { 0.03 } else { 0.01 };
        if self.tier >= 3 && rng.random_bool(drift_chance) {
            let right = cfg.width - self.size - 20.0;
            let left = cfg.width - self.size - 100.0;
            self.target_x = (self.target_x + rng.random_range(-50.0..50.0)).clamp(left, right);
        }
    }

    /// Apply one player bullet hit. Only a vulnerable or enraged boss takes
    /// damage; reaching zero hp is terminal.
    pub fn hit(&mut self) -> HitOutcome {
        if !self.is_vulnerable() {
            return HitOutcome::Ignored;
        }
        self.hp -= 1;
        if self.hp <= 0 {
            self.hp = 0;
            self.phase = BossPhase::Defeated;
            tracing::info!(tier = self.tier, "Boss defeated");
            return HitOutcome::Defeated;
        }
        HitOutcome::Damaged { hp: self.hp }
    }
}
