pub mod boss;
pub mod config;
pub mod patterns;
pub mod wave;

use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use lounge_core::arcade_game_boilerplate;
use lounge_core::collision::{Aabb, within_radius};
use lounge_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameMetadata, GameOverReason, PlayerScore,
};
use lounge_core::input::{HeldInput, InputAction, InputEvent};
use lounge_core::player::{Player, PlayerId};

use boss::{Boss, HitOutcome, MAX_TIER};
use config::ShooterConfig;
use patterns::Projectile;
use wave::{Armament, ShotOutcome, Wave, lane_at};

const STEP: f32 = 1.0 / 60.0;
const MAX_STEPS_PER_UPDATE: usize = 8;
/// Enemy bullets this far outside the field are dropped.
const CULL_MARGIN: f32 = 50.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ShooterPhase {
    Scrolling,
    /// The next boss is announced; the field is cleared and scrolling stops.
    Warning { remaining: f32 },
    BossFight,
}

/// Serializable round state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShooterState {
    pub phase: ShooterPhase,
    /// Top edge of the ship.
    pub ship_y: f32,
    pub target_y: f32,
    pub held: HeldInput,
    pub lives: u32,
    pub score: i32,
    pub speed: f32,
    pub distance: f32,
    pub distance_since_boss: f32,
    /// Tier of the next boss.
    pub tier: u8,
    pub bosses_defeated: u32,
    pub boss: Option<Boss>,
    /// Monsters and pickups scrolling in between bosses.
    pub wave: Wave,
    pub armament: Armament,
    pub monsters_destroyed: u32,
    pub bullets: Vec<Projectile>,
    pub enemy_bullets: Vec<Projectile>,
    pub fire_timer: f32,
    pub accumulator: f32,
    pub round_timer: f32,
    pub round_complete: bool,
}

impl ShooterState {
    fn new(cfg: &ShooterConfig) -> Self {
        let ship_y = (cfg.height - cfg.ship_size) / 2.0;
        Self {
            phase: ShooterPhase::Scrolling,
            ship_y,
            target_y: ship_y,
            held: HeldInput::default(),
            lives: cfg.lives,
            score: 0,
            speed: cfg.base_speed,
            distance: 0.0,
            distance_since_boss: 0.0,
            tier: 1,
            bosses_defeated: 0,
            boss: None,
            wave: Wave::default(),
            armament: Armament::new(cfg),
            monsters_destroyed: 0,
            bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            fire_timer: 0.0,
            accumulator: 0.0,
            round_timer: 0.0,
            round_complete: false,
        }
    }

    pub fn ship_center(&self, cfg: &ShooterConfig) -> Vec2 {
        Vec2::new(cfg.ship_x, self.ship_y) + Vec2::splat(cfg.ship_size / 2.0)
    }

    fn can_fire(&self) -> bool {
        match self.phase {
            ShooterPhase::Warning { .. } => false,
            _ => !self.boss.as_ref().is_some_and(Boss::is_entering),
        }
    }
}

/// Scroll, survive and take down ever tougher bosses.
pub struct ShooterGame {
    config: ShooterConfig,
    state: ShooterState,
    rng: StdRng,
    local: Player,
    paused: bool,
    round_duration: f32,
}

impl ShooterGame {
    pub fn new() -> Self {
        Self::with_config(ShooterConfig::load())
    }

    pub fn with_config(config: ShooterConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(42);
        let mut state = ShooterState::new(&config);
        state.wave.fill(state.tier, &mut rng, &config);
        Self {
            config,
            state,
            rng,
            local: Player::new(0, "", ""),
            paused: false,
            round_duration: 0.0,
        }
    }

    pub fn state(&self) -> &ShooterState {
        &self.state
    }

    fn step(&mut self, events: &mut Vec<GameEvent>) {
        let score_before = self.state.score;
        self.steer();
        self.advance_phase();
        self.advance_wave(events);
        self.auto_fire();
        self.move_player_bullets(events);
        self.move_enemy_bullets(events);
        if self.state.score != score_before {
            events.push(GameEvent::ScoreUpdate {
                player_id: self.local.id,
                score: self.state.score,
            });
        }
    }

    fn steer(&mut self) {
        let cfg = &self.config;
        let state = &mut self.state;
        let floor = (cfg.height - cfg.ship_size).max(0.0);
        state.target_y = (state.target_y + state.held.vertical() * cfg.steer_step).clamp(0.0, floor);
        state.ship_y += (state.target_y - state.ship_y) * cfg.ship_follow;
    }

    fn advance_phase(&mut self) {
        let cfg = &self.config;
        let state = &mut self.state;
        match &mut state.phase {
            ShooterPhase::Scrolling => {
                state.speed = (state.speed + cfg.speed_increment).min(cfg.max_speed);
                state.distance += state.speed;
                state.distance_since_boss += state.speed;
                state.score += state.speed.floor() as i32;
                if state.distance_since_boss >= cfg.boss_threshold {
                    tracing::info!(tier = state.tier, distance = state.distance, "Boss incoming");
                    state.phase = ShooterPhase::Warning {
                        remaining: cfg.warning_duration,
                    };
                    state.speed = 0.0;
                    state.bullets.clear();
                    state.enemy_bullets.clear();
                }
            },
            ShooterPhase::Warning { remaining } => {
                *remaining -= STEP;
                if *remaining <= 0.0 {
                    state.phase = ShooterPhase::BossFight;
                    state.boss = Some(Boss::new(state.tier, cfg));
                }
            },
            ShooterPhase::BossFight => {
                let target = state.ship_center(cfg);
                if let Some(boss) = state.boss.as_mut() {
                    let volley = boss.tick(STEP, target, &mut self.rng, cfg);
                    state.enemy_bullets.extend(volley);
                }
            },
        }
    }

    fn advance_wave(&mut self, events: &mut Vec<GameEvent>) {
        let cfg = &self.config;
        let state = &mut self.state;
        if state.phase != ShooterPhase::Scrolling {
            return;
        }
        let ship = state.ship_center(cfg);
        let shots = state.wave.fire(ship, STEP, cfg);
        state.enemy_bullets.extend(shots);
        state.wave.scroll(state.speed);
        state.wave.fill(state.tier, &mut self.rng, cfg);

        if let Some(monster) = state.wave.ram(ship, cfg) {
            tracing::debug!(player_id = self.local.id, kind = monster.kind, "Rammed a monster");
            state.speed = cfg.base_speed;
            lose_lives(state, 1, self.local.id, events);
        }
        if let Some(kind) = state.wave.collect(ship.x, lane_at(ship.y, cfg), cfg) {
            state.armament.apply(kind, cfg);
            tracing::debug!(
                player_id = self.local.id,
                ?kind,
                interval = state.armament.interval,
                missiles = state.armament.missiles,
                "Pickup collected"
            );
        }
    }

    fn auto_fire(&mut self) {
        let cfg = &self.config;
        let state = &mut self.state;
        if !state.can_fire() {
            state.fire_timer = 0.0;
            return;
        }
        state.fire_timer += STEP;
        if state.fire_timer > state.armament.interval {
            state.fire_timer = 0.0;
            let muzzle = Vec2::new(cfg.ship_x + cfg.ship_size, state.ship_y + cfg.ship_size / 2.0);
            for offset in state.armament.offsets(cfg) {
                state.bullets.push(Projectile {
                    pos: muzzle + Vec2::new(0.0, offset),
                    vel: Vec2::new(cfg.bullet_speed, 0.0),
                });
            }
        }
    }

    fn move_player_bullets(&mut self, events: &mut Vec<GameEvent>) {
        let cfg = &self.config;
        let state = &mut self.state;
        let mut defeated = None;
        let boss_box: Option<Aabb> = state.boss.as_ref().map(Boss::bounds);
        state.bullets.retain_mut(|bullet| {
            bullet.advance();
            if let (Some(boss), Some(bounds)) = (state.boss.as_mut(), boss_box)
                && bounds.contains_point(bullet.pos)
            {
                match boss.hit() {
                    HitOutcome::Ignored => return true,
                    HitOutcome::Damaged { .. } => state.score += cfg.hit_score,
                    HitOutcome::Defeated => {
                        state.score += cfg.hit_score;
                        defeated = Some(boss.tier);
                    },
                }
                return false;
            }
            if state.phase == ShooterPhase::Scrolling {
                match state.wave.shoot(bullet.pos, cfg) {
                    ShotOutcome::Miss => {},
                    ShotOutcome::Wounded => return false,
                    ShotOutcome::Killed { kind } => {
                        state.score += cfg.kill_score * i32::from(kind);
                        state.monsters_destroyed += 1;
                        return false;
                    },
                }
            }
            bullet.on_field(cfg.width, cfg.height, 0.0)
        });

        if let Some(tier) = defeated {
            state.bosses_defeated += 1;
            let next = (state.bosses_defeated + 1).min(u32::from(MAX_TIER));
            state.tier = u8::try_from(next).unwrap_or(MAX_TIER);
            state.score += cfg.defeat_score * i32::from(state.tier);
            state.boss = None;
            state.phase = ShooterPhase::Scrolling;
            state.distance_since_boss = 0.0;
            state.speed = cfg.base_speed;
            state.enemy_bullets.clear();
            tracing::info!(
                player_id = self.local.id,
                tier,
                next_tier = state.tier,
                score = state.score,
                "Boss down"
            );
            events.push(GameEvent::BossDefeated { tier });
        }
    }

    fn move_enemy_bullets(&mut self, events: &mut Vec<GameEvent>) {
        let cfg = &self.config;
        let state = &mut self.state;
        let ship = state.ship_center(cfg);
        let mut hits = 0;
        state.enemy_bullets.retain_mut(|bullet| {
            bullet.advance();
            if within_radius(bullet.pos, ship, cfg.hit_radius) {
                hits += 1;
                return false;
            }
            bullet.on_field(cfg.width, cfg.height, CULL_MARGIN)
        });
        lose_lives(state, hits, self.local.id, events);
    }
}

fn lose_lives(
    state: &mut ShooterState,
    hits: u32,
    player_id: PlayerId,
    events: &mut Vec<GameEvent>,
) {
    if hits == 0 || state.round_complete {
        return;
    }
    state.lives = state.lives.saturating_sub(hits);
    tracing::debug!(player_id, lives = state.lives, "Ship hit");
    if state.lives == 0 {
        tracing::info!(player_id, score = state.score, "Out of lives");
        state.round_complete = true;
        events.push(GameEvent::GameOver {
            player_id,
            reason: GameOverReason::OutOfLives,
        });
        events.push(GameEvent::RoundComplete);
    }
}

impl Default for ShooterGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeGame for ShooterGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Shib Shooter".to_string(),
            description: "Dodge bullet patterns and bring down the bosses".to_string(),
            min_players: 1,
            max_players: 1,
            estimated_round_duration: Duration::from_secs(180),
        }
    }

    fn init(&mut self, local: &Player, config: &GameConfig) {
        let seed = config.seed().unwrap_or(42);
        self.rng = StdRng::seed_from_u64(seed);
        self.state = ShooterState::new(&self.config);
        self.state.wave.fill(self.state.tier, &mut self.rng, &self.config);
        self.local = local.clone();
        self.paused = false;
        self.round_duration = config.round_duration.as_secs_f32();
    }

    fn handle_input(&mut self, event: &InputEvent) {
        if event.action == InputAction::Move {
            self.state.held.apply(event);
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused || self.state.round_complete {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.state.round_timer += dt;
        self.state.accumulator += dt;

        let mut steps = 0;
        while self.state.accumulator + 1e-6 >= STEP {
            if steps == MAX_STEPS_PER_UPDATE {
                self.state.accumulator = 0.0;
                break;
            }
            self.state.accumulator = (self.state.accumulator - STEP).max(0.0);
            self.step(&mut events);
            steps += 1;
            if self.state.round_complete {
                return events;
            }
        }

        if self.round_duration > 0.0 && self.state.round_timer >= self.round_duration {
            tracing::info!(player_id = self.local.id, score = self.state.score, "Time up");
            self.state.round_complete = true;
            events.push(GameEvent::RoundComplete);
        }
        events
    }

    arcade_game_boilerplate!(state_type: ShooterState);

    fn round_results(&self) -> Vec<PlayerScore> {
        vec![PlayerScore {
            player_id: self.local.id,
            score: self.state.score,
        }]
    }
}
