pub mod config;
pub mod items;
pub mod map;
pub mod runner;

use std::collections::BTreeMap;
use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use lounge_core::arcade_game_boilerplate;
use lounge_core::entity::{Action, Direction, Facing};
use lounge_core::game_trait::{ArcadeGame, GameConfig, GameEvent, GameMetadata, PlayerScore};
use lounge_core::grid::{Body, step_body};
use lounge_core::input::{HeldInput, InputAction, InputEvent, InputPhase};
use lounge_core::net::snapshot::RemoteSnapshot;
use lounge_core::player::{Player, PlayerId};
use lounge_core::powerup;

use config::PlatformerConfig;
use items::{ActivePowerUp, ItemField, ItemKind, PowerUpKind};
use map::TileMap;

/// Physics runs at a fixed 60 Hz regardless of the frame rate.
pub(crate) const STEP: f32 = 1.0 / 60.0;
/// Backlog beyond this many steps is dropped.
pub(crate) const MAX_STEPS_PER_UPDATE: usize = 8;

/// Another player, mirrored from snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteJumper {
    pub sprite: String,
    pub name: String,
    pub pos: Vec2,
    pub facing: Facing,
    pub action: Action,
    pub last_timestamp: u64,
}

impl RemoteJumper {
    fn from_snapshot(snapshot: &RemoteSnapshot) -> Self {
        Self {
            sprite: snapshot.sprite.clone(),
            name: snapshot.name.clone(),
            pos: snapshot.position,
            facing: snapshot.facing,
            action: snapshot.action,
            last_timestamp: snapshot.timestamp_ms,
        }
    }

    fn apply(&mut self, snapshot: &RemoteSnapshot) {
        if snapshot.timestamp_ms <= self.last_timestamp {
            return;
        }
        self.pos = snapshot.position;
        self.facing = snapshot.facing;
        self.action = snapshot.action;
        self.last_timestamp = snapshot.timestamp_ms;
    }
}

/// Serializable round state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformerState {
    pub map: TileMap,
    pub items: ItemField,
    pub body: Body,
    pub facing: Facing,
    pub held: HeldInput,
    pub jump_requested: bool,
    pub effects: Vec<ActivePowerUp>,
    pub score: i32,
    pub spawn_timer: f32,
    pub remotes: BTreeMap<PlayerId, RemoteJumper>,
    pub accumulator: f32,
    pub round_timer: f32,
    pub round_complete: bool,
}

impl PlatformerState {
    fn new(rng: &mut StdRng, config: &PlatformerConfig) -> Self {
        let map = TileMap::generate(rng, config);
        let mut items = ItemField::new();
        items::spawn_items(&mut items, &map, rng, config);
        Self {
            map,
            items,
            body: Body::new(spawn_point(config), Vec2::from(config.body_size)),
            facing: Facing::Right,
            held: HeldInput::default(),
            jump_requested: false,
            effects: Vec::new(),
            score: 0,
            spawn_timer: 0.0,
            remotes: BTreeMap::new(),
            accumulator: 0.0,
            round_timer: 0.0,
            round_complete: false,
        }
    }

    pub fn has_jetpack(&self) -> bool {
        self.effects.iter().any(|e| e.kind == PowerUpKind::Jetpack)
    }
}

/// Standing on the floor in the second column.
fn spawn_point(cfg: &PlatformerConfig) -> Vec2 {
    let t = cfg.tile_size;
    Vec2::new(
        t + (t - cfg.body_size[0]) / 2.0,
        (cfg.rows.saturating_sub(1)) as f32 * t - cfg.body_size[1],
    )
}

/// Jump between platforms collecting coins before the clock runs out.
pub struct PlatformerGame {
    config: PlatformerConfig,
    state: PlatformerState,
    rng: StdRng,
    local: Player,
    paused: bool,
    round_duration: f32,
}

impl PlatformerGame {
    pub fn new() -> Self {
        Self::with_config(PlatformerConfig::load())
    }

    pub fn with_config(config: PlatformerConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(42);
        let state = PlatformerState::new(&mut rng, &config);
        Self {
            config,
            state,
            rng,
            local: Player::new(0, "", ""),
            paused: false,
            round_duration: 0.0,
        }
    }

    pub fn state(&self) -> &PlatformerState {
        &self.state
    }

    fn step(&mut self, events: &mut Vec<GameEvent>) {
        let cfg = &self.config;
        let state = &mut self.state;
        state.map.tick(STEP);
        powerup::tick_all(&mut state.effects, STEP);

        let jump = std::mem::take(&mut state.jump_requested) || state.held.up;
        state.body.vel.x = state.held.horizontal() * cfg.speed;
        if state.has_jetpack() {
            state.body.vel.y = cfg.jetpack_velocity;
            state.body.grounded = false;
        } else {
            if jump && state.body.grounded {
                state.body.vel.y = cfg.jump_strength;
                state.body.grounded = false;
            }
            state.body.vel.y = (state.body.vel.y + cfg.gravity).min(cfg.max_fall_speed);
        }

        let outcome = step_body(&mut state.body, &state.map);
        if let Some(point) = outcome.landed_on {
            state.map.break_at(point, cfg.crumble_delay);
        }

        let taken = items::collect_touching(&mut state.items, &state.map, &state.body.bounds());
        let mut scored = false;
        for kind in taken {
            tracing::debug!(player_id = self.local.id, ?kind, "Item collected");
            match kind {
                ItemKind::Coin | ItemKind::GoldenCoin => {
                    state.score += kind.score(cfg);
                    scored = true;
                },
                ItemKind::Spring => {
                    state.body.vel.y = cfg.jump_strength * cfg.spring_boost;
                    state.body.grounded = false;
                },
                ItemKind::Jetpack => powerup::grant(&mut state.effects, PowerUpKind::Jetpack),
            }
        }
        if scored {
            events.push(GameEvent::ScoreUpdate {
                player_id: self.local.id,
                score: state.score,
            });
        }

        state.spawn_timer += STEP;
        if state.spawn_timer >= cfg.item_spawn_interval {
            state.spawn_timer = 0.0;
            items::spawn_items(&mut state.items, &state.map, &mut self.rng, cfg);
        }
    }

    fn action(&self) -> Action {
        let body = &self.state.body;
        if !body.grounded {
            Action::Jump
        } else if body.vel.x != 0.0 {
            Action::Move
        } else {
            Action::Idle
        }
    }
}

impl Default for PlatformerGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeGame for PlatformerGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Suitch Madness".to_string(),
            description: "Race the clock for coins across crumbling platforms".to_string(),
            min_players: 1,
            max_players: 8,
            estimated_round_duration: Duration::from_secs(60),
        }
    }

    fn init(&mut self, local: &Player, config: &GameConfig) {
        let seed = config.seed().unwrap_or(42);
        self.rng = StdRng::seed_from_u64(seed);
        self.state = PlatformerState::new(&mut self.rng, &self.config);
        self.local = local.clone();
        self.paused = false;
        self.round_duration = config.round_duration.as_secs_f32();
        tracing::debug!(seed, items = self.state.items.len(), "Platformer map generated");
    }

    fn handle_input(&mut self, event: &InputEvent) {
        match event.action {
            InputAction::Move => {
                self.state.held.apply(event);
                if event.phase == InputPhase::Start {
                    match event.direction.map(|d| d.facing()) {
                        Some(Direction::Left) => self.state.facing = Facing::Left,
                        Some(Direction::Right) => self.state.facing = Facing::Right,
                        _ => {},
                    }
                }
            },
            InputAction::Jump if event.phase == InputPhase::Start => {
                self.state.jump_requested = true;
            },
            _ => {},
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
        }

        if self.round_duration > 0.0 && self.state.round_timer >= self.round_duration {
            tracing::info!(player_id = self.local.id, score = self.state.score, "Time up");
            self.state.round_complete = true;
            events.push(GameEvent::RoundComplete);
        }
        events
    }

    fn apply_remote(&mut self, snapshot: &RemoteSnapshot) {
        if snapshot.id == self.local.id {
            return;
        }
        match self.state.remotes.get_mut(&snapshot.id) {
            Some(remote) => remote.apply(snapshot),
            None => {
                tracing::info!(player_id = snapshot.id, "Jumper joined");
                self.state
                    .remotes
                    .insert(snapshot.id, RemoteJumper::from_snapshot(snapshot));
            },
        }
    }

    fn remove_remote(&mut self, id: PlayerId) {
        if self.state.remotes.remove(&id).is_some() {
            tracing::info!(player_id = id, "Jumper left");
        }
    }

    fn local_snapshot(&self, now_ms: u64) -> Option<RemoteSnapshot> {
        let direction = match self.state.facing {
            Facing::Left => Direction::Left,
            Facing::Right => Direction::Right,
        };
        Some(RemoteSnapshot {
            direction,
            facing: self.state.facing,
            action: self.action(),
            name: self.local.display_name.clone(),
            ..RemoteSnapshot::new(
                self.local.id,
                self.local.sprite.clone(),
                self.state.body.pos,
                now_ms,
            )
        })
    }

    arcade_game_boilerplate!(state_type: PlatformerState);

    fn round_results(&self) -> Vec<PlayerScore> {
        vec![PlayerScore {
            player_id: self.local.id,
            score: self.state.score,
        }]
    }
}
