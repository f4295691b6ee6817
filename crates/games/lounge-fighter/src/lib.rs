pub mod arena;
pub mod config;
pub mod fighter;
pub mod lobby;
pub mod mirror;

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use lounge_core::animation::AnimationTable;
use lounge_core::arcade_game_boilerplate;
use lounge_core::entity::{Action, Direction, Facing};
use lounge_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameMetadata, GameOverReason, PlayerScore,
};
use lounge_core::input::InputEvent;
use lounge_core::net::damage::DamageEvent;
use lounge_core::net::snapshot::RemoteSnapshot;
use lounge_core::player::{Player, PlayerId};
use lounge_core::sprite::SpriteCache;

use arena::Arena;
use config::FighterConfig;
use fighter::{HitReaction, LocalFighter};
use mirror::RemoteFighter;

/// Physics runs at a fixed 60 Hz regardless of the frame rate.
const STEP: f32 = 1.0 / 60.0;
/// Backlog beyond this many steps is dropped.
const MAX_STEPS_PER_UPDATE: usize = 8;

/// Serializable game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FighterState {
    pub local: LocalFighter,
    pub remotes: BTreeMap<PlayerId, RemoteFighter>,
    pub accumulator: f32,
    pub damage_dealt: i32,
    pub round_timer: f32,
    pub round_complete: bool,
}

/// Side-view brawler: every participant simulates its own fighter and
/// reports hits to the victim.
pub struct FighterGame {
    config: FighterConfig,
    arena: Arena,
    table: AnimationTable,
    state: FighterState,
    local: Player,
    pending: Vec<GameEvent>,
    paused: bool,
    round_duration: f32,
}

impl FighterGame {
    pub fn new() -> Self {
        Self::with_config(FighterConfig::load())
    }

    pub fn with_config(config: FighterConfig) -> Self {
        let state = FighterState {
            local: LocalFighter::new(0, &config),
            remotes: BTreeMap::new(),
            accumulator: 0.0,
            damage_dealt: 0,
            round_timer: 0.0,
            round_complete: false,
        };
        Self {
            arena: Arena::standard(&config),
            table: AnimationTable::fighter(),
            config,
            state,
            local: Player::new(0, "", ""),
            pending: Vec::new(),
            paused: false,
            round_duration: 0.0,
        }
    }

    pub fn state(&self) -> &FighterState {
        &self.state
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Take frame counts from the local sprite's loaded sheets.
    pub fn load_animations(&mut self, cache: &SpriteCache) {
        self.table = cache.animation_table(&self.local.sprite);
    }

    fn step(&mut self, events: &mut Vec<GameEvent>) {
        let state = &mut self.state;
        let hit = state.local.step(
            &self.arena,
            &self.table,
            state.remotes.values(),
            &self.config,
            STEP,
        );
        if let Some(hit) = hit {
            state.damage_dealt += hit.amount;
            events.push(GameEvent::Damage(hit));
            events.push(GameEvent::ScoreUpdate {
                player_id: state.local.id,
                score: state.damage_dealt,
            });
        }
        for remote in state.remotes.values_mut() {
            remote.tick(&self.table, 1.0);
        }
    }

    fn death_strip_finished(&self) -> bool {
        let local = &self.state.local;
        local.is_dead() && local.controller.frame() >= self.table.get(Action::Dead).last_frame()
    }
}

impl Default for FighterGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeGame for FighterGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Dino Fight".to_string(),
            description: "Bite, kick and dodge until one dino is left standing".to_string(),
            min_players: 2,
            max_players: 8,
            estimated_round_duration: Duration::from_secs(180),
        }
    }

    fn init(&mut self, local: &Player, config: &GameConfig) {
        self.local = local.clone();
        self.state = FighterState {
            local: LocalFighter::new(local.id, &self.config),
            remotes: BTreeMap::new(),
            accumulator: 0.0,
            damage_dealt: 0,
            round_timer: 0.0,
            round_complete: false,
        };
        self.pending.clear();
        self.paused = false;
        self.round_duration = config.round_duration.as_secs_f32();
    }

    fn handle_input(&mut self, event: &InputEvent) {
        self.state.local.handle_input(event);
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused || self.state.round_complete {
            return Vec::new();
        }
        let mut events = std::mem::take(&mut self.pending);
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

        let timer_expired =
            self.round_duration > 0.0 && self.state.round_timer >= self.round_duration;
        if self.death_strip_finished() || timer_expired {
            self.state.round_complete = true;
            events.push(GameEvent::RoundComplete);
        }
        events
    }

    fn apply_remote(&mut self, snapshot: &RemoteSnapshot) {
        if snapshot.id == self.state.local.id {
            return;
        }
        match self.state.remotes.get_mut(&snapshot.id) {
            Some(remote) => {
                remote.apply(snapshot);
            },
            None => {
                tracing::info!(player_id = snapshot.id, sprite = %snapshot.sprite, "Fighter joined");
                self.state
                    .remotes
                    .insert(snapshot.id, RemoteFighter::from_snapshot(snapshot));
            },
        }
    }

    fn remove_remote(&mut self, id: PlayerId) {
        if self.state.remotes.remove(&id).is_some() {
            tracing::info!(player_id = id, "Fighter left");
        }
    }

    fn apply_damage(&mut self, event: &DamageEvent) {
        match self.state.local.receive(event) {
            HitReaction::Killed => {
                tracing::info!(player_id = event.target, attacker = event.attacker, "Fighter died");
                self.pending.push(GameEvent::GameOver {
                    player_id: event.target,
                    reason: GameOverReason::Defeated,
                });
            },
            HitReaction::Hurt { remaining } => {
                tracing::debug!(attacker = event.attacker, remaining, "Fighter hurt");
            },
            HitReaction::Ignored => {},
        }
    }

    fn local_snapshot(&self, now_ms: u64) -> Option<RemoteSnapshot> {
        let local = &self.state.local;
        Some(RemoteSnapshot {
            id: local.id,
            sprite: self.local.sprite.clone(),
            name: self.local.display_name.clone(),
            position: local.body.pos,
            direction: match local.facing {
                Facing::Left => Direction::Left,
                Facing::Right => Direction::Right,
            },
            facing: local.facing,
            action: local.action(),
            frame: local.controller.frame(),
            health: Some(local.health.current()),
            timestamp_ms: now_ms,
            message: None,
        })
    }

    arcade_game_boilerplate!(state_type: FighterState);

    fn round_results(&self) -> Vec<PlayerScore> {
        vec![PlayerScore {
            player_id: self.state.local.id,
            score: self.state.damage_dealt,
        }]
    }
}
