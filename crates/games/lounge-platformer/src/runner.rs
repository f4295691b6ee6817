//! Endless runner: the ground scrolls past a runner fixed on screen.

use std::collections::VecDeque;
use std::time::Duration;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use lounge_core::arcade_game_boilerplate;
use lounge_core::collision::Aabb;
use lounge_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameMetadata, GameOverReason, PlayerScore,
};
use lounge_core::input::{InputAction, InputEvent, InputPhase};
use lounge_core::player::{Player, PlayerId};

use crate::config::{PlatformerConfig, RunnerConfig};
use crate::{MAX_STEPS_PER_UPDATE, STEP};

/// Scrolling strip of ground tiles; `false` marks a gap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ground {
    pub tiles: VecDeque<bool>,
    /// Scroll offset of tile 0, in `(-tile_size, 0]`.
    pub offset: f32,
    trailing_gaps: usize,
}

impl Ground {
    /// Safe run-up, then alternating runs of 5-15 tiles and short gaps.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, cfg: &RunnerConfig) -> Self {
        let mut tiles = VecDeque::with_capacity(cfg.ground_tiles);
        tiles.extend(std::iter::repeat_n(true, cfg.safe_tiles.min(cfg.ground_tiles)));
        while tiles.len() < cfg.ground_tiles {
            let run = rng.random_range(5..=15).min(cfg.ground_tiles - tiles.len());
            tiles.extend(std::iter::repeat_n(true, run));
            if tiles.len() >= cfg.ground_tiles || cfg.max_gap_tiles == 0 {
                continue;
            }
            let gap = rng
                .random_range(1..=cfg.max_gap_tiles)
                .min(cfg.ground_tiles - tiles.len());
            tiles.extend(std::iter::repeat_n(false, gap));
        }
        let trailing_gaps = tiles.iter().rev().take_while(|t| !**t).count();
        Self {
            tiles,
            offset: 0.0,
            trailing_gaps,
        }
    }

    fn next_tile<R: Rng + ?Sized>(&mut self, rng: &mut R, cfg: &RunnerConfig) -> bool {
        let gap = self.trailing_gaps < cfg.max_gap_tiles && rng.random_bool(cfg.gap_chance);
        self.trailing_gaps = if gap { self.trailing_gaps + 1 } else { 0 };
        !gap
    }

    /// Move the strip left by `distance`, recycling tiles that leave the
    /// screen.
    pub fn scroll<R: Rng + ?Sized>(&mut self, distance: f32, rng: &mut R, cfg: &RunnerConfig) {
        self.offset -= distance;
        while self.offset <= -cfg.tile_size {
            self.offset += cfg.tile_size;
            self.tiles.pop_front();
            let tile = self.next_tile(rng, cfg);
            self.tiles.push_back(tile);
        }
    }

    /// Whether the ground holds a body spanning `[left, left + width)` in
    /// screen space. Gaps overlapped by at most `leniency` pixels at the
    /// edges are ignored only while `airborne`.
    pub fn supports(&self, left: f32, width: f32, airborne: bool, cfg: &RunnerConfig) -> bool {
        let t = cfg.tile_size;
        let start = left - self.offset;
        let end = start + width;
        let first = (start / t).floor().max(0.0) as usize;
        let last = (end / t).floor().max(0.0) as usize;
        (first..=last).all(|i| {
            if self.tiles.get(i).copied().unwrap_or(false) {
                return true;
            }
            let overlap = end.min((i + 1) as f32 * t) - start.max(i as f32 * t);
            overlap <= 0.0 || (airborne && overlap <= cfg.leniency)
        })
    }
}

/// Floating platform, `tiles` wide, scrolling with the ground.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ledge {
    pub x: f32,
    pub y: f32,
    pub tiles: u32,
}

impl Ledge {
    fn right(&self, tile: f32) -> f32 {
        self.x + self.tiles as f32 * tile
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunnerState {
    pub ground: Ground,
    /// Top of the runner; x is fixed by config.
    pub y: f32,
    pub vel_y: f32,
    /// Set by a jump, cleared on landing. Edge leniency applies only here.
    pub jumping: bool,
    pub grounded: bool,
    pub ledges: Vec<Ledge>,
    pub coins: Vec<Vec2>,
    pub coins_collected: u32,
    pub distance: f32,
    pub ledge_timer: f32,
    pub jump_requested: bool,
    pub game_over: bool,
    pub accumulator: f32,
    pub round_timer: f32,
    pub round_complete: bool,
}

impl RunnerState {
    fn new<R: Rng + ?Sized>(rng: &mut R, cfg: &RunnerConfig) -> Self {
        Self {
            ground: Ground::generate(rng, cfg),
            y: cfg.floor_y(),
            vel_y: 0.0,
            jumping: false,
            grounded: true,
            ledges: Vec::new(),
            coins: Vec::new(),
            coins_collected: 0,
            distance: 0.0,
            ledge_timer: 0.0,
            jump_requested: false,
            game_over: false,
            accumulator: 0.0,
            round_timer: 0.0,
            round_complete: false,
        }
    }

    pub fn runner_box(&self, cfg: &RunnerConfig) -> Aabb {
        Aabb::new(cfg.runner_x, self.y, cfg.body_size[0], cfg.body_size[1])
    }
}

/// Jump over gaps and grab coins while the world speeds up.
pub struct RunnerGame {
    config: RunnerConfig,
    state: RunnerState,
    rng: StdRng,
    local_id: PlayerId,
    paused: bool,
    round_duration: f32,
}

impl RunnerGame {
    pub fn new() -> Self {
        Self::with_config(PlatformerConfig::load().runner)
    }

    pub fn with_config(config: RunnerConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(42);
        let state = RunnerState::new(&mut rng, &config);
        Self {
            config,
            state,
            rng,
            local_id: 0,
            paused: false,
            round_duration: 0.0,
        }
    }

    pub fn state(&self) -> &RunnerState {
        &self.state
    }

    pub fn speed(&self) -> f32 {
        self.config.speed_for(self.state.coins_collected)
    }

    fn spawn_ledge(&mut self) {
        let cfg = &self.config;
        let t = cfg.tile_size;
        let tiles = self.rng.random_range(2..=4u32);
        let y = cfg.screen_height - t * self.rng.random_range(3..=5) as f32;
        let x = cfg.screen_width + self.rng.random_range(0.0..cfg.screen_width / 2.0);
        self.state.ledges.push(Ledge { x, y, tiles });
        if self.rng.random_bool(cfg.coin_chance) {
            let slot = self.rng.random_range(0..tiles) as f32;
            self.state
                .coins
                .push(Vec2::new(x + slot * t + t / 4.0, y - t - 10.0));
        }
        let excess = self.state.ledges.len().saturating_sub(cfg.max_platforms);
        self.state.ledges.drain(..excess);
    }

    fn step(&mut self, events: &mut Vec<GameEvent>) {
        let speed = self.speed();
        let t = self.config.tile_size;
        self.state.ground.scroll(speed, &mut self.rng, &self.config);
        self.state.distance += speed;

        self.state.ledge_timer += STEP;
        if self.state.ledge_timer >= self.config.platform_interval {
            self.state.ledge_timer = 0.0;
            self.spawn_ledge();
        }
        for ledge in &mut self.state.ledges {
            ledge.x -= speed;
        }
        self.state.ledges.retain(|l| l.right(t) > -t);
        for coin in &mut self.state.coins {
            coin.x -= speed;
        }

        let runner = self.state.runner_box(&self.config);
        let before = self.state.coins.len();
        self.state
            .coins
            .retain(|c| !Aabb::new(c.x, c.y, t, t).overlaps(&runner));
        let taken = before - self.state.coins.len();
        if taken > 0 {
            self.state.coins_collected += taken as u32;
            events.push(GameEvent::ScoreUpdate {
                player_id: self.local_id,
                score: self.state.coins_collected as i32,
            });
        }
        self.state.coins.retain(|c| c.x > -t);

        if std::mem::take(&mut self.state.jump_requested) && self.state.grounded {
            self.state.vel_y = self.config.jump_strength;
            self.state.jumping = true;
            self.state.grounded = false;
        }
        self.move_vertically();

        if self.state.y > self.config.screen_height + self.config.fall_margin {
            tracing::info!(
                player_id = self.local_id,
                coins = self.state.coins_collected,
                "Runner fell"
            );
            self.state.game_over = true;
            self.state.round_complete = true;
            events.push(GameEvent::GameOver {
                player_id: self.local_id,
                reason: GameOverReason::Fell,
            });
            events.push(GameEvent::RoundComplete);
        }
    }

    fn move_vertically(&mut self) {
        let cfg = &self.config;
        let state = &mut self.state;
        let (w, h) = (cfg.body_size[0], cfg.body_size[1]);
        let t = cfg.tile_size;
        let prev_y = state.y;
        state.vel_y += cfg.gravity;
        state.y += state.vel_y;
        state.grounded = false;

        // A runner already below the surface keeps falling through the gap.
        let floor = cfg.floor_y();
        if prev_y <= floor
            && state.y >= floor
            && state.ground.supports(cfg.runner_x, w, state.jumping, cfg)
        {
            state.y = floor;
            state.vel_y = 0.0;
            state.jumping = false;
            state.grounded = true;
        }

        let (left, right) = (cfg.runner_x, cfg.runner_x + w);
        for ledge in &state.ledges {
            if right <= ledge.x || left >= ledge.right(t) {
                continue;
            }
            let (top, bottom) = (ledge.y, ledge.y + t);
            let feet = state.y + h;
            if state.vel_y >= 0.0 && feet >= top && feet <= bottom {
                state.y = top - h;
                state.vel_y = 0.0;
                state.jumping = false;
                state.grounded = true;
            } else if state.vel_y < 0.0 && state.y <= bottom + 5.0 && state.y >= top - 5.0 {
                state.vel_y = 0.0;
                state.y = bottom;
            }
        }
    }
}

impl Default for RunnerGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeGame for RunnerGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Dino Run".to_string(),
            description: "Jump the gaps and grab coins; every ten coins speeds you up"
                .to_string(),
            min_players: 1,
            max_players: 1,
            estimated_round_duration: Duration::from_secs(90),
        }
    }

    fn init(&mut self, local: &Player, config: &GameConfig) {
        let seed = config.seed().unwrap_or(42);
        self.rng = StdRng::seed_from_u64(seed);
        self.state = RunnerState::new(&mut self.rng, &self.config);
        self.local_id = local.id;
        self.paused = false;
        self.round_duration = config.round_duration.as_secs_f32();
    }

    fn handle_input(&mut self, event: &InputEvent) {
        if event.action == InputAction::Jump && event.phase == InputPhase::Start {
            if self.state.game_over {
                tracing::trace!("Jump ignored: run is over");
                return;
            }
            self.state.jump_requested = true;
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
        while self.state.accumulator + 1e-6 >= STEP && !self.state.round_complete {
            if steps == MAX_STEPS_PER_UPDATE {
                self.state.accumulator = 0.0;
                break;
            }
            self.state.accumulator = (self.state.accumulator - STEP).max(0.0);
            self.step(&mut events);
            steps += 1;
        }

        if !self.state.round_complete
            && self.round_duration > 0.0
            && self.state.round_timer >= self.round_duration
        {
            self.state.round_complete = true;
            events.push(GameEvent::RoundComplete);
        }
        events
    }

    arcade_game_boilerplate!(state_type: RunnerState);

    fn round_results(&self) -> Vec<PlayerScore> {
        vec![PlayerScore {
            player_id: self.local_id,
            score: self.state.coins_collected as i32,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lounge_core::test_helpers::{
        contract_init_creates_state, contract_input_changes_state,
        contract_local_snapshot_identifies_player, contract_pause_stops_updates,
        contract_round_eventually_completes, contract_round_results_include_local,
        contract_state_roundtrip_preserves, contract_update_advances_time, default_config,
        make_players, run_game_ticks,
    };

    const DT: f32 = 1.0 / 60.0;

    fn game() -> RunnerGame {
        let mut game = RunnerGame::with_config(RunnerConfig::default());
        game.init(&make_players(1)[0], &default_config(7));
        game
    }

    fn strip(pattern: &str) -> Ground {
        Ground {
            tiles: pattern.chars().map(|c| c == '#').collect(),
            offset: 0.0,
            trailing_gaps: 0,
        }
    }

    // ================================================================
    // Game trait contract
    // ================================================================

    #[test]
    fn contract_init() {
        let mut game = RunnerGame::with_config(RunnerConfig::default());
        contract_init_creates_state(&mut game);
    }

    #[test]
    fn contract_input() {
        let mut game = game();
        contract_input_changes_state(&mut game, &InputEvent::jump());
    }

    #[test]
    fn contract_update() {
        let mut game = game();
        contract_update_advances_time(&mut game);
    }

    #[test]
    fn contract_roundtrip() {
        let mut game = game();
        run_game_ticks(&mut game, 5, DT);
        contract_state_roundtrip_preserves(&mut game);
    }

    #[test]
    fn contract_pause() {
        let mut game = game();
        contract_pause_stops_updates(&mut game);
    }

    #[test]
    fn contract_snapshot() {
        let game = game();
        contract_local_snapshot_identifies_player(&game);
    }

    #[test]
    fn contract_round_completes() {
        let mut game = game();
        contract_round_eventually_completes(&mut game, 200, 1.0);
    }

    #[test]
    fn contract_results() {
        let game = game();
        let results = contract_round_results_include_local(&game);
        assert_eq!(results[0].score, 0);
    }

    // ================================================================
    // Ground
    // ================================================================

    #[test]
    fn generated_ground_starts_safe_and_caps_gaps() {
        let cfg = RunnerConfig::default();
        let ground = Ground::generate(&mut StdRng::seed_from_u64(3), &cfg);
        assert_eq!(ground.tiles.len(), cfg.ground_tiles);
        assert!(ground.tiles.iter().take(cfg.safe_tiles).all(|t| *t));
        let mut run = 0;
        for solid in &ground.tiles {
            run = if *solid { 0 } else { run + 1 };
            assert!(run <= cfg.max_gap_tiles);
        }
    }

    #[test]
    fn scrolling_recycles_tiles_and_keeps_gap_limit() {
        let cfg = RunnerConfig {
            gap_chance: 1.0,
            ..RunnerConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let mut ground = Ground::generate(&mut rng, &cfg);
        ground.scroll(cfg.tile_size * 40.0 + 5.0, &mut rng, &cfg);
        assert_eq!(ground.tiles.len(), cfg.ground_tiles);
        assert_eq!(ground.offset, -5.0);
        let mut run = 0;
        for solid in &ground.tiles {
            run = if *solid { 0 } else { run + 1 };
            assert!(run <= cfg.max_gap_tiles);
        }
    }

    #[test]
    fn edge_leniency_only_while_jumping() {
        let cfg = RunnerConfig::default();
        // Tiles 0..4 solid, 4 is a gap.
        let ground = strip("####.###");
        // Body [81, 129) pokes 1 px into the gap tile [128, 160).
        assert!(ground.supports(81.0, 48.0, true, &cfg));
        assert!(!ground.supports(81.0, 48.0, false, &cfg));
        // 3 px is beyond the leniency.
        assert!(!ground.supports(83.0, 48.0, true, &cfg));
        // Flush with the gap edge is fully supported.
        assert!(ground.supports(80.0, 48.0, false, &cfg));
    }

    #[test]
    fn body_over_a_gap_falls_through() {
        let cfg = RunnerConfig::default();
        let ground = strip("##.....#");
        assert!(!ground.supports(100.0, 48.0, true, &cfg));
    }

    // ================================================================
    // Running
    // ================================================================

    #[test]
    fn runner_stays_on_solid_ground() {
        let mut game = game();
        run_game_ticks(&mut game, 60, DT);
        assert_eq!(game.state.y, game.config.floor_y());
        assert!(game.state.grounded);
        assert!(!game.state.game_over);
        assert!(game.state.distance > 0.0);
    }

    #[test]
    fn jump_arcs_and_lands() {
        let mut game = game();
        game.handle_input(&InputEvent::jump());
        game.update(DT);
        assert!(game.state.jumping);
        assert!(game.state.y < game.config.floor_y());
        run_game_ticks(&mut game, 60, DT);
        assert!(!game.state.jumping);
        assert_eq!(game.state.y, game.config.floor_y());
    }

    #[test]
    fn falling_into_a_gap_ends_the_run() {
        let mut game = game();
        game.state.ground = strip(&".".repeat(100));
        let events = run_game_ticks(&mut game, 120, DT);
        assert!(game.state.game_over);
        assert!(game.is_round_complete());
        assert!(events.contains(&GameEvent::GameOver {
            player_id: 1,
            reason: GameOverReason::Fell,
        }));
    }

    #[test]
    fn coins_score_and_speed_up() {
        let mut game = game();
        let base = game.speed();
        let runner = game.state.runner_box(&game.config);
        for _ in 0..10 {
            game.state.coins.push(runner.min + Vec2::splat(4.0));
        }
        let events = run_game_ticks(&mut game, 1, DT);
        assert_eq!(game.state.coins_collected, 10);
        assert!(events.contains(&GameEvent::ScoreUpdate {
            player_id: 1,
            score: 10,
        }));
        assert_eq!(game.speed(), base + game.config.speed_step);
    }

    #[test]
    fn lands_on_a_ledge() {
        let mut game = game();
        let cfg = game.config.clone();
        let top = cfg.floor_y() - 60.0 + cfg.body_size[1];
        game.state.ledges.push(Ledge {
            x: cfg.runner_x - 20.0,
            y: top,
            tiles: 6,
        });
        game.state.y = top - cfg.body_size[1] - 2.0;
        game.state.grounded = false;
        run_game_ticks(&mut game, 3, DT);
        assert!(game.state.grounded);
        assert_eq!(game.state.y, top - cfg.body_size[1]);
    }
}
