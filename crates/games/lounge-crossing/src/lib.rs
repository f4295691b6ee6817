pub mod config;
pub mod lanes;

use std::time::Duration;

use glam::Vec2;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use lounge_core::arcade_game_boilerplate;
use lounge_core::collision::Span;
use lounge_core::game_trait::{
    ArcadeGame, GameConfig, GameEvent, GameMetadata, GameOverReason, PlayerScore,
};
use lounge_core::input::{InputAction, InputEvent, InputPhase, MoveDir};
use lounge_core::player::{Player, PlayerId};
use lounge_motion::RenderState;
use lounge_motion::grid_step::GridStepper;

use config::CrossingConfig;
use lanes::{Board, Lane};

/// Serializable round state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrossingState {
    pub board: Board,
    pub stepper: GridStepper,
    /// Accumulated sideways carry from riding logs. Steps add on top of it.
    pub drift: f32,
    pub furthest_lane: i32,
    pub game_over: Option<GameOverReason>,
    pub round_timer: f32,
    pub round_complete: bool,
}

impl CrossingState {
    fn new(rng: &mut StdRng, config: &CrossingConfig) -> Self {
        Self {
            board: Board::generate(rng, config),
            stepper: GridStepper::new(
                0,
                config.start_column(),
                config.step_duration,
                config.hop_height,
                config.max_queued_steps,
            ),
            drift: 0.0,
            furthest_lane: 0,
            game_over: None,
            round_timer: 0.0,
            round_complete: false,
        }
    }
}

/// Hop forward across roads and rivers without getting hit or falling in.
pub struct CrossingGame {
    config: CrossingConfig,
    state: CrossingState,
    rng: StdRng,
    local_id: PlayerId,
    paused: bool,
    round_duration: f32,
}

impl CrossingGame {
    pub fn new() -> Self {
        Self::with_config(CrossingConfig::load())
    }

    pub fn with_config(config: CrossingConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(42);
        let state = CrossingState::new(&mut rng, &config);
        Self {
            config,
            state,
            rng,
            local_id: 0,
            paused: false,
            round_duration: 0.0,
        }
    }

    pub fn state(&self) -> &CrossingState {
        &self.state
    }

    pub fn config(&self) -> &CrossingConfig {
        &self.config
    }

    /// World x of the avatar: rendered column plus log drift.
    pub fn avatar_x(&self) -> f32 {
        let stepper = &self.state.stepper;
        self.config.column_center(stepper.column())
            + stepper.visual_offset().x * self.config.position_width
            + self.state.drift
    }

    pub fn avatar_position(&self) -> Vec2 {
        let stepper = &self.state.stepper;
        let lane = stepper.lane() as f32 + stepper.visual_offset().y;
        Vec2::new(self.avatar_x(), lane * self.config.position_width)
    }

    pub fn render_state(&self) -> RenderState {
        let stepper = &self.state.stepper;
        RenderState {
            hop: stepper.hop_offset(),
            direction: stepper.facing().facing(),
            ..RenderState::at(self.avatar_position())
        }
    }

    fn request_step(&mut self, dir: MoveDir) {
        if self.state.game_over.is_some() {
            tracing::trace!(?dir, "Step rejected: game over");
            return;
        }
        let accepted = self.state.stepper.request(dir, &self.state.board);
        if accepted && dir == MoveDir::Up {
            self.state.board.push_lane(&mut self.rng, &self.config);
        }
    }

    /// Vehicle and river checks against the committed lane.
    fn hazard_check(&mut self, dt: f32) -> Option<GameOverReason> {
        let lane = self.state.board.lane(self.state.stepper.lane())?;
        let x = self.avatar_x();
        match lane {
            Lane::Road { .. } => {
                let avatar = Span::centered(x, self.config.avatar_size);
                lane.vehicle_hits(&avatar, &self.config)
                    .then_some(GameOverReason::HitByVehicle)
            },
            Lane::River { .. } => match lane.log_carry(x, dt, &self.config) {
                Some(carry) => {
                    self.state.drift += carry;
                    (self.avatar_x().abs() > self.config.board_width() / 2.0)
                        .then_some(GameOverReason::SweptAway)
                },
                None => Some(GameOverReason::Drowned),
            },
            Lane::Field | Lane::Forest { .. } => None,
        }
    }
}

impl Default for CrossingGame {
    fn default() -> Self {
        Self::new()
    }
}

impl ArcadeGame for CrossingGame {
    fn metadata(&self) -> GameMetadata {
        GameMetadata {
            name: "Crossing".to_string(),
            description: "Hop across roads and rivers as far as you can".to_string(),
            min_players: 1,
            max_players: 1,
            estimated_round_duration: Duration::from_secs(120),
        }
    }

    fn init(&mut self, local: &Player, config: &GameConfig) {
        let seed = config.seed().unwrap_or(42);
        self.rng = StdRng::seed_from_u64(seed);
        self.state = CrossingState::new(&mut self.rng, &self.config);
        self.local_id = local.id;
        self.paused = false;
        self.round_duration = config.round_duration.as_secs_f32();
        tracing::debug!(seed, lanes = self.state.board.lanes.len(), "Crossing board generated");
    }

    fn handle_input(&mut self, event: &InputEvent) {
        if let (InputAction::Move, InputPhase::Start, Some(dir)) =
            (event.action, event.phase, event.direction)
        {
            self.request_step(dir);
        }
    }

    fn update(&mut self, dt: f32) -> Vec<GameEvent> {
        if self.paused || self.state.round_complete {
            return Vec::new();
        }
        let mut events = Vec::new();
        self.state.round_timer += dt;
        self.state.board.advance(dt, &self.config);

        if let Some(done) = self.state.stepper.tick(dt)
            && done.lane > self.state.furthest_lane
        {
            self.state.furthest_lane = done.lane;
            events.push(GameEvent::ScoreUpdate {
                player_id: self.local_id,
                score: done.lane,
            });
        }

        if let Some(reason) = self.hazard_check(dt) {
            tracing::info!(
                player_id = self.local_id,
                ?reason,
                lane = self.state.stepper.lane(),
                "Crossing game over"
            );
            self.state.stepper.halt();
            self.state.game_over = Some(reason);
            self.state.round_complete = true;
            events.push(GameEvent::GameOver {
                player_id: self.local_id,
                reason,
            });
            events.push(GameEvent::RoundComplete);
        } else if self.round_duration > 0.0 && self.state.round_timer >= self.round_duration {
            self.state.round_complete = true;
            events.push(GameEvent::RoundComplete);
        }
        events
    }

    arcade_game_boilerplate!(state_type: CrossingState);

    fn round_results(&self) -> Vec<PlayerScore> {
        vec![PlayerScore {
            player_id: self.local_id,
            score: self.state.furthest_lane,
        }]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lanes::{Travel, VehicleKind};
    use lounge_core::test_helpers::{
        contract_init_creates_state, contract_input_changes_state,
        contract_local_snapshot_identifies_player, contract_pause_stops_updates,
        contract_round_eventually_completes, contract_round_results_include_local,
        contract_state_roundtrip_preserves, contract_update_advances_time, default_config,
        make_players,
    };
    use lounge_motion::grid_step::StepRules;

    const DT: f32 = 1.0 / 60.0;

    fn game() -> CrossingGame {
        let mut game = CrossingGame::with_config(CrossingConfig::default());
        game.init(&make_players(1)[0], &default_config(7));
        game
    }

    fn set_lane(game: &mut CrossingGame, index: usize, lane: Lane) {
        game.state.board.lanes[index] = lane;
    }

    // ================================================================
    // Game trait contract
    // ================================================================

    #[test]
    fn contract_init() {
        let mut game = CrossingGame::with_config(CrossingConfig::default());
        contract_init_creates_state(&mut game);
    }

    #[test]
    fn contract_input() {
        let mut game = game();
        set_lane(&mut game, 1, Lane::Field);
        contract_input_changes_state(&mut game, &InputEvent::press(MoveDir::Up));
    }

    #[test]
    fn contract_update() {
        let mut game = game();
        contract_update_advances_time(&mut game);
    }

    #[test]
    fn contract_roundtrip() {
        let mut game = game();
        game.update(DT);
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
    // Stepping
    // ================================================================

    #[test]
    fn forward_step_lands_after_step_duration() {
        let mut game = game();
        set_lane(&mut game, 1, Lane::Field);
        let lanes_before = game.state.board.lanes.len();

        game.handle_input(&InputEvent::press(MoveDir::Up));
        assert_eq!(game.state.board.lanes.len(), lanes_before + 1);
        game.update(0.1);
        assert_eq!(game.state.stepper.lane(), 0);
        assert!(game.render_state().hop > 0.0);

        let events = game.update(0.1);
        assert_eq!(game.state.stepper.lane(), 1);
        assert_eq!(game.render_state().hop, 0.0);
        assert!(events.contains(&GameEvent::ScoreUpdate {
            player_id: 1,
            score: 1
        }));
    }

    #[test]
    fn tree_blocks_step() {
        let mut game = game();
        set_lane(
            &mut game,
            1,
            Lane::Forest {
                occupied: [8].into(),
            },
        );
        game.handle_input(&InputEvent::press(MoveDir::Up));
        assert!(!game.state.stepper.is_moving());
    }

    #[test]
    fn backward_from_start_rejected() {
        let mut game = game();
        game.handle_input(&InputEvent::press(MoveDir::Down));
        assert!(!game.state.stepper.is_moving());
    }

    #[test]
    fn input_ignored_after_game_over() {
        let mut game = game();
        set_lane(&mut game, 1, Lane::Field);
        game.state.game_over = Some(GameOverReason::Drowned);
        game.handle_input(&InputEvent::press(MoveDir::Up));
        assert!(!game.state.stepper.is_moving());
    }

    // ================================================================
    // Hazards
    // ================================================================

    #[test]
    fn vehicle_on_current_lane_ends_round_same_tick() {
        let mut game = game();
        set_lane(
            &mut game,
            0,
            Lane::Road {
                kind: VehicleKind::Car,
                direction: Travel::Right,
                speed: 2.0,
                vehicles: vec![0.0],
            },
        );
        let events = game.update(DT);
        assert_eq!(game.state.game_over, Some(GameOverReason::HitByVehicle));
        assert!(game.is_round_complete());
        assert!(events.contains(&GameEvent::GameOver {
            player_id: 1,
            reason: GameOverReason::HitByVehicle,
        }));
    }

    #[test]
    fn vehicle_on_other_lane_is_harmless() {
        let mut game = game();
        set_lane(
            &mut game,
            1,
            Lane::Road {
                kind: VehicleKind::Truck,
                direction: Travel::Left,
                speed: 3.0,
                vehicles: vec![0.0],
            },
        );
        game.update(DT);
        assert_eq!(game.state.game_over, None);
    }

    #[test]
    fn river_without_log_drowns() {
        let mut game = game();
        set_lane(
            &mut game,
            0,
            Lane::River {
                direction: Travel::Left,
                speed: 2.0,
                logs: vec![300.0],
            },
        );
        game.update(DT);
        assert_eq!(game.state.game_over, Some(GameOverReason::Drowned));
    }

    #[test]
    fn log_carries_avatar() {
        let mut game = game();
        set_lane(
            &mut game,
            0,
            Lane::River {
                direction: Travel::Right,
                speed: 2.0,
                logs: vec![0.0],
            },
        );
        let events = game.update(0.016);
        assert!(events.is_empty());
        assert_eq!(game.state.game_over, None);
        assert!((game.avatar_x() - 2.0).abs() < 1e-3);
    }

    #[test]
    fn log_carrying_off_board_sweeps_away() {
        let mut game = game();
        game.state.drift = 356.5;
        set_lane(
            &mut game,
            0,
            Lane::River {
                direction: Travel::Right,
                speed: 2.0,
                logs: vec![356.0],
            },
        );
        game.update(DT);
        assert_eq!(game.state.game_over, Some(GameOverReason::SweptAway));
    }

    #[test]
    fn sideways_hop_on_a_log_keeps_the_carry() {
        let mut game = game();
        set_lane(
            &mut game,
            0,
            Lane::River {
                direction: Travel::Right,
                speed: 2.0,
                logs: vec![0.0],
            },
        );
        for _ in 0..10 {
            game.update(0.016);
        }
        let mut last_x = game.avatar_x();
        assert!((last_x - 20.0).abs() < 1e-2);

        game.handle_input(&InputEvent::press(MoveDir::Left));
        while game.state.stepper.is_moving() {
            game.update(0.016);
            let x = game.avatar_x();
            // One tick moves at most a slice of a column plus the carry.
            assert!((x - last_x).abs() < 6.0, "jumped from {last_x} to {x}");
            last_x = x;
        }
        assert_eq!(game.state.game_over, None);
        assert_eq!(game.state.stepper.column(), game.config.start_column() - 1);
        assert!(game.state.drift > 40.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn dir(n: u8) -> MoveDir {
            match n % 4 {
                0 => MoveDir::Up,
                1 => MoveDir::Down,
                2 => MoveDir::Left,
                _ => MoveDir::Right,
            }
        }

        proptest! {
            #[test]
            fn committed_cell_always_enterable(
                seed in 0u64..500,
                moves in proptest::collection::vec(0u8..4, 1..60),
            ) {
                let mut game = CrossingGame::with_config(CrossingConfig::default());
                game.init(&make_players(1)[0], &default_config(seed));
                for m in moves {
                    game.handle_input(&InputEvent::press(dir(m)));
                    let before = (game.state.stepper.lane(), game.state.stepper.column());
                    for _ in 0..4 {
                        game.update(0.05);
                    }
                    let after = (game.state.stepper.lane(), game.state.stepper.column());
                    let moved = (after.0 - before.0).abs() + (after.1 - before.1).abs();
                    prop_assert!(moved <= 1);
                    prop_assert!(game.state.board.can_enter(after.0, after.1));
                }
            }
        }
    }
}
