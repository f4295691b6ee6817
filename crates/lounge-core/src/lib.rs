pub mod animation;
pub mod collision;
pub mod config;
pub mod entity;
pub mod game_trait;
pub mod grid;
pub mod input;
pub mod net;
pub mod player;
pub mod powerup;
pub mod sprite;
pub mod time;

#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers {
    use std::collections::HashMap;
    use std::time::Duration;

    use crate::game_trait::{ArcadeGame, GameConfig, GameEvent, PlayerScore};
    use crate::input::InputEvent;
    use crate::player::{Player, PlayerId};

    /// Create `n` test players with sequential IDs starting at 1.
    pub fn make_players(n: usize) -> Vec<Player> {
        (0..n)
            .map(|i| Player::new(i as PlayerId + 1, format!("Player{}", i + 1), "shib"))
            .collect()
    }

    /// Create a GameConfig with a fixed generation seed.
    pub fn default_config(seed: u64) -> GameConfig {
        let mut custom = HashMap::new();
        custom.insert("seed".to_string(), serde_json::json!(seed));
        GameConfig {
            round_duration: Duration::from_secs(120),
            custom,
        }
    }

    /// Run N game ticks, returning all accumulated events.
    pub fn run_game_ticks(game: &mut dyn ArcadeGame, n: usize, dt: f32) -> Vec<GameEvent> {
        let mut all_events = Vec::new();
        for _ in 0..n {
            all_events.extend(game.update(dt));
        }
        all_events
    }

    // ================================================================
    // Game Trait Contract Tests
    // ================================================================
    // Every ArcadeGame implementation runs these from its own
    // #[cfg(test)] module with a concrete game instance.

    /// After init(), serialize_state() must return non-empty bytes.
    pub fn contract_init_creates_state(game: &mut dyn ArcadeGame) {
        let local = &make_players(1)[0];
        game.init(local, &default_config(7));
        let state = game.serialize_state();
        assert!(
            !state.is_empty(),
            "serialize_state() must return non-empty bytes after init"
        );
    }

    /// handle_input() followed by update() must change state.
    pub fn contract_input_changes_state(game: &mut dyn ArcadeGame, event: &InputEvent) {
        let before = game.serialize_state();
        game.handle_input(event);
        game.update(1.0 / 60.0);
        let after = game.serialize_state();
        assert_ne!(before, after, "State must change after handle_input + update");
    }

    /// update() with dt>0 must advance game state.
    pub fn contract_update_advances_time(game: &mut dyn ArcadeGame) {
        let before = game.serialize_state();
        game.update(1.0 / 60.0);
        let after = game.serialize_state();
        assert_ne!(before, after, "update(dt>0) must advance game state");
    }

    /// serialize_state → apply_state must be stable after one roundtrip.
    pub fn contract_state_roundtrip_preserves(game: &mut dyn ArcadeGame) {
        let state_a = game.serialize_state();
        game.apply_state(&state_a);
        let state_b = game.serialize_state();
        game.apply_state(&state_b);
        let state_c = game.serialize_state();
        assert_eq!(
            state_b, state_c,
            "State must be stable after serialize→apply→serialize roundtrip"
        );
    }

    /// pause() must freeze state, resume() must unfreeze it.
    pub fn contract_pause_stops_updates(game: &mut dyn ArcadeGame) {
        game.pause();
        let before = game.serialize_state();
        game.update(1.0 / 60.0);
        let during_pause = game.serialize_state();
        assert_eq!(before, during_pause, "State must not change while paused");

        game.resume();
        game.update(1.0 / 60.0);
        let after_resume = game.serialize_state();
        assert_ne!(during_pause, after_resume, "State must change after resume");
    }

    /// A publishing game's snapshot must carry the local id and sprite.
    pub fn contract_local_snapshot_identifies_player(game: &dyn ArcadeGame) {
        let local = &make_players(1)[0];
        if let Some(snapshot) = game.local_snapshot(1_000) {
            assert_eq!(snapshot.id, local.id, "snapshot id must be the local id");
            assert_eq!(snapshot.sprite, local.sprite, "snapshot must carry the sprite");
            assert_eq!(snapshot.timestamp_ms, 1_000, "snapshot must carry the timestamp");
        }
    }

    /// Running update() long enough must eventually end the round.
    pub fn contract_round_eventually_completes(
        game: &mut dyn ArcadeGame,
        max_ticks: usize,
        dt: f32,
    ) {
        for _ in 0..max_ticks {
            game.update(dt);
            if game.is_round_complete() {
                return;
            }
        }
        assert!(
            game.is_round_complete(),
            "Game must complete within {max_ticks} ticks"
        );
    }

    /// round_results() must include the local participant.
    pub fn contract_round_results_include_local(game: &dyn ArcadeGame) -> Vec<PlayerScore> {
        let local = &make_players(1)[0];
        let results = game.round_results();
        assert!(
            results.iter().any(|r| r.player_id == local.id),
            "round_results must include the local participant"
        );
        results
    }
}
