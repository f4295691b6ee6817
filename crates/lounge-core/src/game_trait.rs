use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::input::InputEvent;
use crate::net::damage::DamageEvent;
use crate::net::snapshot::RemoteSnapshot;
use crate::player::{Player, PlayerId};

/// Core trait every lounge game implements.
///
/// The session owns networking and the remote roster; a game simulates the
/// local participant, mirrors remote ones from snapshots, and reports what
/// should be published.
pub trait ArcadeGame: Send + Sync {
    /// Game metadata for the game library screen.
    fn metadata(&self) -> GameMetadata;

    /// Called once when the round starts for the local participant.
    fn init(&mut self, local: &Player, config: &GameConfig);

    /// Feed one normalized input event for the local participant.
    fn handle_input(&mut self, event: &InputEvent);

    /// Called each frame. Returns a list of game events.
    fn update(&mut self, dt: f32) -> Vec<GameEvent>;

    /// Mirror a remote participant's published state.
    fn apply_remote(&mut self, _snapshot: &RemoteSnapshot) {}

    /// A remote participant left or went stale.
    fn remove_remote(&mut self, _id: PlayerId) {}

    /// Damage another participant addressed to the local one.
    fn apply_damage(&mut self, _event: &DamageEvent) {}

    /// State of the local participant to publish, if the game publishes any.
    fn local_snapshot(&self, _now_ms: u64) -> Option<RemoteSnapshot> {
        None
    }

    /// Simulation rate in Hz. Physics constants assume 60.
    fn tick_rate(&self) -> f32 {
        60.0
    }

    /// Serialize the local game state (MessagePack).
    fn serialize_state(&self) -> Vec<u8>;

    /// Restore state produced by [`ArcadeGame::serialize_state`].
    fn apply_state(&mut self, state: &[u8]);

    fn pause(&mut self);

    fn resume(&mut self);

    /// Whether the current round is over (game over or won).
    fn is_round_complete(&self) -> bool;

    /// Final scores for the completed round.
    fn round_results(&self) -> Vec<PlayerScore>;
}

/// Game metadata for the game library screen.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameMetadata {
    pub name: String,
    pub description: String,
    pub min_players: u8,
    pub max_players: u8,
    pub estimated_round_duration: Duration,
}

/// Per-round options.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GameConfig {
    pub round_duration: Duration,
    pub custom: HashMap<String, serde_json::Value>,
}

impl GameConfig {
    /// Procedural generation seed (`custom["seed"]`), if provided.
    pub fn seed(&self) -> Option<u64> {
        self.custom.get("seed").and_then(serde_json::Value::as_u64)
    }

    pub fn custom_u64(&self, key: &str) -> Option<u64> {
        self.custom.get(key).and_then(serde_json::Value::as_u64)
    }
}

/// Why a participant's round ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameOverReason {
    HitByVehicle,
    Drowned,
    SweptAway,
    Fell,
    OutOfLives,
    Defeated,
}

/// Events emitted by a game during update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    ScoreUpdate {
        player_id: PlayerId,
        score: i32,
    },
    /// The local participant hit someone; publish to the victim's inbox.
    Damage(DamageEvent),
    GameOver {
        player_id: PlayerId,
        reason: GameOverReason,
    },
    BossDefeated {
        tier: u8,
    },
    RoundComplete,
}

/// Score entry for a participant at the end of a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerScore {
    pub player_id: PlayerId,
    pub score: i32,
}

/// Generates the `ArcadeGame` methods that are identical across all games:
/// `serialize_state`, `apply_state`, `pause`, `resume`, `is_round_complete`.
///
/// Requires the implementing struct to have `state: $StateType` and `paused: bool` fields,
/// and `$StateType` to have a `round_complete: bool` field.
#[macro_export]
macro_rules! arcade_game_boilerplate {
    (state_type: $StateType:ty) => {
        fn serialize_state(&self) -> Vec<u8> {
            rmp_serde::to_vec(&self.state).expect("game state serialization must succeed")
        }

        fn apply_state(&mut self, state: &[u8]) {
            if let Ok(s) = rmp_serde::from_slice::<$StateType>(state) {
                self.state = s;
            }
        }

        fn pause(&mut self) {
            self.paused = true;
        }

        fn resume(&mut self) {
            self.paused = false;
        }

        fn is_round_complete(&self) -> bool {
            self.state.round_complete
        }
    };
}
