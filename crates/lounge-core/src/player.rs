use serde::{Deserialize, Serialize};

/// Unique identifier for a lounge participant.
pub type PlayerId = u64;

/// A participant in the lounge or in one of its games.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    /// Sprite key (e.g. `"pikachu"`, `"dino-blue"`) used to look up sheets.
    pub sprite: String,
    pub is_spectator: bool,
}

impl Player {
    pub fn new(id: PlayerId, display_name: impl Into<String>, sprite: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            sprite: sprite.into(),
            is_spectator: false,
        }
    }
}
