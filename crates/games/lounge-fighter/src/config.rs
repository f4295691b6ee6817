use serde::{Deserialize, Serialize};

use lounge_core::config::load_toml_or_default;

/// Data-driven configuration for the fighter. Physics values are per 60 Hz
/// tick, distances in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FighterConfig {
    pub gravity: f32,
    /// Horizontal speed while a direction is held.
    pub speed: f32,
    /// Vertical velocity applied on jump (negative is up).
    pub jump_strength: f32,
    pub body_size: [f32; 2],
    pub tile_size: f32,
    pub arena_columns: usize,
    pub arena_rows: usize,
    /// Top-left corner where the local fighter enters the arena.
    pub spawn: [f32; 2],
    pub max_health: i32,
    /// Health removed by one landed attack.
    pub damage: i32,
    pub hitbox_width: f32,
    /// Hitbox inset from the attacker's top and bottom edges.
    pub hitbox_inset: f32,
}

impl Default for FighterConfig {
    fn default() -> Self {
        Self {
            gravity: 0.5,
            speed: 2.0,
            jump_strength: -8.0,
            body_size: [24.0, 24.0],
            tile_size: 16.0,
            arena_columns: 30,
            arena_rows: 17,
            spawn: [100.0, 100.0],
            max_health: 100,
            damage: 10,
            hitbox_width: 12.0,
            hitbox_inset: 4.0,
        }
    }
}

impl FighterConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("LOUNGE_FIGHTER_CONFIG")
            .unwrap_or_else(|_| "config/fighter.toml".to_string());
        load_toml_or_default(&path)
    }
}
