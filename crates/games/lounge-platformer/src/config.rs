use serde::{Deserialize, Serialize};

use lounge_core::config::load_toml_or_default;

/// Data-driven configuration for the platformer and the endless runner.
/// Distances are pixels, velocities pixels per 60 Hz tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformerConfig {
    pub columns: usize,
    pub rows: usize,
    pub tile_size: f32,
    /// Chance that an interior cell starts a platform.
    pub platform_chance: f64,
    /// Chance that a platform extends one tile to the right.
    pub extend_chance: f64,
    /// Share of platforms that are one-way.
    pub one_way_share: f64,
    /// Share of platforms that crumble when landed on.
    pub breakable_share: f64,
    /// Seconds a broken tile still holds before it disappears.
    pub crumble_delay: f32,

    pub body_size: [f32; 2],
    pub gravity: f32,
    pub max_fall_speed: f32,
    pub speed: f32,
    pub jump_strength: f32,
    /// Springs launch at `jump_strength * spring_boost`.
    pub spring_boost: f32,
    /// Vertical velocity held while a jetpack burns.
    pub jetpack_velocity: f32,

    pub max_items: usize,
    pub spawn_attempts: usize,
    /// Seconds between item spawn waves.
    pub item_spawn_interval: f32,
    pub golden_chance: f64,
    pub spring_chance: f64,
    pub jetpack_chance: f64,
    pub coin_score: i32,
    pub golden_score: i32,

    pub runner: RunnerConfig,
}

impl Default for PlatformerConfig {
    fn default() -> Self {
        Self {
            columns: 20,
            rows: 12,
            tile_size: 32.0,
            platform_chance: 0.12,
            extend_chance: 0.5,
            one_way_share: 0.5,
            breakable_share: 0.25,
            crumble_delay: 0.2,
            body_size: [24.0, 24.0],
            gravity: 0.5,
            max_fall_speed: 8.0,
            speed: 3.0,
            jump_strength: -9.0,
            spring_boost: 1.5,
            jetpack_velocity: -5.0,
            max_items: 10,
            spawn_attempts: 50,
            item_spawn_interval: 2.0,
            golden_chance: 0.2,
            spring_chance: 0.1,
            jetpack_chance: 0.05,
            coin_score: 1,
            golden_score: 3,
            runner: RunnerConfig::default(),
        }
    }
}

impl PlatformerConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("LOUNGE_PLATFORMER_CONFIG")
            .unwrap_or_else(|_| "config/platformer.toml".to_string());
        load_toml_or_default(&path)
    }
}

/// Endless runner tuning (`[runner]` table).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    pub screen_width: f32,
    pub screen_height: f32,
    pub tile_size: f32,
    pub body_size: [f32; 2],
    /// Fixed x of the runner on screen.
    pub runner_x: f32,
    pub gravity: f32,
    pub jump_strength: f32,
    pub base_speed: f32,
    /// Added to the scroll speed for every `coins_per_speedup` coins.
    pub speed_step: f32,
    pub coins_per_speedup: u32,
    /// Ground tiles kept in the scrolling strip.
    pub ground_tiles: usize,
    /// Leading tiles that are always solid.
    pub safe_tiles: usize,
    pub max_gap_tiles: usize,
    /// Chance that a freshly scrolled-in tile is a gap.
    pub gap_chance: f64,
    /// Edge tolerance, only while airborne.
    pub leniency: f32,
    /// Distance below the screen at which a fall ends the run.
    pub fall_margin: f32,
    /// Seconds between floating platform spawns.
    pub platform_interval: f32,
    pub coin_chance: f64,
    pub max_platforms: usize,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            screen_width: 800.0,
            screen_height: 480.0,
            tile_size: 32.0,
            body_size: [48.0, 48.0],
            runner_x: 100.0,
            gravity: 1.0,
            jump_strength: -20.0,
            base_speed: 4.0,
            speed_step: 1.0,
            coins_per_speedup: 10,
            ground_tiles: 100,
            safe_tiles: 30,
            max_gap_tiles: 3,
            gap_chance: 0.1,
            leniency: 2.0,
            fall_margin: 50.0,
            platform_interval: 2.0,
            coin_chance: 0.7,
            max_platforms: 10,
        }
    }
}

impl RunnerConfig {
    /// y of the runner's top edge when standing on the ground strip.
    pub fn floor_y(&self) -> f32 {
        self.screen_height - self.tile_size - self.body_size[1]
    }

    pub fn speed_for(&self, coins: u32) -> f32 {
        let steps = coins.checked_div(self.coins_per_speedup).unwrap_or(0);
        self.base_speed + steps as f32 * self.speed_step
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: PlatformerConfig =
            toml::from_str("columns = 30\n[runner]\nbase_speed = 6.0\n").unwrap();
        assert_eq!(cfg.columns, 30);
        assert_eq!(cfg.rows, 12);
        assert_eq!(cfg.runner.base_speed, 6.0);
        assert_eq!(cfg.runner.gap_chance, 0.1);
    }

    #[test]
    fn runner_speeds_up_every_ten_coins() {
        let cfg = RunnerConfig::default();
        assert_eq!(cfg.speed_for(0), 4.0);
        assert_eq!(cfg.speed_for(9), 4.0);
        assert_eq!(cfg.speed_for(10), 5.0);
        assert_eq!(cfg.speed_for(25), 6.0);
    }
}
