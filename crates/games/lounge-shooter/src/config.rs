use serde::{Deserialize, Serialize};

use lounge_core::config::load_toml_or_default;

/// Data-driven configuration for the shooter. Distances are world units,
/// speeds world units per 60 Hz tick, durations seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShooterConfig {
    pub width: f32,
    pub height: f32,
    /// Fixed x of the ship's left edge.
    pub ship_x: f32,
    pub ship_size: f32,
    /// Fraction of the remaining distance to its target the ship covers
    /// per tick.
    pub ship_follow: f32,
    /// Target movement per tick while a direction is held.
    pub steer_step: f32,
    pub lives: u32,
    /// Enemy bullets closer than this to the ship's centre hit it.
    pub hit_radius: f32,

    pub base_speed: f32,
    pub speed_increment: f32,
    pub max_speed: f32,
    /// Scrolled distance that summons the next boss.
    pub boss_threshold: f32,
    pub warning_duration: f32,
    pub entrance_duration: f32,
    pub boss_size: f32,
    /// Gap kept between the boss and the right edge.
    pub boss_margin: f32,
    pub base_pattern_period: f32,
    pub enraged_pattern_period: f32,

    pub auto_fire_interval: f32,
    pub bullet_speed: f32,
    pub hit_score: i32,
    /// Multiplied by the tier reached when a boss falls.
    pub defeat_score: i32,

    /// Horizontal bands monsters and pickups occupy.
    pub lanes: u8,
    /// Columns kept generated ahead of the ship.
    pub columns_ahead: usize,
    pub monster_chance: f64,
    pub pickup_chance: f64,
    pub monster_size: f32,
    /// Offset of a monster's left edge from its column.
    pub monster_inset: f32,
    /// Scaled by each kind's bullet speed multiplier.
    pub monster_bullet_speed: f32,
    /// Multiplied by the kind of the monster destroyed.
    pub kill_score: i32,
    /// Horizontal distance from the ship centre within which pickups are taken.
    pub pickup_reach: f32,
    pub fire_bonus_step: f32,
    pub fire_malus_step: f32,
    pub min_fire_interval: f32,
    pub max_fire_interval: f32,
    pub max_missiles: u32,
    /// Vertical gap between missiles of one shot.
    pub missile_spread: f32,
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 480.0,
            ship_x: 50.0,
            ship_size: 40.0,
            ship_follow: 0.2,
            steer_step: 5.0,
            lives: 3,
            hit_radius: 25.0,
            base_speed: 2.5,
            speed_increment: 0.01,
            max_speed: 6.0,
            boss_threshold: 5000.0,
            warning_duration: 2.0,
            entrance_duration: 2.0,
            boss_size: 180.0,
            boss_margin: 50.0,
            base_pattern_period: 4.0,
            enraged_pattern_period: 1.5,
            auto_fire_interval: 0.3,
            bullet_speed: 12.0,
            hit_score: 50,
            defeat_score: 5000,
            lanes: 3,
            columns_ahead: 30,
            monster_chance: 0.35,
            pickup_chance: 0.1,
            monster_size: 60.0,
            monster_inset: 20.0,
            monster_bullet_speed: 4.0,
            kill_score: 15,
            pickup_reach: 50.0,
            fire_bonus_step: 0.05,
            fire_malus_step: 0.1,
            min_fire_interval: 0.1,
            max_fire_interval: 0.6,
            max_missiles: 5,
            missile_spread: 8.0,
        }
    }
}

impl ShooterConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("LOUNGE_SHOOTER_CONFIG")
            .unwrap_or_else(|_| "config/shooter.toml".to_string());
        load_toml_or_default(&path)
    }

    pub fn lane_height(&self) -> f32 {
        self.height / f32::from(self.lanes.max(1))
    }
}
