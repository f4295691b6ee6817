use serde::{Deserialize, Serialize};

use lounge_core::config::load_toml_or_default;

/// Data-driven configuration for the crossing game. Distances are world
/// units, centred on the middle column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrossingConfig {
    /// Number of columns on the board.
    pub columns: i32,
    /// Width of one column.
    pub position_width: f32,
    /// Lanes generated before the first step (lane 0 included).
    pub initial_lanes: i32,
    /// Width of the avatar's collision interval.
    pub avatar_size: f32,
    pub tree_count: usize,
    pub car_count: usize,
    pub truck_count: usize,
    pub log_count: usize,
    pub car_length: f32,
    pub truck_length: f32,
    pub log_length: f32,
    /// Lane speeds, in world units per 16 ms.
    pub speeds: Vec<f32>,
    /// Duration of one hop (seconds).
    pub step_duration: f32,
    /// Peak height of the hop arc.
    pub hop_height: f32,
    /// Steps that may be queued behind the animating one.
    pub max_queued_steps: usize,
}

impl Default for CrossingConfig {
    fn default() -> Self {
        Self {
            columns: 17,
            position_width: 42.0,
            initial_lanes: 10,
            avatar_size: 15.0,
            tree_count: 4,
            car_count: 3,
            truck_count: 2,
            log_count: 3,
            car_length: 60.0,
            truck_length: 105.0,
            log_length: 120.0,
            speeds: vec![2.0, 2.5, 3.0],
            step_duration: 0.2,
            hop_height: 8.0,
            max_queued_steps: 4,
        }
    }
}

impl CrossingConfig {
    /// Load config from environment or TOML file, falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("LOUNGE_CROSSING_CONFIG")
            .unwrap_or_else(|_| "config/crossing.toml".to_string());
        load_toml_or_default(&path)
    }

    /// Total board width.
    pub fn board_width(&self) -> f32 {
        self.columns as f32 * self.position_width
    }

    /// Column in which the avatar starts.
    pub fn start_column(&self) -> i32 {
        self.columns / 2
    }

    /// Centre x of `column`.
    pub fn column_center(&self, column: i32) -> f32 {
        column as f32 * self.position_width + self.position_width / 2.0 - self.board_width() / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn middle_column_is_centred() {
        let cfg = CrossingConfig::default();
        assert_eq!(cfg.start_column(), 8);
        assert_eq!(cfg.column_center(8), 0.0);
        assert_eq!(cfg.column_center(0), -336.0);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg: CrossingConfig = toml::from_str("columns = 9\n").unwrap();
        assert_eq!(cfg.columns, 9);
        assert_eq!(cfg.speeds, vec![2.0, 2.5, 3.0]);
    }
}
