use serde::{Deserialize, Serialize};

use lounge_core::config::load_toml_or_default;

/// Settings for the headless lounge simulator, loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub room: String,
    pub participants: usize,
    /// Number of 60 Hz ticks to run.
    pub ticks: u32,
    pub seed: u64,
    /// Ticks between two changes of a simulated participant's heading.
    pub turn_every: u32,
    /// Ticks between two summaries in the log.
    pub report_every: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            room: "lounge".to_string(),
            participants: 2,
            ticks: 600,
            seed: 42,
            turn_every: 30,
            report_every: 60,
        }
    }
}

impl SimConfig {
    pub fn load() -> Self {
        let path =
            std::env::var("LOUNGE_SIM_CONFIG").unwrap_or_else(|_| "config/sim.toml".to_string());
        load_toml_or_default(&path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let cfg: SimConfig = toml::from_str("participants = 4\n").unwrap();
        assert_eq!(cfg.participants, 4);
        assert_eq!(cfg.room, "lounge");
        assert_eq!(cfg.ticks, 600);
    }
}
