use serde::{Deserialize, Serialize};

/// Lounge tile size in pixels.
pub const TILE_SIZE: f32 = 32.0;
/// Free-roam step per tick, in tiles.
pub const ROAM_STEP: f32 = 0.1;
/// Frames in a walk cycle (1-based on the wire).
pub const WALK_FRAMES: u32 = 8;
/// Minimum seconds between two publishes.
pub const PUBLISH_INTERVAL: f32 = 0.12;
/// Seconds between idle frame advances while standing still.
pub const IDLE_FRAME_INTERVAL: f32 = 0.25;
/// Seconds of silence after which a remote entity is dropped.
pub const STALE_AFTER: f32 = 5.0;

/// Tunables shared by the local controllers and the remote interpolator,
/// loadable from TOML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionConfig {
    pub tile_size: f32,
    pub roam_step: f32,
    /// Collision box of a lounge avatar, in tiles, anchored at its position.
    pub avatar_footprint: [f32; 2],
    pub walk_frames: u32,
    pub idle_frame_interval: f32,
    pub publish_interval: f32,
    pub stale_after: f32,
    /// Duration of one grid step, in seconds.
    pub step_duration: f32,
    pub hop_height: f32,
    pub max_queued_steps: usize,
    pub interp_duration: f32,
    pub interp_queue_cap: usize,
    /// Minimum position delta for a snapshot to be queued.
    pub interp_epsilon: f32,
    pub remote_walk_frame_interval: f32,
    pub remote_idle_frame_interval: f32,
    /// Seconds without a new snapshot before a remote falls back to idle.
    pub idle_timeout: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            tile_size: TILE_SIZE,
            roam_step: ROAM_STEP,
            avatar_footprint: [0.5, 0.5],
            walk_frames: WALK_FRAMES,
            idle_frame_interval: IDLE_FRAME_INTERVAL,
            publish_interval: PUBLISH_INTERVAL,
            stale_after: STALE_AFTER,
            step_duration: 0.2,
            hop_height: 16.0,
            max_queued_steps: 4,
            interp_duration: 0.2,
            interp_queue_cap: 3,
            interp_epsilon: 0.05,
            remote_walk_frame_interval: 0.1,
            remote_idle_frame_interval: 0.4,
            idle_timeout: 0.5,
        }
    }
}

impl MotionConfig {
    /// Load config from a TOML file. Falls back to defaults if the file is missing
    /// or unparseable.
    pub fn load() -> Self {
        let path = std::env::var("LOUNGE_MOTION_CONFIG")
            .unwrap_or_else(|_| "config/motion.toml".to_string());
        load_toml_or_default(&path)
    }

    pub fn stale_after_ms(&self) -> u64 {
        (self.stale_after.max(0.0) * 1000.0) as u64
    }
}

/// Read and parse a TOML config, logging and falling back to `T::default()`
/// when the file is unparseable. A missing file is silent.
pub fn load_toml_or_default<T>(path: &str) -> T
where
    T: Default + serde::de::DeserializeOwned,
{
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str::<T>(&content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("Failed to parse {path}: {e}, using defaults");
                T::default()
            },
        },
        Err(_) => T::default(),
    }
}
