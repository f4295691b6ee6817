use std::collections::HashMap;

use futures::future::{BoxFuture, join_all};
use serde::{Deserialize, Serialize};

use crate::animation::AnimationTable;
use crate::entity::Action;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpriteError {
    NotFound(String),
    Decode { key: String, reason: String },
}

impl std::fmt::Display for SpriteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(key) => write!(f, "sprite sheet not found: {key}"),
            Self::Decode { key, reason } => write!(f, "failed to decode {key}: {reason}"),
        }
    }
}

impl std::error::Error for SpriteError {}

/// Dimensions of a horizontal sprite strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSheet {
    pub width: u32,
    pub height: u32,
}

/// Source of sprite sheet metadata (file system, HTTP, embedded assets).
pub trait SpriteLoader: Send + Sync {
    fn load<'a>(&'a self, key: &'a str) -> BoxFuture<'a, Result<SpriteSheet, SpriteError>>;
}

/// Key of the strip for one sprite and action, e.g. `"dino-blue/kick"`.
pub fn sheet_key(sprite: &str, action: Action) -> String {
    format!("{sprite}/{}", action.sheet_name())
}

/// Read-only sheet metadata cache, filled once at startup.
#[derive(Debug, Clone)]
pub struct SpriteCache {
    frame_width: u32,
    sheets: HashMap<String, SpriteSheet>,
}

impl SpriteCache {
    pub fn new(frame_width: u32) -> Self {
        Self {
            frame_width: frame_width.max(1),
            sheets: HashMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&SpriteSheet> {
        self.sheets.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, sheet: SpriteSheet) {
        self.sheets.insert(key.into(), sheet);
    }

    pub fn len(&self) -> usize {
        self.sheets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sheets.is_empty()
    }

    /// Number of frames in a strip: `image_width / frame_width`.
    pub fn frame_count(&self, key: &str) -> Option<u32> {
        self.get(key).map(|s| s.width / self.frame_width)
    }

    /// Load every key not already cached, concurrently. Failed keys are
    /// logged and returned; successful ones are cached.
    pub async fn ensure_loaded<L>(&mut self, loader: &L, keys: &[String]) -> Vec<SpriteError>
    where
        L: SpriteLoader + ?Sized,
    {
        let missing: Vec<&String> = keys
            .iter()
            .filter(|k| !self.sheets.contains_key(k.as_str()))
            .collect();
        let results = join_all(missing.iter().map(|k| loader.load(k.as_str()))).await;

        let mut errors = Vec::new();
        for (key, result) in missing.into_iter().zip(results) {
            match result {
                Ok(sheet) => {
                    self.sheets.insert(key.clone(), sheet);
                },
                Err(e) => {
                    tracing::warn!(key = %key, error = %e, "Sprite sheet failed to load");
                    errors.push(e);
                },
            }
        }
        errors
    }

    /// Animation table for `sprite` with frame counts probed from its sheets.
    /// Actions without a loaded sheet keep their default counts.
    pub fn animation_table(&self, sprite: &str) -> AnimationTable {
        let counts = Action::ALL
            .iter()
            .filter_map(|&action| Some((action, self.frame_count(&sheet_key(sprite, action))?)));
        AnimationTable::fighter().with_frame_counts(counts.collect::<Vec<_>>())
    }
}
