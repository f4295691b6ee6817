//! Collectible items and the jetpack power-up.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use lounge_core::collision::Aabb;
use lounge_core::powerup;

use crate::config::PlatformerConfig;
use crate::map::TileMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Coin,
    GoldenCoin,
    /// Launches the player upward on touch.
    Spring,
    Jetpack,
}

impl ItemKind {
    fn roll<R: Rng + ?Sized>(rng: &mut R, cfg: &PlatformerConfig) -> Self {
        let roll: f64 = rng.random();
        if roll < cfg.jetpack_chance {
            ItemKind::Jetpack
        } else if roll < cfg.jetpack_chance + cfg.spring_chance {
            ItemKind::Spring
        } else if rng.random_bool(cfg.golden_chance) {
            ItemKind::GoldenCoin
        } else {
            ItemKind::Coin
        }
    }

    /// Points for picking this item up.
    pub fn score(self, cfg: &PlatformerConfig) -> i32 {
        match self {
            ItemKind::Coin => cfg.coin_score,
            ItemKind::GoldenCoin => cfg.golden_score,
            ItemKind::Spring | ItemKind::Jetpack => 0,
        }
    }
}

/// Items on the map, keyed by cell index (y * width + x).
pub type ItemField = BTreeMap<usize, ItemKind>;

/// Place new items on random empty, unoccupied cells until the field holds
/// `max_items` or the attempts run out. Returns how many were placed.
pub fn spawn_items<R: Rng + ?Sized>(
    items: &mut ItemField,
    map: &TileMap,
    rng: &mut R,
    cfg: &PlatformerConfig,
) -> usize {
    if map.width == 0 || map.height == 0 {
        return 0;
    }
    let mut placed = 0;
    for _ in 0..cfg.spawn_attempts {
        if items.len() >= cfg.max_items {
            break;
        }
        let x = rng.random_range(0..map.width);
        let y = rng.random_range(0..map.height);
        let key = y * map.width + x;
        if map.tiles[key] != crate::map::Tile::Empty || items.contains_key(&key) {
            continue;
        }
        items.insert(key, ItemKind::roll(rng, cfg));
        placed += 1;
    }
    placed
}

/// World-space box of the item cell `key`.
pub fn item_bounds(key: usize, map: &TileMap) -> Aabb {
    let (x, y) = (key % map.width, key / map.width);
    Aabb::new(
        x as f32 * map.tile_size,
        y as f32 * map.tile_size,
        map.tile_size,
        map.tile_size,
    )
}

/// Remove and return every item touching `body`.
pub fn collect_touching(items: &mut ItemField, map: &TileMap, body: &Aabb) -> Vec<ItemKind> {
    let touched: Vec<usize> = items
        .keys()
        .copied()
        .filter(|&key| item_bounds(key, map).overlaps(body))
        .collect();
    touched
        .into_iter()
        .filter_map(|key| items.remove(&key))
        .collect()
}

/// Timed platformer effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PowerUpKind {
    Jetpack,
}

/// Seconds of burn per jetpack pickup.
pub const JETPACK_SECONDS: f32 = 4.0;

impl powerup::PowerUpKind for PowerUpKind {
    fn duration(&self) -> f32 {
        match self {
            PowerUpKind::Jetpack => JETPACK_SECONDS,
        }
    }
}

pub type ActivePowerUp = powerup::ActivePowerUp<PowerUpKind>;
