//! Seeded tile map with one-way and crumbling platforms.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use lounge_core::grid::SolidityMap;

use crate::config::PlatformerConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Empty,
    Solid,
    /// One-way: only supports bodies falling onto it from above.
    Platform,
    /// Solid until landed on, then gone after the crumble delay.
    Breakable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TileMap {
    pub width: usize,
    pub height: usize,
    pub tile_size: f32,
    /// Row-major (y * width + x).
    pub tiles: Vec<Tile>,
    /// Broken breakable tiles and the seconds they still hold.
    pub crumbling: BTreeMap<usize, f32>,
}

impl TileMap {
    pub fn empty(width: usize, height: usize, tile_size: f32) -> Self {
        Self {
            width,
            height,
            tile_size,
            tiles: vec![Tile::Empty; width * height],
            crumbling: BTreeMap::new(),
        }
    }

    /// Solid floor along the bottom row plus short random platforms in the
    /// interior. The top row, the row above the floor and the outer columns
    /// stay empty.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R, cfg: &PlatformerConfig) -> Self {
        let (w, h) = (cfg.columns, cfg.rows);
        let mut map = Self::empty(w, h, cfg.tile_size);
        if w == 0 || h == 0 {
            return map;
        }
        for x in 0..w {
            map.set(x, h - 1, Tile::Solid);
        }
        for y in 1..h.saturating_sub(2) {
            for x in 1..w.saturating_sub(2) {
                if !rng.random_bool(cfg.platform_chance) {
                    continue;
                }
                let tile = platform_kind(rng, cfg);
                map.set(x, y, tile);
                if rng.random_bool(cfg.extend_chance) {
                    map.set(x + 1, y, tile);
                }
            }
        }
        map
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return None;
        }
        Some(y as usize * self.width + x as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Tile {
        self.index(x, y).map_or(Tile::Empty, |i| self.tiles[i])
    }

    pub fn set(&mut self, x: usize, y: usize, tile: Tile) {
        if x < self.width && y < self.height {
            self.tiles[y * self.width + x] = tile;
        }
    }

    /// Tile coordinates of a world point.
    pub fn cell_at(&self, p: Vec2) -> (i32, i32) {
        (
            (p.x / self.tile_size).floor() as i32,
            (p.y / self.tile_size).floor() as i32,
        )
    }

    pub fn is_broken(&self, x: i32, y: i32) -> bool {
        self.index(x, y).is_some_and(|i| self.crumbling.contains_key(&i))
    }

    /// Start crumbling the breakable tile under a landing point. Returns
    /// `true` only the first time a given tile breaks.
    pub fn break_at(&mut self, p: Vec2, delay: f32) -> bool {
        let (x, y) = self.cell_at(p);
        let Some(i) = self.index(x, y) else {
            return false;
        };
        if self.tiles[i] != Tile::Breakable || self.crumbling.contains_key(&i) {
            return false;
        }
        tracing::trace!(x, y, "Tile broke");
        self.crumbling.insert(i, delay);
        true
    }

    /// Advance crumble timers; expired tiles become empty.
    pub fn tick(&mut self, dt: f32) {
        let mut gone = Vec::new();
        for (&i, remaining) in self.crumbling.iter_mut() {
            *remaining -= dt;
            if *remaining <= 0.0 {
                gone.push(i);
            }
        }
        for i in gone {
            self.crumbling.remove(&i);
            self.tiles[i] = Tile::Empty;
        }
    }

    /// Empty cells, row-major.
    pub fn empty_cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| **t == Tile::Empty)
            .map(|(i, _)| ((i % self.width) as i32, (i / self.width) as i32))
    }
}

fn platform_kind<R: Rng + ?Sized>(rng: &mut R, cfg: &PlatformerConfig) -> Tile {
    let roll: f64 = rng.random();
    if roll < cfg.one_way_share {
        Tile::Platform
    } else if roll < cfg.one_way_share + cfg.breakable_share {
        Tile::Breakable
    } else {
        Tile::Solid
    }
}

impl SolidityMap for TileMap {
    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.width as f32 * self.tile_size,
            self.height as f32 * self.tile_size,
        )
    }

    fn is_solid_at(&self, x: f32, y: f32) -> bool {
        let (cx, cy) = self.cell_at(Vec2::new(x, y));
        matches!(self.get(cx, cy), Tile::Solid | Tile::Breakable)
    }

    fn is_one_way_at(&self, x: f32, y: f32) -> bool {
        let (cx, cy) = self.cell_at(Vec2::new(x, y));
        self.get(cx, cy) == Tile::Platform
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn generated_map_has_floor_and_clear_border() {
        let cfg = PlatformerConfig::default();
        let map = TileMap::generate(&mut StdRng::seed_from_u64(3), &cfg);
        let (w, h) = (cfg.columns as i32, cfg.rows as i32);
        assert!((0..w).all(|x| map.get(x, h - 1) == Tile::Solid));
        assert!((0..w).all(|x| map.get(x, 0) == Tile::Empty));
        assert!((0..w).all(|x| map.get(x, h - 2) == Tile::Empty));
        assert!((0..h).all(|y| map.get(0, y) == Tile::Empty || y == h - 1));
        assert!((0..h - 1).all(|y| map.get(w - 1, y) == Tile::Empty));
    }

    #[test]
    fn same_seed_same_map() {
        let cfg = PlatformerConfig::default();
        let a = TileMap::generate(&mut StdRng::seed_from_u64(11), &cfg);
        let b = TileMap::generate(&mut StdRng::seed_from_u64(11), &cfg);
        assert_eq!(a, b);
    }

    #[test]
    fn breakable_tile_breaks_once_then_vanishes() {
        let mut map = TileMap::empty(4, 4, 32.0);
        map.set(1, 2, Tile::Breakable);
        let landing = Vec2::new(40.0, 64.5);
        assert!(map.is_solid_at(40.0, 70.0));
        assert!(map.break_at(landing, 0.2));
        assert!(!map.break_at(landing, 0.2));
        assert!(map.is_broken(1, 2));

        map.tick(0.1);
        assert!(map.is_solid_at(40.0, 70.0), "still holds during the crumble");
        map.tick(0.15);
        assert_eq!(map.get(1, 2), Tile::Empty);
        assert!(!map.is_solid_at(40.0, 70.0));
        assert!(!map.is_broken(1, 2));
    }

    #[test]
    fn only_breakable_tiles_break() {
        let mut map = TileMap::empty(4, 4, 32.0);
        map.set(1, 2, Tile::Solid);
        assert!(!map.break_at(Vec2::new(40.0, 70.0), 0.2));
        assert!(!map.break_at(Vec2::new(-5.0, 70.0), 0.2));
    }

    #[test]
    fn one_way_is_not_solid() {
        let mut map = TileMap::empty(4, 4, 32.0);
        map.set(2, 1, Tile::Platform);
        assert!(!map.is_solid_at(70.0, 40.0));
        assert!(map.is_one_way_at(70.0, 40.0));
    }
}
