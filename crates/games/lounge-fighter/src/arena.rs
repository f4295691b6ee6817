//! Collision layer of the fight arena.

use glam::Vec2;

use lounge_core::grid::SolidityMap;

use crate::config::FighterConfig;

/// Solid tiles of the arena, row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Arena {
    columns: usize,
    rows: usize,
    tile_size: f32,
    solid: Vec<bool>,
}

impl Arena {
    pub fn empty(columns: usize, rows: usize, tile_size: f32) -> Self {
        Self {
            columns,
            rows,
            tile_size,
            solid: vec![false; columns * rows],
        }
    }

    /// Floor along the bottom row, two side ledges and a centre ledge.
    pub fn standard(cfg: &FighterConfig) -> Self {
        let mut arena = Self::empty(cfg.arena_columns, cfg.arena_rows, cfg.tile_size);
        let (cols, rows) = (cfg.arena_columns, cfg.arena_rows);
        if rows == 0 || cols == 0 {
            return arena;
        }
        arena.fill_row(rows - 1, 0, cols);
        if rows > 6 {
            let ledge = rows - 6;
            arena.fill_row(ledge, cols * 2 / 15, cols / 3);
            arena.fill_row(ledge, cols * 2 / 3, cols * 13 / 15);
        }
        if rows > 10 {
            arena.fill_row(rows - 10, cols * 2 / 5, cols * 3 / 5);
        }
        arena
    }

    /// Mark columns `from..to` of `row` solid.
    pub fn fill_row(&mut self, row: usize, from: usize, to: usize) {
        if row >= self.rows {
            return;
        }
        for col in from..to.min(self.columns) {
            self.solid[row * self.columns + col] = true;
        }
    }

    pub fn is_solid_tile(&self, col: i32, row: i32) -> bool {
        if col < 0 || row < 0 || col as usize >= self.columns || row as usize >= self.rows {
            return false;
        }
        self.solid[row as usize * self.columns + col as usize]
    }
}

impl SolidityMap for Arena {
    fn tile_size(&self) -> f32 {
        self.tile_size
    }

    fn world_size(&self) -> Vec2 {
        Vec2::new(
            self.columns as f32 * self.tile_size,
            self.rows as f32 * self.tile_size,
        )
    }

    fn is_solid_at(&self, x: f32, y: f32) -> bool {
        let col = (x / self.tile_size).floor() as i32;
        let row = (y / self.tile_size).floor() as i32;
        self.is_solid_tile(col, row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_arena_has_floor_and_ledges() {
        let cfg = FighterConfig::default();
        let arena = Arena::standard(&cfg);
        assert!((0..30).all(|c| arena.is_solid_tile(c, 16)));
        assert!(arena.is_solid_tile(4, 11));
        assert!(arena.is_solid_tile(12, 7));
        assert!(!arena.is_solid_tile(15, 11));
        assert_eq!(arena.world_size(), Vec2::new(480.0, 272.0));
    }

    #[test]
    fn outside_the_map_is_open() {
        let arena = Arena::standard(&FighterConfig::default());
        assert!(!arena.is_solid_at(-1.0, 270.0));
        assert!(!arena.is_solid_at(10.0, 400.0));
    }
}
