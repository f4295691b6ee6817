//! The lounge: a walled room with furniture the avatars walk around.

use glam::Vec2;

use lounge_core::grid::OccupancyGrid;

pub const ROOM_COLUMNS: u32 = 25;
pub const ROOM_ROWS: u32 = 20;
/// Rows at the top of the room drawn as wall; never walkable.
pub const WALL_HEIGHT: u32 = 3;

/// A piece of furniture. `(x, y)` is the bottom-centre of its footprint, in
/// tiles.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecorItem {
    pub kind: &'static str,
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
    pub collides: bool,
}

impl DecorItem {
    const fn solid(kind: &'static str, x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            kind,
            x,
            y,
            w,
            h,
            collides: true,
        }
    }

    const fn walkable(kind: &'static str, x: f32, y: f32, w: f32, h: f32) -> Self {
        Self {
            kind,
            x,
            y,
            w,
            h,
            collides: false,
        }
    }

    /// Top-left corner of the footprint.
    pub fn anchor(&self) -> Vec2 {
        Vec2::new(self.x - self.w / 2.0, self.y - self.h)
    }
}

pub const DECOR: &[DecorItem] = &[
    DecorItem::solid("counter", 2.0, 6.0, 4.0, 1.0),
    DecorItem::solid("register", 3.2, 5.5, 1.0, 1.0),
    DecorItem::solid("bread", 0.8, 5.5, 0.8, 0.8),
    DecorItem::solid("pastry-stand", 1.9, 5.5, 0.8, 0.8),
    DecorItem::solid("fridge", 0.5, 3.5, 1.0, 2.0),
    DecorItem::solid("counter", 2.5, 3.5, 3.0, 1.0),
    DecorItem::solid("coffee-machine", 2.0, 3.0, 1.0, 1.0),
    DecorItem::solid("sink", 3.3, 2.98, 0.8, 0.8),
    DecorItem::walkable("sign", 5.0, 6.0, 1.0, 1.2),
    DecorItem::walkable("rug", 12.5, 6.0, 3.0, 2.0),
    DecorItem::solid("table-tall", 2.0, 9.0, 1.0, 1.0),
    DecorItem::solid("table-tall", 4.0, 9.0, 1.0, 1.0),
    DecorItem::solid("table-tall", 6.0, 9.0, 1.0, 1.0),
    DecorItem::solid("table", 4.0, 13.0, 1.5, 1.5),
    DecorItem::walkable("table-seat", 2.5, 12.7, 0.75, 0.75),
    DecorItem::walkable("table-seat", 5.5, 12.7, 0.75, 0.75),
    DecorItem::solid("table2", 4.0, 16.0, 1.5, 1.5),
    DecorItem::walkable("table-seat", 2.5, 15.7, 0.75, 0.75),
    DecorItem::walkable("table-seat", 5.5, 15.7, 0.75, 0.75),
    DecorItem::walkable("couch", 22.2, 4.0, 3.0, 1.3),
    DecorItem::solid("plant-tall2", 24.3, 3.7, 0.73, 2.08),
    DecorItem::solid("water-pot", 16.4, 3.7, 0.46, 0.45),
    DecorItem::solid("cactus", 17.0, 3.7, 1.0, 2.0),
    DecorItem::solid("plant-tall", 18.0, 3.7, 1.0, 1.7),
    DecorItem::solid("plant", 19.0, 3.7, 1.0, 1.3),
    DecorItem::solid("crate", 19.0, 5.0, 1.0, 1.0),
    DecorItem::solid("sign2", 3.3, 2.2, 0.9, 1.1),
    DecorItem::solid("wall-art", 22.2, 2.4, 1.7, 2.0),
    DecorItem::solid("window", 7.0, 2.5, 3.0, 2.0),
    DecorItem::solid("game-console", 12.5, 2.5, 4.0, 2.0),
    DecorItem::solid("window", 18.0, 2.5, 3.0, 2.0),
    DecorItem::solid("cone", 13.0, 15.0, 1.0, 2.0),
    DecorItem::solid("crate", 10.0, 15.3, 1.0, 1.0),
    DecorItem::solid("crate", 11.0, 15.2, 1.0, 1.0),
    DecorItem::solid("crate", 10.3, 16.0, 1.0, 1.0),
    DecorItem::solid("crate", 11.3, 16.2, 1.0, 1.0),
    DecorItem::solid("shell", 10.7, 15.6, 1.0, 1.0),
    DecorItem::solid("jars", 10.0, 16.2, 1.0, 0.5),
    DecorItem::solid("tv", 12.0, 15.5, 1.0, 1.0),
    DecorItem::solid("anchor", 12.3, 15.9, 1.0, 1.0),
    DecorItem::walkable("log", 20.0, 13.5, 0.8, 0.8),
    DecorItem::walkable("log", 22.0, 14.2, 0.8, 0.8),
    DecorItem::walkable("log", 22.8, 16.0, 0.8, 0.8),
    DecorItem::walkable("log", 22.0, 17.8, 0.8, 0.8),
    DecorItem::walkable("log", 20.0, 18.5, 0.8, 0.8),
    DecorItem::walkable("log", 18.0, 17.8, 0.8, 0.8),
    DecorItem::walkable("log", 17.2, 16.0, 0.8, 0.8),
    DecorItem::walkable("log", 18.0, 14.2, 0.8, 0.8),
];

/// Axis-aligned trigger area, half-open on its far edges.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Zone {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Zone {
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }
}

/// Standing here opens the game library.
pub const GAME_LIBRARY_ZONE: Zone = Zone {
    x: 10.5,
    y: 2.5,
    w: 4.0,
    h: 4.0,
};

/// Collision layer of the lounge.
#[derive(Debug, Clone)]
pub struct LoungeRoom {
    grid: OccupancyGrid,
}

impl Default for LoungeRoom {
    fn default() -> Self {
        Self::new()
    }
}

impl LoungeRoom {
    pub fn new() -> Self {
        let mut grid = OccupancyGrid::new(ROOM_COLUMNS, ROOM_ROWS);
        grid.block_rect(0.0, 0.0, ROOM_COLUMNS as f32, WALL_HEIGHT as f32);
        for item in DECOR.iter().filter(|d| d.collides) {
            let a = item.anchor();
            grid.block_rect(a.x, a.y, item.w, item.h);
        }
        tracing::debug!(cells = grid.len(), "Lounge collision layer built");
        Self { grid }
    }

    pub fn grid(&self) -> &OccupancyGrid {
        &self.grid
    }

    /// Centre tile of the room.
    pub fn spawn() -> Vec2 {
        Vec2::new((ROOM_COLUMNS / 2) as f32, (ROOM_ROWS / 2) as f32)
    }

    pub fn near_game_library(&self, position: Vec2) -> bool {
        GAME_LIBRARY_ZONE.contains(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wall_rows_are_blocked() {
        let room = LoungeRoom::new();
        assert!(room.grid().is_blocked(5.0, 0.0));
        assert!(room.grid().is_blocked(12.0, 2.9));
        assert!(!room.grid().is_blocked(12.0, 3.0));
    }

    #[test]
    fn spawn_is_walkable() {
        let room = LoungeRoom::new();
        let s = LoungeRoom::spawn();
        assert_eq!(s, Vec2::new(12.0, 10.0));
        assert!(!room.grid().is_blocked(s.x, s.y));
    }

    #[test]
    fn solid_decor_blocks_and_walkable_decor_does_not() {
        let room = LoungeRoom::new();
        // Tall table at (2, 9) covers [1.5, 2.5) x [8, 9).
        assert!(room.grid().is_blocked(2.0, 8.5));
        // Rug at (12.5, 6) covers [11, 14) x [4, 6) but is walkable.
        assert!(!room.grid().is_blocked(12.0, 5.0));
    }

    #[test]
    fn game_library_zone_is_half_open() {
        let room = LoungeRoom::new();
        assert!(room.near_game_library(Vec2::new(10.5, 2.5)));
        assert!(room.near_game_library(Vec2::new(14.4, 6.4)));
        assert!(!room.near_game_library(Vec2::new(14.5, 4.0)));
        assert!(!room.near_game_library(LoungeRoom::spawn()));
    }
}
