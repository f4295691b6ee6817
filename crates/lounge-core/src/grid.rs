use std::collections::HashSet;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::collision::Aabb;

/// Occupancy resolution: a tile is split into 10×10 sub-cells.
pub const SUBCELLS_PER_TILE: f32 = 10.0;

/// Snap a tile-space coordinate to its sub-cell index.
pub fn quantize(v: f32) -> i32 {
    (v * SUBCELLS_PER_TILE).round() as i32
}

/// Pack two sub-cell indices into one integer key.
pub fn pack_key(qx: i32, qy: i32) -> i64 {
    ((qx as i64) << 32) | (qy as u32 as i64)
}

pub fn unpack_key(key: i64) -> (i32, i32) {
    ((key >> 32) as i32, key as u32 as i32)
}

/// Key of the sub-cell containing the tile-space point `(x, y)`.
pub fn subcell_key(x: f32, y: f32) -> i64 {
    pack_key(quantize(x), quantize(y))
}

/// Sparse set of blocked sub-cells over a bounded room, in tile units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OccupancyGrid {
    width: f32,
    height: f32,
    cells: HashSet<i64>,
}

impl OccupancyGrid {
    pub fn new(width_tiles: u32, height_tiles: u32) -> Self {
        Self {
            width: width_tiles as f32,
            height: height_tiles as f32,
            cells: HashSet::new(),
        }
    }

    pub fn width(&self) -> f32 {
        self.width
    }

    pub fn height(&self) -> f32 {
        self.height
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn block_point(&mut self, x: f32, y: f32) {
        self.cells.insert(subcell_key(x, y));
    }

    /// Block every sub-cell whose origin lies in `[x, x + w) × [y, y + h)`.
    pub fn block_rect(&mut self, x: f32, y: f32, w: f32, h: f32) {
        let (x0, y0) = (quantize(x), quantize(y));
        let cols = (w * SUBCELLS_PER_TILE).round() as i32;
        let rows = (h * SUBCELLS_PER_TILE).round() as i32;
        for dx in 0..cols {
            for dy in 0..rows {
                self.cells.insert(pack_key(x0 + dx, y0 + dy));
            }
        }
    }

    /// Within `[0, width) × [0, height)` after snapping to sub-cells.
    pub fn in_bounds(&self, x: f32, y: f32) -> bool {
        let (qx, qy) = (quantize(x), quantize(y));
        qx >= 0
            && qy >= 0
            && (qx as f32) < self.width * SUBCELLS_PER_TILE
            && (qy as f32) < self.height * SUBCELLS_PER_TILE
    }

    /// Out-of-bounds counts as blocked.
    pub fn is_blocked(&self, x: f32, y: f32) -> bool {
        !self.in_bounds(x, y) || self.cells.contains(&subcell_key(x, y))
    }

    /// Probe the leading edge of a `footprint` box anchored at `pos` after a
    /// one-axis move of `delta`. Both corners of the leading edge are tested.
    pub fn leading_edge_blocked(&self, pos: Vec2, footprint: Vec2, delta: Vec2) -> bool {
        let next = pos + delta;
        let far = next + footprint;
        let probes: [Vec2; 2] = if delta.x > 0.0 {
            [Vec2::new(far.x, next.y), Vec2::new(far.x, far.y)]
        } else if delta.x < 0.0 {
            [Vec2::new(next.x, next.y), Vec2::new(next.x, far.y)]
        } else if delta.y > 0.0 {
            [Vec2::new(next.x, far.y), Vec2::new(far.x, far.y)]
        } else if delta.y < 0.0 {
            [Vec2::new(next.x, next.y), Vec2::new(far.x, next.y)]
        } else {
            return false;
        };
        probes.iter().any(|p| self.is_blocked(p.x, p.y))
    }
}

/// Tile-map view used by [`step_body`]. Coordinates are world pixels, y-down.
pub trait SolidityMap {
    fn tile_size(&self) -> f32;

    /// World size in pixels.
    fn world_size(&self) -> Vec2;

    fn is_solid_at(&self, x: f32, y: f32) -> bool;

    /// One-way tiles only stop bodies falling onto them from above.
    fn is_one_way_at(&self, _x: f32, _y: f32) -> bool {
        false
    }
}

/// Kinematic box driven by velocity, anchored at its top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: Vec2,
    pub grounded: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            vel: Vec2::ZERO,
            size,
            grounded: false,
        }
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::new(self.pos.x, self.pos.y, self.size.x, self.size.y)
    }
}

/// Horizontal probe inset from the body's side edges.
pub const PROBE_INSET: f32 = 2.0;

/// What happened during one [`step_body`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StepOutcome {
    pub blocked_x: bool,
    pub blocked_y: bool,
    /// Body came to rest on a tile (not the world floor) this step.
    pub landed_on: Option<Vec2>,
}

/// Move `body` by its velocity, resolving the horizontal axis first and the
/// vertical axis second, each with four corner probes.
///
/// A blocked axis keeps its coordinate and zeroes its velocity. A blocked
/// downward move grounds the body; a blocked upward move only zeroes `vel.y`.
/// The body is clamped to the world horizontally and lands on the world floor.
pub fn step_body<M: SolidityMap + ?Sized>(body: &mut Body, map: &M) -> StepOutcome {
    let mut outcome = StepOutcome::default();
    let world = map.world_size();

    let next_x = body.pos.x + body.vel.x;
    let top = body.pos.y;
    let bottom = body.pos.y + body.size.y - 1.0;
    let left = next_x + PROBE_INSET;
    let right = next_x + body.size.x - PROBE_INSET;
    let blocked_h = map.is_solid_at(left, top)
        || map.is_solid_at(left, bottom)
        || map.is_solid_at(right, top)
        || map.is_solid_at(right, bottom);
    if blocked_h {
        body.vel.x = 0.0;
        outcome.blocked_x = true;
    } else {
        body.pos.x = next_x.clamp(0.0, (world.x - body.size.x).max(0.0));
    }

    let next_y = body.pos.y + body.vel.y;
    let top = next_y;
    let bottom = next_y + body.size.y - 1.0;
    let left = body.pos.x + PROBE_INSET;
    let right = body.pos.x + body.size.x - PROBE_INSET;
    // Lowest probe row before the move; it must start above a one-way tile.
    let prev_probe = body.pos.y + body.size.y - 1.0;
    let falling = body.vel.y > 0.0;
    let lands_on_one_way = |x: f32| {
        if !falling || !map.is_one_way_at(x, bottom) {
            return false;
        }
        let tile_top = (bottom / map.tile_size()).floor() * map.tile_size();
        prev_probe < tile_top
    };
    let blocked_v = map.is_solid_at(left, bottom)
        || map.is_solid_at(right, bottom)
        || map.is_solid_at(left, top)
        || map.is_solid_at(right, top)
        || lands_on_one_way(left)
        || lands_on_one_way(right);

    if blocked_v {
        if falling {
            body.grounded = true;
            outcome.landed_on = Some(Vec2::new(
                if map.is_solid_at(left, bottom) || lands_on_one_way(left) {
                    left
                } else {
                    right
                },
                bottom,
            ));
        }
        body.vel.y = 0.0;
        outcome.blocked_y = true;
    } else if next_y < 0.0 {
        body.pos.y = 0.0;
    } else if next_y + body.size.y > world.y {
        body.pos.y = world.y - body.size.y;
        body.vel.y = 0.0;
        body.grounded = true;
    } else {
        body.pos.y = next_y;
        body.grounded = false;
    }

    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestMap {
        cols: usize,
        rows: usize,
        solid: Vec<bool>,
        one_way: Vec<bool>,
    }

    impl TestMap {
        fn new(cols: usize, rows: usize) -> Self {
            Self {
                cols,
                rows,
                solid: vec![false; cols * rows],
                one_way: vec![false; cols * rows],
            }
        }

        fn set(&mut self, c: usize, r: usize) {
            self.solid[r * self.cols + c] = true;
        }

        fn cell(&self, x: f32, y: f32) -> Option<usize> {
            if x < 0.0 || y < 0.0 {
                return None;
            }
            let (c, r) = ((x / 16.0) as usize, (y / 16.0) as usize);
            (c < self.cols && r < self.rows).then_some(r * self.cols + c)
        }
    }

    impl SolidityMap for TestMap {
        fn tile_size(&self) -> f32 {
            16.0
        }
        fn world_size(&self) -> Vec2 {
            Vec2::new(self.cols as f32 * 16.0, self.rows as f32 * 16.0)
        }
        fn is_solid_at(&self, x: f32, y: f32) -> bool {
            self.cell(x, y).is_some_and(|i| self.solid[i])
        }
        fn is_one_way_at(&self, x: f32, y: f32) -> bool {
            self.cell(x, y).is_some_and(|i| self.one_way[i])
        }
    }

    #[test]
    fn subcell_keys_round_to_tenths() {
        assert_eq!(subcell_key(1.04, 2.0), subcell_key(1.0, 2.0));
        assert_ne!(subcell_key(1.06, 2.0), subcell_key(1.0, 2.0));
        assert_eq!(unpack_key(pack_key(-3, 7)), (-3, 7));
    }

    #[test]
    fn blocked_rect_and_bounds() {
        let mut grid = OccupancyGrid::new(5, 5);
        grid.block_rect(2.0, 2.0, 1.0, 1.0);
        assert!(grid.is_blocked(2.0, 2.0));
        assert!(grid.is_blocked(2.9, 2.9));
        assert!(!grid.is_blocked(3.0, 2.0));
        assert!(grid.is_blocked(-0.1, 0.0));
        assert!(grid.is_blocked(5.0, 0.0));
        assert!(!grid.is_blocked(4.9, 4.9));
    }

    #[test]
    fn leading_edge_probe_uses_far_side_when_moving_right() {
        let mut grid = OccupancyGrid::new(10, 10);
        grid.block_rect(5.0, 0.0, 1.0, 10.0);
        let footprint = Vec2::new(0.9, 0.9);
        assert!(!grid.leading_edge_blocked(Vec2::new(3.9, 4.0), footprint, Vec2::new(0.1, 0.0)));
        assert!(grid.leading_edge_blocked(Vec2::new(4.0, 4.0), footprint, Vec2::new(0.1, 0.0)));
        assert!(!grid.leading_edge_blocked(Vec2::new(4.0, 4.0), footprint, Vec2::new(-0.1, 0.0)));
    }

    #[test]
    fn falling_body_lands_and_grounds() {
        let mut map = TestMap::new(10, 10);
        for c in 0..10 {
            map.set(c, 8);
        }
        let mut body = Body::new(Vec2::new(32.0, 100.0), Vec2::new(24.0, 24.0));
        body.vel.y = 6.0;
        let mut landed = false;
        for _ in 0..10 {
            body.vel.y += 0.5;
            landed |= step_body(&mut body, &map).landed_on.is_some();
        }
        assert!(landed);
        assert!(body.grounded);
        assert_eq!(body.vel.y, 0.0);
        // Lowest probe row stays above the floor tiles.
        assert!(body.pos.y + body.size.y - 1.0 < 128.0);
    }

    #[test]
    fn ceiling_hit_zeroes_velocity_without_grounding() {
        let mut map = TestMap::new(10, 10);
        for c in 0..10 {
            map.set(c, 2);
        }
        let mut body = Body::new(Vec2::new(32.0, 50.0), Vec2::new(24.0, 24.0));
        body.vel.y = -8.0;
        let outcome = step_body(&mut body, &map);
        assert!(outcome.blocked_y);
        assert!(!body.grounded);
        assert_eq!(body.vel.y, 0.0);
        assert_eq!(body.pos.y, 50.0);
    }

    #[test]
    fn wall_blocks_horizontal_only() {
        let mut map = TestMap::new(10, 10);
        for r in 0..10 {
            map.set(4, r);
        }
        let mut body = Body::new(Vec2::new(40.0, 40.0), Vec2::new(24.0, 24.0));
        body.vel = Vec2::new(2.0, 1.0);
        let outcome = step_body(&mut body, &map);
        assert!(outcome.blocked_x);
        assert_eq!(body.pos.x, 40.0);
        assert_eq!(body.vel.x, 0.0);
        assert_eq!(body.pos.y, 41.0);
    }

    #[test]
    fn world_edges_clamp_and_floor_grounds() {
        let map = TestMap::new(4, 4);
        let mut body = Body::new(Vec2::new(1.0, 38.0), Vec2::new(24.0, 24.0));
        body.vel = Vec2::new(-5.0, 5.0);
        step_body(&mut body, &map);
        assert_eq!(body.pos.x, 0.0);
        assert_eq!(body.pos.y, 40.0);
        assert!(body.grounded);
    }

    #[test]
    fn one_way_tile_supports_from_above_only() {
        let mut map = TestMap::new(10, 10);
        for c in 0..10 {
            map.one_way[5 * 10 + c] = true;
        }
        let mut falling = Body::new(Vec2::new(32.0, 54.0), Vec2::new(24.0, 24.0));
        falling.vel.y = 4.0;
        step_body(&mut falling, &map);
        assert!(falling.grounded);
        assert_eq!(falling.pos.y, 54.0);

        // Resting on the edge never sinks through.
        for _ in 0..30 {
            falling.vel.y += 0.5;
            step_body(&mut falling, &map);
        }
        assert!(falling.pos.y + falling.size.y - 1.0 < 80.0);

        let mut rising = Body::new(Vec2::new(32.0, 90.0), Vec2::new(24.0, 24.0));
        rising.vel.y = -8.0;
        step_body(&mut rising, &map);
        assert_eq!(rising.pos.y, 82.0);
    }
}
