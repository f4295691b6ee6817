//! Continuous top-down movement for lounge avatars.

use glam::Vec2;

use lounge_core::config::MotionConfig;
use lounge_core::entity::{Action, Direction, Facing};
use lounge_core::grid::{OccupancyGrid, SUBCELLS_PER_TILE};
use lounge_core::input::{HeldInput, InputEvent};

use crate::RenderState;
use crate::publish::{PublishKey, PublishThrottle};

/// Result of one controller tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoamTick {
    pub moved: bool,
    /// State to push to the shared store, if the publish policy allows it.
    pub publish: Option<RenderState>,
}

/// Authoritative position and walk cycle of the local lounge avatar.
///
/// Positions are in tiles and always sit on the 0.1-tile sub-cell lattice.
#[derive(Debug, Clone)]
pub struct FreeRoamController {
    position: Vec2,
    direction: Direction,
    /// Last non-idle direction, used for rendering while idle-cycling.
    heading: Direction,
    frame: u32,
    held: HeldInput,
    idle_clock: f32,
    step: f32,
    footprint: Vec2,
    walk_frames: u32,
    idle_frame_interval: f32,
    throttle: PublishThrottle,
}

impl FreeRoamController {
    pub fn new(spawn: Vec2, config: &MotionConfig) -> Self {
        Self {
            position: snap(spawn),
            direction: Direction::Idle,
            heading: Direction::Front,
            frame: 1,
            held: HeldInput::default(),
            idle_clock: 0.0,
            step: config.roam_step,
            footprint: Vec2::from(config.avatar_footprint),
            walk_frames: config.walk_frames.max(1),
            idle_frame_interval: config.idle_frame_interval,
            throttle: PublishThrottle::new(config.publish_interval),
        }
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        self.held.apply(event);
    }

    pub fn held(&self) -> HeldInput {
        self.held
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    /// Advance one fixed step in the held direction(s). Each axis is resolved
    /// on its own so sliding along a wall still works.
    pub fn tick(&mut self, grid: &OccupancyGrid, dt: f32, now_ms: u64) -> RoamTick {
        let dx = self.held.horizontal() * self.step;
        let dy = self.held.vertical() * self.step;

        let mut moved = false;
        if dx != 0.0 && !grid.leading_edge_blocked(self.position, self.footprint, Vec2::new(dx, 0.0))
        {
            self.position = snap(self.position + Vec2::new(dx, 0.0));
            moved = true;
        }
        if dy != 0.0 && !grid.leading_edge_blocked(self.position, self.footprint, Vec2::new(0.0, dy))
        {
            self.position = snap(self.position + Vec2::new(0.0, dy));
            moved = true;
        }
        if (dx != 0.0 || dy != 0.0) && !moved {
            tracing::trace!(x = self.position.x, y = self.position.y, "Move blocked");
        }

        if moved {
            self.idle_clock = 0.0;
            if let Some(dir) = self.held.priority_dir() {
                self.direction = dir.facing();
                self.heading = self.direction;
            }
            self.frame = self.next_frame();
            let key = self.key();
            let publish = self
                .throttle
                .should_publish(now_ms, key)
                .then(|| self.render_state());
            return RoamTick { moved, publish };
        }

        self.idle_clock += dt;
        if self.idle_clock > self.idle_frame_interval {
            self.idle_clock = 0.0;
            self.direction = Direction::Idle;
            self.frame = self.next_frame();
            let key = self.key();
            let publish = self
                .throttle
                .should_publish_idle(now_ms, key)
                .then(|| self.render_state());
            return RoamTick {
                moved: false,
                publish,
            };
        }

        RoamTick {
            moved: false,
            publish: None,
        }
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            position: self.position,
            hop: 0.0,
            direction: self.direction,
            facing: match self.heading {
                Direction::Left => Facing::Left,
                _ => Facing::Right,
            },
            action: if self.direction.is_idle() {
                Action::Idle
            } else {
                Action::Move
            },
            frame: self.frame,
        }
    }

    fn next_frame(&self) -> u32 {
        if self.frame >= self.walk_frames {
            1
        } else {
            self.frame + 1
        }
    }

    fn key(&self) -> PublishKey {
        PublishKey::new(
            self.position,
            1.0 / SUBCELLS_PER_TILE,
            self.direction,
            Facing::Right,
            Action::Idle,
            self.frame,
        )
    }
}

fn snap(p: Vec2) -> Vec2 {
    (p * SUBCELLS_PER_TILE).round() / SUBCELLS_PER_TILE
}

#[cfg(test)]
mod tests {
    use lounge_core::input::MoveDir;

    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn controller_at(x: f32, y: f32) -> FreeRoamController {
        FreeRoamController::new(Vec2::new(x, y), &MotionConfig::default())
    }

    #[test]
    fn held_key_moves_one_step_per_tick() {
        let grid = OccupancyGrid::new(10, 10);
        let mut c = controller_at(2.0, 2.0);
        c.handle_input(&InputEvent::press(MoveDir::Right));
        let tick = c.tick(&grid, DT, 0);
        assert!(tick.moved);
        assert!((c.position().x - 2.1).abs() < 1e-5);
        assert_eq!(c.direction(), Direction::Right);
        assert_eq!(c.frame(), 2);
        assert!(tick.publish.is_some());
    }

    #[test]
    fn blocked_move_leaves_position_unchanged() {
        let mut grid = OccupancyGrid::new(10, 10);
        grid.block_rect(3.0, 0.0, 1.0, 10.0);
        let mut c = controller_at(2.4, 2.0);
        c.handle_input(&InputEvent::press(MoveDir::Right));
        let tick = c.tick(&grid, DT, 0);
        assert!(!tick.moved);
        assert_eq!(c.position(), Vec2::new(2.4, 2.0));
    }

    #[test]
    fn out_of_bounds_is_blocked() {
        let grid = OccupancyGrid::new(10, 10);
        let mut c = controller_at(0.0, 0.0);
        c.handle_input(&InputEvent::press(MoveDir::Up));
        c.handle_input(&InputEvent::press(MoveDir::Left));
        assert!(!c.tick(&grid, DT, 0).moved);
        assert_eq!(c.position(), Vec2::ZERO);
    }

    #[test]
    fn diagonal_slides_along_wall() {
        let mut grid = OccupancyGrid::new(10, 10);
        grid.block_rect(3.0, 0.0, 1.0, 10.0);
        let mut c = controller_at(2.4, 2.0);
        c.handle_input(&InputEvent::press(MoveDir::Right));
        c.handle_input(&InputEvent::press(MoveDir::Down));
        assert!(c.tick(&grid, DT, 0).moved);
        assert_eq!(c.position(), Vec2::new(2.4, 2.1));
        assert_eq!(c.direction(), Direction::Front);
    }

    #[test]
    fn walking_publishes_are_throttled() {
        let grid = OccupancyGrid::new(20, 20);
        let mut c = controller_at(1.0, 1.0);
        c.handle_input(&InputEvent::press(MoveDir::Right));
        let mut published = 0;
        // One second of walking at 60 Hz.
        for i in 0..60u64 {
            if c.tick(&grid, DT, i * 1000 / 60).publish.is_some() {
                published += 1;
            }
        }
        assert!(published >= 7 && published <= 9, "published {published}");
    }

    #[test]
    fn standing_still_cycles_idle_frames() {
        let grid = OccupancyGrid::new(10, 10);
        let mut c = controller_at(5.0, 5.0);
        let mut idle_publishes = 0;
        for i in 0..60u64 {
            if c.tick(&grid, DT, i * 1000 / 60).publish.is_some() {
                idle_publishes += 1;
            }
        }
        assert_eq!(c.direction(), Direction::Idle);
        assert!(idle_publishes >= 3, "idle publishes {idle_publishes}");
        assert!(c.frame() > 1);
    }

    #[test]
    fn walk_frame_wraps_to_one() {
        let grid = OccupancyGrid::new(40, 10);
        let mut c = controller_at(1.0, 1.0);
        c.handle_input(&InputEvent::press(MoveDir::Right));
        for _ in 0..8 {
            c.tick(&grid, DT, 0);
        }
        assert_eq!(c.frame(), 1);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn never_enters_blocked_cells(
                moves in proptest::collection::vec(0u8..4, 1..200)
            ) {
                let mut grid = OccupancyGrid::new(12, 12);
                grid.block_rect(5.0, 5.0, 2.0, 2.0);
                let footprint = Vec2::from(MotionConfig::default().avatar_footprint);
                let mut c = controller_at(1.0, 1.0);
                for m in moves {
                    let dir = match m {
                        0 => MoveDir::Up,
                        1 => MoveDir::Down,
                        2 => MoveDir::Left,
                        _ => MoveDir::Right,
                    };
                    c.handle_input(&InputEvent::press(dir));
                    for _ in 0..5 {
                        c.tick(&grid, DT, 0);
                    }
                    c.handle_input(&InputEvent::release(dir));
                    let p = c.position();
                    let far = p + footprint;
                    for corner in [p, Vec2::new(far.x, p.y), Vec2::new(p.x, far.y), far] {
                        prop_assert!(!grid.is_blocked(corner.x, corner.y));
                    }
                }
            }
        }
    }
}
