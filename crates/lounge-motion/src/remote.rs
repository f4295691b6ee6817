//! Smooths sparse remote snapshots into per-frame render state.

use std::collections::VecDeque;

use glam::Vec2;

use lounge_core::config::MotionConfig;
use lounge_core::entity::{Action, Direction, Facing};
use lounge_core::net::snapshot::RemoteSnapshot;

use crate::RenderState;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Target {
    position: Vec2,
    direction: Direction,
    frame: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Segment {
    from: Vec2,
    to: Vec2,
    elapsed: f32,
}

/// Render-side mirror of one remote entity.
///
/// Exists only once a snapshot has been seen: construction snaps to the
/// first position. Later snapshots queue as interpolation targets.
#[derive(Debug, Clone)]
pub struct RemoteInterpolator {
    rendered: Vec2,
    segment: Option<Segment>,
    queue: VecDeque<Target>,
    /// Last accepted target, used for redundancy checks.
    last_target: Target,
    direction: Direction,
    last_non_idle: Direction,
    facing: Facing,
    action: Action,
    frame: u32,
    frame_clock: f32,
    since_snapshot: f32,
    last_timestamp_ms: u64,
    cap: usize,
    epsilon: f32,
    interp_duration: f32,
    walk_frame_interval: f32,
    idle_frame_interval: f32,
    idle_timeout: f32,
    walk_frames: u32,
}

impl RemoteInterpolator {
    pub fn new(first: &RemoteSnapshot, config: &MotionConfig) -> Self {
        let mut this = Self {
            rendered: first.position,
            segment: None,
            queue: VecDeque::with_capacity(config.interp_queue_cap),
            last_target: Target {
                position: first.position,
                direction: Direction::Front,
                frame: 1,
            },
            direction: Direction::Front,
            last_non_idle: Direction::Front,
            facing: first.facing,
            action: first.action,
            frame: 1,
            frame_clock: 0.0,
            since_snapshot: 0.0,
            last_timestamp_ms: first.timestamp_ms,
            cap: config.interp_queue_cap.max(1),
            epsilon: config.interp_epsilon,
            interp_duration: config.interp_duration.max(f32::EPSILON),
            walk_frame_interval: config.remote_walk_frame_interval,
            idle_frame_interval: config.remote_idle_frame_interval,
            idle_timeout: config.idle_timeout,
            walk_frames: config.walk_frames.max(1),
        };
        let (direction, frame) = this.infer(first.direction, first.frame);
        this.direction = direction;
        this.frame = frame;
        this.last_target = Target {
            position: first.position,
            direction,
            frame,
        };
        this
    }

    /// Display direction and frame for a published `(direction, frame)`.
    ///
    /// A published idle with a mid-stride frame keeps walking in the last
    /// non-idle direction; only idle at frame 1 or below displays as idle.
    pub fn infer(&mut self, direction: Direction, frame: u32) -> (Direction, u32) {
        if direction.is_idle() {
            if frame > 1 {
                (self.last_non_idle, frame)
            } else {
                (Direction::Idle, 1)
            }
        } else {
            self.last_non_idle = direction;
            (direction, frame.max(1))
        }
    }

    /// Offer a new snapshot. Returns whether it was queued. Older snapshots
    /// than the newest seen are ignored.
    pub fn push(&mut self, snapshot: &RemoteSnapshot) -> bool {
        if snapshot.timestamp_ms < self.last_timestamp_ms {
            return false;
        }
        self.last_timestamp_ms = snapshot.timestamp_ms;
        self.since_snapshot = 0.0;
        self.facing = snapshot.facing;
        self.action = snapshot.action;

        let (direction, frame) = self.infer(snapshot.direction, snapshot.frame);
        let moved = snapshot.position.distance(self.last_target.position) > self.epsilon;
        if !moved && direction == self.last_target.direction {
            return false;
        }
        let target = Target {
            position: snapshot.position,
            direction,
            frame,
        };
        if self.queue.len() >= self.cap {
            self.queue.pop_front();
        }
        self.queue.push_back(target);
        self.last_target = target;
        true
    }

    /// Advance interpolation and animation by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.since_snapshot += dt;

        if self.segment.is_none() {
            self.start_next();
        }

        if let Some(mut seg) = self.segment {
            seg.elapsed += dt;
            let t = (seg.elapsed / self.interp_duration).min(1.0);
            self.rendered = seg.from.lerp(seg.to, t);
            let arrived = t >= 1.0;

            if !self.direction.is_idle() {
                self.frame_clock += dt;
                if self.frame_clock >= self.walk_frame_interval {
                    self.frame_clock = 0.0;
                    self.frame = self.next_frame();
                }
            }

            if arrived {
                self.rendered = seg.to;
                self.segment = None;
                self.start_next();
            } else {
                self.segment = Some(seg);
            }
            return;
        }

        if self.since_snapshot >= self.idle_timeout {
            if !self.direction.is_idle() {
                self.direction = Direction::Idle;
                self.frame = 1;
                self.frame_clock = 0.0;
            }
            self.frame_clock += dt;
            if self.frame_clock >= self.idle_frame_interval {
                self.frame_clock = 0.0;
                self.frame = self.next_frame();
            }
        }
    }

    pub fn position(&self) -> Vec2 {
        self.rendered
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn last_non_idle(&self) -> Direction {
        self.last_non_idle
    }

    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn is_interpolating(&self) -> bool {
        self.segment.is_some()
    }

    pub fn last_timestamp_ms(&self) -> u64 {
        self.last_timestamp_ms
    }

    pub fn render(&self) -> RenderState {
        RenderState {
            position: self.rendered,
            hop: 0.0,
            direction: self.direction,
            facing: self.facing,
            action: if self.direction.is_idle() {
                Action::Idle
            } else if self.action == Action::Idle {
                Action::Move
            } else {
                self.action
            },
            frame: self.frame,
        }
    }

    fn start_next(&mut self) {
        if let Some(target) = self.queue.pop_front() {
            self.direction = target.direction;
            self.frame = target.frame;
            self.segment = Some(Segment {
                from: self.rendered,
                to: target.position,
                elapsed: 0.0,
            });
        }
    }

    fn next_frame(&self) -> u32 {
        if self.frame >= self.walk_frames {
            1
        } else {
            self.frame + 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snap(x: f32, dir: Direction, frame: u32, ts: u64) -> RemoteSnapshot {
        let mut s = RemoteSnapshot::new(2, "shib", Vec2::new(x, 5.0), ts);
        s.direction = dir;
        s.frame = frame;
        s
    }

    fn interp(first: &RemoteSnapshot) -> RemoteInterpolator {
        RemoteInterpolator::new(first, &MotionConfig::default())
    }

    #[test]
    fn first_snapshot_snaps_without_sliding() {
        let r = interp(&snap(9.0, Direction::Right, 3, 100));
        assert_eq!(r.position(), Vec2::new(9.0, 5.0));
        assert!(!r.is_interpolating());
        assert_eq!(r.direction(), Direction::Right);
    }

    #[test]
    fn idle_with_mid_stride_frame_keeps_walking_direction() {
        let mut r = interp(&snap(1.0, Direction::Right, 3, 0));
        assert_eq!(r.direction(), Direction::Right);

        r.push(&snap(1.0, Direction::Idle, 4, 50));
        r.tick(0.016);
        assert_eq!(r.direction(), Direction::Right);

        r.push(&snap(1.0, Direction::Idle, 1, 100));
        r.tick(0.016);
        assert_eq!(r.direction(), Direction::Idle);
        assert_eq!(r.frame(), 1);
    }

    #[test]
    fn last_non_idle_defaults_to_front() {
        let mut r = interp(&snap(1.0, Direction::Idle, 5, 0));
        assert_eq!(r.direction(), Direction::Front);
        assert_eq!(r.infer(Direction::Idle, 2), (Direction::Front, 2));
    }

    #[test]
    fn redundant_snapshot_is_discarded() {
        let mut r = interp(&snap(1.0, Direction::Right, 2, 0));
        assert!(!r.push(&snap(1.01, Direction::Right, 3, 10)));
        assert!(r.push(&snap(1.5, Direction::Right, 4, 20)));
        assert!(r.push(&snap(1.5, Direction::Back, 5, 30)));
    }

    #[test]
    fn queue_drops_oldest_beyond_cap() {
        let mut r = interp(&snap(0.0, Direction::Right, 1, 0));
        for i in 1..=5 {
            r.push(&snap(i as f32, Direction::Right, 1, i as u64 * 10));
        }
        assert_eq!(r.pending(), 3);
        r.tick(0.2);
        // Targets 1 and 2 were dropped; the first segment heads to 3.
        assert_eq!(r.position(), Vec2::new(3.0, 5.0));
    }

    #[test]
    fn interpolates_linearly_over_window() {
        let mut r = interp(&snap(0.0, Direction::Right, 1, 0));
        r.push(&snap(2.0, Direction::Right, 2, 120));
        r.tick(0.1);
        assert!((r.position().x - 1.0).abs() < 1e-4);
        r.tick(0.1);
        assert_eq!(r.position().x, 2.0);
        assert!(!r.is_interpolating());
    }

    #[test]
    fn out_of_order_snapshot_is_ignored() {
        let mut r = interp(&snap(0.0, Direction::Right, 1, 500));
        assert!(!r.push(&snap(4.0, Direction::Left, 1, 400)));
        assert_eq!(r.pending(), 0);
    }

    #[test]
    fn falls_back_to_idle_after_silence() {
        let mut r = interp(&snap(0.0, Direction::Right, 1, 0));
        r.push(&snap(1.0, Direction::Right, 2, 100));
        for _ in 0..20 {
            r.tick(0.016);
        }
        assert_eq!(r.direction(), Direction::Right);
        for _ in 0..30 {
            r.tick(0.016);
        }
        assert_eq!(r.direction(), Direction::Idle);
        assert_eq!(r.render().action, Action::Idle);
    }

    #[test]
    fn walk_frame_advances_on_own_cadence() {
        let mut r = interp(&snap(0.0, Direction::Right, 1, 0));
        r.push(&snap(1.0, Direction::Right, 1, 100));
        r.tick(0.05);
        assert_eq!(r.frame(), 1);
        r.tick(0.05);
        assert_eq!(r.frame(), 2);
    }
}
