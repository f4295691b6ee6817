//! Discrete one-tile-per-request movement with hop animation and queued input.

use std::collections::VecDeque;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use lounge_core::input::MoveDir;

/// Game-specific admission rules for grid steps.
pub trait StepRules {
    /// Whether the avatar may end a step on `(lane, column)`.
    fn can_enter(&self, lane: i32, column: i32) -> bool;
}

/// Lane/column change for one step. `Up` moves forward one lane.
pub fn step_delta(dir: MoveDir) -> (i32, i32) {
    match dir {
        MoveDir::Up => (1, 0),
        MoveDir::Down => (-1, 0),
        MoveDir::Left => (0, -1),
        MoveDir::Right => (0, 1),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct ActiveStep {
    dir: MoveDir,
    elapsed: f32,
}

/// A step that finished this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepCompleted {
    pub dir: MoveDir,
    pub lane: i32,
    pub column: i32,
}

/// Grid-stepped avatar: committed lane/column plus an animating step and a
/// queue of accepted requests.
///
/// The committed position only changes when a step completes, by exactly one
/// lane or one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridStepper {
    lane: i32,
    column: i32,
    active: Option<ActiveStep>,
    queue: VecDeque<MoveDir>,
    facing: MoveDir,
    step_duration: f32,
    hop_height: f32,
    max_queued: usize,
}

impl GridStepper {
    pub fn new(lane: i32, column: i32, step_duration: f32, hop_height: f32, max_queued: usize) -> Self {
        Self {
            lane,
            column,
            active: None,
            queue: VecDeque::new(),
            facing: MoveDir::Up,
            step_duration: step_duration.max(f32::EPSILON),
            hop_height,
            max_queued,
        }
    }

    pub fn lane(&self) -> i32 {
        self.lane
    }

    pub fn column(&self) -> i32 {
        self.column
    }

    pub fn facing(&self) -> MoveDir {
        self.facing
    }

    pub fn is_moving(&self) -> bool {
        self.active.is_some()
    }

    /// Direction of the step currently animating.
    pub fn active_dir(&self) -> Option<MoveDir> {
        self.active.map(|a| a.dir)
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Where the avatar will stand once every accepted step has run.
    pub fn final_position(&self) -> (i32, i32) {
        self.active
            .iter()
            .map(|a| a.dir)
            .chain(self.queue.iter().copied())
            .fold((self.lane, self.column), |(l, c), dir| {
                let (dl, dc) = step_delta(dir);
                (l + dl, c + dc)
            })
    }

    /// Accept a step if its destination, computed from the final queued
    /// position, is enterable. Returns whether the request was accepted.
    pub fn request<R: StepRules + ?Sized>(&mut self, dir: MoveDir, rules: &R) -> bool {
        let pending = usize::from(self.active.is_some()) + self.queue.len();
        if pending > self.max_queued {
            tracing::trace!(?dir, pending, "Step rejected: queue full");
            return false;
        }
        let (lane, column) = self.final_position();
        let (dl, dc) = step_delta(dir);
        if !rules.can_enter(lane + dl, column + dc) {
            tracing::trace!(?dir, lane = lane + dl, column = column + dc, "Step rejected");
            return false;
        }
        if self.active.is_none() {
            self.start(dir);
        } else {
            self.queue.push_back(dir);
        }
        true
    }

    /// Advance the animating step. A completed step commits its ±1 change and
    /// the next queued request starts on the following tick.
    pub fn tick(&mut self, dt: f32) -> Option<StepCompleted> {
        let active = self.active.as_mut()?;
        active.elapsed += dt;
        if active.elapsed < self.step_duration {
            return None;
        }
        let dir = active.dir;
        let (dl, dc) = step_delta(dir);
        self.lane += dl;
        self.column += dc;
        self.active = None;
        if let Some(next) = self.queue.pop_front() {
            self.start(next);
        }
        Some(StepCompleted {
            dir,
            lane: self.lane,
            column: self.column,
        })
    }

    /// Linear progress of the animating step in `[0, 1]`; 0 when idle.
    pub fn progress(&self) -> f32 {
        self.active
            .map(|a| (a.elapsed / self.step_duration).clamp(0.0, 1.0))
            .unwrap_or(0.0)
    }

    /// Vertical arc over the step: `sin(progress·π) · hop_height`.
    pub fn hop_offset(&self) -> f32 {
        if self.active.is_none() {
            return 0.0;
        }
        (self.progress() * std::f32::consts::PI).sin() * self.hop_height
    }

    /// Fractional (lane, column) offset of the rendered avatar from the
    /// committed cell.
    pub fn visual_offset(&self) -> Vec2 {
        match self.active {
            Some(a) => {
                let (dl, dc) = step_delta(a.dir);
                Vec2::new(dc as f32, dl as f32) * self.progress()
            },
            None => Vec2::ZERO,
        }
    }

    /// Drop every pending step (game over, respawn).
    pub fn halt(&mut self) {
        self.active = None;
        self.queue.clear();
    }

    fn start(&mut self, dir: MoveDir) {
        self.facing = dir;
        self.active = Some(ActiveStep { dir, elapsed: 0.0 });
    }
}
