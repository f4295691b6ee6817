//! Lane generation and traffic movement.

use std::collections::BTreeSet;

use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use lounge_core::collision::Span;
use lounge_motion::grid_step::StepRules;

use crate::config::CrossingConfig;

/// Lane speeds are given per 16 ms frame.
pub const FRAME_MS: f32 = 16.0;

/// Horizontal travel direction of a lane's traffic or logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Travel {
    Left,
    Right,
}

impl Travel {
    pub fn sign(self) -> f32 {
        match self {
            Travel::Left => -1.0,
            Travel::Right => 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VehicleKind {
    Car,
    Truck,
}

impl VehicleKind {
    pub fn length(self, cfg: &CrossingConfig) -> f32 {
        match self {
            VehicleKind::Car => cfg.car_length,
            VehicleKind::Truck => cfg.truck_length,
        }
    }

    /// Columns reserved per vehicle when placing.
    fn slot_columns(self) -> i32 {
        match self {
            VehicleKind::Car => 2,
            VehicleKind::Truck => 3,
        }
    }

    fn count(self, cfg: &CrossingConfig) -> usize {
        match self {
            VehicleKind::Car => cfg.car_count,
            VehicleKind::Truck => cfg.truck_count,
        }
    }
}

/// One horizontal strip of the board. Obstacle positions are the centre x of
/// each vehicle or log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Lane {
    Field,
    Forest {
        occupied: BTreeSet<i32>,
    },
    Road {
        kind: VehicleKind,
        direction: Travel,
        speed: f32,
        vehicles: Vec<f32>,
    },
    River {
        direction: Travel,
        speed: f32,
        logs: Vec<f32>,
    },
}

const LOG_SLOT_COLUMNS: i32 = 2;

impl Lane {
    pub fn is_tree(&self, column: i32) -> bool {
        matches!(self, Lane::Forest { occupied } if occupied.contains(&column))
    }

    /// Move traffic and logs by `dt` seconds, wrapping past either edge.
    fn advance(&mut self, dt: f32, cfg: &CrossingConfig) {
        let (direction, speed, objects) = match self {
            Lane::Road {
                direction,
                speed,
                vehicles,
                ..
            } => (*direction, *speed, vehicles),
            Lane::River {
                direction,
                speed,
                logs,
            } => (*direction, *speed, logs),
            Lane::Field | Lane::Forest { .. } => return,
        };
        let edge = cfg.board_width() / 2.0 + 2.0 * cfg.position_width;
        let delta = direction.sign() * frame_distance(speed, dt);
        for x in objects.iter_mut() {
            *x += delta;
            if direction == Travel::Left && *x < -edge {
                *x = edge;
            } else if direction == Travel::Right && *x > edge {
                *x = -edge;
            }
        }
    }

    /// Whether a vehicle on this lane overlaps the avatar interval.
    pub fn vehicle_hits(&self, avatar: &Span, cfg: &CrossingConfig) -> bool {
        match self {
            Lane::Road { kind, vehicles, .. } => {
                let len = kind.length(cfg);
                vehicles.iter().any(|&x| Span::centered(x, len).overlaps(avatar))
            },
            _ => false,
        }
    }

    /// Carry applied to an avatar standing at `x` on a river lane over `dt`,
    /// or `None` if no log is under it.
    pub fn log_carry(&self, x: f32, dt: f32, cfg: &CrossingConfig) -> Option<f32> {
        match self {
            Lane::River {
                direction,
                speed,
                logs,
            } => logs
                .iter()
                .any(|&l| Span::centered(l, cfg.log_length).contains(x))
                .then(|| direction.sign() * frame_distance(*speed, dt)),
            _ => None,
        }
    }
}

/// Distance covered at `speed` units per frame over `dt` seconds.
pub fn frame_distance(speed: f32, dt: f32) -> f32 {
    speed * dt * 1000.0 / FRAME_MS
}

/// Generate lane `index`. Lanes at or behind the start are always fields.
pub fn generate_lane(index: i32, rng: &mut StdRng, cfg: &CrossingConfig) -> Lane {
    if index <= 0 {
        return Lane::Field;
    }
    match rng.random_range(0..4) {
        0 => road(VehicleKind::Car, rng, cfg),
        1 => road(VehicleKind::Truck, rng, cfg),
        2 => Lane::Forest {
            occupied: distinct_slots(rng, cfg.tree_count, cfg.columns),
        },
        _ => Lane::River {
            direction: random_travel(rng),
            speed: random_speed(rng, cfg),
            logs: slot_positions(rng, cfg.log_count, LOG_SLOT_COLUMNS, cfg),
        },
    }
}

fn road(kind: VehicleKind, rng: &mut StdRng, cfg: &CrossingConfig) -> Lane {
    Lane::Road {
        kind,
        direction: random_travel(rng),
        speed: random_speed(rng, cfg),
        vehicles: slot_positions(rng, kind.count(cfg), kind.slot_columns(), cfg),
    }
}

fn random_travel(rng: &mut StdRng) -> Travel {
    if rng.random_bool(0.5) {
        Travel::Left
    } else {
        Travel::Right
    }
}

fn random_speed(rng: &mut StdRng, cfg: &CrossingConfig) -> f32 {
    if cfg.speeds.is_empty() {
        return 0.0;
    }
    cfg.speeds[rng.random_range(0..cfg.speeds.len())]
}

/// Rejection-sample `count` distinct values in `0..slots`.
fn distinct_slots(rng: &mut StdRng, count: usize, slots: i32) -> BTreeSet<i32> {
    let count = count.min(slots.max(0) as usize);
    let mut taken = BTreeSet::new();
    while taken.len() < count {
        taken.insert(rng.random_range(0..slots));
    }
    taken
}

/// Centre x of `count` obstacles at distinct slots `slot_columns` wide.
fn slot_positions(
    rng: &mut StdRng,
    count: usize,
    slot_columns: i32,
    cfg: &CrossingConfig,
) -> Vec<f32> {
    let slots = (cfg.columns + slot_columns - 1) / slot_columns;
    let width = slot_columns as f32 * cfg.position_width;
    distinct_slots(rng, count, slots)
        .into_iter()
        .map(|slot| slot as f32 * width + cfg.position_width / 2.0 - cfg.board_width() / 2.0)
        .collect()
}

/// The lanes generated so far plus the board geometry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    pub lanes: Vec<Lane>,
    pub columns: i32,
}

impl Board {
    pub fn generate(rng: &mut StdRng, cfg: &CrossingConfig) -> Self {
        let lanes = (0..cfg.initial_lanes.max(1))
            .map(|i| generate_lane(i, rng, cfg))
            .collect();
        Self {
            lanes,
            columns: cfg.columns,
        }
    }

    pub fn lane(&self, index: i32) -> Option<&Lane> {
        usize::try_from(index).ok().and_then(|i| self.lanes.get(i))
    }

    pub fn push_lane(&mut self, rng: &mut StdRng, cfg: &CrossingConfig) {
        let index = self.lanes.len() as i32;
        self.lanes.push(generate_lane(index, rng, cfg));
    }

    pub fn advance(&mut self, dt: f32, cfg: &CrossingConfig) {
        for lane in &mut self.lanes {
            lane.advance(dt, cfg);
        }
    }
}

impl StepRules for Board {
    fn can_enter(&self, lane: i32, column: i32) -> bool {
        if lane < 0 || !(0..self.columns).contains(&column) {
            return false;
        }
        !self.lane(lane).is_some_and(|l| l.is_tree(column))
    }
}
