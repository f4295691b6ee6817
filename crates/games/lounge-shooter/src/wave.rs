//! Scrolling monster columns and fire-rate pickups between boss fights.

use glam::Vec2;
use rand::Rng;
use rand::distr::Distribution;
use rand::distr::weighted::WeightedIndex;
use serde::{Deserialize, Serialize};

use lounge_core::collision::Aabb;

use crate::config::ShooterConfig;
use crate::patterns::Projectile;

/// Columns scrolled this far past the left edge are dropped.
const DESPAWN_X: f32 = -200.0;
/// How many recent columns limit monster density and lane reuse.
const RECENT_COLUMNS: usize = 3;
/// Monsters hold fire when the ship is closer than this.
const MIN_AIM_DISTANCE: f32 = 5.0;

/// Per-kind monster statistics. Kinds run 1 to 4, stronger as they rise.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MonsterStats {
    pub hp: u32,
    /// Seconds between shots.
    pub fire_interval: f32,
    /// Multiplier on the base monster bullet speed.
    pub bullet_speed: f32,
}

impl MonsterStats {
    pub fn for_kind(kind: u8) -> Self {
        match kind {
            0 | 1 => Self {
                hp: 1,
                fire_interval: 3.0,
                bullet_speed: 1.0,
            },
            2 => Self {
                hp: 1,
                fire_interval: 2.5,
                bullet_speed: 1.2,
            },
            3 => Self {
                hp: 2,
                fire_interval: 2.0,
                bullet_speed: 1.5,
            },
            _ => Self {
                hp: 3,
                fire_interval: 1.5,
                bullet_speed: 2.0,
            },
        }
    }
}

/// Relative odds of each monster kind, strongest last, for the boss tier
/// the player is heading towards.
pub fn spawn_weights(tier: u8) -> &'static [u32] {
    match tier {
        0 | 1 => &[100],
        2 => &[70, 30],
        3 => &[50, 30, 20],
        _ => &[30, 25, 25, 20],
    }
}

fn roll_kind<R: Rng + ?Sized>(tier: u8, rng: &mut R) -> u8 {
    WeightedIndex::new(spawn_weights(tier))
        .map(|dist| dist.sample(rng) as u8 + 1)
        .unwrap_or(1)
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Monster {
    pub lane: u8,
    pub kind: u8,
    pub hp: u32,
    /// Set once the monster has scrolled onto the field.
    pub armed: bool,
    pub cooldown: f32,
}

impl Monster {
    pub fn new(lane: u8, kind: u8) -> Self {
        Self {
            lane,
            kind,
            hp: MonsterStats::for_kind(kind).hp,
            armed: false,
            cooldown: 0.0,
        }
    }

    pub fn stats(&self) -> MonsterStats {
        MonsterStats::for_kind(self.kind)
    }

    /// World box of this monster in a column at `column_x`.
    pub fn bounds(&self, column_x: f32, cfg: &ShooterConfig) -> Aabb {
        let lane_height = cfg.lane_height();
        Aabb::new(
            column_x + cfg.monster_inset,
            f32::from(self.lane) * lane_height + (lane_height - cfg.monster_size) / 2.0,
            cfg.monster_size,
            cfg.monster_size,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PickupKind {
    /// Shorter fire interval and one more missile per shot.
    FireRateUp,
    /// Longer fire interval and one missile fewer.
    FireRateDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pickup {
    pub lane: u8,
    pub kind: PickupKind,
}

/// One slice of the scrolling field, at most one monster and one pickup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub x: f32,
    pub monster: Option<Monster>,
    pub pickup: Option<Pickup>,
}

/// What a player bullet did to the wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShotOutcome {
    Miss,
    Wounded,
    Killed { kind: u8 },
}

/// The player's current auto-fire, shaped by pickups.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Armament {
    /// Seconds between shots.
    pub interval: f32,
    pub missiles: u32,
}

impl Armament {
    pub fn new(cfg: &ShooterConfig) -> Self {
        Self {
            interval: cfg.auto_fire_interval,
            missiles: 1,
        }
    }

    pub fn apply(&mut self, kind: PickupKind, cfg: &ShooterConfig) {
        match kind {
            PickupKind::FireRateUp => {
                self.interval = (self.interval - cfg.fire_bonus_step).max(cfg.min_fire_interval);
                self.missiles = (self.missiles + 1).min(cfg.max_missiles);
            },
            PickupKind::FireRateDown => {
                self.interval = (self.interval + cfg.fire_malus_step).min(cfg.max_fire_interval);
                self.missiles = self.missiles.saturating_sub(1).max(1);
            },
        }
    }

    /// Vertical offsets of one shot's missiles, centred on the muzzle.
    pub fn offsets(&self, cfg: &ShooterConfig) -> impl Iterator<Item = f32> {
        let n = self.missiles;
        let spread = cfg.missile_spread;
        (0..n).map(move |i| (i as f32 - n.saturating_sub(1) as f32 / 2.0) * spread)
    }
}

/// Lane whose band contains the height `y`.
pub fn lane_at(y: f32, cfg: &ShooterConfig) -> u8 {
    let last = cfg.lanes.saturating_sub(1);
    let lane = (y / cfg.lane_height()).floor().max(0.0) as u32;
    u8::try_from(lane).unwrap_or(last).min(last)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Wave {
    pub columns: Vec<Column>,
}

impl Wave {
    /// Append columns past the right edge until `columns_ahead` exist.
    pub fn fill<R: Rng + ?Sized>(&mut self, tier: u8, rng: &mut R, cfg: &ShooterConfig) {
        let spacing = cfg.width / 10.0;
        let lanes = cfg.lanes.max(1);
        while self.columns.len() < cfg.columns_ahead {
            let x = self.columns.last().map_or(cfg.width, |c| c.x) + spacing;
            let recent = &self.columns[self.columns.len().saturating_sub(RECENT_COLUMNS)..];
            let recent_monsters: Vec<u8> =
                recent.iter().filter_map(|c| c.monster.map(|m| m.lane)).collect();

            let monster = (recent_monsters.len() < RECENT_COLUMNS
                && rng.random_bool(cfg.monster_chance))
            .then(|| {
                let lane = pick_lane(lanes, &recent_monsters, rng);
                Monster::new(lane, roll_kind(tier, rng))
            });

            let pickup = rng.random_bool(cfg.pickup_chance).then(|| {
                let taken: Vec<u8> = monster.iter().map(|m| m.lane).collect();
                let kind = if rng.random_bool(0.5) {
                    PickupKind::FireRateUp
                } else {
                    PickupKind::FireRateDown
                };
                Pickup {
                    lane: pick_lane(lanes, &taken, rng),
                    kind,
                }
            });

            self.columns.push(Column { x, monster, pickup });
        }
    }

    pub fn scroll(&mut self, speed: f32) {
        for column in &mut self.columns {
            column.x -= speed;
        }
        self.columns.retain(|c| c.x > DESPAWN_X);
    }

    /// Arm monsters that reached the field and aim due shots at `target`.
    pub fn fire(&mut self, target: Vec2, dt: f32, cfg: &ShooterConfig) -> Vec<Projectile> {
        let mut shots = Vec::new();
        let lane_height = cfg.lane_height();
        for column in &mut self.columns {
            let Some(monster) = column.monster.as_mut() else {
                continue;
            };
            let left = column.x + cfg.monster_inset;
            if !monster.armed && left > 0.0 && left < cfg.width {
                monster.armed = true;
                monster.cooldown = 0.0;
            }
            if !monster.armed {
                continue;
            }
            monster.cooldown -= dt;
            if monster.cooldown > 0.0 {
                continue;
            }
            let stats = monster.stats();
            monster.cooldown = stats.fire_interval;
            let origin = Vec2::new(left, (f32::from(monster.lane) + 0.5) * lane_height);
            let aim = target - origin;
            if aim.length() > MIN_AIM_DISTANCE {
                shots.push(Projectile {
                    pos: origin,
                    vel: aim.normalize() * cfg.monster_bullet_speed * stats.bullet_speed,
                });
            }
        }
        shots
    }

    /// Remove the monster the ship centre flew into, if any.
    pub fn ram(&mut self, ship: Vec2, cfg: &ShooterConfig) -> Option<Monster> {
        self.columns.iter_mut().find_map(|column| {
            let x = column.x;
            let hit = column
                .monster
                .is_some_and(|m| m.bounds(x, cfg).contains_point(ship));
            if hit { column.monster.take() } else { None }
        })
    }

    /// Apply a player bullet at `point` to the first monster it is inside.
    pub fn shoot(&mut self, point: Vec2, cfg: &ShooterConfig) -> ShotOutcome {
        for column in &mut self.columns {
            let x = column.x;
            let Some(monster) = column.monster.as_mut() else {
                continue;
            };
            if !monster.bounds(x, cfg).contains_point(point) {
                continue;
            }
            monster.hp = monster.hp.saturating_sub(1);
            if monster.hp > 0 {
                return ShotOutcome::Wounded;
            }
            let kind = monster.kind;
            column.monster = None;
            return ShotOutcome::Killed { kind };
        }
        ShotOutcome::Miss
    }

    /// Take the pickup in `lane` from a column alongside `ship_x`.
    pub fn collect(&mut self, ship_x: f32, lane: u8, cfg: &ShooterConfig) -> Option<PickupKind> {
        self.columns
            .iter_mut()
            .filter(|c| (c.x - ship_x).abs() < cfg.pickup_reach)
            .find_map(|c| {
                let kind = c.pickup.filter(|p| p.lane == lane)?.kind;
                c.pickup = None;
                Some(kind)
            })
    }

    pub fn monster_count(&self) -> usize {
        self.columns.iter().filter(|c| c.monster.is_some()).count()
    }
}

/// A lane not in `taken`, or any lane when all are taken.
fn pick_lane<R: Rng + ?Sized>(lanes: u8, taken: &[u8], rng: &mut R) -> u8 {
    let free: Vec<u8> = (0..lanes).filter(|l| !taken.contains(l)).collect();
    if free.is_empty() {
        rng.random_range(0..lanes)
    } else {
        free[rng.random_range(0..free.len())]
    }
}
