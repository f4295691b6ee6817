//! Boss attack patterns.

use std::f32::consts::{PI, TAU};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// One volley; most fit inline, enraged spirals spill to the heap.
pub type Volley = SmallVec<[Projectile; 16]>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Projectile {
    pub pos: Vec2,
    /// Units per tick.
    pub vel: Vec2,
}

impl Projectile {
    pub fn advance(&mut self) {
        self.pos += self.vel;
    }

    /// Still within `margin` of the `width` x `height` field.
    pub fn on_field(&self, width: f32, height: f32, margin: f32) -> bool {
        self.pos.x > -margin
            && self.pos.x < width + margin
            && self.pos.y >= -margin
            && self.pos.y <= height + margin
    }
}

/// Patterns in the order a boss cycles through them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    StraightVolley,
    FanSpread,
    Homing,
    /// Tier 2 and up.
    VerticalBarrage,
    /// Tier 3 and up.
    Spiral,
}

impl Pattern {
    pub const CYCLE: [Pattern; 5] = [
        Pattern::StraightVolley,
        Pattern::FanSpread,
        Pattern::Homing,
        Pattern::VerticalBarrage,
        Pattern::Spiral,
    ];

    pub fn min_tier(self) -> u8 {
        match self {
            Pattern::VerticalBarrage => 2,
            Pattern::Spiral => 3,
            _ => 1,
        }
    }
}

/// Where and how hard a boss fires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FireContext {
    /// Muzzle: the boss's left edge, vertically centred.
    pub origin: Vec2,
    /// Centre of the ship.
    pub target: Vec2,
    pub tier: u8,
    pub enraged: bool,
    /// Seconds since the fight started; turns the spiral.
    pub elapsed: f32,
    pub field_height: f32,
}

impl FireContext {
    fn speed(&self) -> f32 {
        let base = 5.0 + f32::from(self.tier);
        if self.enraged { base * 1.5 } else { base }
    }

    /// Enraged bosses fire twice as many projectiles.
    fn count(&self, n: usize) -> usize {
        if self.enraged { n * 2 } else { n }
    }
}

/// Offset of shot `i` from the middle of an `n`-shot volley.
fn centred(i: usize, n: usize) -> f32 {
    i as f32 - (n / 2) as f32
}

pub fn fire(pattern: Pattern, ctx: &FireContext) -> Volley {
    let mut volley = Volley::new();
    if ctx.tier < pattern.min_tier() {
        return volley;
    }
    let tier = usize::from(ctx.tier);
    let speed = ctx.speed();
    match pattern {
        Pattern::StraightVolley => {
            let n = ctx.count(tier.min(3));
            volley.extend((0..n).map(|i| Projectile {
                pos: ctx.origin + Vec2::new(0.0, centred(i, n) * 20.0),
                vel: Vec2::new(-speed, 0.0),
            }));
        },
        Pattern::FanSpread => {
            let n = ctx.count(3 + tier);
            volley.extend((0..n).map(|i| {
                let angle = centred(i, n) * 0.3;
                Projectile {
                    pos: ctx.origin,
                    vel: Vec2::new(-speed * angle.cos(), speed * angle.sin()),
                }
            }));
        },
        Pattern::Homing => {
            let delta = ctx.target - ctx.origin;
            let dist = delta.length();
            if dist > 5.0 {
                let dir = delta / dist;
                let n = ctx.count(tier);
                volley.extend((0..n).map(|i| {
                    let spread = centred(i, n) * 0.2;
                    Projectile {
                        pos: ctx.origin,
                        vel: (dir + Vec2::splat(spread)) * speed,
                    }
                }));
            }
        },
        Pattern::VerticalBarrage => {
            let n = ctx.count(3 + tier * 2);
            let gap = (ctx.field_height - 60.0) / (n - 1) as f32;
            volley.extend((0..n).map(|i| Projectile {
                pos: Vec2::new(ctx.origin.x, 30.0 + i as f32 * gap),
                vel: Vec2::new(-speed, 0.0),
            }));
        },
        Pattern::Spiral => {
            let arms = ctx.count(tier);
            let radial = 2.0 + f32::from(ctx.tier);
            let spin = ctx.elapsed * 1000.0 * 0.008;
            for j in 0..arms {
                for i in 0..4 {
                    let angle =
                        (spin + i as f32 * TAU / 4.0 + j as f32 * PI / arms as f32).rem_euclid(TAU);
                    volley.push(Projectile {
                        pos: ctx.origin,
                        vel: Vec2::new(-3.0 + angle.cos() * radial, angle.sin() * radial),
                    });
                }
            }
        },
    }
    volley
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(tier: u8, enraged: bool) -> FireContext {
        FireContext {
            origin: Vec2::new(570.0, 240.0),
            target: Vec2::new(70.0, 240.0),
            tier,
            enraged,
            elapsed: 0.0,
            field_height: 480.0,
        }
    }

    #[test]
    fn straight_volley_caps_at_three() {
        assert_eq!(fire(Pattern::StraightVolley, &ctx(1, false)).len(), 1);
        assert_eq!(fire(Pattern::StraightVolley, &ctx(4, false)).len(), 3);
        let v = fire(Pattern::StraightVolley, &ctx(4, false));
        assert!(v.iter().all(|p| p.vel == Vec2::new(-9.0, 0.0)));
        assert_eq!(v[0].pos.y, 220.0);
    }

    #[test]
    fn enraged_doubles_count_and_speeds_up() {
        let calm = fire(Pattern::FanSpread, &ctx(2, false));
        let angry = fire(Pattern::FanSpread, &ctx(2, true));
        assert_eq!(calm.len(), 5);
        assert_eq!(angry.len(), 10);
        let middle = angry.iter().find(|p| p.vel.y == 0.0).unwrap();
        assert_eq!(middle.vel.x, -7.0 * 1.5);
    }

    #[test]
    fn homing_aims_at_the_ship() {
        let v = fire(Pattern::Homing, &ctx(1, false));
        assert_eq!(v.len(), 1);
        assert!(v[0].vel.x < 0.0);
        assert!(v[0].vel.y.abs() < 1e-4);

        let mut on_top = ctx(3, false);
        on_top.target = on_top.origin;
        assert!(fire(Pattern::Homing, &on_top).is_empty());
    }

    #[test]
    fn advanced_patterns_are_tier_gated() {
        assert!(fire(Pattern::VerticalBarrage, &ctx(1, false)).is_empty());
        assert!(fire(Pattern::Spiral, &ctx(2, false)).is_empty());
        let barrage = fire(Pattern::VerticalBarrage, &ctx(2, false));
        assert_eq!(barrage.len(), 7);
        assert_eq!(barrage[0].pos.y, 30.0);
        assert!((barrage[6].pos.y - 450.0).abs() < 1e-3);
        assert_eq!(fire(Pattern::Spiral, &ctx(3, false)).len(), 12);
        assert_eq!(fire(Pattern::Spiral, &ctx(4, true)).len(), 32);
    }

    #[test]
    fn projectiles_leave_the_field() {
        let mut p = Projectile {
            pos: Vec2::new(-45.0, 10.0),
            vel: Vec2::new(-6.0, 0.0),
        };
        assert!(p.on_field(800.0, 480.0, 50.0));
        p.advance();
        assert!(!p.on_field(800.0, 480.0, 50.0));
    }
}
