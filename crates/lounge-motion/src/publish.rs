use glam::Vec2;

use lounge_core::entity::{Action, Direction, Facing};

/// Composite change key for a published state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublishKey {
    qx: i32,
    qy: i32,
    direction: Direction,
    facing: Facing,
    action: Action,
    frame: u32,
}

impl PublishKey {
    /// Position is snapped to multiples of `quantum` so float jitter below it
    /// does not count as a change.
    pub fn new(
        position: Vec2,
        quantum: f32,
        direction: Direction,
        facing: Facing,
        action: Action,
        frame: u32,
    ) -> Self {
        let q = if quantum > 0.0 { quantum } else { 1.0 };
        Self {
            qx: (position.x / q).round() as i32,
            qy: (position.y / q).round() as i32,
            direction,
            facing,
            action,
            frame,
        }
    }
}

/// Rate-limits publishes and suppresses unchanged states.
#[derive(Debug, Clone)]
pub struct PublishThrottle {
    interval_ms: u64,
    last_sent_ms: Option<u64>,
    last_key: Option<PublishKey>,
}

impl PublishThrottle {
    pub fn new(interval_secs: f32) -> Self {
        Self {
            interval_ms: (interval_secs.max(0.0) * 1000.0) as u64,
            last_sent_ms: None,
            last_key: None,
        }
    }

    /// Publish only if the key changed and more than the interval has passed
    /// since the last publish.
    pub fn should_publish(&mut self, now_ms: u64, key: PublishKey) -> bool {
        if self.last_key == Some(key) {
            return false;
        }
        if let Some(last) = self.last_sent_ms
            && now_ms.saturating_sub(last) <= self.interval_ms
        {
            return false;
        }
        self.record(now_ms, key);
        true
    }

    /// Idle-cycle publishes are already paced by the idle clock, so only the
    /// change rule applies.
    pub fn should_publish_idle(&mut self, now_ms: u64, key: PublishKey) -> bool {
        if self.last_key == Some(key) {
            return false;
        }
        self.record(now_ms, key);
        true
    }

    /// Record an out-of-band publish (death, respawn) so the next regular
    /// publish compares against it.
    pub fn record(&mut self, now_ms: u64, key: PublishKey) {
        self.last_sent_ms = Some(now_ms);
        self.last_key = Some(key);
    }

    pub fn last_sent_ms(&self) -> Option<u64> {
        self.last_sent_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: f32, frame: u32) -> PublishKey {
        PublishKey::new(
            Vec2::new(x, 0.0),
            0.1,
            Direction::Right,
            Facing::Right,
            Action::Move,
            frame,
        )
    }

    #[test]
    fn first_publish_always_goes_out() {
        let mut throttle = PublishThrottle::new(0.12);
        assert!(throttle.should_publish(0, key(1.0, 1)));
    }

    #[test]
    fn publishes_are_rate_limited() {
        let mut throttle = PublishThrottle::new(0.12);
        assert!(throttle.should_publish(1_000, key(1.0, 1)));
        assert!(!throttle.should_publish(1_060, key(1.1, 2)));
        assert!(!throttle.should_publish(1_120, key(1.2, 3)));
        assert!(throttle.should_publish(1_121, key(1.3, 4)));
    }

    #[test]
    fn unchanged_key_is_suppressed() {
        let mut throttle = PublishThrottle::new(0.12);
        assert!(throttle.should_publish(0, key(1.0, 1)));
        assert!(!throttle.should_publish(5_000, key(1.0, 1)));
        assert!(!throttle.should_publish(5_000, key(1.04, 1)));
    }

    #[test]
    fn idle_publish_ignores_interval_but_not_key() {
        let mut throttle = PublishThrottle::new(0.12);
        assert!(throttle.should_publish(0, key(1.0, 1)));
        assert!(throttle.should_publish_idle(10, key(1.0, 2)));
        assert!(!throttle.should_publish_idle(20, key(1.0, 2)));
    }
}
