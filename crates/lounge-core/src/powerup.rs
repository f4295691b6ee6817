use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Game-specific timed effect kinds (jetpack, shield, rapid fire).
pub trait PowerUpKind: Clone + Copy + PartialEq + Serialize + DeserializeOwned {
    /// Effect length in seconds. `f32::INFINITY` never expires.
    fn duration(&self) -> f32;
}

/// A timed effect currently held by an entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct ActivePowerUp<K: PowerUpKind> {
    pub kind: K,
    pub remaining: f32,
}

impl<K: PowerUpKind> ActivePowerUp<K> {
    pub fn new(kind: K) -> Self {
        Self {
            remaining: kind.duration(),
            kind,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        if self.remaining.is_finite() {
            self.remaining -= dt;
        }
    }

    /// Picking up the same kind again restarts its timer.
    pub fn refresh(&mut self) {
        self.remaining = self.kind.duration();
    }

    pub fn is_expired(&self) -> bool {
        self.remaining <= 0.0
    }
}

/// Tick every effect and drop the expired ones.
pub fn tick_all<K: PowerUpKind>(effects: &mut Vec<ActivePowerUp<K>>, dt: f32) {
    for effect in effects.iter_mut() {
        effect.tick(dt);
    }
    effects.retain(|e| !e.is_expired());
}

/// Add `kind`, refreshing the timer if it is already active.
pub fn grant<K: PowerUpKind>(effects: &mut Vec<ActivePowerUp<K>>, kind: K) {
    match effects.iter_mut().find(|e| e.kind == kind) {
        Some(existing) => existing.refresh(),
        None => effects.push(ActivePowerUp::new(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    enum Effect {
        Short,
        Forever,
    }

    impl PowerUpKind for Effect {
        fn duration(&self) -> f32 {
            match self {
                Effect::Short => 1.0,
                Effect::Forever => f32::INFINITY,
            }
        }
    }

    #[test]
    fn expired_effects_are_dropped() {
        let mut effects = Vec::new();
        grant(&mut effects, Effect::Short);
        grant(&mut effects, Effect::Forever);
        tick_all(&mut effects, 1.5);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].kind, Effect::Forever);
    }

    #[test]
    fn regrant_refreshes_instead_of_stacking() {
        let mut effects = Vec::new();
        grant(&mut effects, Effect::Short);
        tick_all(&mut effects, 0.75);
        grant(&mut effects, Effect::Short);
        assert_eq!(effects.len(), 1);
        assert_eq!(effects[0].remaining, 1.0);
    }
}
