//! Collection of remote entities, keyed by participant id.

use std::collections::BTreeMap;

use lounge_core::config::MotionConfig;
use lounge_core::net::snapshot::RemoteSnapshot;
use lounge_core::player::PlayerId;
use lounge_core::time::is_stale;

use crate::RenderState;
use crate::remote::RemoteInterpolator;

/// How long a chat bubble stays up after it first appears.
pub const CHAT_BUBBLE_TTL_MS: u64 = 4_000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatBubble {
    pub text: String,
    /// Sender-side timestamp; identifies the message.
    pub timestamp: u64,
    pub shown_at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct RemoteEntity {
    pub id: PlayerId,
    pub sprite: String,
    pub name: String,
    pub health: Option<i32>,
    pub bubble: Option<ChatBubble>,
    pub motion: RemoteInterpolator,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterChange {
    Joined,
    Updated,
    /// Own echo, stale on arrival, or older than what we hold.
    Ignored,
}

/// Remote entities currently rendered.
///
/// Staleness is judged from the payload timestamp only; an entity silent for
/// longer than `stale_after` is dropped by [`RemoteRoster::prune_stale`].
#[derive(Debug, Clone)]
pub struct RemoteRoster {
    local_id: Option<PlayerId>,
    entities: BTreeMap<PlayerId, RemoteEntity>,
    config: MotionConfig,
    stale_after_ms: u64,
}

impl RemoteRoster {
    pub fn new(local_id: Option<PlayerId>, config: MotionConfig) -> Self {
        Self {
            local_id,
            stale_after_ms: config.stale_after_ms(),
            entities: BTreeMap::new(),
            config,
        }
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn get(&self, id: PlayerId) -> Option<&RemoteEntity> {
        self.entities.get(&id)
    }

    pub fn ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.entities.keys().copied()
    }

    pub fn apply(&mut self, snapshot: &RemoteSnapshot, now_ms: u64) -> RosterChange {
        if Some(snapshot.id) == self.local_id {
            return RosterChange::Ignored;
        }
        if is_stale(now_ms, snapshot.timestamp_ms, self.stale_after_ms) {
            return RosterChange::Ignored;
        }

        let change = match self.entities.get_mut(&snapshot.id) {
            Some(entity) => {
                if snapshot.timestamp_ms < entity.motion.last_timestamp_ms() {
                    return RosterChange::Ignored;
                }
                entity.motion.push(snapshot);
                entity.sprite.clone_from(&snapshot.sprite);
                entity.name.clone_from(&snapshot.name);
                entity.health = snapshot.health;
                RosterChange::Updated
            },
            None => {
                tracing::info!(player_id = snapshot.id, sprite = %snapshot.sprite, "Remote entity joined");
                self.entities.insert(
                    snapshot.id,
                    RemoteEntity {
                        id: snapshot.id,
                        sprite: snapshot.sprite.clone(),
                        name: snapshot.name.clone(),
                        health: snapshot.health,
                        bubble: None,
                        motion: RemoteInterpolator::new(snapshot, &self.config),
                    },
                );
                RosterChange::Joined
            },
        };

        if let Some(message) = &snapshot.message
            && let Some(entity) = self.entities.get_mut(&snapshot.id)
        {
            let is_new = entity
                .bubble
                .as_ref()
                .is_none_or(|b| b.timestamp != message.timestamp);
            if is_new && now_ms.saturating_sub(message.timestamp) < CHAT_BUBBLE_TTL_MS {
                entity.bubble = Some(ChatBubble {
                    text: message.text.clone(),
                    timestamp: message.timestamp,
                    shown_at_ms: now_ms,
                });
            }
        }

        change
    }

    pub fn remove(&mut self, id: PlayerId) -> bool {
        let removed = self.entities.remove(&id).is_some();
        if removed {
            tracing::info!(player_id = id, "Remote entity removed");
        }
        removed
    }

    /// Drop entities whose newest snapshot is older than the threshold.
    pub fn prune_stale(&mut self, now_ms: u64) -> Vec<PlayerId> {
        let threshold = self.stale_after_ms;
        let stale: Vec<PlayerId> = self
            .entities
            .values()
            .filter(|e| is_stale(now_ms, e.motion.last_timestamp_ms(), threshold))
            .map(|e| e.id)
            .collect();
        for id in &stale {
            self.entities.remove(id);
            tracing::info!(player_id = id, "Remote entity went stale");
        }
        stale
    }

    /// Advance every interpolator and expire chat bubbles.
    pub fn tick(&mut self, dt: f32, now_ms: u64) {
        for entity in self.entities.values_mut() {
            entity.motion.tick(dt);
            if entity
                .bubble
                .as_ref()
                .is_some_and(|b| now_ms.saturating_sub(b.shown_at_ms) >= CHAT_BUBBLE_TTL_MS)
            {
                entity.bubble = None;
            }
        }
    }

    pub fn render(&self) -> Vec<(PlayerId, RenderState)> {
        self.entities
            .values()
            .map(|e| (e.id, e.motion.render()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;
    use lounge_core::net::snapshot::ChatMessage;

    use super::*;

    fn snap(id: PlayerId, x: f32, ts: u64) -> RemoteSnapshot {
        RemoteSnapshot::new(id, "shib", Vec2::new(x, 4.0), ts)
    }

    fn roster() -> RemoteRoster {
        RemoteRoster::new(Some(1), MotionConfig::default())
    }

    #[test]
    fn own_echo_is_ignored() {
        let mut r = roster();
        assert_eq!(r.apply(&snap(1, 0.0, 100), 100), RosterChange::Ignored);
        assert!(r.is_empty());
    }

    #[test]
    fn silent_entity_is_pruned_after_threshold() {
        let mut r = roster();
        assert_eq!(r.apply(&snap(2, 0.0, 1_000), 1_000), RosterChange::Joined);
        assert!(r.prune_stale(6_000).is_empty());
        assert_eq!(r.prune_stale(6_001), vec![2]);
        assert!(r.is_empty());
    }

    #[test]
    fn fresh_snapshot_keeps_entity_alive() {
        let mut r = roster();
        r.apply(&snap(2, 0.0, 1_000), 1_000);
        assert_eq!(r.apply(&snap(2, 1.0, 5_000), 5_000), RosterChange::Updated);
        assert!(r.prune_stale(9_000).is_empty());
    }

    #[test]
    fn stale_on_arrival_is_not_materialized() {
        let mut r = roster();
        assert_eq!(r.apply(&snap(3, 0.0, 1_000), 7_000), RosterChange::Ignored);
        assert!(r.get(3).is_none());
    }

    #[test]
    fn older_snapshot_does_not_regress() {
        let mut r = roster();
        r.apply(&snap(2, 0.0, 2_000), 2_000);
        assert_eq!(r.apply(&snap(2, 5.0, 1_500), 2_100), RosterChange::Ignored);
        assert_eq!(r.get(2).map(|e| e.motion.last_timestamp_ms()), Some(2_000));
    }

    #[test]
    fn duplicate_snapshot_is_idempotent() {
        let mut r = roster();
        let s = snap(2, 0.0, 2_000);
        r.apply(&s, 2_000);
        r.apply(&s, 2_010);
        assert_eq!(r.len(), 1);
        assert_eq!(r.get(2).map(|e| e.motion.pending()), Some(0));
    }

    #[test]
    fn chat_bubble_shows_once_and_expires() {
        let mut r = roster();
        let mut s = snap(2, 0.0, 1_000);
        s.message = Some(ChatMessage {
            text: "hi".into(),
            timestamp: 1_000,
        });
        r.apply(&s, 1_000);
        assert_eq!(r.get(2).and_then(|e| e.bubble.as_ref()).map(|b| b.text.as_str()), Some("hi"));

        // Re-delivery of the same message does not restart the bubble.
        s.timestamp_ms = 2_000;
        r.apply(&s, 2_000);
        assert_eq!(r.get(2).and_then(|e| e.bubble.as_ref()).map(|b| b.shown_at_ms), Some(1_000));

        r.tick(0.016, 5_000);
        assert!(r.get(2).and_then(|e| e.bubble.as_ref()).is_none());
    }
}
