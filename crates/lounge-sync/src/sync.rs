//! Network-sync task: the only owner of the store connection.
//!
//! Motion and game code talk to it through channels. Store callbacks
//! forward raw documents into the task, which decodes them into
//! [`SyncEvent`]s; outbound [`SyncCommand`]s become store writes.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lounge_core::net::damage::DamageEvent;
use lounge_core::net::snapshot::{RemoteSnapshot, SnapshotError};
use lounge_core::net::store::{
    CleanupEffect, SharedStore, StoreError, Subscriber, SubscriptionId, damage_inbox_path,
    damage_path, player_path, players_path,
};
use lounge_core::player::PlayerId;

/// Commands sent from the session to the sync task.
#[derive(Debug)]
pub enum SyncCommand {
    /// Overwrite the local participant's snapshot document.
    Publish(RemoteSnapshot),
    /// Write a damage event into the victim's inbox.
    Damage(DamageEvent),
    /// Remove the local record, then stop.
    Leave,
    Stop,
}

/// Decoded changes from the shared store.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncEvent {
    Snapshot(RemoteSnapshot),
    Departed(PlayerId),
    /// Damage addressed to the local participant.
    Damage(DamageEvent),
    Malformed {
        key: String,
        error: SnapshotError,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum SyncError {
    Store(StoreError),
    Snapshot(SnapshotError),
    /// The sync task has exited.
    Closed,
}

impl std::fmt::Display for SyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store error: {e}"),
            Self::Snapshot(e) => write!(f, "snapshot error: {e}"),
            Self::Closed => write!(f, "sync task is not running"),
        }
    }
}

impl std::error::Error for SyncError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Store(e) => Some(e),
            Self::Snapshot(e) => Some(e),
            Self::Closed => None,
        }
    }
}

impl From<StoreError> for SyncError {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<SnapshotError> for SyncError {
    fn from(e: SnapshotError) -> Self {
        Self::Snapshot(e)
    }
}

#[derive(Debug)]
enum Inbound {
    Players(Value),
    Inbox(Value),
}

pub type SyncHandles = (
    mpsc::UnboundedSender<SyncCommand>,
    mpsc::UnboundedReceiver<SyncEvent>,
    JoinHandle<()>,
);

/// Join `room` as `local_id` and spawn the sync task.
///
/// Registers removal of the local record (and its damage inbox) as a
/// disconnect cleanup before subscribing. Must be called inside a tokio
/// runtime.
pub fn spawn_sync_task(
    store: Arc<dyn SharedStore>,
    room: &str,
    local_id: PlayerId,
) -> Result<SyncHandles, SyncError> {
    store.on_disconnect_cleanup(&player_path(room, local_id), CleanupEffect::Remove)?;
    store.on_disconnect_cleanup(&damage_inbox_path(room, local_id), CleanupEffect::Remove)?;

    let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
    let players_tx = inbound_tx.clone();
    let on_players: Subscriber = Arc::new(move |v: &Value| {
        let _ = players_tx.send(Inbound::Players(v.clone()));
    });
    let on_inbox: Subscriber = Arc::new(move |v: &Value| {
        let _ = inbound_tx.send(Inbound::Inbox(v.clone()));
    });
    let players_sub = store.subscribe(&players_path(room), on_players)?;
    let inbox_sub = match store.subscribe(&damage_inbox_path(room, local_id), on_inbox) {
        Ok(id) => id,
        Err(e) => {
            store.unsubscribe(players_sub);
            return Err(e.into());
        },
    };

    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let task = SyncTask {
        store,
        room: room.to_string(),
        local_id,
        subscriptions: [players_sub, inbox_sub],
        known: BTreeMap::new(),
        seen_damage: BTreeSet::new(),
        reported: BTreeSet::new(),
        events: event_tx,
    };
    tracing::info!(room, player_id = local_id, "Joined room");
    let handle = tokio::spawn(task.run(cmd_rx, inbound_rx));
    Ok((cmd_tx, event_rx, handle))
}

struct SyncTask {
    store: Arc<dyn SharedStore>,
    room: String,
    local_id: PlayerId,
    subscriptions: [SubscriptionId; 2],
    /// Newest timestamp forwarded per remote participant.
    known: BTreeMap<PlayerId, u64>,
    /// Inbox keys already delivered and still present in the store.
    seen_damage: BTreeSet<String>,
    /// Malformed entries already reported, until they change or vanish.
    reported: BTreeSet<String>,
    events: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncTask {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<SyncCommand>,
        mut inbound_rx: mpsc::UnboundedReceiver<Inbound>,
    ) {
        loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(SyncCommand::Publish(snapshot)) => self.publish(&snapshot),
                    Some(SyncCommand::Damage(event)) => self.send_damage(&event),
                    Some(SyncCommand::Leave) => {
                        if let Err(e) = self.store.remove(&player_path(&self.room, self.local_id)) {
                            tracing::warn!(error = %e, "Failed to remove own record");
                        }
                        break;
                    },
                    Some(SyncCommand::Stop) | None => break,
                },
                inbound = inbound_rx.recv() => match inbound {
                    Some(Inbound::Players(value)) => self.on_players(&value),
                    Some(Inbound::Inbox(value)) => self.on_inbox(&value),
                    None => break,
                },
            }
        }
        for id in self.subscriptions {
            self.store.unsubscribe(id);
        }
        tracing::info!(room = %self.room, player_id = self.local_id, "Sync task stopped");
    }

    fn publish(&self, snapshot: &RemoteSnapshot) {
        if snapshot.id != self.local_id {
            tracing::debug!(player_id = snapshot.id, "Refusing to publish a foreign record");
            return;
        }
        let result = snapshot
            .to_document()
            .map_err(SyncError::from)
            .and_then(|doc| {
                self.store
                    .write(&player_path(&self.room, snapshot.id), doc)
                    .map_err(SyncError::from)
            });
        if let Err(e) = result {
            tracing::warn!(player_id = snapshot.id, error = %e, "Publish failed");
        }
    }

    fn send_damage(&self, event: &DamageEvent) {
        let path = damage_path(&self.room, event.target, &event.key());
        let result = event
            .to_document()
            .map_err(SyncError::from)
            .and_then(|doc| self.store.write(&path, doc).map_err(SyncError::from));
        match result {
            Ok(()) => tracing::debug!(target_id = event.target, key = %event.key(), "Damage sent"),
            Err(e) => tracing::warn!(target_id = event.target, error = %e, "Damage write failed"),
        }
    }

    fn on_players(&mut self, value: &Value) {
        let present: BTreeSet<PlayerId> = value
            .as_object()
            .map(|m| m.keys().filter_map(|k| k.parse().ok()).collect())
            .unwrap_or_default();

        let (snapshots, errors) = RemoteSnapshot::decode_collection(value);
        let bad: BTreeSet<String> = errors.iter().map(|(k, _)| k.clone()).collect();
        self.reported.retain(|k| bad.contains(k));
        for (key, error) in errors {
            if key == self.local_id.to_string() || self.reported.contains(&key) {
                continue;
            }
            tracing::debug!(key = %key, error = %error, "Dropped malformed snapshot");
            self.reported.insert(key.clone());
            self.emit(SyncEvent::Malformed { key, error });
        }
        for snapshot in snapshots {
            if snapshot.id == self.local_id {
                continue;
            }
            let newer = self
                .known
                .get(&snapshot.id)
                .is_none_or(|&ts| snapshot.timestamp_ms > ts);
            if newer {
                self.known.insert(snapshot.id, snapshot.timestamp_ms);
                self.emit(SyncEvent::Snapshot(snapshot));
            }
        }

        let departed: Vec<PlayerId> = self
            .known
            .keys()
            .copied()
            .filter(|id| !present.contains(id))
            .collect();
        for id in departed {
            self.known.remove(&id);
            tracing::info!(player_id = id, "Participant departed");
            self.emit(SyncEvent::Departed(id));
        }
    }

    fn on_inbox(&mut self, value: &Value) {
        let Some(entries) = value.as_object() else {
            self.seen_damage.clear();
            return;
        };
        // Keys whose removal has been observed can no longer be redelivered.
        self.seen_damage.retain(|k| entries.contains_key(k));
        for (key, doc) in entries {
            if self.seen_damage.insert(key.clone()) {
                self.accept_damage(key, doc);
            }
            let path = damage_path(&self.room, self.local_id, key);
            if let Err(e) = self.store.remove(&path) {
                tracing::warn!(error = %e, "Failed to clear damage inbox entry");
            }
        }
    }

    fn accept_damage(&self, key: &str, doc: &Value) {
        match DamageEvent::from_document(doc) {
            Ok(event) if event.target == self.local_id => self.emit(SyncEvent::Damage(event)),
            Ok(event) => {
                tracing::debug!(key = %key, target_id = event.target, "Misaddressed damage ignored");
            },
            Err(error) => {
                tracing::debug!(key = %key, error = %error, "Dropped malformed damage event");
            },
        }
    }

    fn emit(&self, event: SyncEvent) {
        // The session may already be gone; nothing to do then.
        let _ = self.events.send(event);
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::memory::MemoryStore;

    const ROOM: &str = "lounge";

    fn task(store: &MemoryStore) -> (SyncTask, mpsc::UnboundedReceiver<SyncEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let task = SyncTask {
            store: Arc::new(store.connect()),
            room: ROOM.to_string(),
            local_id: 1,
            subscriptions: [SubscriptionId(0), SubscriptionId(1)],
            known: BTreeMap::new(),
            seen_damage: BTreeSet::new(),
            reported: BTreeSet::new(),
            events,
        };
        (task, rx)
    }

    fn hit(seq: u32) -> DamageEvent {
        DamageEvent {
            attacker: 2,
            target: 1,
            attack_seq: seq,
            amount: 10,
        }
    }

    fn inbox(hits: &[DamageEvent]) -> Value {
        let mut map = serde_json::Map::new();
        for h in hits {
            map.insert(h.key(), h.to_document().unwrap());
        }
        Value::Object(map)
    }

    #[test]
    fn repeated_inbox_value_is_delivered_once() {
        let store = MemoryStore::new();
        let (mut task, mut rx) = task(&store);
        let value = inbox(&[hit(1)]);
        task.on_inbox(&value);
        task.on_inbox(&value);
        assert_eq!(rx.try_recv().unwrap(), SyncEvent::Damage(hit(1)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn cleared_inbox_forgets_consumed_keys() {
        let store = MemoryStore::new();
        let (mut task, _rx) = task(&store);
        for seq in 0..50 {
            task.on_inbox(&inbox(&[hit(seq)]));
            task.on_inbox(&Value::Null);
        }
        assert!(task.seen_damage.is_empty());
    }

    #[test]
    fn only_keys_still_pending_are_remembered() {
        let store = MemoryStore::new();
        let (mut task, mut rx) = task(&store);
        task.on_inbox(&inbox(&[hit(1), hit(2)]));
        task.on_inbox(&inbox(&[hit(2), hit(3)]));
        let keys: Vec<&str> = task.seen_damage.iter().map(String::as_str).collect();
        assert_eq!(keys, ["2-2", "2-3"]);

        let mut delivered = Vec::new();
        while let Ok(SyncEvent::Damage(e)) = rx.try_recv() {
            delivered.push(e.attack_seq);
        }
        assert_eq!(delivered, [1, 2, 3]);
    }

    #[test]
    fn non_object_inbox_is_ignored() {
        let store = MemoryStore::new();
        let (mut task, mut rx) = task(&store);
        task.on_inbox(&json!(5));
        assert!(rx.try_recv().is_err());
        assert!(task.seen_damage.is_empty());
    }
}
