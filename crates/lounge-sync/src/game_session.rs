//! One participant in a networked game round: the local game, the sync task
//! and the publish policy between them.
//!
//! Remote snapshots are mirrored into the game, damage the game reports is
//! written to the victim's inbox, and damage addressed to the local
//! participant is handed back to the game.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lounge_core::config::MotionConfig;
use lounge_core::game_trait::{ArcadeGame, GameConfig, GameEvent};
use lounge_core::input::InputEvent;
use lounge_core::net::snapshot::RemoteSnapshot;
use lounge_core::net::store::SharedStore;
use lounge_core::player::{Player, PlayerId};
use lounge_core::time::is_stale;
use lounge_motion::publish::{PublishKey, PublishThrottle};

use crate::sync::{SyncCommand, SyncError, SyncEvent, spawn_sync_task};

/// Game positions are whole pixels on the wire.
const POSITION_QUANTUM: f32 = 1.0;

/// What happened during one game session tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameTick {
    pub events: Vec<GameEvent>,
    pub published: bool,
    pub damage_sent: usize,
    pub joined: Vec<PlayerId>,
    pub departed: Vec<PlayerId>,
}

pub struct GameSession<G: ArcadeGame> {
    game: G,
    local: Player,
    throttle: PublishThrottle,
    stale_after_ms: u64,
    /// Newest snapshot timestamp per remote participant.
    last_seen: BTreeMap<PlayerId, u64>,
    commands: mpsc::UnboundedSender<SyncCommand>,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    task: JoinHandle<()>,
}

impl<G: ArcadeGame> GameSession<G> {
    /// Start `game` for `local`, join `room_name` and publish the opening
    /// snapshot.
    pub fn join(
        store: Arc<dyn SharedStore>,
        room_name: &str,
        mut game: G,
        local: Player,
        round: &GameConfig,
        motion: &MotionConfig,
        now_ms: u64,
    ) -> Result<Self, SyncError> {
        game.init(&local, round);
        let (commands, events, task) = spawn_sync_task(store, room_name, local.id)?;
        let mut session = Self {
            game,
            local,
            throttle: PublishThrottle::new(motion.publish_interval),
            stale_after_ms: motion.stale_after_ms(),
            last_seen: BTreeMap::new(),
            commands,
            events,
            task,
        };
        if let Some(snapshot) = session.game.local_snapshot(now_ms) {
            session.throttle.record(now_ms, publish_key(&snapshot));
            session.send(SyncCommand::Publish(snapshot))?;
        }
        Ok(session)
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn local(&self) -> &Player {
        &self.local
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        self.game.handle_input(event);
    }

    /// Apply store events, advance the game, then forward its damage and
    /// publish its state. Never waits on the network.
    pub fn tick(&mut self, dt: f32, now_ms: u64) -> GameTick {
        let mut out = GameTick::default();
        self.drain_sync_events(&mut out);
        self.prune_stale(now_ms, &mut out);

        out.events = self.game.update(dt);
        let mut died = false;
        for event in &out.events {
            match event {
                GameEvent::Damage(hit) => {
                    if self.send(SyncCommand::Damage(*hit)).is_ok() {
                        out.damage_sent += 1;
                    }
                },
                GameEvent::GameOver { player_id, .. } if *player_id == self.local.id => {
                    died = true;
                },
                _ => {},
            }
        }

        if let Some(snapshot) = self.game.local_snapshot(now_ms) {
            let key = publish_key(&snapshot);
            // A death, or a quiet stretch that would make peers drop us, goes
            // out regardless of the throttle.
            let quiet = self
                .throttle
                .last_sent_ms()
                .is_some_and(|last| is_stale(now_ms, last, self.stale_after_ms / 2));
            let publish = if died || quiet {
                self.throttle.record(now_ms, key);
                true
            } else {
                self.throttle.should_publish(now_ms, key)
            };
            if publish {
                out.published = self.send(SyncCommand::Publish(snapshot)).is_ok();
            }
        }
        out
    }

    /// Remove the local record and wait for the sync task to finish.
    pub async fn leave(self) -> Result<(), SyncError> {
        self.send(SyncCommand::Leave)?;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Sync task ended abnormally");
            return Err(SyncError::Closed);
        }
        Ok(())
    }

    fn drain_sync_events(&mut self, out: &mut GameTick) {
        while let Ok(event) = self.events.try_recv() {
            match event {
                SyncEvent::Snapshot(snapshot) => {
                    if self.last_seen.insert(snapshot.id, snapshot.timestamp_ms).is_none() {
                        out.joined.push(snapshot.id);
                    }
                    self.game.apply_remote(&snapshot);
                },
                SyncEvent::Departed(id) => {
                    if self.last_seen.remove(&id).is_some() {
                        self.game.remove_remote(id);
                        out.departed.push(id);
                    }
                },
                SyncEvent::Damage(hit) => {
                    tracing::debug!(attacker = hit.attacker, amount = hit.amount, "Damage received");
                    self.game.apply_damage(&hit);
                },
                SyncEvent::Malformed { key, error } => {
                    tracing::debug!(key = %key, error = %error, "Skipping malformed participant");
                },
            }
        }
    }

    fn prune_stale(&mut self, now_ms: u64, out: &mut GameTick) {
        let stale: Vec<PlayerId> = self
            .last_seen
            .iter()
            .filter(|&(_, &ts)| is_stale(now_ms, ts, self.stale_after_ms))
            .map(|(&id, _)| id)
            .collect();
        for id in stale {
            self.last_seen.remove(&id);
            tracing::info!(player_id = id, "Participant went stale");
            self.game.remove_remote(id);
            out.departed.push(id);
        }
    }

    fn send(&self, command: SyncCommand) -> Result<(), SyncError> {
        self.commands.send(command).map_err(|_| SyncError::Closed)
    }
}

fn publish_key(snapshot: &RemoteSnapshot) -> PublishKey {
    PublishKey::new(
        snapshot.position,
        POSITION_QUANTUM,
        snapshot.direction,
        snapshot.facing,
        snapshot.action,
        snapshot.frame,
    )
}
