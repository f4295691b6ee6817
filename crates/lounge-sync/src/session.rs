//! One participant in the lounge: local avatar, remote roster and the sync
//! task that connects them.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use lounge_core::config::MotionConfig;
use lounge_core::input::InputEvent;
use lounge_core::net::snapshot::{ChatMessage, RemoteSnapshot};
use lounge_core::net::store::SharedStore;
use lounge_core::player::{Player, PlayerId};
use lounge_motion::RenderState;
use lounge_motion::free_roam::FreeRoamController;
use lounge_motion::roster::{RemoteRoster, RosterChange};

use crate::room::LoungeRoom;
use crate::sync::{SyncCommand, SyncError, SyncEvent, spawn_sync_task};

/// What changed during one session tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionTick {
    pub moved: bool,
    pub published: bool,
    pub joined: Vec<PlayerId>,
    pub departed: Vec<PlayerId>,
    /// Set when the avatar entered or left the game library zone.
    pub library_toggled: Option<bool>,
}

pub struct LoungeSession {
    local: Player,
    room: LoungeRoom,
    controller: FreeRoamController,
    roster: RemoteRoster,
    message: Option<ChatMessage>,
    near_library: bool,
    commands: mpsc::UnboundedSender<SyncCommand>,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    task: JoinHandle<()>,
}

impl LoungeSession {
    /// Join `room_name` at the room spawn and publish the initial snapshot.
    pub fn join(
        store: Arc<dyn SharedStore>,
        room_name: &str,
        local: Player,
        config: MotionConfig,
        now_ms: u64,
    ) -> Result<Self, SyncError> {
        let (commands, events, task) = spawn_sync_task(store, room_name, local.id)?;
        let room = LoungeRoom::new();
        let controller = FreeRoamController::new(LoungeRoom::spawn(), &config);
        let near_library = room.near_game_library(controller.position());
        let session = Self {
            roster: RemoteRoster::new(Some(local.id), config),
            local,
            room,
            controller,
            message: None,
            near_library,
            commands,
            events,
            task,
        };
        session.publish(session.controller.render_state(), now_ms)?;
        Ok(session)
    }

    pub fn local(&self) -> &Player {
        &self.local
    }

    pub fn roster(&self) -> &RemoteRoster {
        &self.roster
    }

    pub fn near_game_library(&self) -> bool {
        self.near_library
    }

    pub fn handle_input(&mut self, event: &InputEvent) {
        self.controller.handle_input(event);
    }

    /// Attach a chat message to the avatar and publish it right away.
    pub fn say(&mut self, text: impl Into<String>, now_ms: u64) -> Result<(), SyncError> {
        self.message = Some(ChatMessage {
            text: text.into(),
            timestamp: now_ms,
        });
        self.publish(self.controller.render_state(), now_ms)
    }

    /// Drain store events, move the avatar and advance remote mirrors.
    /// Never waits on the network.
    pub fn tick(&mut self, dt: f32, now_ms: u64) -> SessionTick {
        let mut out = SessionTick::default();

        while let Ok(event) = self.events.try_recv() {
            match event {
                SyncEvent::Snapshot(snapshot) => {
                    if self.roster.apply(&snapshot, now_ms) == RosterChange::Joined {
                        out.joined.push(snapshot.id);
                    }
                },
                SyncEvent::Departed(id) => {
                    if self.roster.remove(id) {
                        out.departed.push(id);
                    }
                },
                SyncEvent::Damage(event) => {
                    tracing::debug!(attacker = event.attacker, "Damage ignored in the lounge");
                },
                SyncEvent::Malformed { key, error } => {
                    tracing::debug!(key = %key, error = %error, "Skipping malformed participant");
                },
            }
        }

        let roam = self.controller.tick(self.room.grid(), dt, now_ms);
        out.moved = roam.moved;
        if let Some(state) = roam.publish {
            out.published = self.publish(state, now_ms).is_ok();
        }

        out.departed.extend(self.roster.prune_stale(now_ms));
        self.roster.tick(dt, now_ms);

        let near = self.room.near_game_library(self.controller.position());
        if near != self.near_library {
            self.near_library = near;
            out.library_toggled = Some(near);
        }
        out
    }

    pub fn local_render(&self) -> RenderState {
        self.controller.render_state()
    }

    pub fn remote_render(&self) -> Vec<(PlayerId, RenderState)> {
        self.roster.render()
    }

    /// Remove the local record and wait for the sync task to finish.
    pub async fn leave(self) -> Result<(), SyncError> {
        self.commands
            .send(SyncCommand::Leave)
            .map_err(|_| SyncError::Closed)?;
        if let Err(e) = self.task.await {
            tracing::warn!(error = %e, "Sync task ended abnormally");
            return Err(SyncError::Closed);
        }
        Ok(())
    }

    fn publish(&self, state: RenderState, now_ms: u64) -> Result<(), SyncError> {
        let snapshot = RemoteSnapshot {
            id: self.local.id,
            sprite: self.local.sprite.clone(),
            name: self.local.display_name.clone(),
            position: state.position,
            direction: state.direction,
            facing: state.facing,
            action: state.action,
            frame: state.frame,
            health: None,
            timestamp_ms: now_ms,
            message: self.message.clone(),
        };
        self.commands
            .send(SyncCommand::Publish(snapshot))
            .map_err(|_| SyncError::Closed)
    }
}
