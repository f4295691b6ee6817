//! Headless lounge run: simulated participants wander the room over a
//! shared in-memory store while each logs what it sees of the others.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use lounge_core::config::MotionConfig;
use lounge_core::input::{InputEvent, MoveDir};
use lounge_core::net::store::SharedStore;
use lounge_core::player::{Player, PlayerId};
use lounge_core::time::now_millis;

use crate::config::SimConfig;
use crate::memory::MemoryStore;
use crate::session::LoungeSession;
use crate::sync::SyncError;

const SPRITES: [&str; 4] = ["shib", "corgi", "husky", "pug"];
const HEADINGS: [Option<MoveDir>; 5] = [
    None,
    Some(MoveDir::Up),
    Some(MoveDir::Down),
    Some(MoveDir::Left),
    Some(MoveDir::Right),
];

/// End-of-run summary for one simulated participant.
#[derive(Debug, Clone, PartialEq)]
pub struct ParticipantReport {
    pub id: PlayerId,
    pub position: Vec2,
    pub remotes_visible: usize,
    pub joins_seen: usize,
    pub departures_seen: usize,
}

struct Walker {
    session: LoungeSession,
    heading: Option<MoveDir>,
    joins: usize,
    departures: usize,
}

impl Walker {
    fn turn(&mut self, heading: Option<MoveDir>) {
        if let Some(old) = self.heading {
            self.session.handle_input(&InputEvent::release(old));
        }
        if let Some(new) = heading {
            self.session.handle_input(&InputEvent::press(new));
        }
        self.heading = heading;
    }
}

pub async fn run(config: &SimConfig, motion: MotionConfig) -> Result<Vec<ParticipantReport>, SyncError> {
    let store = MemoryStore::new();
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut walkers = Vec::with_capacity(config.participants);

    for i in 0..config.participants {
        let id = i as PlayerId + 1;
        let player = Player::new(id, format!("Sim{id}"), SPRITES[i % SPRITES.len()]);
        let connection: Arc<dyn SharedStore> = Arc::new(store.connect());
        let session = LoungeSession::join(connection, &config.room, player, motion.clone(), now_millis())?;
        walkers.push(Walker {
            session,
            heading: None,
            joins: 0,
            departures: 0,
        });
    }

    let dt = 1.0 / 60.0;
    let mut interval = tokio::time::interval(Duration::from_secs_f32(dt));
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    for tick in 0..config.ticks {
        interval.tick().await;
        let now = now_millis();

        for walker in &mut walkers {
            if config.turn_every > 0 && tick % config.turn_every == 0 {
                let heading = HEADINGS[rng.random_range(0..HEADINGS.len())];
                walker.turn(heading);
            }
            let step = walker.session.tick(dt, now);
            walker.joins += step.joined.len();
            walker.departures += step.departed.len();
            if let Some(near) = step.library_toggled {
                tracing::info!(player_id = walker.session.local().id, near, "Game library zone");
            }
        }

        if config.report_every > 0 && tick % config.report_every == 0 {
            for walker in &walkers {
                let viewer = walker.session.local().id;
                for (id, state) in walker.session.remote_render() {
                    tracing::info!(
                        viewer,
                        remote = id,
                        x = state.position.x,
                        y = state.position.y,
                        direction = state.direction.as_str(),
                        frame = state.frame,
                        "Remote seen"
                    );
                }
            }
        }
    }

    let reports = walkers
        .iter()
        .map(|w| ParticipantReport {
            id: w.session.local().id,
            position: w.session.local_render().position,
            remotes_visible: w.session.roster().len(),
            joins_seen: w.joins,
            departures_seen: w.departures,
        })
        .collect();

    for walker in walkers {
        walker.session.leave().await?;
    }
    Ok(reports)
}
