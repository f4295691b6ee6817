//! Sync task and lounge session over the in-memory store.

use std::sync::Arc;
use std::time::Duration;

use glam::Vec2;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use lounge_core::config::MotionConfig;
use lounge_core::input::{InputEvent, MoveDir};
use lounge_core::net::damage::DamageEvent;
use lounge_core::net::snapshot::{RemoteSnapshot, SnapshotError};
use lounge_core::net::store::{SharedStore, damage_path, player_path};
use lounge_core::test_helpers::make_players;
use lounge_sync::config::SimConfig;
use lounge_sync::memory::MemoryStore;
use lounge_sync::session::LoungeSession;
use lounge_sync::sync::{SyncCommand, SyncEvent, spawn_sync_task};

const ROOM: &str = "lounge";

/// Wait for the first event matching `pred`, failing after one second.
async fn wait_for<F>(rx: &mut UnboundedReceiver<SyncEvent>, mut pred: F) -> SyncEvent
where
    F: FnMut(&SyncEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(1);
    loop {
        let event = tokio::time::timeout_at(deadline, rx.recv())
            .await
            .expect("timed out waiting for sync event")
            .expect("sync task closed");
        if pred(&event) {
            return event;
        }
    }
}

#[tokio::test]
async fn published_snapshot_reaches_other_participant() {
    let store = MemoryStore::new();
    let (a_tx, _a_rx, _a) = spawn_sync_task(Arc::new(store.connect()), ROOM, 1).unwrap();
    let (_b_tx, mut b_rx, _b) = spawn_sync_task(Arc::new(store.connect()), ROOM, 2).unwrap();

    let snap = RemoteSnapshot::new(1, "shib", Vec2::new(3.0, 4.0), 1_000);
    a_tx.send(SyncCommand::Publish(snap.clone())).unwrap();

    let event = wait_for(&mut b_rx, |e| matches!(e, SyncEvent::Snapshot(_))).await;
    assert_eq!(event, SyncEvent::Snapshot(snap));
}

#[tokio::test]
async fn own_snapshot_is_not_echoed() {
    let store = MemoryStore::new();
    let (a_tx, mut a_rx, _a) = spawn_sync_task(Arc::new(store.connect()), ROOM, 1).unwrap();
    a_tx.send(SyncCommand::Publish(RemoteSnapshot::new(1, "shib", Vec2::ZERO, 10)))
        .unwrap();
    let outcome = tokio::time::timeout(Duration::from_millis(100), a_rx.recv()).await;
    assert!(outcome.is_err(), "no event expected, got {outcome:?}");
}

#[tokio::test]
async fn disconnect_removes_record_and_reports_departure() {
    let store = MemoryStore::new();
    let a_conn = Arc::new(store.connect());
    let a_shared = Arc::clone(&a_conn);
    let a_store: Arc<dyn SharedStore> = a_shared;
    let (a_tx, _a_rx, _a) = spawn_sync_task(a_store, ROOM, 1).unwrap();
    let (_b_tx, mut b_rx, _b) = spawn_sync_task(Arc::new(store.connect()), ROOM, 2).unwrap();

    a_tx.send(SyncCommand::Publish(RemoteSnapshot::new(1, "shib", Vec2::ONE, 500)))
        .unwrap();
    wait_for(&mut b_rx, |e| matches!(e, SyncEvent::Snapshot(_))).await;

    a_conn.disconnect();
    let event = wait_for(&mut b_rx, |e| matches!(e, SyncEvent::Departed(_))).await;
    assert_eq!(event, SyncEvent::Departed(1));
    assert_eq!(store.get(&player_path(ROOM, 1)), serde_json::Value::Null);
}

#[tokio::test]
async fn damage_is_delivered_once_and_cleared() {
    let store = MemoryStore::new();
    let (_a_tx, mut a_rx, _a) = spawn_sync_task(Arc::new(store.connect()), ROOM, 1).unwrap();
    let (b_tx, _b_rx, _b) = spawn_sync_task(Arc::new(store.connect()), ROOM, 2).unwrap();

    let hit = DamageEvent {
        attacker: 2,
        target: 1,
        attack_seq: 7,
        amount: 10,
    };
    b_tx.send(SyncCommand::Damage(hit)).unwrap();
    b_tx.send(SyncCommand::Damage(hit)).unwrap();

    let event = wait_for(&mut a_rx, |e| matches!(e, SyncEvent::Damage(_))).await;
    assert_eq!(event, SyncEvent::Damage(hit));

    let again = tokio::time::timeout(Duration::from_millis(100), async {
        loop {
            match a_rx.recv().await {
                Some(SyncEvent::Damage(e)) => return e,
                Some(_) => continue,
                None => std::future::pending::<()>().await,
            }
        }
    })
    .await;
    assert!(again.is_err(), "duplicate damage delivered");
    assert_eq!(store.get(&damage_path(ROOM, 1, &hit.key())), serde_json::Value::Null);
}

#[tokio::test]
async fn malformed_record_is_reported_not_materialized() {
    let store = MemoryStore::new();
    let (_b_tx, mut b_rx, _b) = spawn_sync_task(Arc::new(store.connect()), ROOM, 2).unwrap();
    let raw = store.connect();
    raw.write(&player_path(ROOM, 9), json!({"x": 1.0, "y": 2.0})).unwrap();

    let event = wait_for(&mut b_rx, |e| !matches!(e, SyncEvent::Departed(_))).await;
    assert_eq!(
        event,
        SyncEvent::Malformed {
            key: "9".to_string(),
            error: SnapshotError::MissingSprite,
        }
    );
}

#[tokio::test]
async fn lounge_sessions_see_each_other() {
    let store = MemoryStore::new();
    let players = make_players(2);
    let config = MotionConfig::default();
    let mut a = LoungeSession::join(
        Arc::new(store.connect()),
        ROOM,
        players[0].clone(),
        config.clone(),
        1_000,
    )
    .unwrap();
    let mut b = LoungeSession::join(
        Arc::new(store.connect()),
        ROOM,
        players[1].clone(),
        config,
        1_000,
    )
    .unwrap();

    a.handle_input(&InputEvent::press(MoveDir::Down));
    let mut now = 1_000;
    for _ in 0..60 {
        now += 16;
        a.tick(1.0 / 60.0, now);
        b.tick(1.0 / 60.0, now);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    let seen_by_b = b.roster().get(players[0].id).expect("b sees a");
    assert_eq!(seen_by_b.sprite, "shib");
    assert!(a.roster().get(players[1].id).is_some(), "a sees b");
    assert!(a.local_render().position.y > 10.0);

    a.leave().await.unwrap();
    for _ in 0..20 {
        now += 16;
        b.tick(1.0 / 60.0, now);
        tokio::time::sleep(Duration::from_millis(2)).await;
    }
    assert!(b.roster().is_empty());
    b.leave().await.unwrap();
}

#[tokio::test]
async fn short_simulation_runs_to_completion() {
    let config = SimConfig {
        ticks: 30,
        report_every: 10,
        ..SimConfig::default()
    };
    let reports = lounge_sync::sim::run(&config, MotionConfig::default())
        .await
        .unwrap();
    assert_eq!(reports.len(), 2);
    assert!(reports.iter().all(|r| r.remotes_visible == 1));
}
