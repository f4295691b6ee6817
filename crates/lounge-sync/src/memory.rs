//! In-process [`SharedStore`] used by tests and the simulator.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde_json::{Map, Value};

use lounge_core::net::store::{
    CleanupEffect, SharedStore, StoreError, Subscriber, SubscriptionId, split_path,
};

struct Subscription {
    connection: u64,
    path: Vec<String>,
    callback: Subscriber,
}

#[derive(Default)]
struct Tree {
    root: Value,
    subscriptions: BTreeMap<u64, Subscription>,
    cleanups: BTreeMap<u64, Vec<(Vec<String>, CleanupEffect)>>,
    next_subscription: u64,
    next_connection: u64,
}

type Notifications = Vec<(Subscriber, Value)>;

impl Tree {
    fn value_at(&self, path: &[String]) -> Value {
        path.iter()
            .try_fold(&self.root, |node, seg| node.get(seg.as_str()))
            .cloned()
            .unwrap_or(Value::Null)
    }

    fn set(&mut self, path: &[String], value: Value) -> Notifications {
        self.root = set_in(std::mem::take(&mut self.root), path, value);
        self.notifications(path)
    }

    fn merge(&mut self, path: &[String], fields: Value) -> Result<Notifications, StoreError> {
        let Value::Object(fields) = fields else {
            return Err(StoreError::NotAnObject(path.join("/")));
        };
        let mut merged = match self.value_at(path) {
            Value::Null => Map::new(),
            Value::Object(map) => map,
            _ => return Err(StoreError::NotAnObject(path.join("/"))),
        };
        for (key, value) in fields {
            if value.is_null() {
                merged.remove(&key);
            } else {
                merged.insert(key, value);
            }
        }
        Ok(self.set(path, Value::Object(merged)))
    }

    fn notifications(&self, changed: &[String]) -> Notifications {
        self.subscriptions
            .values()
            .filter(|s| s.path.iter().zip(changed).all(|(a, b)| a == b))
            .map(|s| (Arc::clone(&s.callback), self.value_at(&s.path)))
            .collect()
    }
}

/// Replace the value at `path`, pruning objects left empty. `Null` removes.
fn set_in(node: Value, path: &[String], value: Value) -> Value {
    let Some((head, rest)) = path.split_first() else {
        return value;
    };
    let mut map = match node {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let child = map.remove(head).unwrap_or(Value::Null);
    let updated = set_in(child, rest, value);
    let empty = updated.is_null() || updated.as_object().is_some_and(Map::is_empty);
    if !empty {
        map.insert(head.clone(), updated);
    }
    if map.is_empty() {
        Value::Null
    } else {
        Value::Object(map)
    }
}

fn deliver(notifications: Notifications) {
    for (callback, value) in notifications {
        callback(&value);
    }
}

fn segments(path: &str) -> Result<Vec<String>, StoreError> {
    Ok(split_path(path)?.into_iter().map(str::to_string).collect())
}

/// Shared document tree. Each participant talks to it through its own
/// [`MemoryConnection`].
#[derive(Clone, Default)]
pub struct MemoryStore {
    tree: Arc<Mutex<Tree>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connect(&self) -> MemoryConnection {
        let id = {
            let mut tree = lock(&self.tree);
            tree.next_connection += 1;
            tree.next_connection
        };
        MemoryConnection {
            id,
            tree: Arc::clone(&self.tree),
            closed: AtomicBool::new(false),
        }
    }

    /// Current value at `path` (`Null` when absent).
    pub fn get(&self, path: &str) -> Value {
        match segments(path) {
            Ok(segs) => lock(&self.tree).value_at(&segs),
            Err(_) => lock(&self.tree).root.clone(),
        }
    }
}

fn lock(tree: &Mutex<Tree>) -> MutexGuard<'_, Tree> {
    tree.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One participant's connection. Dropping it counts as a disconnect.
pub struct MemoryConnection {
    id: u64,
    tree: Arc<Mutex<Tree>>,
    closed: AtomicBool,
}

impl MemoryConnection {
    pub fn is_connected(&self) -> bool {
        !self.closed.load(Ordering::Acquire)
    }

    /// Close the connection: drop its subscriptions and run its registered
    /// cleanups. Runs at most once.
    pub fn disconnect(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let notifications = {
            let mut tree = lock(&self.tree);
            tree.subscriptions.retain(|_, s| s.connection != self.id);
            let cleanups = tree.cleanups.remove(&self.id).unwrap_or_default();
            let mut notifications = Vec::new();
            for (path, effect) in cleanups {
                let value = match effect {
                    CleanupEffect::Remove => Value::Null,
                    CleanupEffect::Write(value) => value,
                };
                notifications.extend(tree.set(&path, value));
            }
            notifications
        };
        tracing::debug!(connection = self.id, "Store connection closed");
        deliver(notifications);
    }

    fn ensure_open(&self) -> Result<(), StoreError> {
        if self.is_connected() {
            Ok(())
        } else {
            Err(StoreError::Disconnected)
        }
    }
}

impl Drop for MemoryConnection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

impl SharedStore for MemoryConnection {
    fn write(&self, path: &str, value: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        let segs = segments(path)?;
        let notifications = lock(&self.tree).set(&segs, value);
        deliver(notifications);
        Ok(())
    }

    fn merge(&self, path: &str, fields: Value) -> Result<(), StoreError> {
        self.ensure_open()?;
        let segs = segments(path)?;
        let notifications = lock(&self.tree).merge(&segs, fields)?;
        deliver(notifications);
        Ok(())
    }

    fn remove(&self, path: &str) -> Result<(), StoreError> {
        self.write(path, Value::Null)
    }

    fn subscribe(&self, path: &str, callback: Subscriber) -> Result<SubscriptionId, StoreError> {
        self.ensure_open()?;
        let segs = segments(path)?;
        let (id, current) = {
            let mut tree = lock(&self.tree);
            tree.next_subscription += 1;
            let id = tree.next_subscription;
            let current = tree.value_at(&segs);
            tree.subscriptions.insert(
                id,
                Subscription {
                    connection: self.id,
                    path: segs,
                    callback: Arc::clone(&callback),
                },
            );
            (id, current)
        };
        callback(&current);
        Ok(SubscriptionId(id))
    }

    fn unsubscribe(&self, id: SubscriptionId) {
        lock(&self.tree).subscriptions.remove(&id.0);
    }

    fn on_disconnect_cleanup(&self, path: &str, effect: CleanupEffect) -> Result<(), StoreError> {
        self.ensure_open()?;
        let segs = segments(path)?;
        lock(&self.tree)
            .cleanups
            .entry(self.id)
            .or_default()
            .push((segs, effect));
        Ok(())
    }
}
