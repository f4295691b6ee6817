use std::sync::Arc;

use serde_json::Value;

use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The connection was closed; further writes are refused.
    Disconnected,
    InvalidPath(String),
    /// `merge` targeted a value that is not an object.
    NotAnObject(String),
    Transport(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "store connection closed"),
            Self::InvalidPath(p) => write!(f, "invalid store path: {p:?}"),
            Self::NotAnObject(p) => write!(f, "cannot merge into non-object at {p:?}"),
            Self::Transport(e) => write!(f, "store transport error: {e}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Callback receiving the full value at a subscribed path (`Null` when absent).
pub type Subscriber = Arc<dyn Fn(&Value) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Write the store performs on the server side when this connection drops.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanupEffect {
    Remove,
    Write(Value),
}

/// Realtime key-value store shared by all participants.
///
/// Paths are `/`-separated. Writes are fire-and-forget: an `Ok` means the
/// write was accepted locally, not that peers have seen it. Subscribers get
/// the current value immediately and again after every change under the path.
pub trait SharedStore: Send + Sync {
    fn write(&self, path: &str, value: Value) -> Result<(), StoreError>;

    /// Shallow-merge the fields of an object into the value at `path`.
    fn merge(&self, path: &str, fields: Value) -> Result<(), StoreError>;

    fn remove(&self, path: &str) -> Result<(), StoreError>;

    fn subscribe(&self, path: &str, callback: Subscriber) -> Result<SubscriptionId, StoreError>;

    fn unsubscribe(&self, id: SubscriptionId);

    /// Register an effect that runs exactly once when this connection drops.
    fn on_disconnect_cleanup(&self, path: &str, effect: CleanupEffect) -> Result<(), StoreError>;
}

/// Collection holding one snapshot document per participant.
pub fn players_path(room: &str) -> String {
    format!("{room}/players")
}

pub fn player_path(room: &str, id: PlayerId) -> String {
    format!("{room}/players/{id}")
}

/// Damage inbox of one participant.
pub fn damage_inbox_path(room: &str, target: PlayerId) -> String {
    format!("{room}/damage/{target}")
}

pub fn damage_path(room: &str, target: PlayerId, key: &str) -> String {
    format!("{room}/damage/{target}/{key}")
}

/// Split a path into non-empty segments, rejecting empty paths.
pub fn split_path(path: &str) -> Result<Vec<&str>, StoreError> {
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_nest_under_room() {
        assert_eq!(player_path("lounge", 3), "lounge/players/3");
        assert_eq!(damage_path("dino-fight", 2, "7-1"), "dino-fight/damage/2/7-1");
    }

    #[test]
    fn split_path_ignores_extra_slashes() {
        assert_eq!(split_path("/a//b/").unwrap(), vec!["a", "b"]);
        assert!(split_path("//").is_err());
    }
}
