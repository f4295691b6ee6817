use glam::Vec2;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::entity::{Action, Direction, Facing};
use crate::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotError {
    /// The document has no usable `sprite`; the entity cannot be drawn.
    MissingSprite,
    NonFinitePosition,
    InvalidId(String),
    Malformed(String),
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingSprite => write!(f, "snapshot has no sprite"),
            Self::NonFinitePosition => write!(f, "snapshot position is not finite"),
            Self::InvalidId(id) => write!(f, "invalid entity id: {id:?}"),
            Self::Malformed(e) => write!(f, "malformed snapshot: {e}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Chat bubble attached to a lounge avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub text: String,
    pub timestamp: u64,
}

/// Last published state of an entity, as read back from the shared store.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSnapshot {
    pub id: PlayerId,
    pub sprite: String,
    pub name: String,
    pub position: Vec2,
    pub direction: Direction,
    pub facing: Facing,
    pub action: Action,
    pub frame: u32,
    pub health: Option<i32>,
    pub timestamp_ms: u64,
    pub message: Option<ChatMessage>,
}

/// Wire shape of a snapshot document. Unknown fields are ignored.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotDoc {
    #[serde(default)]
    sprite: Option<String>,
    #[serde(default)]
    name: Option<String>,
    x: f32,
    y: f32,
    #[serde(default)]
    dir: Direction,
    #[serde(default)]
    facing: Facing,
    #[serde(default)]
    action: Action,
    #[serde(default)]
    frame: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    health: Option<i32>,
    #[serde(default)]
    timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    message: Option<ChatMessage>,
}

impl RemoteSnapshot {
    /// Minimal snapshot for a sprite at a position; remaining fields default.
    pub fn new(id: PlayerId, sprite: impl Into<String>, position: Vec2, timestamp_ms: u64) -> Self {
        Self {
            id,
            sprite: sprite.into(),
            name: String::new(),
            position,
            direction: Direction::Front,
            facing: Facing::Right,
            action: Action::Idle,
            frame: 1,
            health: None,
            timestamp_ms,
            message: None,
        }
    }

    pub fn to_document(&self) -> Result<Value, SnapshotError> {
        let doc = SnapshotDoc {
            sprite: Some(self.sprite.clone()),
            name: Some(self.name.clone()),
            x: self.position.x,
            y: self.position.y,
            dir: self.direction,
            facing: self.facing,
            action: self.action,
            frame: self.frame,
            health: self.health,
            timestamp: self.timestamp_ms,
            message: self.message.clone(),
        };
        serde_json::to_value(doc).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }

    /// Decode the document stored under `key`. The key is the entity id.
    pub fn from_document(key: &str, value: &Value) -> Result<Self, SnapshotError> {
        let id: PlayerId = key
            .parse()
            .map_err(|_| SnapshotError::InvalidId(key.to_string()))?;
        let doc: SnapshotDoc = serde_json::from_value(value.clone())
            .map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        let sprite = match doc.sprite {
            Some(s) if !s.trim().is_empty() => s,
            _ => return Err(SnapshotError::MissingSprite),
        };
        if !doc.x.is_finite() || !doc.y.is_finite() {
            return Err(SnapshotError::NonFinitePosition);
        }
        Ok(Self {
            id,
            sprite,
            name: doc.name.unwrap_or_default(),
            position: Vec2::new(doc.x, doc.y),
            direction: doc.dir,
            facing: doc.facing,
            action: doc.action,
            frame: doc.frame,
            health: doc.health,
            timestamp_ms: doc.timestamp,
            message: doc.message,
        })
    }

    /// Decode every child of a collection document, splitting good entries from
    /// malformed ones. Non-object collections decode to nothing.
    pub fn decode_collection(value: &Value) -> (Vec<Self>, Vec<(String, SnapshotError)>) {
        let mut good = Vec::new();
        let mut bad = Vec::new();
        if let Some(map) = value.as_object() {
            for (key, child) in map {
                match Self::from_document(key, child) {
                    Ok(snap) => good.push(snap),
                    Err(e) => bad.push((key.clone(), e)),
                }
            }
        }
        (good, bad)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn document_roundtrip_keeps_fields() {
        let mut snap = RemoteSnapshot::new(42, "shib", Vec2::new(3.5, 7.0), 1_000);
        snap.direction = Direction::Left;
        snap.frame = 4;
        snap.health = Some(80);
        let doc = snap.to_document().unwrap();
        assert_eq!(doc["dir"], "left");
        let back = RemoteSnapshot::from_document("42", &doc).unwrap();
        assert_eq!(back, snap);
    }

    #[test]
    fn missing_sprite_is_rejected() {
        let doc = json!({"x": 1.0, "y": 2.0, "timestamp": 5});
        assert_eq!(
            RemoteSnapshot::from_document("1", &doc),
            Err(SnapshotError::MissingSprite)
        );
        let blank = json!({"sprite": "  ", "x": 1.0, "y": 2.0});
        assert_eq!(
            RemoteSnapshot::from_document("1", &blank),
            Err(SnapshotError::MissingSprite)
        );
    }

    #[test]
    fn wrong_types_are_malformed() {
        let doc = json!({"sprite": "shib", "x": "left", "y": 2.0});
        assert!(matches!(
            RemoteSnapshot::from_document("1", &doc),
            Err(SnapshotError::Malformed(_))
        ));
    }

    #[test]
    fn non_numeric_key_is_invalid_id() {
        let doc = json!({"sprite": "shib", "x": 1.0, "y": 2.0});
        assert!(matches!(
            RemoteSnapshot::from_document("abc", &doc),
            Err(SnapshotError::InvalidId(_))
        ));
    }

    #[test]
    fn collection_splits_good_and_bad() {
        let doc = json!({
            "1": {"sprite": "shib", "x": 1.0, "y": 1.0, "dir": "right", "frame": 3},
            "2": {"x": 1.0, "y": 1.0},
        });
        let (good, bad) = RemoteSnapshot::decode_collection(&doc);
        assert_eq!(good.len(), 1);
        assert_eq!(good[0].direction, Direction::Right);
        assert_eq!(bad.len(), 1);
        assert_eq!(bad[0].0, "2");
    }
}
