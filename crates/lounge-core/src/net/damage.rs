use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::player::PlayerId;

use super::snapshot::SnapshotError;

/// One attack instance landing on `target`, written by the attacker and
/// applied by the target's owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DamageEvent {
    pub attacker: PlayerId,
    pub target: PlayerId,
    /// Per-attacker counter; `(attacker, attack_seq)` names the attack.
    pub attack_seq: u32,
    pub amount: i32,
}

impl DamageEvent {
    /// Child key under the target's damage inbox.
    pub fn key(&self) -> String {
        format!("{}-{}", self.attacker, self.attack_seq)
    }

    pub fn to_document(&self) -> Result<Value, SnapshotError> {
        serde_json::to_value(self).map_err(|e| SnapshotError::Malformed(e.to_string()))
    }

    pub fn from_document(value: &Value) -> Result<Self, SnapshotError> {
        let event: DamageEvent = serde_json::from_value(value.clone())
            .map_err(|e| SnapshotError::Malformed(e.to_string()))?;
        if event.amount < 0 {
            return Err(SnapshotError::Malformed(format!(
                "negative damage amount {}",
                event.amount
            )));
        }
        Ok(event)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_combines_attacker_and_seq() {
        let ev = DamageEvent {
            attacker: 7,
            target: 2,
            attack_seq: 11,
            amount: 10,
        };
        assert_eq!(ev.key(), "7-11");
        let doc = ev.to_document().unwrap();
        assert_eq!(DamageEvent::from_document(&doc).unwrap(), ev);
    }

    #[test]
    fn negative_amounts_are_rejected() {
        let doc = serde_json::json!({"attacker": 1, "target": 2, "attack_seq": 0, "amount": -5});
        assert!(DamageEvent::from_document(&doc).is_err());
    }
}
