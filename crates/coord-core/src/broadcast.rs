//! Broadcast -- the append-only event log consumers tail by id.

use serde::{Deserialize, Serialize};

use crate::enums::BroadcastEventType;
use crate::metadata::Metadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Broadcast {
    /// Monotonically increasing; consumers tail the log from the last id
    /// they observed.
    pub id: i64,
    pub event_type: BroadcastEventType,
    pub issue_id: String,
    pub agent_id: String,
    #[serde(default)]
    pub payload: Metadata,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let broadcast = Broadcast {
            id: 1,
            event_type: BroadcastEventType::Claimed,
            issue_id: "iss-1".into(),
            agent_id: "agent-1".into(),
            payload: Metadata::new(),
            created_at: 100,
        };
        let json = serde_json::to_string(&broadcast).unwrap();
        let back: Broadcast = serde_json::from_str(&json).unwrap();
        assert_eq!(back, broadcast);
    }
}
