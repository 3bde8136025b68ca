//! Agent -- a worker in the swarm, identified by a caller-chosen id.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::AgentStatus;
use crate::metadata::Metadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub agent_id: String,
    #[serde(default)]
    pub capabilities: BTreeSet<String>,
    pub status: AgentStatus,
    pub last_seen_at: i64,
    #[serde(default)]
    pub metadata: Metadata,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let agent = Agent {
            agent_id: "agent-1".into(),
            capabilities: BTreeSet::from(["io".to_string()]),
            status: AgentStatus::Active,
            last_seen_at: 100,
            metadata: Metadata::new(),
        };
        let json = serde_json::to_string(&agent).unwrap();
        let back: Agent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, agent);
    }
}
