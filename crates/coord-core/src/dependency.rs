//! Dependency edges -- directed relationships between issues.

use serde::{Deserialize, Serialize};

use crate::enums::DependencyType;

/// A directed edge from one issue to another.
///
/// The primary key is the triple `(from_id, to_id, type)`: unlike a simple
/// issue-graph edge, the same pair of issues may be connected by more than
/// one relationship type at once (e.g. both `blocks` and `informs`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub from_id: String,
    pub to_id: String,
    #[serde(rename = "type")]
    pub dep_type: DependencyType,
    pub created_at: i64,
}

impl Dependency {
    pub fn new(from_id: impl Into<String>, to_id: impl Into<String>, dep_type: DependencyType, created_at: i64) -> Self {
        Self {
            from_id: from_id.into(),
            to_id: to_id.into(),
            dep_type,
            created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let dep = Dependency::new("iss-a", "iss-b", DependencyType::Blocks, 1_700_000_000);
        let json = serde_json::to_string(&dep).unwrap();
        assert!(json.contains(r#""type":"blocks""#));
        let back: Dependency = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dep);
    }
}
