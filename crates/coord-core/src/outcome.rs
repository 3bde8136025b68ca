//! Outcome -- an append-only terminal record of an agent's attempt at an issue.

use serde::{Deserialize, Serialize};

use crate::enums::OutcomeResult;
use crate::metadata::Metadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub id: String,
    pub issue_id: String,
    pub agent_id: String,
    pub result: OutcomeResult,
    #[serde(default)]
    pub learnings: String,
    #[serde(default)]
    pub metadata: Metadata,
    pub recorded_at: i64,
}
