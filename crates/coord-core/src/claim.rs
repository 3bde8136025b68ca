//! Claim -- an exclusive lease on an issue.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Primary key: at most one live claim exists per issue.
    pub issue_id: String,
    pub agent_id: String,
    pub claimed_at: i64,
    /// Absolute unix-second expiry. `None` means the claim never expires.
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub heartbeat_at: i64,
}

impl Claim {
    pub fn is_expired(&self, now: i64) -> bool {
        matches!(self.expires_at, Some(expiry) if expiry <= now)
    }
}
