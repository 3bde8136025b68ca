//! HealthSnapshot -- a periodic sample of Ethos's six metrics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// Fraction of non-terminal issues attached to a project. `[0, 1]`.
    pub coherence: f64,
    /// Successful outcomes per hour over the last 24h. `>= 0`.
    pub velocity: f64,
    /// Fraction of non-terminal issues that are blocked. `[0, 1]`.
    pub blockage: f64,
    /// Mean age in seconds of non-terminal issues. `>= 0`.
    pub staleness: f64,
    /// `min(active_claims / non_terminal_issues, 1)`. `[0, 1]`.
    pub claim_health: f64,
    /// `active_agents / registered_agents`. `[0, 1]`.
    pub agent_health: f64,
    pub recorded_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let snapshot = HealthSnapshot {
            coherence: 1.0,
            velocity: 0.5,
            blockage: 0.0,
            staleness: 120.0,
            claim_health: 1.0,
            agent_health: 1.0,
            recorded_at: 100,
        };
        let json = serde_json::to_string(&snapshot).unwrap();
        let back: HealthSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(back, snapshot);
    }
}
