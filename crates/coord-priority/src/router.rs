//! Capability-matched assignment on top of [`crate::priority::Priority`]'s
//! ranking.

use std::collections::HashMap;
use std::sync::Arc;

use coord_core::{Agent, AgentStatus, Issue, now_unix};
use coord_claims::Claims;
use coord_storage::Storage;

use crate::error::Result;
use crate::priority::Priority;

/// Per-agent workload summary.
#[derive(Debug, Clone, PartialEq)]
pub struct WorkloadEntry {
    pub agent_id: String,
    pub claim_count: usize,
    pub recent_completions: usize,
}

pub struct Router {
    storage: Arc<dyn Storage>,
    priority: Priority,
    claims: Arc<Claims>,
}

impl Router {
    pub fn new(storage: Arc<dyn Storage>, claims: Arc<Claims>) -> Self {
        Self {
            priority: Priority::new(storage.clone()),
            storage,
            claims,
        }
    }

    /// Picks the next issue for `agent_id`, gated by current workload and
    /// capability overlap. Falls back to the top-ranked issue regardless of
    /// capability when nothing matches.
    pub fn get_next_for(
        &self,
        agent_id: &str,
        max_concurrent: usize,
        prefer_labels: &[String],
    ) -> Result<Option<Issue>> {
        if self.claims.get_agent_claims(agent_id)?.len() >= max_concurrent {
            return Ok(None);
        }

        let agent = self.storage.get_agent(agent_id)?;
        let ranked = self.priority.get_prioritized(50)?;

        let mut first_capability_matched: Option<&Issue> = None;
        for scored in &ranked {
            let issue = &scored.issue;
            let capability_gate_open = issue.labels.is_empty()
                || agent.capabilities.is_empty()
                || issue.labels.intersection(&agent.capabilities).next().is_some();
            if !capability_gate_open {
                continue;
            }

            if first_capability_matched.is_none() {
                first_capability_matched = Some(issue);
            }

            if !prefer_labels.is_empty() && issue.labels.iter().any(|l| prefer_labels.contains(l)) {
                return Ok(Some(issue.clone()));
            }
        }

        if let Some(issue) = first_capability_matched {
            return Ok(Some(issue.clone()));
        }

        Ok(ranked.into_iter().next().map(|s| s.issue))
    }

    /// Scores every active agent for `issue_id` and returns the top scorer.
    pub fn get_best_agent_for(&self, issue_id: &str) -> Result<Option<Agent>> {
        let issue = self.storage.get_issue(issue_id)?;
        let now = now_unix();

        let mut best: Option<(Agent, f64)> = None;
        for agent in self.storage.list_agents()? {
            if agent.status != AgentStatus::Active {
                continue;
            }
            let score = self.score_agent_for_issue(&agent, &issue, now)?;
            if best.as_ref().map(|(_, s)| score > *s).unwrap_or(true) {
                best = Some((agent, score));
            }
        }

        Ok(best.map(|(agent, _)| agent))
    }

    fn score_agent_for_issue(&self, agent: &Agent, issue: &Issue, now: i64) -> Result<f64> {
        let label_count = issue.labels.len().max(1);
        let capability_match = (issue.labels.intersection(&agent.capabilities).count() as f64) / label_count as f64;

        let claim_count = self.claims.get_agent_claims(&agent.agent_id)?.len();
        let workload = 1.0 / (1.0 + claim_count as f64);

        let minutes_since_seen = ((now - agent.last_seen_at).max(0) as f64) / 60.0;
        let recency = 1.0 / (1.0 + minutes_since_seen);

        let experience_count = self.count_relevant_successes(&agent.agent_id, issue)?;
        let experience = (experience_count.min(5) as f64) / 5.0;

        Ok(capability_match * 0.30 + workload * 0.30 + recency * 0.20 + experience * 0.20)
    }

    /// Prior successful outcomes recorded by `agent_id` on issues sharing at
    /// least one label with `issue`.
    fn count_relevant_successes(&self, agent_id: &str, issue: &Issue) -> Result<usize> {
        let mut count = 0;
        for other in self.storage.list_issues()? {
            if other.labels.intersection(&issue.labels).next().is_none() {
                continue;
            }
            for outcome in self.storage.list_outcomes(&other.id)? {
                if outcome.agent_id == agent_id && outcome.result == coord_core::OutcomeResult::Success {
                    count += 1;
                }
            }
        }
        Ok(count)
    }

    /// Attempts a claim for the best-scoring agent on each of the top
    /// `limit` prioritized issues. Returns the pairs that actually won.
    pub fn auto_assign(&self, limit: usize) -> Result<Vec<(Issue, Agent)>> {
        let ranked = self.priority.get_prioritized(limit)?;
        let mut assigned = Vec::new();

        for scored in ranked {
            let Some(agent) = self.get_best_agent_for(&scored.issue.id)? else {
                continue;
            };
            if self.claims.claim(&scored.issue.id, &agent.agent_id, None)? {
                assigned.push((scored.issue, agent));
            }
        }

        Ok(assigned)
    }

    /// Claim count and outcomes-in-the-last-hour per active agent.
    pub fn get_workload_distribution(&self) -> Result<Vec<WorkloadEntry>> {
        let now = now_unix();
        let mut per_agent: HashMap<String, usize> = HashMap::new();
        for issue in self.storage.list_issues()? {
            for outcome in self.storage.list_outcomes(&issue.id)? {
                if now - outcome.recorded_at <= 3600 {
                    *per_agent.entry(outcome.agent_id.clone()).or_insert(0) += 1;
                }
            }
        }

        let mut entries = Vec::new();
        for agent in self.storage.list_agents()? {
            if agent.status != AgentStatus::Active {
                continue;
            }
            let claim_count = self.claims.get_agent_claims(&agent.agent_id)?.len();
            let recent_completions = per_agent.get(&agent.agent_id).copied().unwrap_or(0);
            entries.push(WorkloadEntry {
                agent_id: agent.agent_id,
                claim_count,
                recent_completions,
            });
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coord_core::{IssueBuilder, Metadata};
    use coord_storage::SqliteStore;

    fn test_router() -> (Router, Arc<dyn Storage>, Arc<Claims>) {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = coord_config::CoordinatorConfig::default();
        let claims = Arc::new(Claims::new(storage.clone(), &config));
        (Router::new(storage.clone(), claims.clone()), storage, claims)
    }

    #[test]
    fn capability_gate_skips_mismatched_issue() {
        let (router, storage, claims) = test_router();
        claims.register_agent("agent-a", ["rust".to_string()], Metadata::new()).unwrap();

        let matching = IssueBuilder::new("rust work").label("rust").build("iss-match", 100);
        let mismatched = IssueBuilder::new("go work").label("go").priority(0).build("iss-mismatch", 100);
        storage.create_issue(&mismatched).unwrap();
        storage.create_issue(&matching).unwrap();

        let next = router.get_next_for("agent-a", 1, &[]).unwrap().unwrap();
        assert_eq!(next.id, "iss-match");
    }

    #[test]
    fn falls_back_to_top_issue_when_no_capability_match() {
        let (router, storage, claims) = test_router();
        claims.register_agent("agent-a", ["rust".to_string()], Metadata::new()).unwrap();
        let issue = IssueBuilder::new("go work").label("go").build("iss-only", 100);
        storage.create_issue(&issue).unwrap();

        let next = router.get_next_for("agent-a", 1, &[]).unwrap().unwrap();
        assert_eq!(next.id, "iss-only");
    }

    #[test]
    fn busy_agent_at_capacity_gets_nothing() {
        let (router, storage, claims) = test_router();
        claims.register_agent("agent-a", [], Metadata::new()).unwrap();
        let issue = IssueBuilder::new("x").build("iss-1", 100);
        storage.create_issue(&issue).unwrap();
        claims.claim("iss-1", "agent-a", None).unwrap();

        let other = IssueBuilder::new("y").build("iss-2", 100);
        storage.create_issue(&other).unwrap();

        assert!(router.get_next_for("agent-a", 1, &[]).unwrap().is_none());
    }

    #[test]
    fn best_agent_prefers_capability_match() {
        let (router, storage, claims) = test_router();
        claims.register_agent("agent-rust", ["rust".to_string()], Metadata::new()).unwrap();
        claims.register_agent("agent-other", ["go".to_string()], Metadata::new()).unwrap();
        let issue = IssueBuilder::new("rust work").label("rust").build("iss-1", 100);
        storage.create_issue(&issue).unwrap();

        let best = router.get_best_agent_for("iss-1").unwrap().unwrap();
        assert_eq!(best.agent_id, "agent-rust");
    }
}
