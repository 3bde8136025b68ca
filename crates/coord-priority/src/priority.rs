//! Scoring of ready issues, critical-path extraction, and bottleneck ranking.

use std::collections::HashSet;
use std::sync::Arc;

use coord_core::{DependencyType, Issue, now_unix};
use coord_storage::Storage;

use crate::error::Result;

/// A ready issue annotated with its priority score and the human-readable
/// reason for it.
#[derive(Debug, Clone)]
pub struct ScoredIssue {
    pub issue: Issue,
    pub score: f64,
    pub reason: String,
}

struct Factor {
    name: &'static str,
    raw: f64,
    weighted: f64,
}

pub struct Priority {
    storage: Arc<dyn Storage>,
}

impl Priority {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    /// Scores up to 100 ready issues and returns the top `limit` by score
    /// descending.
    pub fn get_prioritized(&self, limit: usize) -> Result<Vec<ScoredIssue>> {
        let mut ready = self.storage.get_ready_issues()?;
        ready.truncate(100);

        let now = now_unix();
        let mut scored: Vec<ScoredIssue> = ready
            .into_iter()
            .map(|issue| self.score_issue(issue, now))
            .collect::<Result<Vec<_>>>()?;

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    fn score_issue(&self, issue: Issue, now: i64) -> Result<ScoredIssue> {
        let priority_raw = (4 - issue.priority) as f64 / 4.0;

        let impact_count = self.compute_impact(&issue.id)?;
        let impact_raw = (impact_count.min(5) as f64) / 5.0;

        let age_days = ((now - issue.created_at).max(0) as f64) / 86_400.0;
        let age_raw = age_days.min(7.0) / 7.0;

        let incoming = self.storage.get_dependencies(&issue.id)?.len();
        let outgoing = self.storage.get_dependents(&issue.id)?.len();
        let connectivity_raw = ((incoming + outgoing).min(10) as f64) / 10.0;

        let project_raw = if issue.project_id.is_some() { 0.5 } else { 0.0 };

        let factors = [
            Factor { name: "priority", raw: priority_raw, weighted: priority_raw * 0.30 },
            Factor { name: "impact", raw: impact_raw, weighted: impact_raw * 0.35 },
            Factor { name: "age", raw: age_raw, weighted: age_raw * 0.10 },
            Factor { name: "connectivity", raw: connectivity_raw, weighted: connectivity_raw * 0.15 },
            Factor { name: "project", raw: project_raw, weighted: project_raw * 0.10 },
        ];

        let total: f64 = factors.iter().map(|f| f.weighted).sum();
        let score = (total * 100.0).round() / 100.0;
        let reason = self.build_reason(&factors);

        Ok(ScoredIssue { issue, score, reason })
    }

    fn build_reason(&self, factors: &[Factor]) -> String {
        let mut candidates: Vec<&Factor> = factors.iter().filter(|f| f.raw > 0.3).collect();
        candidates.sort_by(|a, b| b.weighted.partial_cmp(&a.weighted).unwrap_or(std::cmp::Ordering::Equal));
        candidates.truncate(2);

        if candidates.is_empty() {
            "Default priority".to_string()
        } else {
            candidates.iter().map(|f| f.name).collect::<Vec<_>>().join(", ")
        }
    }

    /// Size of the set of non-terminal issues transitively blocked by
    /// `issue_id`, walked via outbound `blocks` edges with a `visited` guard
    /// that short-circuits cycles.
    fn compute_impact(&self, issue_id: &str) -> Result<usize> {
        let mut visited = HashSet::new();
        self.dfs_impact(issue_id, &mut visited)
    }

    fn dfs_impact(&self, issue_id: &str, visited: &mut HashSet<String>) -> Result<usize> {
        if !visited.insert(issue_id.to_string()) {
            return Ok(0);
        }
        let mut count = 0;
        for dep in self.storage.get_dependents(issue_id)?.into_iter().filter(|d| d.dep_type == DependencyType::Blocks) {
            let successor = self.storage.get_issue(&dep.from_id)?;
            if successor.status.is_terminal() {
                continue;
            }
            count += 1;
            count += self.dfs_impact(&dep.from_id, visited)?;
        }
        Ok(count)
    }

    /// The longest chain of non-terminal issues connected by `blocks` edges,
    /// walked from every terminal node of the blocking graph (an issue that
    /// blocks nothing non-terminal) back through its predecessors.
    pub fn get_critical_path(&self) -> Result<Vec<Issue>> {
        let issues = self.storage.list_issues()?;
        let mut best: Vec<Issue> = Vec::new();

        for issue in &issues {
            if issue.status.is_terminal() {
                continue;
            }
            let has_live_successor = self
                .storage
                .get_dependents(&issue.id)?
                .into_iter()
                .filter(|d| d.dep_type == DependencyType::Blocks)
                .map(|d| self.storage.get_issue(&d.from_id))
                .collect::<coord_storage::Result<Vec<_>>>()?
                .into_iter()
                .any(|successor| !successor.status.is_terminal());

            if has_live_successor {
                continue;
            }

            let chain = self.longest_chain_ending_at(issue)?;
            if chain.len() > best.len() {
                best = chain;
            }
        }

        Ok(best)
    }

    fn longest_chain_ending_at(&self, issue: &Issue) -> Result<Vec<Issue>> {
        let mut best: Vec<Issue> = Vec::new();
        for dep in self.storage.get_dependencies(&issue.id)?.into_iter().filter(|d| d.dep_type == DependencyType::Blocks) {
            let blocker = self.storage.get_issue(&dep.to_id)?;
            if blocker.status.is_terminal() {
                continue;
            }
            let chain = self.longest_chain_ending_at(&blocker)?;
            if chain.len() > best.len() {
                best = chain;
            }
        }
        best.push(issue.clone());
        Ok(best)
    }

    /// Non-terminal issues ranked by count of non-terminal issues they
    /// directly block, descending.
    pub fn get_bottlenecks(&self, limit: usize) -> Result<Vec<Issue>> {
        let issues = self.storage.list_issues()?;
        let mut ranked: Vec<(Issue, usize)> = Vec::new();

        for issue in issues {
            if issue.status.is_terminal() {
                continue;
            }
            let mut count = 0;
            for dep in self.storage.get_dependents(&issue.id)?.into_iter().filter(|d| d.dep_type == DependencyType::Blocks) {
                let successor = self.storage.get_issue(&dep.from_id)?;
                if !successor.status.is_terminal() {
                    count += 1;
                }
            }
            ranked.push((issue, count));
        }

        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(limit);
        Ok(ranked.into_iter().map(|(issue, _)| issue).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coord_core::{Dependency, IssueBuilder, IssueStatus};
    use coord_storage::SqliteStore;

    fn test_priority() -> (Priority, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStore::open_in_memory().unwrap());
        (Priority::new(storage.clone()), storage)
    }

    #[test]
    fn higher_impact_scores_above_isolated_issue() {
        let (priority, storage) = test_priority();
        let blocker = IssueBuilder::new("blocker").build("iss-blocker", 100);
        let blocked = IssueBuilder::new("blocked").build("iss-blocked", 100);
        let isolated = IssueBuilder::new("isolated").build("iss-isolated", 100);
        storage.create_issue(&blocker).unwrap();
        storage.create_issue(&blocked).unwrap();
        storage.create_issue(&isolated).unwrap();
        storage.add_dependency(&Dependency::new("iss-blocked", "iss-blocker", DependencyType::Blocks, 100)).unwrap();

        let scored = priority.get_prioritized(10).unwrap();
        let blocker_score = scored.iter().find(|s| s.issue.id == "iss-blocker").unwrap().score;
        let isolated_score = scored.iter().find(|s| s.issue.id == "iss-isolated").unwrap().score;
        assert!(blocker_score > isolated_score);
    }

    #[test]
    fn critical_path_follows_blocker_chain() {
        let (priority, storage) = test_priority();
        for id in ["a", "b", "c"] {
            storage.create_issue(&IssueBuilder::new(id).build(id, 100)).unwrap();
        }
        // a blocks b, b blocks c: c depends on b, b depends on a.
        storage.add_dependency(&Dependency::new("b", "a", DependencyType::Blocks, 100)).unwrap();
        storage.add_dependency(&Dependency::new("c", "b", DependencyType::Blocks, 100)).unwrap();

        let path = priority.get_critical_path().unwrap();
        let ids: Vec<&str> = path.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn bottlenecks_ranked_by_direct_block_count() {
        let (priority, storage) = test_priority();
        for id in ["hub", "leaf-1", "leaf-2", "lonely"] {
            storage.create_issue(&IssueBuilder::new(id).build(id, 100)).unwrap();
        }
        storage.add_dependency(&Dependency::new("leaf-1", "hub", DependencyType::Blocks, 100)).unwrap();
        storage.add_dependency(&Dependency::new("leaf-2", "hub", DependencyType::Blocks, 100)).unwrap();

        let bottlenecks = priority.get_bottlenecks(5).unwrap();
        assert_eq!(bottlenecks[0].id, "hub");
    }

    #[test]
    fn terminal_successor_does_not_block_ready_status() {
        let (priority, storage) = test_priority();
        let blocker = IssueBuilder::new("blocker").build("iss-done", 100);
        storage.create_issue(&blocker).unwrap();
        storage
            .update_issue(
                "iss-done",
                &coord_core::IssueUpdate {
                    status: Some(IssueStatus::Done),
                    ..Default::default()
                },
            )
            .unwrap();

        let scored = priority.get_prioritized(10).unwrap();
        assert!(scored.iter().any(|s| s.issue.id == "iss-done"));
    }
}
