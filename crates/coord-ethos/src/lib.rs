//! Ethos -- the self-monitoring loop. Samples six health ratios on a
//! caller-driven cadence and opens remediation projects when a ratio
//! crosses its configured threshold.

pub mod error;

use std::sync::Arc;

use tracing::{info, warn};

use coord_claims::Claims;
use coord_config::EthosThresholds;
use coord_core::{Agent, HealthSnapshot, Issue, IssueStatus, Metadata, OutcomeResult, Project, ProjectCreate, ProjectStatus, now_unix};
use coord_storage::Storage;
use coord_tracker::Tracker;

pub use error::{EthosError, Result};

/// A single threshold breach detected by [`Ethos::check_violations`].
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub metric: &'static str,
    pub operator: &'static str,
    pub threshold: f64,
    pub actual: f64,
    pub action_tag: &'static str,
}

/// Per-metric movement classification produced by [`Ethos::get_health_trend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Improving,
    Stable,
    Degrading,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HealthTrend {
    pub coherence: Direction,
    pub velocity: Direction,
    pub blockage: Direction,
    pub staleness: Direction,
    pub claim_health: Direction,
    pub agent_health: Direction,
    pub overall: Direction,
}

/// Output of a single [`Ethos::run_cycle`] pass.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub reclaimed: Vec<Issue>,
    pub dead_agents: Vec<Agent>,
    pub snapshot: HealthSnapshot,
    pub violations: Vec<Violation>,
    pub remediations: Vec<Project>,
}

pub struct Ethos {
    storage: Arc<dyn Storage>,
    tracker: Arc<Tracker>,
    claims: Arc<Claims>,
    thresholds: EthosThresholds,
}

impl Ethos {
    pub fn new(storage: Arc<dyn Storage>, tracker: Arc<Tracker>, claims: Arc<Claims>, thresholds: EthosThresholds) -> Self {
        Self { storage, tracker, claims, thresholds }
    }

    /// Computes the six ratios from a single store read and persists them.
    pub fn assess_health(&self) -> Result<HealthSnapshot> {
        let snapshot = self.compute_metrics()?;
        self.storage.insert_health_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    fn compute_metrics(&self) -> Result<HealthSnapshot> {
        let now = now_unix();
        let issues = self.storage.list_issues()?;
        let non_terminal: Vec<&Issue> = issues.iter().filter(|i| !i.status.is_terminal()).collect();

        let coherence = if non_terminal.is_empty() {
            1.0
        } else {
            non_terminal.iter().filter(|i| i.project_id.is_some()).count() as f64 / non_terminal.len() as f64
        };

        let mut successes_24h = 0usize;
        for issue in &issues {
            for outcome in self.storage.list_outcomes(&issue.id)? {
                if outcome.result == OutcomeResult::Success && now - outcome.recorded_at <= 86_400 {
                    successes_24h += 1;
                }
            }
        }
        let velocity = successes_24h as f64 / 24.0;

        let open_ish = non_terminal.iter().filter(|i| matches!(i.status, IssueStatus::Open | IssueStatus::InProgress | IssueStatus::Blocked)).count();
        let blocked_count = non_terminal.iter().filter(|i| i.status == IssueStatus::Blocked).count();
        let blockage = if open_ish == 0 { 0.0 } else { blocked_count as f64 / open_ish as f64 };

        let staleness = if non_terminal.is_empty() {
            0.0
        } else {
            non_terminal.iter().map(|i| (now - i.created_at).max(0) as f64).sum::<f64>() / non_terminal.len() as f64
        };

        let active_claims = self.storage.list_active_claims()?.len();
        let claim_health = if non_terminal.is_empty() {
            1.0
        } else {
            (active_claims as f64 / non_terminal.len() as f64).min(1.0)
        };

        let agents = self.storage.list_agents()?;
        let agent_health = if agents.is_empty() {
            1.0
        } else {
            agents.iter().filter(|a| a.status == coord_core::AgentStatus::Active).count() as f64 / agents.len() as f64
        };

        Ok(HealthSnapshot {
            coherence,
            velocity,
            blockage,
            staleness,
            claim_health,
            agent_health,
            recorded_at: now,
        })
    }

    /// Evaluates the current snapshot against the configured thresholds.
    pub fn check_violations(&self) -> Result<Vec<Violation>> {
        let snapshot = self.compute_metrics()?;
        let mut violations = Vec::new();

        if snapshot.coherence < self.thresholds.coherence_min {
            violations.push(Violation {
                metric: "coherence",
                operator: "min",
                threshold: self.thresholds.coherence_min,
                actual: snapshot.coherence,
                action_tag: "create-linking-project",
            });
        }
        if snapshot.blockage > self.thresholds.blockage_max {
            violations.push(Violation {
                metric: "blockage",
                operator: "max",
                threshold: self.thresholds.blockage_max,
                actual: snapshot.blockage,
                action_tag: "prioritize-blockers",
            });
        }
        if snapshot.staleness > self.thresholds.staleness_secs {
            violations.push(Violation {
                metric: "staleness",
                operator: "max",
                threshold: self.thresholds.staleness_secs,
                actual: snapshot.staleness,
                action_tag: "prune-or-revive",
            });
        }
        if snapshot.claim_health < self.thresholds.claim_health_min {
            violations.push(Violation {
                metric: "claimHealth",
                operator: "min",
                threshold: self.thresholds.claim_health_min,
                actual: snapshot.claim_health,
                action_tag: "rebalance-work",
            });
        }
        if snapshot.agent_health < self.thresholds.agent_health_min {
            violations.push(Violation {
                metric: "agentHealth",
                operator: "min",
                threshold: self.thresholds.agent_health_min,
                actual: snapshot.agent_health,
                action_tag: "alert-agent-failures",
            });
        }

        Ok(violations)
    }

    fn action_triple(action_tag: &str) -> (&'static str, &'static str, &'static str) {
        match action_tag {
            "create-linking-project" => (
                "Link orphaned issues to a project",
                "Coherence has dropped below threshold: too many non-terminal issues lack a project.",
                "All non-terminal issues are attached to a project.",
            ),
            "prioritize-blockers" => (
                "Unblock the dependency graph",
                "Blockage has risen above threshold: a large share of open work is blocked.",
                "Blockage ratio returns under threshold.",
            ),
            "prune-or-revive" => (
                "Prune or revive stale issues",
                "Mean issue age has exceeded the staleness threshold.",
                "Stale issues are either closed or actively worked.",
            ),
            "rebalance-work" => (
                "Rebalance claimed work",
                "Claim health has dropped below threshold: too little non-terminal work is actively claimed.",
                "Claim health returns above threshold.",
            ),
            "alert-agent-failures" => (
                "Investigate agent attrition",
                "Agent health has dropped below threshold: too many registered agents are dead.",
                "Agent health returns above threshold.",
            ),
            other => (other, other, other),
        }
    }

    /// Opens at most one active remediation project per action tag. Skips a
    /// violation if an active project already carries `remediationFor` for
    /// that metric.
    pub fn respond_to_violations(&self, violations: &[Violation]) -> Result<Vec<Project>> {
        let existing = self.tracker.list_projects()?;
        let mut created = Vec::new();

        for violation in violations {
            let already_remediating = existing.iter().any(|p| {
                p.status == ProjectStatus::Active
                    && p.metadata.0.get("remediationFor").and_then(|v| v.as_str()) == Some(violation.metric)
            });
            if already_remediating {
                continue;
            }

            let (name, description, success_criteria) = Self::action_triple(violation.action_tag);
            let mut metadata = Metadata::new();
            metadata.0.insert("remediationFor".to_string(), serde_json::Value::String(violation.metric.to_string()));
            metadata.0.insert("autoGenerated".to_string(), serde_json::Value::Bool(true));
            metadata.0.insert(
                "violation".to_string(),
                serde_json::json!({
                    "metric": violation.metric,
                    "operator": violation.operator,
                    "threshold": violation.threshold,
                    "actual": violation.actual,
                    "actionTag": violation.action_tag,
                }),
            );

            let project = self
                .tracker
                .create_project(ProjectCreate::new(name, description, success_criteria).with_metadata(metadata))?;
            warn!(metric = violation.metric, project_id = %project.id, "opened remediation project");
            created.push(project);
        }

        Ok(created)
    }

    pub fn get_health_history(&self, hours_window: f64) -> Result<Vec<HealthSnapshot>> {
        let since = now_unix() - (hours_window * 3600.0) as i64;
        Ok(self.storage.list_health_snapshots_since(since)?)
    }

    /// Compares the first and last snapshot over `hours_window` (default 4h)
    /// against a 10%-change threshold and majority-votes the overall trend.
    pub fn get_health_trend(&self, hours_window: Option<f64>) -> Result<Option<HealthTrend>> {
        let history = self.get_health_history(hours_window.unwrap_or(4.0))?;
        let (Some(first), Some(last)) = (history.first(), history.last()) else {
            return Ok(None);
        };
        if std::ptr::eq(first, last) {
            return Ok(None);
        }

        let higher_is_good = |before: f64, after: f64| Self::classify(before, after, true);
        let lower_is_good = |before: f64, after: f64| Self::classify(before, after, false);

        let coherence = higher_is_good(first.coherence, last.coherence);
        let velocity = higher_is_good(first.velocity, last.velocity);
        let blockage = lower_is_good(first.blockage, last.blockage);
        let staleness = lower_is_good(first.staleness, last.staleness);
        let claim_health = higher_is_good(first.claim_health, last.claim_health);
        let agent_health = higher_is_good(first.agent_health, last.agent_health);

        let directions = [coherence, velocity, blockage, staleness, claim_health, agent_health];
        let improving = directions.iter().filter(|d| **d == Direction::Improving).count();
        let degrading = directions.iter().filter(|d| **d == Direction::Degrading).count();
        let overall = if improving >= 3 {
            Direction::Improving
        } else if degrading >= 3 {
            Direction::Degrading
        } else {
            Direction::Stable
        };

        Ok(Some(HealthTrend {
            coherence,
            velocity,
            blockage,
            staleness,
            claim_health,
            agent_health,
            overall,
        }))
    }

    fn classify(before: f64, after: f64, higher_is_good: bool) -> Direction {
        if before.abs() < f64::EPSILON {
            return if after > before { Direction::Improving } else { Direction::Stable };
        }
        let change = (after - before) / before.abs();
        let improved = if higher_is_good { change > 0.10 } else { change < -0.10 };
        let worsened = if higher_is_good { change < -0.10 } else { change > 0.10 };
        if improved {
            Direction::Improving
        } else if worsened {
            Direction::Degrading
        } else {
            Direction::Stable
        }
    }

    /// Housekeeping, a fresh assessment, and remediation -- the cadence an
    /// embedder drives on its own timer.
    pub fn run_cycle(&self) -> Result<CycleReport> {
        let reclaimed = self.claims.reclaim_expired()?;
        let dead_agents = self.claims.detect_dead_agents(None)?;
        let snapshot = self.assess_health()?;
        let violations = self.check_violations()?;
        let remediations = self.respond_to_violations(&violations)?;

        info!(violation_count = violations.len(), remediation_count = remediations.len(), "ethos cycle complete");

        Ok(CycleReport {
            reclaimed,
            dead_agents,
            snapshot,
            violations,
            remediations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coord_core::IssueBuilder;
    use coord_storage::SqliteStore;

    fn test_ethos() -> (Ethos, Arc<dyn Storage>) {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStore::open_in_memory().unwrap());
        let config = coord_config::CoordinatorConfig::default();
        let tracker = Arc::new(Tracker::new(storage.clone()));
        let claims = Arc::new(Claims::new(storage.clone(), &config));
        (Ethos::new(storage.clone(), tracker, claims, config.ethos_thresholds.clone()), storage)
    }

    #[test]
    fn empty_store_reports_healthy_defaults() {
        let (ethos, _storage) = test_ethos();
        let snapshot = ethos.assess_health().unwrap();
        assert_eq!(snapshot.coherence, 1.0);
        assert_eq!(snapshot.blockage, 0.0);
        assert_eq!(snapshot.claim_health, 1.0);
        assert_eq!(snapshot.agent_health, 1.0);
    }

    #[test]
    fn low_coherence_triggers_violation_and_remediation_project() {
        let (ethos, storage) = test_ethos();
        for i in 0..5 {
            let issue = IssueBuilder::new(format!("orphan {i}")).build(format!("iss-{i}"), 100);
            storage.create_issue(&issue).unwrap();
        }

        let violations = ethos.check_violations().unwrap();
        assert!(violations.iter().any(|v| v.metric == "coherence"));

        let remediations = ethos.respond_to_violations(&violations).unwrap();
        assert_eq!(remediations.len(), violations.len());
        assert!(remediations.iter().any(|p| p.metadata.0.get("remediationFor").and_then(|v| v.as_str()) == Some("coherence")));
    }

    #[test]
    fn remediation_is_not_duplicated_while_active() {
        let (ethos, storage) = test_ethos();
        for i in 0..5 {
            let issue = IssueBuilder::new(format!("orphan {i}")).build(format!("iss-{i}"), 100);
            storage.create_issue(&issue).unwrap();
        }

        let violations = ethos.check_violations().unwrap();
        let first = ethos.respond_to_violations(&violations).unwrap();
        let second = ethos.respond_to_violations(&violations).unwrap();

        assert!(!first.is_empty());
        assert!(second.is_empty());
    }

    #[test]
    fn health_trend_requires_at_least_two_snapshots() {
        let (ethos, _storage) = test_ethos();
        ethos.assess_health().unwrap();
        assert!(ethos.get_health_trend(Some(4.0)).unwrap().is_none());
    }
}
