//! The coordination engine facade -- a single entry point wiring storage to
//! the tracker, claims, priority/router, and ethos components.
//!
//! No CLI, no wire protocol, no environment variables live here: this crate
//! is a library for embedders to link directly.

pub mod error;

use std::path::Path;
use std::sync::Arc;

pub use error::{CoordinatorError, Result};

// Re-exported so embedders can `use coord::*` for the whole surface rather
// than depending on every component crate individually.
pub use coord_claims::{Claims, ClaimsError};
pub use coord_config::{CoordinatorConfig, EthosThresholds};
pub use coord_core::{
    Agent, AgentStatus, Broadcast, BroadcastEventType, Claim, Dependency, DependencyType, HealthSnapshot, Issue,
    IssueBuilder, IssueStatus, IssueUpdate, Metadata, Outcome, OutcomeResult, Project, ProjectCreate, ProjectStatus,
    ProjectUpdate,
};
pub use coord_ethos::{CycleReport, Direction, Ethos, EthosError, HealthTrend, Violation};
pub use coord_priority::{Priority, PriorityError, Router, ScoredIssue, WorkloadEntry};
pub use coord_storage::{BlockedIssue, SqliteStore, Storage, StorageError};
pub use coord_tracker::{Tracker, TrackerError};

/// The outcome of a [`Coordinator::get_next_work`] call.
#[derive(Debug, Clone)]
pub struct NextWork {
    pub issue: Issue,
    pub claimed: bool,
}

/// Wires every component crate to one shared storage handle.
///
/// Sub-components are public fields: embedders needing finer-grained
/// control than `get_next_work`/`complete_work`/`run_health_check` can reach
/// past them directly.
pub struct Coordinator {
    pub storage: Arc<dyn Storage>,
    pub tracker: Arc<Tracker>,
    pub claims: Arc<Claims>,
    pub priority: Priority,
    pub router: Router,
    pub ethos: Ethos,
    config: CoordinatorConfig,
}

impl Coordinator {
    /// Opens (or creates) a SQLite-backed coordinator at `path` with
    /// `config`. The store's constructor runs schema bootstrap, so there is
    /// no separate setup step.
    pub fn open(path: impl AsRef<Path>, config: CoordinatorConfig) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStore::open(path)?);
        Ok(Self::from_storage(storage, config))
    }

    /// An in-memory coordinator, for tests and short-lived embedders.
    pub fn open_in_memory(config: CoordinatorConfig) -> Result<Self> {
        let storage: Arc<dyn Storage> = Arc::new(SqliteStore::open_in_memory()?);
        Ok(Self::from_storage(storage, config))
    }

    fn from_storage(storage: Arc<dyn Storage>, config: CoordinatorConfig) -> Self {
        let tracker = Arc::new(Tracker::new(storage.clone()));
        let claims = Arc::new(Claims::new(storage.clone(), &config));
        let priority = Priority::new(storage.clone());
        let router = Router::new(storage.clone(), claims.clone());
        let ethos = Ethos::new(storage.clone(), tracker.clone(), claims.clone(), config.ethos_thresholds.clone());

        Self {
            storage,
            tracker,
            claims,
            priority,
            router,
            ethos,
            config,
        }
    }

    /// Idempotent schema bootstrap. A no-op beyond construction: opening the
    /// store already ran it.
    pub fn initialize(&self) -> Result<()> {
        Ok(())
    }

    pub fn config(&self) -> &CoordinatorConfig {
        &self.config
    }

    /// Registers/heartbeats `agent_id`, asks the router for its next issue,
    /// and attempts to claim it. Returns `None` if no issue is available;
    /// otherwise the issue paired with whether the claim was actually won
    /// (a race with another caller can lose it).
    pub fn get_next_work(&self, agent_id: &str, capabilities: impl IntoIterator<Item = String>) -> Result<Option<NextWork>> {
        self.claims.register_agent(agent_id, capabilities, Metadata::new())?;
        self.claims.heartbeat(agent_id)?;

        let Some(issue) = self.router.get_next_for(agent_id, 1, &[])? else {
            return Ok(None);
        };

        let claimed = self.claims.claim(&issue.id, agent_id, None)?;
        Ok(Some(NextWork { issue, claimed }))
    }

    /// Records the outcome, then unconditionally releases the claim -- in
    /// that order, so a `success` outcome's terminal status isn't reverted
    /// to `open` by the release. Returns the ids of issues this one
    /// directly blocks, for the caller's observability.
    pub fn complete_work(
        &self,
        issue_id: &str,
        agent_id: &str,
        result: OutcomeResult,
        learnings: impl Into<String>,
    ) -> Result<Vec<String>> {
        self.tracker.record_outcome(issue_id, agent_id, result, learnings)?;
        self.claims.release(issue_id, agent_id)?;

        let blocked_targets = self
            .storage
            .get_dependents(issue_id)?
            .into_iter()
            .filter(|d| d.dep_type == coord_core::DependencyType::Blocks)
            .map(|d| d.from_id)
            .collect();
        Ok(blocked_targets)
    }

    /// Runs the full housekeeping-assess-remediate cycle: reclaims expired
    /// claims, marks dead agents, assesses health, and opens remediation
    /// projects for any threshold breach. Embedders drive the cadence.
    pub fn run_health_check(&self) -> Result<CycleReport> {
        Ok(self.ethos.run_cycle()?)
    }

    /// Convenience passthrough for creating an issue through the tracker.
    pub fn create_issue(&self, builder: IssueBuilder) -> Result<Issue> {
        Ok(self.tracker.create_issue(builder)?)
    }
}
