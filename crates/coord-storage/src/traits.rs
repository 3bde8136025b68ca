//! The [`Storage`] trait -- the public API every backend implements.
//!
//! Consumers (Tracker, Claims, Priority, Ethos) depend on `Arc<dyn Storage>`
//! rather than on [`crate::SqliteStore`] directly, so an alternative backend
//! could be substituted without touching component code.

use coord_core::{Agent, Broadcast, Claim, Dependency, HealthSnapshot, Issue, IssueUpdate, Outcome, Project, ProjectUpdate};

use crate::error::Result;

/// An issue blocked by at least one open `blocks` dependency, with the
/// count of still-open blockers.
#[derive(Debug, Clone)]
pub struct BlockedIssue {
    pub issue: Issue,
    pub blocked_by_count: i32,
}

/// The public storage API. Object-safe so components can hold
/// `Arc<dyn Storage>`.
pub trait Storage: Send + Sync {
    // -- Projects ---------------------------------------------------------
    fn create_project(&self, project: &Project) -> Result<()>;
    fn get_project(&self, id: &str) -> Result<Project>;
    fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<()>;
    fn list_projects(&self) -> Result<Vec<Project>>;

    // -- Issues -------------------------------------------------------------
    fn create_issue(&self, issue: &Issue) -> Result<()>;
    fn get_issue(&self, id: &str) -> Result<Issue>;
    fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<()>;
    fn list_issues(&self) -> Result<Vec<Issue>>;
    fn list_issues_by_project(&self, project_id: &str) -> Result<Vec<Issue>>;
    fn get_ready_issues(&self) -> Result<Vec<Issue>>;
    fn get_blocked_issues(&self) -> Result<Vec<BlockedIssue>>;

    // -- Dependencies ---------------------------------------------------
    fn add_dependency(&self, dep: &Dependency) -> Result<()>;
    fn remove_dependency(&self, from_id: &str, to_id: &str, dep_type: coord_core::DependencyType) -> Result<()>;
    fn get_dependencies(&self, issue_id: &str) -> Result<Vec<Dependency>>;
    fn get_dependents(&self, issue_id: &str) -> Result<Vec<Dependency>>;

    // -- Outcomes -------------------------------------------------------
    fn record_outcome(&self, outcome: &Outcome) -> Result<()>;
    fn list_outcomes(&self, issue_id: &str) -> Result<Vec<Outcome>>;

    // -- Agents -----------------------------------------------------------
    fn upsert_agent(&self, agent: &Agent) -> Result<()>;
    fn get_agent(&self, agent_id: &str) -> Result<Agent>;
    fn list_agents(&self) -> Result<Vec<Agent>>;
    fn mark_agent_status(&self, agent_id: &str, status: coord_core::AgentStatus) -> Result<()>;
    /// Sets `status='active'` and `last_seen_at=now` in one write -- the
    /// heartbeat contract, distinct from `mark_agent_status` which only
    /// touches `status`.
    fn touch_agent_heartbeat(&self, agent_id: &str, now: i64) -> Result<()>;

    // -- Claims -----------------------------------------------------------
    /// Inserts a claim row iff none exists for `claim.issue_id`. Returns
    /// `false` (not an error) if the issue is already claimed.
    fn try_insert_claim(&self, claim: &Claim) -> Result<bool>;
    fn get_claim(&self, issue_id: &str) -> Result<Option<Claim>>;
    fn refresh_claim_heartbeat(&self, issue_id: &str, now: i64) -> Result<bool>;
    /// Deletes the claim row iff it's held by `agent_id`. Returns whether a
    /// row was deleted.
    fn delete_claim_if_held(&self, issue_id: &str, agent_id: &str) -> Result<bool>;
    fn delete_claim(&self, issue_id: &str) -> Result<bool>;
    fn list_expired_claims(&self, now: i64) -> Result<Vec<Claim>>;
    fn get_agent_claims(&self, agent_id: &str) -> Result<Vec<Claim>>;
    fn list_active_claims(&self) -> Result<Vec<Claim>>;

    // -- Broadcasts -------------------------------------------------------
    fn append_broadcast(&self, broadcast: &Broadcast) -> Result<()>;
    fn list_broadcasts_since(&self, since_id: i64, limit: i64) -> Result<Vec<Broadcast>>;

    // -- Health -------------------------------------------------------------
    fn insert_health_snapshot(&self, snapshot: &HealthSnapshot) -> Result<()>;
    fn list_health_snapshots_since(&self, since: i64) -> Result<Vec<HealthSnapshot>>;
}
