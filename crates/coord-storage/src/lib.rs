//! Storage backend for the agent coordination engine.
//!
//! Provides the [`Storage`] trait and a SQLite implementation ([`SqliteStore`]).

pub mod error;
pub mod sqlite;
pub mod traits;

pub use error::{Result, StorageError};
pub use sqlite::SqliteStore;
pub use traits::{BlockedIssue, Storage};

use coord_core::{Agent, AgentStatus, Broadcast, Claim, Dependency, DependencyType, HealthSnapshot, Issue, IssueUpdate, Outcome, Project, ProjectUpdate};

use crate::error::Result;

impl Storage for SqliteStore {
    fn create_project(&self, project: &Project) -> Result<()> {
        self.create_project_impl(project)
    }

    fn get_project(&self, id: &str) -> Result<Project> {
        self.get_project_impl(id)
    }

    fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<()> {
        self.update_project_impl(id, update)
    }

    fn list_projects(&self) -> Result<Vec<Project>> {
        self.list_projects_impl()
    }

    fn create_issue(&self, issue: &Issue) -> Result<()> {
        self.create_issue_impl(issue)
    }

    fn get_issue(&self, id: &str) -> Result<Issue> {
        self.get_issue_impl(id)
    }

    fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<()> {
        self.update_issue_impl(id, update)
    }

    fn list_issues(&self) -> Result<Vec<Issue>> {
        self.list_issues_impl()
    }

    fn list_issues_by_project(&self, project_id: &str) -> Result<Vec<Issue>> {
        self.list_issues_by_project_impl(project_id)
    }

    fn get_ready_issues(&self) -> Result<Vec<Issue>> {
        self.get_ready_issues_impl()
    }

    fn get_blocked_issues(&self) -> Result<Vec<BlockedIssue>> {
        self.get_blocked_issues_impl()
    }

    fn add_dependency(&self, dep: &Dependency) -> Result<()> {
        self.add_dependency_impl(dep)
    }

    fn remove_dependency(&self, from_id: &str, to_id: &str, dep_type: DependencyType) -> Result<()> {
        self.remove_dependency_impl(from_id, to_id, dep_type)
    }

    fn get_dependencies(&self, issue_id: &str) -> Result<Vec<Dependency>> {
        self.get_dependencies_impl(issue_id)
    }

    fn get_dependents(&self, issue_id: &str) -> Result<Vec<Dependency>> {
        self.get_dependents_impl(issue_id)
    }

    fn record_outcome(&self, outcome: &Outcome) -> Result<()> {
        self.record_outcome_impl(outcome)
    }

    fn list_outcomes(&self, issue_id: &str) -> Result<Vec<Outcome>> {
        self.list_outcomes_impl(issue_id)
    }

    fn upsert_agent(&self, agent: &Agent) -> Result<()> {
        self.upsert_agent_impl(agent)
    }

    fn get_agent(&self, agent_id: &str) -> Result<Agent> {
        self.get_agent_impl(agent_id)
    }

    fn list_agents(&self) -> Result<Vec<Agent>> {
        self.list_agents_impl()
    }

    fn mark_agent_status(&self, agent_id: &str, status: AgentStatus) -> Result<()> {
        self.mark_agent_status_impl(agent_id, status)
    }

    fn touch_agent_heartbeat(&self, agent_id: &str, now: i64) -> Result<()> {
        self.touch_agent_heartbeat_impl(agent_id, now)
    }

    fn try_insert_claim(&self, claim: &Claim) -> Result<bool> {
        self.try_insert_claim_impl(claim)
    }

    fn get_claim(&self, issue_id: &str) -> Result<Option<Claim>> {
        self.get_claim_impl(issue_id)
    }

    fn refresh_claim_heartbeat(&self, issue_id: &str, now: i64) -> Result<bool> {
        self.refresh_claim_heartbeat_impl(issue_id, now)
    }

    fn delete_claim_if_held(&self, issue_id: &str, agent_id: &str) -> Result<bool> {
        self.delete_claim_if_held_impl(issue_id, agent_id)
    }

    fn delete_claim(&self, issue_id: &str) -> Result<bool> {
        self.delete_claim_impl(issue_id)
    }

    fn list_expired_claims(&self, now: i64) -> Result<Vec<Claim>> {
        self.list_expired_claims_impl(now)
    }

    fn get_agent_claims(&self, agent_id: &str) -> Result<Vec<Claim>> {
        self.get_agent_claims_impl(agent_id)
    }

    fn list_active_claims(&self) -> Result<Vec<Claim>> {
        self.list_active_claims_impl()
    }

    fn append_broadcast(&self, broadcast: &Broadcast) -> Result<()> {
        self.append_broadcast_impl(broadcast)
    }

    fn list_broadcasts_since(&self, since_id: i64, limit: i64) -> Result<Vec<Broadcast>> {
        self.list_broadcasts_since_impl(since_id, limit)
    }

    fn insert_health_snapshot(&self, snapshot: &HealthSnapshot) -> Result<()> {
        self.insert_health_snapshot_impl(snapshot)
    }

    fn list_health_snapshots_since(&self, since: i64) -> Result<Vec<HealthSnapshot>> {
        self.list_health_snapshots_since_impl(since)
    }
}
