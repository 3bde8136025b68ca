//! Tracker -- issue and project CRUD, the dependency graph, and the
//! ready/blocked work queues.

pub mod error;

use std::sync::Arc;

use tracing::{debug, info};

use coord_core::{
    idgen, now_unix, Broadcast, BroadcastEventType, Dependency, DependencyType, Issue, IssueBuilder, IssueStatus,
    IssueUpdate, Metadata, Outcome, OutcomeResult, Project, ProjectCreate, ProjectUpdate,
};
use coord_storage::{BlockedIssue, Storage};

pub use error::{Result, TrackerError};

/// Issue and project tracking. Holds no state of its own beyond the shared
/// storage handle -- every call re-reads what it needs.
pub struct Tracker {
    storage: Arc<dyn Storage>,
}

impl Tracker {
    pub fn new(storage: Arc<dyn Storage>) -> Self {
        Self { storage }
    }

    // -- Projects ---------------------------------------------------------

    pub fn create_project(&self, create: ProjectCreate) -> Result<Project> {
        let now = now_unix();
        let project = Project {
            id: idgen::generate_id(idgen::prefix::PROJECT, now),
            name: create.name,
            description: create.description,
            status: coord_core::ProjectStatus::Active,
            success_criteria: create.success_criteria,
            created_at: now,
            completed_at: None,
            metadata: create.metadata,
        };
        self.storage.create_project(&project)?;
        info!(project_id = %project.id, "project created");
        Ok(project)
    }

    pub fn update_project(&self, id: &str, update: &ProjectUpdate) -> Result<()> {
        self.storage.update_project(id, update)?;
        Ok(())
    }

    pub fn list_projects(&self) -> Result<Vec<Project>> {
        Ok(self.storage.list_projects()?)
    }

    // -- Issues -------------------------------------------------------------

    pub fn create_issue(&self, builder: IssueBuilder) -> Result<Issue> {
        if !Issue::is_valid_priority(builder.priority_value()) {
            return Err(TrackerError::InvalidPriority(builder.priority_value()));
        }
        let now = now_unix();
        let issue = builder.build(idgen::generate_id(idgen::prefix::ISSUE, now), now);
        self.storage.create_issue(&issue)?;
        debug!(issue_id = %issue.id, "issue created");
        Ok(issue)
    }

    pub fn get_issue(&self, id: &str) -> Result<Issue> {
        Ok(self.storage.get_issue(id)?)
    }

    pub fn update_issue(&self, id: &str, update: &IssueUpdate) -> Result<()> {
        if let Some(priority) = update.priority {
            if !Issue::is_valid_priority(priority) {
                return Err(TrackerError::InvalidPriority(priority));
            }
        }
        self.storage.update_issue(id, update)?;
        Ok(())
    }

    pub fn list_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.storage.list_issues()?)
    }

    pub fn list_issues_by_project(&self, project_id: &str) -> Result<Vec<Issue>> {
        Ok(self.storage.list_issues_by_project(project_id)?)
    }

    pub fn get_ready_issues(&self) -> Result<Vec<Issue>> {
        Ok(self.storage.get_ready_issues()?)
    }

    pub fn get_blocked_issues(&self) -> Result<Vec<BlockedIssue>> {
        Ok(self.storage.get_blocked_issues()?)
    }

    // -- Dependencies ---------------------------------------------------

    /// Adds a dependency edge and, for `blocks` edges against a non-terminal
    /// blocker, marks the dependent issue `blocked` if it was `open`.
    pub fn add_dependency(&self, from_id: &str, to_id: &str, dep_type: DependencyType) -> Result<()> {
        let now = now_unix();
        let dep = Dependency::new(from_id, to_id, dep_type, now);
        self.storage.add_dependency(&dep)?;

        if dep_type == DependencyType::Blocks {
            let blocker = self.storage.get_issue(to_id)?;
            let dependent = self.storage.get_issue(from_id)?;
            if !blocker.status.is_terminal() && dependent.status == IssueStatus::Open {
                self.storage.update_issue(
                    from_id,
                    &IssueUpdate {
                        status: Some(IssueStatus::Blocked),
                        ..Default::default()
                    },
                )?;
                self.emit_broadcast(BroadcastEventType::Blocked, from_id, "", Metadata::new(), now);
            }
        }

        if dep_type == DependencyType::DiscoveredFrom {
            self.emit_broadcast(BroadcastEventType::Discovered, from_id, "", Metadata::new(), now);
        }

        Ok(())
    }

    /// Removes a dependency edge and, if `from_id` has no further unresolved
    /// `blocks` dependencies, re-opens it from `blocked`.
    pub fn remove_dependency(&self, from_id: &str, to_id: &str, dep_type: DependencyType) -> Result<()> {
        self.storage.remove_dependency(from_id, to_id, dep_type)?;
        self.reevaluate_blocked_status(from_id)?;
        Ok(())
    }

    fn reevaluate_blocked_status(&self, issue_id: &str) -> Result<()> {
        let issue = self.storage.get_issue(issue_id)?;
        if issue.status != IssueStatus::Blocked {
            return Ok(());
        }

        let deps = self.storage.get_dependencies(issue_id)?;
        let mut still_blocked = false;
        for dep in deps.iter().filter(|d| d.dep_type == DependencyType::Blocks) {
            let blocker = self.storage.get_issue(&dep.to_id)?;
            if !blocker.status.is_terminal() {
                still_blocked = true;
                break;
            }
        }

        if !still_blocked {
            self.storage.update_issue(
                issue_id,
                &IssueUpdate {
                    status: Some(IssueStatus::Open),
                    ..Default::default()
                },
            )?;
        }
        Ok(())
    }

    // -- Outcomes -------------------------------------------------------

    /// Records an outcome for `issue_id`. `Success` transitions the issue to
    /// `Done` and re-evaluates dependents for unblocking; `Cancelled`
    /// transitions it to `Cancelled`; `Failure`/`Partial` leave the current
    /// status untouched so the work stays retryable.
    pub fn record_outcome(&self, issue_id: &str, agent_id: &str, result: OutcomeResult, learnings: impl Into<String>) -> Result<Outcome> {
        let now = now_unix();
        let outcome = Outcome {
            id: idgen::generate_id(idgen::prefix::OUTCOME, now),
            issue_id: issue_id.to_string(),
            agent_id: agent_id.to_string(),
            result,
            learnings: learnings.into(),
            metadata: Metadata::new(),
            recorded_at: now,
        };
        self.storage.record_outcome(&outcome)?;

        let already_terminal = self.storage.get_issue(issue_id)?.status.is_terminal();

        match result {
            OutcomeResult::Success if !already_terminal => {
                self.storage.update_issue(
                    issue_id,
                    &IssueUpdate {
                        status: Some(IssueStatus::Done),
                        ..Default::default()
                    },
                )?;
                self.emit_broadcast(BroadcastEventType::Completed, issue_id, agent_id, Metadata::new(), now);
                for dependent in self.storage.get_dependents(issue_id)? {
                    self.reevaluate_blocked_status(&dependent.from_id)?;
                }
            }
            OutcomeResult::Cancelled if !already_terminal => {
                self.storage.update_issue(
                    issue_id,
                    &IssueUpdate {
                        status: Some(IssueStatus::Cancelled),
                        ..Default::default()
                    },
                )?;
                self.emit_broadcast(BroadcastEventType::Completed, issue_id, agent_id, Metadata::new(), now);
            }
            _ => {}
        }

        Ok(outcome)
    }

    pub fn list_outcomes(&self, issue_id: &str) -> Result<Vec<Outcome>> {
        Ok(self.storage.list_outcomes(issue_id)?)
    }

    fn emit_broadcast(&self, event_type: BroadcastEventType, issue_id: &str, agent_id: &str, payload: Metadata, now: i64) {
        let broadcast = Broadcast {
            id: 0,
            event_type,
            issue_id: issue_id.to_string(),
            agent_id: agent_id.to_string(),
            payload,
            created_at: now,
        };
        if let Err(e) = self.storage.append_broadcast(&broadcast) {
            tracing::warn!(error = %e, issue_id, "failed to emit broadcast");
        }
    }
}
