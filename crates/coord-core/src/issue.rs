//! Issue -- the unit of work and the node of the dependency graph.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::enums::IssueStatus;
use crate::metadata::Metadata;

/// A unit of work. Created `open`; flows through [`IssueStatus`] as
/// dependencies resolve, claims are taken, and outcomes are recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub description: String,
    pub status: IssueStatus,
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    /// 0 (highest) to 4 (lowest).
    pub priority: i32,
    #[serde(default)]
    pub labels: BTreeSet<String>,
    #[serde(default)]
    pub metadata: Metadata,
    pub created_at: i64,
    pub updated_at: i64,
    #[serde(default)]
    pub resolved_at: Option<i64>,
}

impl Issue {
    /// Lowest valid priority value (highest urgency).
    pub const MIN_PRIORITY: i32 = 0;
    /// Highest valid priority value (lowest urgency).
    pub const MAX_PRIORITY: i32 = 4;
    /// Priority assigned when the caller doesn't specify one.
    pub const DEFAULT_PRIORITY: i32 = 2;

    pub fn is_valid_priority(priority: i32) -> bool {
        (Self::MIN_PRIORITY..=Self::MAX_PRIORITY).contains(&priority)
    }
}

/// Fields accepted by a partial update to an [`Issue`].
///
/// Every field is `Option`; only `Some` fields are written. `status`,
/// `priority`, `labels` and `metadata` use the same shape; `description` is
/// the only free-text field that can be patched in place.
#[derive(Debug, Clone, Default)]
pub struct IssueUpdate {
    pub description: Option<String>,
    pub status: Option<IssueStatus>,
    pub priority: Option<i32>,
    pub labels: Option<BTreeSet<String>>,
    pub metadata: Option<Metadata>,
}

/// Fluent builder for constructing test fixtures and caller-facing creation
/// requests.
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    description: String,
    project_id: Option<String>,
    parent_id: Option<String>,
    priority: i32,
    labels: BTreeSet<String>,
    metadata: Metadata,
}

impl IssueBuilder {
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            project_id: None,
            parent_id: None,
            priority: Issue::DEFAULT_PRIORITY,
            labels: BTreeSet::new(),
            metadata: Metadata::new(),
        }
    }

    pub fn project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    pub fn parent_id(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.labels.insert(label.into());
        self
    }

    pub fn labels(mut self, labels: impl IntoIterator<Item = String>) -> Self {
        self.labels.extend(labels);
        self
    }

    pub fn metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority_value(&self) -> i32 {
        self.priority
    }

    pub fn project_id_value(&self) -> Option<&str> {
        self.project_id.as_deref()
    }

    pub fn parent_id_value(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }

    pub fn labels_value(&self) -> &BTreeSet<String> {
        &self.labels
    }

    pub fn metadata_value(&self) -> &Metadata {
        &self.metadata
    }

    /// Builds a fully-formed [`Issue`] directly, for unit tests that don't
    /// go through a store.
    pub fn build(self, id: impl Into<String>, now: i64) -> Issue {
        Issue {
            id: id.into(),
            description: self.description,
            status: IssueStatus::Open,
            project_id: self.project_id,
            parent_id: self.parent_id,
            priority: self.priority,
            labels: self.labels,
            metadata: self.metadata,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults() {
        let issue = IssueBuilder::new("do the thing").build("iss-1", 100);
        assert_eq!(issue.description, "do the thing");
        assert_eq!(issue.status, IssueStatus::Open);
        assert_eq!(issue.priority, Issue::DEFAULT_PRIORITY);
        assert_eq!(issue.created_at, issue.updated_at);
        assert!(issue.resolved_at.is_none());
    }

    #[test]
    fn builder_fluent_fields() {
        let issue = IssueBuilder::new("do the thing")
            .priority(0)
            .project_id("proj-1")
            .label("io")
            .label("urgent")
            .build("iss-2", 100);
        assert_eq!(issue.priority, 0);
        assert_eq!(issue.project_id.as_deref(), Some("proj-1"));
        assert!(issue.labels.contains("io"));
        assert!(issue.labels.contains("urgent"));
    }

    #[test]
    fn priority_bounds() {
        assert!(Issue::is_valid_priority(0));
        assert!(Issue::is_valid_priority(4));
        assert!(!Issue::is_valid_priority(-1));
        assert!(!Issue::is_valid_priority(5));
    }

    #[test]
    fn serde_roundtrip() {
        let issue = IssueBuilder::new("x").build("iss-3", 100);
        let json = serde_json::to_string(&issue).unwrap();
        let back: Issue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, issue);
    }
}
