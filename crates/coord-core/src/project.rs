//! Project -- a named grouping of issues, never deleted once created.

use serde::{Deserialize, Serialize};

use crate::enums::ProjectStatus;
use crate::metadata::Metadata;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: ProjectStatus,
    pub success_criteria: String,
    pub created_at: i64,
    #[serde(default)]
    pub completed_at: Option<i64>,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Fields accepted by a partial update to a [`Project`].
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    pub success_criteria: Option<String>,
    pub metadata: Option<Metadata>,
}

/// Parameters accepted by [`crate::project::Project`] creation.
///
/// Used both for caller-created projects and for the remediation projects
/// Ethos generates automatically.
#[derive(Debug, Clone)]
pub struct ProjectCreate {
    pub name: String,
    pub description: String,
    pub success_criteria: String,
    pub metadata: Metadata,
}

impl ProjectCreate {
    pub fn new(name: impl Into<String>, description: impl Into<String>, success_criteria: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            success_criteria: success_criteria.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_roundtrip() {
        let project = Project {
            id: "proj-1".into(),
            name: "Fix it".into(),
            description: "".into(),
            status: ProjectStatus::Active,
            success_criteria: "".into(),
            created_at: 100,
            completed_at: None,
            metadata: Metadata::new(),
        };
        let json = serde_json::to_string(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(back, project);
    }
}
