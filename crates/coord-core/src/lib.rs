//! Domain types for the agent coordination engine.
//!
//! Pure data model: no I/O, no storage access. Every entity is plain-old
//! data with serde and a handful of invariant-checking helpers.

pub mod agent;
pub mod broadcast;
pub mod claim;
pub mod dependency;
pub mod enums;
pub mod health;
pub mod idgen;
pub mod issue;
pub mod metadata;
pub mod outcome;
pub mod project;

pub use agent::Agent;
pub use broadcast::Broadcast;
pub use claim::Claim;
pub use dependency::Dependency;
pub use enums::{AgentStatus, BroadcastEventType, DependencyType, IssueStatus, OutcomeResult, ProjectStatus};
pub use health::HealthSnapshot;
pub use issue::{Issue, IssueBuilder, IssueUpdate};
pub use metadata::Metadata;
pub use outcome::Outcome;
pub use project::{Project, ProjectCreate, ProjectUpdate};

/// Current unix-second timestamp, the clock every entity's `*_at` field is
/// stamped with.
pub fn now_unix() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}
