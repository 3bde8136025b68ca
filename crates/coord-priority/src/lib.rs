//! Priority -- ready-issue scoring, critical path, and bottleneck ranking.
//! Router -- capability-matched assignment built on top of Priority.

pub mod error;
pub mod priority;
pub mod router;

pub use error::{PriorityError, Result};
pub use priority::{Priority, ScoredIssue};
pub use router::{Router, WorkloadEntry};
