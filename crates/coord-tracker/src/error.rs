//! Tracker error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TrackerError {
    #[error(transparent)]
    Storage(#[from] coord_storage::StorageError),

    #[error("invalid priority {0}: must be between {min} and {max}", min = coord_core::Issue::MIN_PRIORITY, max = coord_core::Issue::MAX_PRIORITY)]
    InvalidPriority(i32),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

impl TrackerError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }
}
