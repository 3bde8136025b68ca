//! Coordinator facade error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    #[error(transparent)]
    Storage(#[from] coord_storage::StorageError),

    #[error(transparent)]
    Tracker(#[from] coord_tracker::TrackerError),

    #[error(transparent)]
    Claims(#[from] coord_claims::ClaimsError),

    #[error(transparent)]
    Priority(#[from] coord_priority::PriorityError),

    #[error(transparent)]
    Ethos(#[from] coord_ethos::EthosError),
}

pub type Result<T> = std::result::Result<T, CoordinatorError>;

impl CoordinatorError {
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Storage(e) => e.is_not_found(),
            Self::Tracker(e) => e.is_not_found(),
            Self::Claims(e) => e.is_not_found(),
            Self::Priority(e) => e.is_not_found(),
            _ => false,
        }
    }
}
