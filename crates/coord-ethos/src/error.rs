//! Ethos error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EthosError {
    #[error(transparent)]
    Storage(#[from] coord_storage::StorageError),

    #[error(transparent)]
    Tracker(#[from] coord_tracker::TrackerError),

    #[error(transparent)]
    Claims(#[from] coord_claims::ClaimsError),
}

pub type Result<T> = std::result::Result<T, EthosError>;
