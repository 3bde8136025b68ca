//! Priority/Router error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PriorityError {
    #[error(transparent)]
    Storage(#[from] coord_storage::StorageError),

    #[error(transparent)]
    Claims(#[from] coord_claims::ClaimsError),
}

pub type Result<T> = std::result::Result<T, PriorityError>;

impl PriorityError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }
}
