//! Claims error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClaimsError {
    #[error(transparent)]
    Storage(#[from] coord_storage::StorageError),
}

pub type Result<T> = std::result::Result<T, ClaimsError>;

impl ClaimsError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(e) if e.is_not_found())
    }
}
