//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
///
/// Maps onto the spec's error taxonomy: [`StorageError::NotFound`] is
/// `ErrNotFound`, [`StorageError::Validation`] and
/// [`StorageError::CycleDetected`] are `ErrInvalidArgument`, everything else
/// is `ErrStore`. A lost claim race is deliberately *not* an error variant
/// here -- it's represented as `Ok(false)` by the claims layer.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid argument: {0}")]
    Validation(String),

    #[error("dependency {from} -> {to} would close a cycle in the blocks graph")]
    CycleDetected { from: String, to: String },

    #[error("storage connection error: {0}")]
    Connection(String),

    #[error("schema migration '{name}' failed: {reason}")]
    Migration { name: String, reason: String },

    #[error("database query failed: {0}")]
    Query(#[from] rusqlite::Error),

    #[error("(de)serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

impl StorageError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity,
            id: id.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Whether retrying the same operation (unmodified) might succeed --
    /// connection hiccups are, validation and cycle errors are not.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}
