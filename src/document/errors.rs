//! Document store error types
//!
//! Missing keys are never errors: `get`, `has` and `delete` treat absence as
//! a normal outcome. No error is retried internally.

use thiserror::Error;

use crate::kv::KvError;
use crate::schema::ValidationError;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Document store errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store is read-only: {operation} rejected")]
    ReadOnly { operation: &'static str },

    #[error("{operation} is not valid in {mode} mode")]
    Mode {
        operation: &'static str,
        mode: &'static str,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] KvError),

    #[error("Corrupted persisted '{key}': {reason}")]
    Corrupted { key: &'static str, reason: String },
}

impl StoreError {
    /// Get error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::ReadOnly { .. } => "DOCSHAPE_READ_ONLY",
            StoreError::Mode { .. } => "DOCSHAPE_MODE",
            StoreError::Validation(_) => "DOCSHAPE_VALIDATION_FAILED",
            StoreError::Storage(_) => "DOCSHAPE_STORAGE",
            StoreError::Corrupted { .. } => "DOCSHAPE_CORRUPTED",
        }
    }

    /// Returns the validation failure, if this is one
    pub fn validation(&self) -> Option<&ValidationError> {
        match self {
            StoreError::Validation(err) => Some(err),
            _ => None,
        }
    }

    /// Returns true for errors caused by the request rather than the backend
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            StoreError::ReadOnly { .. } | StoreError::Mode { .. } | StoreError::Validation(_)
        )
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Storage(KvError::from(e))
    }
}
