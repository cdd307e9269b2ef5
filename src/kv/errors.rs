//! # Key-Value Store Errors

use thiserror::Error;

/// Result type for key-value operations
pub type KvResult<T> = Result<T, KvError>;

/// Key-value backend errors
#[derive(Debug, Clone, Error)]
pub enum KvError {
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corrupted entry '{key}': {reason}")]
    Corrupted { key: String, reason: String },
}

impl KvError {
    /// Get error code for callers that surface errors over a wire
    pub fn code(&self) -> &'static str {
        match self {
            KvError::InvalidKey(_) => "DOCSHAPE_KV_INVALID_KEY",
            KvError::Io(_) => "DOCSHAPE_KV_IO",
            KvError::Serialization(_) => "DOCSHAPE_KV_SERIALIZATION",
            KvError::Corrupted { .. } => "DOCSHAPE_KV_CORRUPTED",
        }
    }
}

impl From<std::io::Error> for KvError {
    fn from(e: std::io::Error) -> Self {
        KvError::Io(e.to_string())
    }
}

impl From<serde_json::Error> for KvError {
    fn from(e: serde_json::Error) -> Self {
        KvError::Serialization(e.to_string())
    }
}
