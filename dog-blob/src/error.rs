use std::time::Duration;

use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Errors that can occur during blob operations
#[derive(Error, Debug)]
pub enum BlobError {
    #[error("Blob not found: {key}")]
    NotFound { key: String },

    #[error("Invalid request: {message}")]
    Invalid { message: String },

    #[error("Blob of {size} bytes exceeds the {max} byte limit")]
    TooLarge { size: u64, max: u64 },

    #[error("Storage put timed out after {after:?}")]
    Timeout { after: Duration },

    #[error("Storage backend unavailable: {reason}")]
    Unavailable { reason: String },
}

impl BlobError {
    /// Create an invalid request error
    pub fn invalid<S: Into<String>>(message: S) -> Self {
        Self::Invalid {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found<S: Into<String>>(key: S) -> Self {
        Self::NotFound { key: key.into() }
    }

    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    /// Transient failures a caller may reasonably retry as a whole.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Unavailable { .. })
    }
}
