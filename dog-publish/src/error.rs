use std::fmt;

use dog_blob::BlobError;
use dog_content::ValidationError;
use serde::Serialize;
use thiserror::Error;

use crate::state::FailureKind;

/// Registry lookups and staging.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("staged media not found: {0}")]
    NotFound(String),

    #[error("invalid staged media: {0}")]
    Invalid(String),
}

/// Why a single upload failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadCause {
    /// A placeholder survived resolution because the registry no longer holds it.
    Missing,
    /// The storage collaborator did not answer in time.
    Timeout,
    /// Storage refused the payload (size, content type, key).
    Rejected(String),
    /// Storage failed.
    Storage(String),
}

impl UploadCause {
    pub fn as_str(&self) -> &'static str {
        match self {
            UploadCause::Missing => "missing",
            UploadCause::Timeout => "timeout",
            UploadCause::Rejected(_) => "rejected",
            UploadCause::Storage(_) => "storage",
        }
    }
}

impl fmt::Display for UploadCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UploadCause::Missing => f.write_str("staged media is no longer in the registry"),
            UploadCause::Timeout => f.write_str("storage timed out"),
            UploadCause::Rejected(msg) => write!(f, "storage rejected the payload: {msg}"),
            UploadCause::Storage(msg) => write!(f, "storage error: {msg}"),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("upload of {key} failed: {cause}")]
pub struct UploadError {
    pub key: String,
    pub cause: UploadCause,
}

impl UploadError {
    pub fn missing<S: Into<String>>(key: S) -> Self {
        Self {
            key: key.into(),
            cause: UploadCause::Missing,
        }
    }

    pub fn from_blob<S: Into<String>>(key: S, err: BlobError) -> Self {
        let cause = match err {
            BlobError::Timeout { .. } => UploadCause::Timeout,
            BlobError::TooLarge { .. } | BlobError::Invalid { .. } => {
                UploadCause::Rejected(err.to_string())
            }
            other => UploadCause::Storage(other.to_string()),
        };
        Self {
            key: key.into(),
            cause,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PersistError {
    /// Raised by a store when another post owns the slug; retried by the coordinator.
    #[error("slug `{slug}` is already taken")]
    SlugConflict { slug: String },

    #[error("no free slug after {attempts} attempts starting at `{base}`")]
    SlugConflictExhausted { base: String, attempts: u32 },

    #[error("post store unavailable: {0}")]
    StorageUnavailable(String),
}

impl PersistError {
    pub fn reason(&self) -> &'static str {
        match self {
            PersistError::SlugConflict { .. } => "slug-conflict",
            PersistError::SlugConflictExhausted { .. } => "slug-conflict-exhausted",
            PersistError::StorageUnavailable(_) => "storage-unavailable",
        }
    }
}

/// Everything a publish entry point can fail with.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PublishError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Persist(#[from] PersistError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error("caller is not authorized to edit or publish")]
    Unauthorized,

    #[error("a publish is already in flight for draft {0}")]
    PublishInFlight(String),
}

impl PublishError {
    /// The pipeline stage that failed, for errors raised inside a publish attempt.
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            PublishError::Validation(_) => Some(FailureKind::Validation),
            PublishError::Upload(_) => Some(FailureKind::Upload),
            PublishError::Persist(_) => Some(FailureKind::Persist),
            _ => None,
        }
    }

    pub fn report(&self) -> ErrorReport {
        let (kind, reason, path, key) = match self {
            PublishError::Validation(e) => ("validation", e.reason.as_str(), Some(e.path.clone()), None),
            PublishError::Upload(e) => ("upload", e.cause.as_str(), None, Some(e.key.clone())),
            PublishError::Persist(e) => ("persist", e.reason(), None, None),
            PublishError::Registry(RegistryError::NotFound(key)) => {
                ("not_found", "not-found", None, Some(key.clone()))
            }
            PublishError::Registry(RegistryError::Invalid(_)) => ("registry", "invalid-media", None, None),
            PublishError::Unauthorized => ("unauthorized", "unauthorized", None, None),
            PublishError::PublishInFlight(_) => ("conflict", "publish-in-flight", None, None),
        };
        ErrorReport {
            kind,
            reason,
            message: self.to_string(),
            path,
            key,
        }
    }
}

/// Serializable view of a [`PublishError`] for callers that flag the offending field or media.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    pub kind: &'static str,
    pub reason: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}
