use std::fmt;

use thiserror::Error;

/// Why a document (or draft field) was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationReason {
    /// A node `type` outside the closed schema.
    UnknownNodeType,
    /// The tree shape breaks a structural rule.
    MalformedTree,
    /// A field next to the tree (title, locale, ...) is unusable.
    InvalidField,
}

impl ValidationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationReason::UnknownNodeType => "unknown-node-type",
            ValidationReason::MalformedTree => "malformed-tree",
            ValidationReason::InvalidField => "invalid-field",
        }
    }
}

impl fmt::Display for ValidationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation failure with the JSON path of the offending node.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{reason} at {path}: {message}")]
pub struct ValidationError {
    pub reason: ValidationReason,
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new<P: Into<String>, M: Into<String>>(reason: ValidationReason, path: P, message: M) -> Self {
        Self {
            reason,
            path: path.into(),
            message: message.into(),
        }
    }

    pub fn unknown_node_type<P: Into<String>>(path: P, name: &str) -> Self {
        Self::new(
            ValidationReason::UnknownNodeType,
            path,
            format!("unknown node type `{name}`"),
        )
    }

    pub fn malformed<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::new(ValidationReason::MalformedTree, path, message)
    }

    pub fn invalid_field<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::new(ValidationReason::InvalidField, path, message)
    }

    /// Re-root the path, e.g. `$` -> `$.translations.de.content`.
    pub fn within(mut self, prefix: &str) -> Self {
        self.path = match self.path.strip_prefix('$') {
            Some(rest) => format!("{prefix}{rest}"),
            None => format!("{prefix}.{}", self.path),
        };
        self
    }
}
