//! Error types for domain value parsing and validation.

use thiserror::Error;

/// Errors that can occur when parsing or validating domain values.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// The input string is empty.
    #[error("value cannot be empty")]
    Empty,

    /// The architecture spelling is not one the catalog serves.
    #[error("unknown architecture: '{0}'")]
    UnknownArchitecture(String),

    /// The release string is not `{major}.{minor}`.
    #[error("invalid release '{value}': {reason}")]
    InvalidRelease { value: String, reason: String },

    /// The checksum is not 64 hexadecimal characters.
    #[error("invalid checksum: {reason}")]
    InvalidChecksum { reason: String },
}

impl TypesError {
    pub(crate) fn release(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidRelease {
            value: value.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn checksum(reason: impl Into<String>) -> Self {
        Self::InvalidChecksum {
            reason: reason.into(),
        }
    }
}
