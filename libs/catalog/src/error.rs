//! Error taxonomy for catalog access.

use thiserror::Error;

/// Errors raised by catalog authentication and API access.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Token exchange was rejected. The offline token is invalid or
    /// expired; this is user-actionable and never retried.
    #[error("authentication failed (status {status}): offline token was rejected")]
    Authentication { status: u16 },

    /// The catalog answered with a non-retryable client error.
    #[error("catalog error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Transport failure or persistent 5xx after the retry budget.
    #[error("transient network failure after {attempts} attempt(s): {message}")]
    Transient { attempts: u32, message: String },

    /// The requested resource does not exist in the catalog.
    #[error("not found in catalog: {0}")]
    NotFound(String),

    /// The catalog answered with a payload this client cannot interpret.
    #[error("unexpected catalog response: {0}")]
    InvalidResponse(String),

    /// The HTTP client could not be constructed (TLS backend setup).
    #[error("http client initialization: {0}")]
    Init(String),
}

impl CatalogError {
    /// Creates an API error from response details.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Creates a transient error after `attempts` tries.
    pub fn transient(attempts: u32, message: impl Into<String>) -> Self {
        Self::Transient {
            attempts,
            message: message.into(),
        }
    }

    /// Returns true if the condition is user-actionable rather than
    /// infrastructure-related.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Authentication { .. })
    }
}
