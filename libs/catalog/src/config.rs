//! Catalog endpoint and retry configuration.

use std::time::Duration;

/// Default token-exchange endpoint.
const DEFAULT_TOKEN_URL: &str =
    "https://sso.redhat.com/auth/realms/redhat-external/protocol/openid-connect/token";

/// Default catalog API base.
const DEFAULT_API_BASE: &str = "https://api.access.redhat.com/management/v1";

/// OAuth client id registered for catalog API access.
const DEFAULT_CLIENT_ID: &str = "rhsm-api";

fn default_api_base() -> String {
    std::env::var("IMGVAULT_API_BASE")
        .map(|base| base.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| DEFAULT_API_BASE.to_string())
}

/// Configuration for catalog access.
///
/// Retry and timeout values are tuned to current catalog behavior, not
/// correctness requirements; adjust freely.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Token-exchange endpoint URL.
    pub token_url: String,

    /// Catalog API base URL (no trailing slash).
    pub api_base: String,

    /// OAuth client id sent with the token exchange.
    pub client_id: String,

    /// TCP connect timeout per HTTP call.
    pub connect_timeout: Duration,

    /// Total timeout per catalog API call (list, token, handle). Byte
    /// transfers are governed by the caller's deadline instead.
    pub request_timeout: Duration,

    /// Maximum attempts per catalog call (first try included).
    pub max_attempts: u32,

    /// Base delay for exponential backoff between attempts.
    pub backoff_base: Duration,

    /// Refresh the bearer token when it is within this margin of expiry.
    pub refresh_margin: Duration,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            token_url: DEFAULT_TOKEN_URL.to_string(),
            api_base: default_api_base(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            backoff_base: Duration::from_millis(500),
            refresh_margin: Duration::from_secs(60),
        }
    }
}

impl CatalogConfig {
    /// Returns a config pointed at a different API base and token URL.
    ///
    /// Used by tests to target a mock server; the rest of the defaults
    /// are kept.
    pub fn with_endpoints(api_base: impl Into<String>, token_url: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into().trim_end_matches('/').to_string(),
            token_url: token_url.into(),
            ..Self::default()
        }
    }
}

/// Calculates the delay before retry `retry_count` using exponential
/// backoff: `base * 2^retry_count`, saturating on overflow.
pub(crate) fn retry_delay(retry_count: u32, base: Duration) -> Duration {
    base.saturating_mul(2_u32.saturating_pow(retry_count))
}
