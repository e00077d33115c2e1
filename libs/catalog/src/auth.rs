//! Credential broker: offline token → short-lived bearer token.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::CatalogError;

/// Token-exchange response payload.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    /// Validity window in seconds (typically 900).
    expires_in: u64,
}

/// Cached bearer token with its known validity window.
struct CachedToken {
    bearer: String,
    expires_at: DateTime<Utc>,
}

/// Exchanges a long-lived offline token for short-lived bearer tokens.
///
/// The broker is the sole owner of credential state. The cached bearer is
/// reused until it is within the configured margin of expiry; refresh is
/// serialized behind a lock so concurrent flows perform one exchange, not
/// many. Neither token ever appears in `Debug` output, errors, or logs.
pub struct TokenBroker {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    offline_token: String,
    refresh_margin: Duration,
    request_timeout: Duration,
    cached: Mutex<Option<CachedToken>>,
}

impl fmt::Debug for TokenBroker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBroker")
            .field("token_url", &self.token_url)
            .field("client_id", &self.client_id)
            .field("offline_token", &"<redacted>")
            .finish_non_exhaustive()
    }
}

impl TokenBroker {
    /// Creates a broker for the given offline token.
    pub fn new(
        http: reqwest::Client,
        token_url: impl Into<String>,
        client_id: impl Into<String>,
        offline_token: impl Into<String>,
        refresh_margin: Duration,
        request_timeout: Duration,
    ) -> Self {
        Self {
            http,
            token_url: token_url.into(),
            client_id: client_id.into(),
            offline_token: offline_token.into(),
            refresh_margin,
            request_timeout,
            cached: Mutex::new(None),
        }
    }

    /// Returns a valid bearer token, refreshing transparently when the
    /// cached one is absent or about to expire.
    ///
    /// Authentication failures are fatal and never retried here: an
    /// invalid or expired offline token needs the operator, not a retry.
    pub async fn bearer_token(&self) -> Result<String, CatalogError> {
        let mut cached = self.cached.lock().await;

        let margin = chrono::Duration::from_std(self.refresh_margin)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));
        if let Some(token) = cached.as_ref() {
            if Utc::now() + margin < token.expires_at {
                return Ok(token.bearer.clone());
            }
        }

        tracing::debug!(token_url = %self.token_url, "refreshing bearer token");
        let fresh = self.exchange().await?;
        let bearer = fresh.bearer.clone();
        *cached = Some(fresh);

        Ok(bearer)
    }

    /// Performs the token exchange.
    async fn exchange(&self) -> Result<CachedToken, CatalogError> {
        let params = [
            ("grant_type", "refresh_token"),
            ("client_id", self.client_id.as_str()),
            ("refresh_token", self.offline_token.as_str()),
        ];

        // Bounded like every other catalog call; an exchange endpoint
        // that accepts the connection and stalls must not hang the run.
        let response = self
            .http
            .post(&self.token_url)
            .form(&params)
            .timeout(self.request_timeout)
            .send()
            .await
            .map_err(|e| CatalogError::transient(1, format!("token exchange: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            // Body is dropped unread: SSO error payloads can echo request
            // parameters, and the offline token must not leak into errors.
            return Err(CatalogError::Authentication {
                status: status.as_u16(),
            });
        }

        let payload: TokenResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("token payload: {e}")))?;

        Ok(CachedToken {
            bearer: payload.access_token,
            expires_at: Utc::now() + chrono::Duration::seconds(payload.expires_in as i64),
        })
    }
}
