//! HTTP client for the catalog API.

use serde::Deserialize;

use imgvault_types::{Artifact, Checksum, ReleaseId};

use crate::config::retry_delay;
use crate::{CatalogConfig, CatalogError, TokenBroker};

/// List response envelope: artifacts live under `body`.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    body: Vec<Artifact>,
}

/// Download-info envelope returned by the redirect-style endpoint.
#[derive(Debug, Deserialize)]
struct DownloadInfo {
    body: DownloadBody,
}

#[derive(Debug, Deserialize)]
struct DownloadBody {
    href: String,
    #[serde(default)]
    filename: Option<String>,
}

/// A resolved transfer location for one artifact.
///
/// The catalog's download endpoint is an indirection: it answers with a
/// time-limited signed URL rather than bytes. Resolving the handle and
/// consuming it are separate steps so failures in each can be told apart.
#[derive(Debug, Clone)]
pub struct DownloadHandle {
    /// Concrete transfer URL; opaque beyond "stream bytes from here".
    pub url: String,

    /// Filename the catalog reports for the artifact, when it does.
    pub filename: Option<String>,
}

/// Client for the catalog's read and download-handle endpoints.
///
/// Every call attaches a bearer token from the [`TokenBroker`] and is
/// retried on transport failures and 5xx responses with bounded
/// exponential backoff. A 404 from a list endpoint is a normal "nothing
/// there" outcome, not an error; release discovery probes rely on it.
#[derive(Debug)]
pub struct CatalogClient {
    /// Follows redirects; used for list calls and byte transfers.
    http: reqwest::Client,

    /// Redirects disabled; the download-handle endpoint answers 307 and
    /// the indirection payload must be read, not followed.
    no_redirect: reqwest::Client,

    broker: TokenBroker,
    config: CatalogConfig,
}

impl CatalogClient {
    /// Creates a client that authenticates with the given offline token.
    pub fn new(offline_token: impl Into<String>, config: CatalogConfig) -> Result<Self, CatalogError> {
        // read_timeout bounds a stalled stream without capping the total
        // duration of a large transfer.
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.request_timeout)
            .build()
            .map_err(|e| CatalogError::Init(e.to_string()))?;

        let no_redirect = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| CatalogError::Init(e.to_string()))?;

        let broker = TokenBroker::new(
            http.clone(),
            config.token_url.clone(),
            config.client_id.clone(),
            offline_token,
            config.refresh_margin,
            config.request_timeout,
        );

        Ok(Self {
            http,
            no_redirect,
            broker,
            config,
        })
    }

    /// Lists the artifacts published for one release partition.
    ///
    /// Returns an empty list when the release does not exist.
    pub async fn list_release_images(&self, release: &ReleaseId) -> Result<Vec<Artifact>, CatalogError> {
        let url = format!(
            "{}/images/rhel/{}/{}",
            self.config.api_base,
            release.version(),
            release.arch
        );
        self.list(&url).await
    }

    /// Lists the artifacts in a named content-set grouping.
    pub async fn list_content_set(&self, set_id: &str) -> Result<Vec<Artifact>, CatalogError> {
        let url = format!("{}/images/cset/{}?limit=100", self.config.api_base, set_id);
        self.list(&url).await
    }

    async fn list(&self, url: &str) -> Result<Vec<Artifact>, CatalogError> {
        let response = self.get_with_retry(&self.http, url, true).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !status.is_success() {
            return Err(self.status_error(status, url));
        }

        let payload: ListResponse = response
            .json()
            .await
            .map_err(|e| CatalogError::InvalidResponse(format!("list payload: {e}")))?;

        Ok(payload.body)
    }

    /// Resolves the download indirection for a checksum.
    ///
    /// The endpoint answers 307 with a JSON `body.href` payload; when the
    /// body is not JSON the `Location` header carries the transfer URL.
    pub async fn download_handle(&self, checksum: &Checksum) -> Result<DownloadHandle, CatalogError> {
        let url = format!("{}/images/{}/download", self.config.api_base, checksum);
        let response = self.get_with_retry(&self.no_redirect, &url, true).await?;
        let status = response.status();

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(checksum.to_string()));
        }
        if !status.is_success() && !status.is_redirection() {
            return Err(self.status_error(status, &url));
        }

        let location = response
            .headers()
            .get(reqwest::header::LOCATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        match response.json::<DownloadInfo>().await {
            Ok(info) => Ok(DownloadHandle {
                url: info.body.href,
                filename: info.body.filename,
            }),
            Err(_) => {
                let Some(location) = location else {
                    return Err(CatalogError::InvalidResponse(
                        "download endpoint sent neither JSON body nor Location".to_string(),
                    ));
                };
                Ok(DownloadHandle {
                    filename: filename_from_url(&location),
                    url: location,
                })
            }
        }
    }

    /// Begins the byte transfer for a resolved handle.
    ///
    /// The transfer URL is pre-signed, so no bearer header is attached.
    /// No total timeout either: large images outlive any sane request
    /// timeout and the caller's deadline governs instead.
    pub async fn open_stream(&self, handle: &DownloadHandle) -> Result<reqwest::Response, CatalogError> {
        let response = self.get_with_retry(&self.http, &handle.url, false).await?;
        let status = response.status();

        if !status.is_success() {
            return Err(self.status_error(status, &handle.url));
        }

        Ok(response)
    }

    /// GET with bounded retry on transport errors and 5xx responses.
    ///
    /// 4xx responses come back to the caller on the first attempt; they
    /// are answers, not infrastructure failures.
    async fn get_with_retry(
        &self,
        client: &reqwest::Client,
        url: &str,
        with_bearer: bool,
    ) -> Result<reqwest::Response, CatalogError> {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0u32;

        loop {
            attempt += 1;

            let mut request = client.get(url);
            if with_bearer {
                request = request.bearer_auth(self.broker.bearer_token().await?);
                request = request.timeout(self.config.request_timeout);
            }

            match request.send().await {
                Ok(response) if response.status().is_server_error() => {
                    let status = response.status().as_u16();
                    if attempt >= max_attempts {
                        return Err(CatalogError::transient(
                            attempt,
                            format!("server error {status} from {url}"),
                        ));
                    }
                    tracing::warn!(url, status, attempt, "catalog server error, retrying");
                }
                Ok(response) => return Ok(response),
                Err(err) => {
                    if attempt >= max_attempts {
                        return Err(CatalogError::transient(attempt, err.to_string()));
                    }
                    tracing::warn!(url, attempt, error = %err, "catalog request failed, retrying");
                }
            }

            tokio::time::sleep(retry_delay(attempt - 1, self.config.backoff_base)).await;
        }
    }

    fn status_error(&self, status: reqwest::StatusCode, url: &str) -> CatalogError {
        match status.as_u16() {
            401 => CatalogError::Authentication { status: 401 },
            code => CatalogError::api(code, format!("unexpected status from {url}")),
        }
    }
}

/// Extracts a filename from the last path segment of a transfer URL.
fn filename_from_url(url: &str) -> Option<String> {
    let path = url.split('?').next().unwrap_or(url);
    let name = path.rsplit('/').next()?;
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}
