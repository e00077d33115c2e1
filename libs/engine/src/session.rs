//! Per-run session owning all shared state.

use std::sync::Arc;

use imgvault_catalog::{CatalogClient, CatalogConfig};
use imgvault_types::{Architecture, Artifact, ReleaseId};

use crate::progress::{NoopProgress, Progress};
use crate::retrieve::{RetrievalOutcome, RetrievalRequest};
use crate::{resolve, retrieve, Discovery, DiscoveryConfig, EngineError};

/// Engine tuning independent of catalog endpoints.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Discovery probing strategy.
    pub discovery: DiscoveryConfig,

    /// Architecture priority for filename resolution when the caller
    /// does not specify one. Defaults to every catalog architecture,
    /// most common first.
    pub search_order: Vec<Architecture>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            search_order: Architecture::ALL.to_vec(),
        }
    }
}

/// One run's worth of engine state.
///
/// A `Session` is constructed once per run and passed by reference to
/// whatever orchestrates retrievals. It owns the two pieces of shared
/// mutable state — the broker's cached bearer token and the discovery
/// cache — so nothing hides in process-wide globals, and two independent
/// runs re-authenticate and re-discover from scratch.
///
/// Independent retrievals may run concurrently against one session;
/// refresh and cache population are lock-serialized internally.
pub struct Session {
    client: Arc<CatalogClient>,
    discovery: Discovery,
    config: EngineConfig,
    progress: Arc<dyn Progress>,
}

impl Session {
    /// Creates a session authenticated by the given offline token.
    pub fn new(
        offline_token: impl Into<String>,
        catalog: CatalogConfig,
        engine: EngineConfig,
    ) -> Result<Self, EngineError> {
        let client = Arc::new(CatalogClient::new(offline_token, catalog)?);
        let discovery = Discovery::new(Arc::clone(&client), engine.discovery.clone());

        Ok(Self {
            client,
            discovery,
            config: engine,
            progress: Arc::new(NoopProgress),
        })
    }

    /// Attaches a progress sink for interactive callers.
    #[must_use]
    pub fn with_progress(mut self, sink: Arc<dyn Progress>) -> Self {
        self.progress = sink;
        self
    }

    /// Returns the releases currently available for `arch`, newest first.
    ///
    /// Probes the catalog on first call per architecture; cached for the
    /// rest of the session. Exposed so an orchestrator can list what is
    /// currently supported without triggering a fetch.
    pub async fn discover_releases(&self, arch: Architecture) -> Result<Arc<[ReleaseId]>, EngineError> {
        self.discovery.discover(arch).await
    }

    /// Resolves a published filename to its artifact, searching the given
    /// architectures in priority order and releases newest-first.
    pub async fn resolve(
        &self,
        filename: &str,
        archs: &[Architecture],
    ) -> Result<Artifact, EngineError> {
        resolve::resolve_filename(
            &self.client,
            &self.discovery,
            self.progress.as_ref(),
            filename,
            archs,
        )
        .await
    }

    /// Resolves (when needed) and fetches one artifact, verified.
    ///
    /// Name targets search `EngineConfig::search_order`. Re-running a
    /// request whose destination already holds the correct bytes is a
    /// no-op returning [`OutcomeStatus::Skipped`].
    ///
    /// [`OutcomeStatus::Skipped`]: crate::OutcomeStatus::Skipped
    pub async fn resolve_and_fetch(
        &self,
        request: RetrievalRequest,
    ) -> Result<RetrievalOutcome, EngineError> {
        retrieve::run(
            &self.client,
            &self.discovery,
            self.progress.as_ref(),
            &self.config.search_order,
            request,
        )
        .await
    }

    /// Lists the artifacts published for one release partition.
    pub async fn list_release_images(&self, release: &ReleaseId) -> Result<Vec<Artifact>, EngineError> {
        Ok(self.client.list_release_images(release).await?)
    }

    /// Lists the artifacts in a named content-set grouping.
    pub async fn list_content_set(&self, set_id: &str) -> Result<Vec<Artifact>, EngineError> {
        Ok(self.client.list_content_set(set_id).await?)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
