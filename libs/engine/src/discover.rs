//! Release discovery: baseline-plus-frontier probing.
//!
//! The catalog has no "list all releases" endpoint, and hardcoding a
//! release table means a stale tool every time a release ships. Instead,
//! discovery probes: a seeded baseline of known-plausible releases
//! establishes the floor, then bounded lookahead past the highest known
//! major and minor finds anything newer. Catalogs grow append-only and
//! densely near the frontier, so the first empty probe on an axis marks
//! the frontier and stops the walk.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::Mutex;

use imgvault_catalog::CatalogClient;
use imgvault_types::{cmp_newest_first, Architecture, ReleaseId};

use crate::EngineError;

/// Tuning for the probing strategy.
///
/// The baseline seed and lookahead bounds track the catalog's release
/// cadence; they are empirical, not correctness-critical. A too-small
/// lookahead misses a release until the baseline is refreshed, a
/// too-large one wastes a few empty probes.
#[derive(Debug, Clone)]
pub struct DiscoveryConfig {
    /// Known-plausible releases: `(major, minors)` pairs, probed as-is.
    pub baseline: Vec<(u32, Vec<u32>)>,

    /// How many candidate majors to probe past the highest baseline major.
    pub major_lookahead: u32,

    /// How many minors to probe past the highest confirmed minor of a major.
    pub minor_lookahead: u32,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            baseline: vec![(10, vec![0]), (9, vec![6, 5, 4]), (8, vec![10, 9, 8])],
            major_lookahead: 4,
            minor_lookahead: 4,
        }
    }
}

/// Discovers and caches the releases that currently exist per architecture.
///
/// The cache lives for the session: the catalog is assumed stable within
/// one run, so an architecture is probed once and served from memory
/// afterwards. Population holds the cache lock, which serializes
/// concurrent discovery and keeps redundant probe storms out.
#[derive(Debug)]
pub struct Discovery {
    client: Arc<CatalogClient>,
    config: DiscoveryConfig,
    cache: Mutex<HashMap<Architecture, Arc<[ReleaseId]>>>,
}

impl Discovery {
    /// Creates a discovery engine over the given client.
    pub fn new(client: Arc<CatalogClient>, config: DiscoveryConfig) -> Self {
        Self {
            client,
            config,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the releases that currently have at least one artifact for
    /// `arch`, sorted strictly descending by `(major, minor)`.
    ///
    /// The first call per architecture probes the catalog; later calls
    /// are served from the session cache with no network activity.
    pub async fn discover(&self, arch: Architecture) -> Result<Arc<[ReleaseId]>, EngineError> {
        let mut cache = self.cache.lock().await;

        if let Some(releases) = cache.get(&arch) {
            return Ok(Arc::clone(releases));
        }

        let releases = self.probe_architecture(arch).await?;
        tracing::info!(%arch, count = releases.len(), "discovered releases");

        let releases: Arc<[ReleaseId]> = releases.into();
        cache.insert(arch, Arc::clone(&releases));
        Ok(releases)
    }

    /// Runs the full baseline + frontier probe for one architecture.
    async fn probe_architecture(&self, arch: Architecture) -> Result<Vec<ReleaseId>, EngineError> {
        let mut found: HashSet<(u32, u32)> = HashSet::new();

        // Baseline: seeded releases that are expected to exist today.
        for (major, minors) in &self.config.baseline {
            for &minor in minors {
                if self.probe(*major, minor, arch).await? {
                    found.insert((*major, minor));
                }
            }
        }

        // Major frontier: walk `.0` of successive majors past the highest
        // seeded one; the first gap is the frontier.
        let highest_major = self
            .config
            .baseline
            .iter()
            .map(|(major, _)| *major)
            .max()
            .unwrap_or(0);
        for major in highest_major + 1..=highest_major + self.config.major_lookahead {
            if !self.probe(major, 0, arch).await? {
                break;
            }
            found.insert((major, 0));

            // A fresh major may already carry point releases.
            for minor in 1..=self.config.minor_lookahead {
                if !self.probe(major, minor, arch).await? {
                    break;
                }
                found.insert((major, minor));
            }
        }

        // Minor frontier: for each confirmed baseline major, walk past its
        // highest confirmed minor. Newly discovered majors had their minor
        // walk above.
        let confirmed_majors: Vec<u32> = self
            .config
            .baseline
            .iter()
            .map(|(major, _)| *major)
            .filter(|major| found.iter().any(|(m, _)| m == major))
            .collect();
        for major in confirmed_majors {
            let highest_minor = found
                .iter()
                .filter(|(m, _)| *m == major)
                .map(|(_, minor)| *minor)
                .max()
                .unwrap_or(0);
            for minor in highest_minor + 1..=highest_minor + self.config.minor_lookahead {
                if !self.probe(major, minor, arch).await? {
                    break;
                }
                found.insert((major, minor));
            }
        }

        let mut releases: Vec<ReleaseId> = found
            .into_iter()
            .map(|(major, minor)| ReleaseId::new(major, minor, arch))
            .collect();
        releases.sort_unstable_by(cmp_newest_first);

        Ok(releases)
    }

    /// Probes one release for existence.
    ///
    /// An empty artifact list (or 404) means "absent", which is the
    /// normal negative outcome. A failed probe is infrastructure trouble
    /// and escalates: reading it as absence would silently truncate the
    /// release set.
    async fn probe(&self, major: u32, minor: u32, arch: Architecture) -> Result<bool, EngineError> {
        let release = ReleaseId::new(major, minor, arch);
        let artifacts = self
            .client
            .list_release_images(&release)
            .await
            .map_err(|e| EngineError::discovery(&release, e))?;

        let exists = !artifacts.is_empty();
        tracing::debug!(%release, exists, "probed release");
        Ok(exists)
    }
}
