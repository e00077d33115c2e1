//! Error taxonomy for the retrieval engine.

use std::path::PathBuf;

use thiserror::Error;

use imgvault_catalog::CatalogError;
use imgvault_types::{Architecture, Checksum, ReleaseId};

/// Errors raised by discovery, resolution, and retrieval.
///
/// Authentication and checksum-mismatch conditions are never retried by
/// the engine; transient transport failures are retried inside the
/// catalog client and surface here only after the budget is spent.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Catalog access failed (authentication, API, transport).
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// No release in any probed architecture carries the filename.
    #[error("no catalog image found with filename '{filename}'")]
    NotFound { filename: String },

    /// Downloaded bytes do not hash to the expected checksum. The
    /// mismatched artifact has already been deleted when this is raised.
    #[error("checksum mismatch for {path}: expected {expected}, got {actual}")]
    ChecksumMismatch {
        expected: Checksum,
        actual: Checksum,
        path: PathBuf,
    },

    /// A discovery probe failed for infrastructure reasons. Distinct from
    /// "release absent": an empty list is normal, a failed probe is not,
    /// and treating it as absence would silently under-report releases.
    #[error("discovery probe for {major}.{minor} ({arch}) failed: {source}")]
    Discovery {
        major: u32,
        minor: u32,
        arch: Architecture,
        source: CatalogError,
    },

    /// The caller's deadline expired mid-transfer; the partial file has
    /// been removed.
    #[error("transfer of '{filename}' cancelled by deadline")]
    Cancelled { filename: String },

    /// Local filesystem failure.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    pub(crate) fn discovery(release: &ReleaseId, source: CatalogError) -> Self {
        Self::Discovery {
            major: release.major,
            minor: release.minor,
            arch: release.arch,
            source,
        }
    }
}
