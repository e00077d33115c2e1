//! Catalog artifact descriptions.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::{Architecture, Checksum};

/// One downloadable file description within a release or content-set.
///
/// Produced by catalog list queries and immutable once constructed. The
/// `checksum` is the content identity; `filename` is a human label that
/// may move between releases over time.
#[derive(Debug, Clone, Deserialize)]
pub struct Artifact {
    /// Human-readable display name, e.g. "Red Hat Enterprise Linux 9.6 Boot ISO".
    #[serde(rename = "imageName")]
    pub image_name: String,

    /// Exact filename as published, e.g. "rhel-9.6-x86_64-boot.iso".
    pub filename: String,

    /// Architecture the artifact was built for.
    pub arch: Architecture,

    /// SHA-256 checksum of the artifact bytes.
    pub checksum: Checksum,

    /// Publication timestamp; used to break duplicate-filename ties.
    #[serde(rename = "datePublished")]
    pub date_published: DateTime<Utc>,

    /// Opaque download reference returned by the catalog.
    #[serde(rename = "downloadHref", default)]
    pub download_href: Option<String>,
}
