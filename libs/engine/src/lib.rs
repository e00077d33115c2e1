//! # imgvault-engine
//!
//! Discovery, resolution, and verified retrieval of catalog images.
//!
//! The engine turns "give me this image" into a checksum-verified file on
//! disk, unattended and idempotently:
//!
//! - **Discovery**: which releases currently exist, probed at runtime
//!   with a baseline-plus-frontier strategy instead of a hardcoded table.
//! - **Resolution**: a human filename searched across releases
//!   newest-first, stopping at the first release that carries it.
//! - **Retrieval**: checksum-keyed fetch to a temporary path, SHA-256
//!   verification, atomic placement, and cleanup of anything that fails
//!   verification.
//!
//! A [`Session`] owns the per-run state (cached bearer token, discovery
//! cache) and is the entry point for all of the above.
//!
//! # Invariants
//!
//! - A filename is never trusted as content identity; every retrieval is
//!   checksum-keyed before bytes move
//! - A re-run against an already-correct file performs no byte transfer
//! - A failed verification never leaves the mismatched file or a partial
//!   temp file behind

mod checksum;
mod discover;
mod error;
mod progress;
mod resolve;
mod retrieve;
mod session;

pub use checksum::sha256_file;
pub use discover::{Discovery, DiscoveryConfig};
pub use error::EngineError;
pub use progress::{Event, NoopProgress, Progress};
pub use retrieve::{OutcomeStatus, RetrievalOutcome, RetrievalRequest, Target};
pub use session::{EngineConfig, Session};

pub use imgvault_catalog::{CatalogConfig, CatalogError, DownloadHandle};
pub use imgvault_types::{Architecture, Artifact, Checksum, ReleaseId};
