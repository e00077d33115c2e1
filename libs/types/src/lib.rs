//! # imgvault-types
//!
//! Typed domain values for the imgvault retrieval engine.
//!
//! ## Design Principles
//!
//! - Checksums identify content; filenames are mutable labels and are
//!   never trusted as a content identity
//! - All values have a canonical string representation with strict parsing
//! - Values support roundtrip serialization (parse → format → parse)
//! - Release identifiers are recomputed each run, never persisted

mod artifact;
mod error;
mod types;

pub use artifact::Artifact;
pub use error::TypesError;
pub use types::{cmp_newest_first, Architecture, Checksum, ReleaseId};
