//! Core domain values: architectures, release identifiers, checksums.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TypesError;

// =============================================================================
// Architecture
// =============================================================================

/// A CPU architecture the catalog partitions releases by.
///
/// The wire spellings are the catalog's own (`x86_64`, `aarch64`, ...);
/// anything else is a parse error rather than a silent passthrough.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Architecture {
    #[serde(rename = "x86_64")]
    X86_64,
    #[serde(rename = "aarch64")]
    Aarch64,
    #[serde(rename = "ppc64le")]
    Ppc64le,
    #[serde(rename = "s390x")]
    S390x,
}

impl Architecture {
    /// All architectures the catalog serves, most common first.
    pub const ALL: [Architecture; 4] = [
        Architecture::X86_64,
        Architecture::Aarch64,
        Architecture::Ppc64le,
        Architecture::S390x,
    ];

    /// Returns the catalog wire spelling.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::X86_64 => "x86_64",
            Self::Aarch64 => "aarch64",
            Self::Ppc64le => "ppc64le",
            Self::S390x => "s390x",
        }
    }
}

impl fmt::Display for Architecture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Architecture {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Err(TypesError::Empty),
            "x86_64" => Ok(Self::X86_64),
            "aarch64" => Ok(Self::Aarch64),
            "ppc64le" => Ok(Self::Ppc64le),
            "s390x" => Ok(Self::S390x),
            other => Err(TypesError::UnknownArchitecture(other.to_string())),
        }
    }
}

// =============================================================================
// ReleaseId
// =============================================================================

/// A `(major, minor, architecture)` tuple addressing a catalog partition.
///
/// Immutable value with structural equality. Release identifiers are
/// discovered at runtime and never persisted; a fresh run re-discovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReleaseId {
    pub major: u32,
    pub minor: u32,
    pub arch: Architecture,
}

impl ReleaseId {
    /// Creates a release identifier.
    #[must_use]
    pub const fn new(major: u32, minor: u32, arch: Architecture) -> Self {
        Self { major, minor, arch }
    }

    /// Parses a `{major}.{minor}` version string for the given architecture.
    pub fn from_version(version: &str, arch: Architecture) -> Result<Self, TypesError> {
        if version.is_empty() {
            return Err(TypesError::Empty);
        }

        let Some((major, minor)) = version.split_once('.') else {
            return Err(TypesError::release(version, "missing '.' separator"));
        };

        let major = major
            .parse::<u32>()
            .map_err(|_| TypesError::release(version, "major is not a number"))?;
        let minor = minor
            .parse::<u32>()
            .map_err(|_| TypesError::release(version, "minor is not a number"))?;

        Ok(Self { major, minor, arch })
    }

    /// Returns the `{major}.{minor}` version string the catalog expects.
    #[must_use]
    pub fn version(&self) -> String {
        format!("{}.{}", self.major, self.minor)
    }
}

impl fmt::Display for ReleaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} ({})", self.major, self.minor, self.arch)
    }
}

/// Orders release identifiers newest-first by `(major, minor)`.
///
/// Exposed as an explicit comparator instead of an `Ord` impl so sorted
/// collections read as "newest first" at the call site rather than relying
/// on an inverted ordering.
#[must_use]
pub fn cmp_newest_first(a: &ReleaseId, b: &ReleaseId) -> Ordering {
    (b.major, b.minor).cmp(&(a.major, a.minor))
}

// =============================================================================
// Checksum
// =============================================================================

/// A SHA-256 content checksum: 64 lowercase hexadecimal characters.
///
/// The checksum is the only content identity the engine trusts. Uppercase
/// input is normalized; wrong length or non-hex input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Checksum(String);

impl Checksum {
    /// Parses and validates a checksum string.
    pub fn parse(s: &str) -> Result<Self, TypesError> {
        if s.is_empty() {
            return Err(TypesError::Empty);
        }
        if s.len() != 64 {
            return Err(TypesError::checksum(format!(
                "expected 64 hex characters, got {}",
                s.len()
            )));
        }
        if !s.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypesError::checksum("non-hexadecimal character"));
        }

        Ok(Self(s.to_ascii_lowercase()))
    }

    /// Constructs a checksum from a raw SHA-256 digest.
    #[must_use]
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        Self(hex::encode(digest))
    }

    /// Returns the lowercase hex string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Checksum {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Checksum {
    type Error = TypesError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Checksum> for String {
    fn from(c: Checksum) -> Self {
        c.0
    }
}
