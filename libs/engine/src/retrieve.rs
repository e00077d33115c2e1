//! Verified retrieval: fetch, verify, place atomically.
//!
//! The retrieval flow is a small state machine:
//!
//! ```text
//! Idle → Resolving → Fetching → Verifying → Done
//!                  ↘ (already correct on disk) → Done (Skipped)
//!                               ↘ Remediating → error surfaced
//! ```
//!
//! Idempotence comes from the pre-check: a destination file that already
//! hashes to the expected checksum short-circuits the whole flow with no
//! byte transfer. Self-healing comes from remediation: anything that
//! fails verification is deleted before the error is surfaced, so no
//! corrupt artifact survives to fool a later pre-check.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use tokio::fs;
use tokio::io::AsyncWriteExt;

use imgvault_catalog::{CatalogClient, CatalogError, DownloadHandle};
use imgvault_types::{Architecture, Checksum};

use crate::checksum::sha256_file;
use crate::progress::{Event, Progress};
use crate::resolve::resolve_filename;
use crate::{Discovery, EngineError};

/// What a retrieval is keyed by.
#[derive(Debug, Clone)]
pub enum Target {
    /// Immutable content identity; fetched directly.
    Hash(Checksum),

    /// Mutable human name; resolved to a checksum before any bytes move.
    Name(String),
}

/// One retrieval request. Consumed by [`Session::resolve_and_fetch`].
///
/// [`Session::resolve_and_fetch`]: crate::Session::resolve_and_fetch
#[derive(Debug, Clone)]
pub struct RetrievalRequest {
    pub target: Target,

    /// Directory the final artifact lands in.
    pub dest_dir: PathBuf,

    /// Fetch even when a matching file already exists.
    pub overwrite: bool,

    /// Destination-name hint for `Hash` targets; `Name` targets always
    /// write to their resolved filename.
    pub filename: Option<String>,

    /// Overall transfer deadline. On expiry the partial file is removed
    /// and the request fails with [`EngineError::Cancelled`].
    pub deadline: Option<Duration>,
}

impl RetrievalRequest {
    /// Request keyed by content hash.
    pub fn for_hash(checksum: Checksum, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Hash(checksum),
            dest_dir: dest_dir.into(),
            overwrite: false,
            filename: None,
            deadline: None,
        }
    }

    /// Request keyed by published filename.
    pub fn for_name(filename: impl Into<String>, dest_dir: impl Into<PathBuf>) -> Self {
        Self {
            target: Target::Name(filename.into()),
            dest_dir: dest_dir.into(),
            overwrite: false,
            filename: None,
            deadline: None,
        }
    }
}

/// Terminal status of a retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Bytes were fetched and verified into a fresh file.
    Downloaded,

    /// The destination already held a checksum-matching file; no
    /// transfer occurred.
    Skipped,

    /// A forced re-fetch (`overwrite`) replaced a previously-mismatched
    /// file with verified bytes.
    Verified,

    /// Recorded by orchestrators when a retrieval raised an error; the
    /// engine itself surfaces errors as `Err`, never as an outcome.
    Failed,
}

/// Result of a completed retrieval.
#[derive(Debug, Clone)]
pub struct RetrievalOutcome {
    pub status: OutcomeStatus,

    /// Final destination filename.
    pub filename: String,

    /// Bytes transferred; `None` when no transfer occurred.
    pub bytes_written: Option<u64>,
}

impl RetrievalOutcome {
    /// Outcome row for a retrieval that raised an error.
    #[must_use]
    pub fn failed(filename: impl Into<String>) -> Self {
        Self {
            status: OutcomeStatus::Failed,
            filename: filename.into(),
            bytes_written: None,
        }
    }
}

/// State of the destination path relative to the expected checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Existing {
    Absent,
    Matching,
    Mismatched,
}

/// Runs one retrieval to completion.
pub(crate) async fn run(
    client: &CatalogClient,
    discovery: &Discovery,
    progress: &dyn Progress,
    search_order: &[Architecture],
    request: RetrievalRequest,
) -> Result<RetrievalOutcome, EngineError> {
    // Resolving: every retrieval becomes checksum-keyed before bytes move.
    let (expected, mut filename) = match &request.target {
        Target::Name(name) => {
            let artifact =
                resolve_filename(client, discovery, progress, name, search_order).await?;
            (artifact.checksum, Some(artifact.filename))
        }
        Target::Hash(sum) => (sum.clone(), request.filename.clone()),
    };

    // Idempotence pre-check when the destination name is already known.
    let mut existing = Existing::Absent;
    if let Some(name) = filename.as_deref() {
        existing = inspect(&request.dest_dir.join(name), &expected).await?;
        if existing == Existing::Matching && !request.overwrite {
            tracing::info!(name, "destination already verified, skipping transfer");
            return Ok(RetrievalOutcome {
                status: OutcomeStatus::Skipped,
                filename: name.to_string(),
                bytes_written: None,
            });
        }
    }

    // Fetching, step one: resolve the download indirection.
    let handle = client.download_handle(&expected).await?;

    // A hash-keyed request learns its filename from the handle; re-run
    // the pre-check now that the destination is known.
    if filename.is_none() {
        let name = handle
            .filename
            .clone()
            .unwrap_or_else(|| generic_name(&expected));
        existing = inspect(&request.dest_dir.join(&name), &expected).await?;
        if existing == Existing::Matching && !request.overwrite {
            tracing::info!(name, "destination already verified, skipping transfer");
            return Ok(RetrievalOutcome {
                status: OutcomeStatus::Skipped,
                filename: name,
                bytes_written: None,
            });
        }
        filename = Some(name);
    }
    let filename = filename.unwrap_or_else(|| generic_name(&expected));

    let final_path = request.dest_dir.join(&filename);
    let part_path = request.dest_dir.join(format!("{filename}.part"));
    fs::create_dir_all(&request.dest_dir).await?;

    // Fetching, step two: stream bytes to the temporary path.
    let bytes = match transfer_with_deadline(
        client,
        &handle,
        &part_path,
        progress,
        &filename,
        request.deadline,
    )
    .await
    {
        Ok(bytes) => bytes,
        Err(err) => {
            let _ = fs::remove_file(&part_path).await;
            return Err(err);
        }
    };

    // Verifying.
    let actual = sha256_file(&part_path).await?;
    if actual != expected {
        // Remediating: nothing corrupt survives, and no automatic
        // re-fetch either. The caller decides whether a retry is wise or
        // whether the catalog itself needs investigating.
        let _ = fs::remove_file(&part_path).await;
        if existing == Existing::Mismatched {
            let _ = fs::remove_file(&final_path).await;
        }
        tracing::warn!(%expected, %actual, path = %final_path.display(), "checksum mismatch, artifact removed");
        return Err(EngineError::ChecksumMismatch {
            expected,
            actual,
            path: final_path,
        });
    }

    // Atomic placement; the temp path is in the destination directory so
    // the rename cannot cross filesystems.
    fs::rename(&part_path, &final_path).await?;
    progress.on_event(Event::Verified {
        filename: filename.clone(),
    });

    let status = if existing == Existing::Mismatched && request.overwrite {
        OutcomeStatus::Verified
    } else {
        OutcomeStatus::Downloaded
    };
    tracing::info!(filename, bytes, ?status, "retrieval complete");

    Ok(RetrievalOutcome {
        status,
        filename,
        bytes_written: Some(bytes),
    })
}

/// Hashes the destination when present.
async fn inspect(path: &Path, expected: &Checksum) -> Result<Existing, EngineError> {
    if !fs::try_exists(path).await? {
        return Ok(Existing::Absent);
    }
    let actual = sha256_file(path).await?;
    if actual == *expected {
        Ok(Existing::Matching)
    } else {
        Ok(Existing::Mismatched)
    }
}

async fn transfer_with_deadline(
    client: &CatalogClient,
    handle: &DownloadHandle,
    part_path: &Path,
    progress: &dyn Progress,
    filename: &str,
    deadline: Option<Duration>,
) -> Result<u64, EngineError> {
    let transfer = transfer(client, handle, part_path, progress, filename);

    match deadline {
        Some(deadline) => match tokio::time::timeout(deadline, transfer).await {
            Ok(result) => result,
            Err(_elapsed) => Err(EngineError::Cancelled {
                filename: filename.to_string(),
            }),
        },
        None => transfer.await,
    }
}

/// Streams the handle's bytes to the temporary path.
async fn transfer(
    client: &CatalogClient,
    handle: &DownloadHandle,
    part_path: &Path,
    progress: &dyn Progress,
    filename: &str,
) -> Result<u64, EngineError> {
    let response = client.open_stream(handle).await?;
    progress.on_event(Event::TransferStarted {
        filename: filename.to_string(),
        total: response.content_length(),
    });

    let mut file = fs::File::create(part_path).await?;
    let mut stream = response.bytes_stream();
    let mut bytes = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk =
            chunk.map_err(|e| CatalogError::transient(1, format!("byte transfer: {e}")))?;
        file.write_all(&chunk).await?;
        bytes += chunk.len() as u64;
        progress.on_event(Event::Transferred { bytes });
    }

    file.flush().await?;
    Ok(bytes)
}

/// Destination name for a hash-keyed retrieval when the catalog reports
/// no filename.
fn generic_name(checksum: &Checksum) -> String {
    format!("sha-{}.img", &checksum.as_str()[..12])
}
