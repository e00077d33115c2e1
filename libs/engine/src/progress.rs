//! Progress reporting for interactive callers.
//!
//! Reporting is an observable side effect only: sinks see what the engine
//! is doing but can never influence resolution or retrieval outcomes.

use imgvault_types::ReleaseId;

/// A progress notification from the engine.
#[derive(Debug, Clone)]
pub enum Event {
    /// A release was listed while searching for a filename.
    ReleaseProbed { release: ReleaseId, matched: bool },

    /// A byte transfer began. `total` is the content length when known.
    TransferStarted { filename: String, total: Option<u64> },

    /// Cumulative bytes written so far for the current transfer.
    Transferred { bytes: u64 },

    /// The artifact verified clean and was moved into place.
    Verified { filename: String },
}

/// A sink for progress events.
///
/// Implementations must be cheap and non-blocking; they are called from
/// the retrieval hot path.
pub trait Progress: Send + Sync {
    fn on_event(&self, event: Event);
}

/// Discards all events. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl Progress for NoopProgress {
    fn on_event(&self, _event: Event) {}
}
