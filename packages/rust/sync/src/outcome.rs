//! Sync cycle outcomes and the reporting sink they flow into.

use docshelf_shared::DocshelfError;
use tracing::{info, warn};

/// The classified result of one fetch-and-persist cycle.
///
/// Outcomes exist only for reporting; they are never stored and never
/// escalate out of the polling loop.
#[derive(Debug)]
pub enum SyncOutcome {
    /// Content was fetched and persisted.
    Success {
        /// Size of the persisted content in bytes.
        bytes: usize,
    },
    /// Retrieving content from the source failed; nothing was persisted.
    FetchFailed { error: DocshelfError },
    /// Content was fetched but writing it to the store failed; the fetched
    /// content is discarded and re-fetched on the next tick.
    PersistFailed { error: DocshelfError },
}

impl SyncOutcome {
    /// Stable kind label for structured logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::FetchFailed { .. } => "fetch-error",
            Self::PersistFailed { .. } => "persist-error",
        }
    }
}

/// Where cycle outcomes are reported.
///
/// Constructed explicitly and handed to the supervisor; loops hold no global
/// logging state.
pub trait OutcomeSink: Send + Sync {
    /// Report the outcome of one cycle for `source`.
    fn report(&self, source: &str, outcome: &SyncOutcome);
}

/// Outcome sink that writes tracing events.
pub struct LogSink;

impl OutcomeSink for LogSink {
    fn report(&self, source: &str, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Success { bytes } => {
                info!(source, bytes, "scraped source");
            }
            SyncOutcome::FetchFailed { error } => {
                warn!(source, error = %error, "scrape failed");
            }
            SyncOutcome::PersistFailed { error } => {
                warn!(source, error = %error, "persist failed");
            }
        }
    }
}
