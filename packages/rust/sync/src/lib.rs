//! The docshelf sync pipeline: per-source polling loops and their supervisor.
//!
//! One loop per configured source repeatedly fetches current content and
//! upserts it into storage at a fixed interval. Loops are fully independent:
//! a failing source never stops, delays, or otherwise affects the others.
//! A single shared [`CancellationToken`] stops every loop cooperatively.
//!
//! [`CancellationToken`]: tokio_util::sync::CancellationToken

mod outcome;
mod scheduler;
mod store;
mod supervisor;

#[cfg(test)]
pub(crate) mod testing;

pub use outcome::{LogSink, OutcomeSink, SyncOutcome};
pub use store::DocumentStore;
pub use supervisor::Supervisor;
