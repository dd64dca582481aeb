//! The per-source polling loop.
//!
//! Each loop runs an immediate first cycle, then one cycle per interval
//! elapse, forever. A cycle is fetch, then (only on fetch success) upsert.
//! Per-cycle failures are classified, reported, and swallowed: the fixed
//! interval itself is the retry delay. Cancellation is observed at the loop
//! top and while waiting for the next tick; a cycle already in progress is
//! allowed to finish.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use docshelf_scraper::Scraper;

use crate::outcome::{OutcomeSink, SyncOutcome};
use crate::store::DocumentStore;

/// Poll one source until cancellation.
pub(crate) async fn poll_source(
    scraper: Arc<dyn Scraper>,
    store: Arc<dyn DocumentStore>,
    interval: Duration,
    cancel: CancellationToken,
    sink: Arc<dyn OutcomeSink>,
) {
    if cancel.is_cancelled() {
        return;
    }

    run_cycle(&*scraper, &*store, &cancel, &*sink).await;

    // Ticks that would land while a cycle is still running are delayed, not
    // burst, so cycles for one source stay strictly sequential.
    let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                debug!(source = scraper.name(), "sync loop cancelled");
                return;
            }
            _ = ticker.tick() => {
                run_cycle(&*scraper, &*store, &cancel, &*sink).await;
            }
        }
    }
}

/// One fetch-and-persist cycle. Never fails; the outcome goes to the sink.
async fn run_cycle(
    scraper: &dyn Scraper,
    store: &dyn DocumentStore,
    cancel: &CancellationToken,
    sink: &dyn OutcomeSink,
) {
    let outcome = match scraper.scrape(cancel).await {
        Err(error) => SyncOutcome::FetchFailed { error },
        Ok(content) => {
            match store
                .upsert_document(scraper.name(), &content, Utc::now())
                .await
            {
                Err(error) => SyncOutcome::PersistFailed { error },
                Ok(()) => SyncOutcome::Success {
                    bytes: content.len(),
                },
            }
        }
    };

    sink.report(scraper.name(), &outcome);
}
