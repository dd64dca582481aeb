//! Fan-out of one polling loop per source, joined as a unit.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use docshelf_scraper::Scraper;
use docshelf_shared::{DocshelfError, Result};

use crate::outcome::OutcomeSink;
use crate::scheduler::poll_source;
use crate::store::DocumentStore;

/// Runs one independent polling loop per source, all sharing one store, one
/// interval, one outcome sink, and one cancellation signal.
pub struct Supervisor {
    scrapers: Vec<Arc<dyn Scraper>>,
    store: Arc<dyn DocumentStore>,
    interval: Duration,
    sink: Arc<dyn OutcomeSink>,
}

impl Supervisor {
    /// Create a supervisor over the given scrapers.
    ///
    /// Fails on configuration faults: a zero interval, or two scrapers
    /// feeding the same document name (the stored document would be
    /// overwritten nondeterministically).
    pub fn new(
        scrapers: Vec<Arc<dyn Scraper>>,
        store: Arc<dyn DocumentStore>,
        interval: Duration,
        sink: Arc<dyn OutcomeSink>,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(DocshelfError::config(
                "polling interval must be greater than zero",
            ));
        }

        let mut seen = HashSet::new();
        for scraper in &scrapers {
            if !seen.insert(scraper.name().to_string()) {
                return Err(DocshelfError::config(format!(
                    "duplicate source name '{}'",
                    scraper.name()
                )));
            }
        }

        Ok(Self {
            scrapers,
            store,
            interval,
            sink,
        })
    }

    /// Run all polling loops until `cancel` fires and every loop has exited.
    ///
    /// This blocks until the last loop is done: cancellation lets an
    /// in-flight cycle finish before its loop stops. Steady-state fetch or
    /// persist failures never surface here; they only reach the outcome sink.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        if self.scrapers.is_empty() {
            warn!("no sources configured, nothing to sync");
            return Ok(());
        }

        info!(
            sources = self.scrapers.len(),
            interval_secs = self.interval.as_secs(),
            "starting sync loops"
        );

        let mut handles = Vec::with_capacity(self.scrapers.len());
        for scraper in &self.scrapers {
            handles.push(tokio::spawn(poll_source(
                scraper.clone(),
                self.store.clone(),
                self.interval,
                cancel.clone(),
                self.sink.clone(),
            )));
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!(error = %e, "sync loop ended abnormally");
            }
        }

        info!("all sync loops stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MemoryStore, RecordingSink, ScriptedScraper};

    struct Harness {
        store: Arc<MemoryStore>,
        sink: Arc<RecordingSink>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                store: Arc::new(MemoryStore::new()),
                sink: Arc::new(RecordingSink::new()),
            }
        }

        fn failing_store() -> Self {
            Self {
                store: Arc::new(MemoryStore::failing()),
                sink: Arc::new(RecordingSink::new()),
            }
        }

        fn supervisor(
            &self,
            scrapers: Vec<Arc<dyn Scraper>>,
            interval: Duration,
        ) -> Supervisor {
            Supervisor::new(scrapers, self.store.clone(), interval, self.sink.clone())
                .expect("construct supervisor")
        }
    }

    /// Spawn `run`, let virtual time pass, cancel, and wait for the join
    /// barrier.
    async fn run_for(supervisor: Supervisor, cancel: CancellationToken, elapse: Duration) {
        let run_cancel = cancel.clone();
        let handle = tokio::spawn(async move { supervisor.run(run_cancel).await });
        tokio::time::sleep(elapse).await;
        cancel.cancel();
        handle.await.expect("join run").expect("run returns ok");
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_first_cycle_per_source() {
        let harness = Harness::new();
        let a = Arc::new(ScriptedScraper::new("a"));
        let b = Arc::new(ScriptedScraper::new("b"));

        // Interval far beyond the test horizon: only immediate cycles can run.
        let supervisor =
            harness.supervisor(vec![a.clone(), b.clone()], Duration::from_secs(3600));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(50)).await;

        assert_eq!(a.calls(), 1);
        assert_eq!(b.calls(), 1);
        assert_eq!(harness.store.len(), 2);
        assert_eq!(harness.sink.kinds_for("a"), vec!["success"]);
        assert_eq!(harness.sink.kinds_for("b"), vec!["success"]);
    }

    #[tokio::test(start_paused = true)]
    async fn fetch_failures_skip_persist_and_keep_ticking() {
        let harness = Harness::new();
        let scraper = Arc::new(ScriptedScraper::failing("flaky"));

        let supervisor = harness.supervisor(vec![scraper.clone()], Duration::from_millis(10));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(45)).await;

        // Immediate cycle plus ticks at 10/20/30/40ms.
        assert_eq!(scraper.calls(), 5);
        assert_eq!(harness.store.upserts(), 0);
        assert_eq!(harness.store.len(), 0);
        assert!(
            harness
                .sink
                .kinds_for("flaky")
                .iter()
                .all(|kind| *kind == "fetch-error")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn success_reports_persisted_byte_count() {
        let harness = Harness::new();
        let scraper =
            Arc::new(ScriptedScraper::new("docs").with_script(vec![Ok(b"abcde".to_vec())]));

        let supervisor = harness.supervisor(vec![scraper], Duration::from_secs(3600));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(50)).await;

        assert_eq!(
            harness.sink.events(),
            vec![("docs".to_string(), "success", Some(5))]
        );
        assert_eq!(harness.store.get("docs").as_deref(), Some(b"abcde".as_slice()));
    }

    #[tokio::test(start_paused = true)]
    async fn persist_failures_are_reported_and_loop_continues() {
        let harness = Harness::failing_store();
        let scraper = Arc::new(ScriptedScraper::new("docs"));

        let supervisor = harness.supervisor(vec![scraper.clone()], Duration::from_millis(10));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(25)).await;

        assert!(scraper.calls() >= 2);
        assert!(
            harness
                .sink
                .kinds_for("docs")
                .iter()
                .all(|kind| *kind == "persist-error")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn scripted_outcome_sequence() {
        let harness = Harness::new();
        let scraper = Arc::new(ScriptedScraper::new("a").with_script(vec![
            Ok(b"x".to_vec()),
            Err("remote unavailable".into()),
            Ok(b"yz".to_vec()),
        ]));

        let supervisor = harness.supervisor(vec![scraper.clone()], Duration::from_millis(10));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(25)).await;

        // Cycles at 0/10/20ms, cancelled before the 30ms tick.
        assert_eq!(scraper.calls(), 3);
        assert_eq!(scraper.overlaps(), 0);
        assert_eq!(
            harness.sink.events(),
            vec![
                ("a".to_string(), "success", Some(1)),
                ("a".to_string(), "fetch-error", None),
                ("a".to_string(), "success", Some(2)),
            ]
        );
        assert_eq!(harness.store.get("a").as_deref(), Some(b"yz".as_slice()));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_before_start_runs_no_cycles() {
        let harness = Harness::new();
        let scraper = Arc::new(ScriptedScraper::new("docs"));

        let supervisor = harness.supervisor(vec![scraper.clone()], Duration::from_millis(10));
        let cancel = CancellationToken::new();
        cancel.cancel();
        supervisor.run(cancel).await.expect("run");

        assert_eq!(scraper.calls(), 0);
        assert!(harness.sink.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn slow_source_does_not_delay_others() {
        let harness = Harness::new();
        // Source "slow" spends far longer fetching than the whole test horizon.
        let slow = Arc::new(
            ScriptedScraper::new("slow").with_delay(Duration::from_secs(10)),
        );
        let fast = Arc::new(ScriptedScraper::new("fast"));

        let supervisor =
            harness.supervisor(vec![slow.clone(), fast.clone()], Duration::from_millis(10));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(95)).await;

        // The fast loop kept its cadence while the slow one sat in one cycle.
        assert_eq!(slow.calls(), 1);
        assert!(fast.calls() >= 5, "fast source made {} cycles", fast.calls());

        // The join barrier let the slow in-flight cycle finish and persist.
        assert!(harness.store.get("slow").is_some());
        assert!(harness.store.get("fast").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_for_one_source_never_overlap() {
        let harness = Harness::new();
        // Each cycle takes three intervals; delayed ticks must not pile up.
        let scraper = Arc::new(
            ScriptedScraper::new("docs").with_delay(Duration::from_millis(30)),
        );

        let supervisor = harness.supervisor(vec![scraper.clone()], Duration::from_millis(10));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(200)).await;

        assert!(scraper.calls() >= 3);
        assert_eq!(scraper.overlaps(), 0);
    }

    #[tokio::test]
    async fn run_with_no_sources_returns_immediately() {
        let harness = Harness::new();
        let supervisor = harness.supervisor(Vec::new(), Duration::from_millis(10));
        supervisor.run(CancellationToken::new()).await.expect("run");
        assert!(harness.sink.events().is_empty());
    }

    #[test]
    fn construction_rejects_zero_interval() {
        let harness = Harness::new();
        let err = Supervisor::new(
            Vec::new(),
            harness.store.clone(),
            Duration::ZERO,
            harness.sink.clone(),
        )
        .err()
        .expect("zero interval rejected");
        assert!(err.to_string().contains("interval"));
    }

    #[test]
    fn construction_rejects_duplicate_names() {
        let harness = Harness::new();
        let scrapers: Vec<Arc<dyn Scraper>> = vec![
            Arc::new(ScriptedScraper::new("docs")),
            Arc::new(ScriptedScraper::new("docs")),
        ];
        let err = Supervisor::new(
            scrapers,
            harness.store.clone(),
            Duration::from_secs(1),
            harness.sink.clone(),
        )
        .err()
        .expect("duplicate names rejected");
        assert!(err.to_string().contains("duplicate source name 'docs'"));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_content_is_persisted() {
        let harness = Harness::new();
        let scraper =
            Arc::new(ScriptedScraper::new("empty").with_script(vec![Ok(Vec::new())]));

        let supervisor = harness.supervisor(vec![scraper], Duration::from_secs(3600));
        run_for(supervisor, CancellationToken::new(), Duration::from_millis(50)).await;

        assert_eq!(harness.store.get("empty").as_deref(), Some(b"".as_slice()));
        assert_eq!(
            harness.sink.events(),
            vec![("empty".to_string(), "success", Some(0))]
        );
    }
}
