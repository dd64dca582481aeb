//! Scripted fakes for exercising the sync loops without real sources.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio_util::sync::CancellationToken;

use docshelf_scraper::Scraper;
use docshelf_shared::{DocshelfError, Result};

use crate::outcome::{OutcomeSink, SyncOutcome};
use crate::store::DocumentStore;

// ---------------------------------------------------------------------------
// ScriptedScraper
// ---------------------------------------------------------------------------

/// Scraper returning a scripted sequence of results, then a fallback forever.
pub(crate) struct ScriptedScraper {
    name: String,
    script: Mutex<VecDeque<std::result::Result<Vec<u8>, String>>>,
    fallback: std::result::Result<Vec<u8>, String>,
    delay: Duration,
    calls: AtomicUsize,
    busy: AtomicBool,
    overlaps: AtomicUsize,
}

impl ScriptedScraper {
    /// A scraper that always succeeds with fixed content.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            script: Mutex::new(VecDeque::new()),
            fallback: Ok(b"content".to_vec()),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
            busy: AtomicBool::new(false),
            overlaps: AtomicUsize::new(0),
        }
    }

    /// A scraper whose every fetch fails.
    pub fn failing(name: &str) -> Self {
        let mut scraper = Self::new(name);
        scraper.fallback = Err("injected fetch failure".into());
        scraper
    }

    /// Serve these results first, in order, before falling back.
    pub fn with_script(
        self,
        steps: Vec<std::result::Result<Vec<u8>, String>>,
    ) -> Self {
        *self.script.lock().unwrap() = steps.into();
        self
    }

    /// Make every fetch take this long.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of fetches started.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of fetches that started while another was still in flight.
    pub fn overlaps(&self) -> usize {
        self.overlaps.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Scraper for ScriptedScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, _cancel: &CancellationToken) -> Result<Vec<u8>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.busy.swap(true, Ordering::SeqCst) {
            self.overlaps.fetch_add(1, Ordering::SeqCst);
        }

        if self.delay > Duration::ZERO {
            tokio::time::sleep(self.delay).await;
        }

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        self.busy.store(false, Ordering::SeqCst);
        step.map_err(DocshelfError::fetch)
    }
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// In-memory document store with an injectable persist failure.
pub(crate) struct MemoryStore {
    docs: Mutex<HashMap<String, Vec<u8>>>,
    upserts: AtomicUsize,
    fail: bool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            docs: Mutex::new(HashMap::new()),
            upserts: AtomicUsize::new(0),
            fail: false,
        }
    }

    /// A store whose every upsert fails.
    pub fn failing() -> Self {
        let mut store = Self::new();
        store.fail = true;
        store
    }

    pub fn get(&self, name: &str) -> Option<Vec<u8>> {
        self.docs.lock().unwrap().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn upsert_document(
        &self,
        name: &str,
        content: &[u8],
        _fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        if self.fail {
            return Err(DocshelfError::Storage("injected persist failure".into()));
        }
        self.docs
            .lock()
            .unwrap()
            .insert(name.to_string(), content.to_vec());
        self.upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// RecordingSink
// ---------------------------------------------------------------------------

/// One recorded outcome: source name, kind label, byte count on success.
pub(crate) type RecordedOutcome = (String, &'static str, Option<usize>);

/// Outcome sink that records everything it sees.
pub(crate) struct RecordingSink {
    events: Mutex<Vec<RecordedOutcome>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn events(&self) -> Vec<RecordedOutcome> {
        self.events.lock().unwrap().clone()
    }

    /// Outcome kind labels recorded for one source, in order.
    pub fn kinds_for(&self, source: &str) -> Vec<&'static str> {
        self.events
            .lock()
            .unwrap()
            .iter()
            .filter(|(name, _, _)| name == source)
            .map(|(_, kind, _)| *kind)
            .collect()
    }
}

impl OutcomeSink for RecordingSink {
    fn report(&self, source: &str, outcome: &SyncOutcome) {
        let bytes = match outcome {
            SyncOutcome::Success { bytes } => Some(*bytes),
            _ => None,
        };
        self.events
            .lock()
            .unwrap()
            .push((source.to_string(), outcome.kind(), bytes));
    }
}
