//! Source scrapers: the fetch side of the sync pipeline.
//!
//! Each configured source gets one [`Scraper`] that knows how to retrieve the
//! current raw markdown for its document. Scrapers are trait objects behind a
//! single capability interface; adding a new source kind means adding an
//! implementation, not touching the scheduler.

mod git;
mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use url::Url;

use docshelf_shared::{DocshelfError, Result, SourceConfig, SourceKind};

pub use git::GitScraper;
pub use http::HttpScraper;

/// User-Agent string for HTTP source requests.
const USER_AGENT: &str = concat!("docshelf/", env!("CARGO_PKG_VERSION"));

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// Capability interface for fetching the current content of one source.
///
/// Implementations must respect `cancel` and abort promptly when it fires; a
/// cancelled fetch is reported as a fetch error for that cycle.
#[async_trait]
pub trait Scraper: Send + Sync {
    /// Name of the document this scraper feeds.
    fn name(&self) -> &str;

    /// Fetch the current content from the source.
    async fn scrape(&self, cancel: &CancellationToken) -> Result<Vec<u8>>;
}

// ---------------------------------------------------------------------------
// Construction from config
// ---------------------------------------------------------------------------

/// Build one scraper per recognized source.
///
/// Sources with an unrecognized kind or a malformed origin are skipped with a
/// warning rather than failing the whole set. Errs only on process-level
/// faults (the shared HTTP client cannot be built).
pub fn build_scrapers(sources: &[SourceConfig]) -> Result<Vec<Arc<dyn Scraper>>> {
    let mut scrapers: Vec<Arc<dyn Scraper>> = Vec::new();
    let mut http_client: Option<reqwest::Client> = None;

    for source in sources {
        match source.kind {
            SourceKind::Git => {
                scrapers.push(Arc::new(
                    GitScraper::new(&source.name, &source.origin)
                        .with_ssh_key(source.ssh_key.clone()),
                ));
            }
            SourceKind::Http => {
                let url = match Url::parse(&source.origin) {
                    Ok(url) => url,
                    Err(e) => {
                        warn!(
                            source = %source.name,
                            origin = %source.origin,
                            error = %e,
                            "invalid http origin, skipping source"
                        );
                        continue;
                    }
                };

                let client = match &http_client {
                    Some(client) => client.clone(),
                    None => {
                        let client = reqwest::Client::builder()
                            .user_agent(USER_AGENT)
                            .timeout(Duration::from_secs(30))
                            .build()
                            .map_err(|e| {
                                DocshelfError::fetch(format!("failed to build HTTP client: {e}"))
                            })?;
                        http_client = Some(client.clone());
                        client
                    }
                };

                scrapers.push(Arc::new(HttpScraper::new(&source.name, url, client)));
            }
            SourceKind::Unrecognized => {
                warn!(source = %source.name, "unrecognized source kind, skipping");
            }
        }
    }

    Ok(scrapers)
}
