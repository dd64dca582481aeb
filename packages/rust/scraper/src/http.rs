//! HTTP source scraper.
//!
//! Fetches a raw markdown document from a fixed URL. The response body is the
//! document content; any non-success status is a fetch error for that cycle.

use async_trait::async_trait;
use reqwest::Client;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use docshelf_shared::{DocshelfError, Result};

use crate::Scraper;

/// Scraper for raw HTTP(S) document sources.
pub struct HttpScraper {
    name: String,
    url: Url,
    client: Client,
}

impl HttpScraper {
    /// Create a scraper fetching `url`, feeding the document `name`.
    pub fn new(name: impl Into<String>, url: Url, client: Client) -> Self {
        Self {
            name: name.into(),
            url,
            client,
        }
    }

    async fn fetch(&self) -> Result<Vec<u8>> {
        let response = self
            .client
            .get(self.url.as_str())
            .send()
            .await
            .map_err(|e| DocshelfError::fetch(format!("{}: {e}", self.url)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DocshelfError::fetch(format!(
                "{}: HTTP {status}",
                self.url
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| DocshelfError::fetch(format!("{}: body read failed: {e}", self.url)))?;

        Ok(body.to_vec())
    }
}

#[async_trait]
impl Scraper for HttpScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        debug!(source = %self.name, url = %self.url, "fetching document");

        tokio::select! {
            result = self.fetch() => result,
            _ = cancel.cancelled() => Err(DocshelfError::fetch("fetch cancelled")),
        }
    }
}
