//! The store capability consumed by the sync loops.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use docshelf_shared::Result;
use docshelf_storage::Storage;

/// Capability interface for persisting fetched documents.
///
/// `upsert_document` must be safe to call concurrently for distinct names
/// from independent tasks; success means the stored document for `name` now
/// reflects `content` exactly (full replace, not merge).
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert or fully replace the document for `name`.
    async fn upsert_document(
        &self,
        name: &str,
        content: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<()>;
}

#[async_trait]
impl DocumentStore for Storage {
    async fn upsert_document(
        &self,
        name: &str,
        content: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        Storage::upsert_document(self, name, content, fetched_at).await
    }
}
