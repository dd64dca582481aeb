//! Core domain types for docshelf documents.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// ---------------------------------------------------------------------------
// StoredDocument
// ---------------------------------------------------------------------------

/// The persisted snapshot of one named document.
///
/// Only the latest fetched content is kept; every successful sync cycle fully
/// replaces `content`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredDocument {
    /// Unique document name (matches the configured source's name).
    pub name: String,
    /// Raw markdown bytes from the most recent successful fetch.
    pub content: Vec<u8>,
    /// SHA-256 hash of `content`, hex-encoded.
    pub content_hash: String,
    /// When the content was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Lightweight listing row for a stored document (no content payload).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentSummary {
    /// Document name.
    pub name: String,
    /// Content size in bytes.
    pub content_len: usize,
    /// When the content was fetched.
    pub fetched_at: DateTime<Utc>,
}

/// Compute the SHA-256 hash of document content, hex-encoded.
pub fn content_hash(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    format!("{:x}", hasher.finalize())
}
