//! Error types for docshelf.
//!
//! Library crates use [`DocshelfError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all docshelf operations.
#[derive(Debug, thiserror::Error)]
pub enum DocshelfError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Failure retrieving content from a source (network, auth, missing file).
    #[error("fetch error: {0}")]
    Fetch(String),

    /// Database or storage layer error.
    #[error("storage error: {0}")]
    Storage(String),

    /// HTTP server startup or shutdown error.
    #[error("server error: {0}")]
    Server(String),

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, DocshelfError>;

impl DocshelfError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a fetch error from any displayable message.
    pub fn fetch(msg: impl Into<String>) -> Self {
        Self::Fetch(msg.into())
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
