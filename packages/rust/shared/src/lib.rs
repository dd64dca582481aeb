//! Shared types, error model, and configuration for docshelf.
//!
//! This crate is the foundation depended on by all other docshelf crates.
//! It provides:
//! - [`DocshelfError`] — the unified error type
//! - Domain types ([`StoredDocument`], [`DocumentSummary`])
//! - Configuration ([`AppConfig`], [`SourceConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, LogFormat, LoggingConfig, ScrapingConfig, SourceConfig, SourceKind, config_dir,
    config_file_path, init_config, load_config, load_config_from, validate_config,
};
pub use error::{DocshelfError, Result};
pub use types::{DocumentSummary, StoredDocument, content_hash};
