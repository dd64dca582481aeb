//! Application configuration for docshelf.
//!
//! User config lives at `~/.docshelf/docshelf.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{DocshelfError, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "docshelf.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".docshelf";

// ---------------------------------------------------------------------------
// Config structs (matching docshelf.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Polling behavior.
    #[serde(default)]
    pub scraping: ScrapingConfig,

    /// Log output settings.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Configured documentation sources.
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

/// `[scraping]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingConfig {
    /// Seconds between polls of each source.
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

impl ScrapingConfig {
    /// The polling interval as a [`Duration`].
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for ScrapingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

fn default_interval_secs() -> u64 {
    300
}

/// `[logging]` section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log output format.
    #[serde(default)]
    pub format: LogFormat,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable line output.
    #[default]
    Text,
    /// Structured JSON output.
    Json,
}

/// `[[sources]]` entry — one configured documentation source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Unique name of the document this source feeds.
    pub name: String,

    /// Kind of source (`git`, `http`).
    pub kind: SourceKind,

    /// Location the source is fetched from (repository URL or raw content URL).
    pub origin: String,

    /// Path to an SSH private key for authenticated git origins.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssh_key: Option<PathBuf>,
}

/// The supported source kinds.
///
/// Unrecognized kinds deserialize to [`SourceKind::Unrecognized`] so a single
/// unknown entry does not fail the whole config; it is skipped (with a
/// warning) when scrapers are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// A git repository; the document is its `README.md` at HEAD.
    Git,
    /// A raw markdown document fetched over HTTP(S).
    Http,
    /// Anything else — tolerated in config, skipped at scraper construction.
    #[serde(other)]
    Unrecognized,
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.docshelf/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| DocshelfError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.docshelf/docshelf.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| DocshelfError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| DocshelfError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| DocshelfError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| DocshelfError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| DocshelfError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Check that the config can drive an import run.
///
/// Rejects a zero interval, empty source names/origins, and duplicate names
/// (two sources feeding the same document would race nondeterministically).
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.scraping.interval_secs == 0 {
        return Err(DocshelfError::config(
            "scraping.interval_secs must be greater than zero",
        ));
    }

    let mut seen = std::collections::HashSet::new();
    for source in &config.sources {
        if source.name.trim().is_empty() {
            return Err(DocshelfError::config("source with empty name"));
        }
        if source.origin.trim().is_empty() {
            return Err(DocshelfError::config(format!(
                "source '{}' has an empty origin",
                source.name
            )));
        }
        if !seen.insert(source.name.as_str()) {
            return Err(DocshelfError::config(format!(
                "duplicate source name '{}'",
                source.name
            )));
        }
    }

    Ok(())
}
