//! Git source scraper.
//!
//! Fetches a repository's `README.md` at HEAD by driving the system `git`
//! binary: a depth-1 clone into a fresh temp directory, read the file, remove
//! the directory. SSH-authenticated origins are supported by pointing
//! `GIT_SSH_COMMAND` at the configured private key.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

use docshelf_shared::{DocshelfError, Result};

use crate::Scraper;

/// The file served as a repository's documentation.
const README_FILE: &str = "README.md";

/// Scraper for git repository sources.
pub struct GitScraper {
    name: String,
    repo_url: String,
    ssh_key: Option<PathBuf>,
}

impl GitScraper {
    /// Create a scraper for `repo_url`, feeding the document `name`.
    pub fn new(name: impl Into<String>, repo_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            repo_url: repo_url.into(),
            ssh_key: None,
        }
    }

    /// Use an SSH private key for the clone.
    pub fn with_ssh_key(mut self, ssh_key: Option<PathBuf>) -> Self {
        self.ssh_key = ssh_key;
        self
    }

    /// Build the clone command for a destination directory.
    fn clone_command(&self, dest: &Path) -> Command {
        let mut cmd = Command::new("git");
        cmd.arg("clone")
            .arg("--depth")
            .arg("1")
            .arg("--quiet")
            .arg(&self.repo_url)
            .arg(dest)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(key) = &self.ssh_key {
            cmd.env("GIT_SSH_COMMAND", ssh_command(key));
        }

        cmd
    }

    /// Clone into `dest` and read the README, leaving cleanup to the caller.
    async fn clone_and_read(&self, dest: &Path, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let mut cmd = self.clone_command(dest);
        let child = cmd
            .spawn()
            .map_err(|e| DocshelfError::fetch(format!("failed to spawn git: {e}")))?;

        // kill_on_drop reaps the clone process if cancellation wins the race.
        let output = tokio::select! {
            result = child.wait_with_output() => {
                result.map_err(|e| DocshelfError::fetch(format!("git clone failed: {e}")))?
            }
            _ = cancel.cancelled() => {
                return Err(DocshelfError::fetch("clone cancelled"));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(DocshelfError::fetch(format!(
                "clone error: {}",
                stderr.trim()
            )));
        }

        match tokio::fs::read(dest.join(README_FILE)).await {
            Ok(content) => Ok(content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(DocshelfError::fetch(
                format!("{README_FILE} not found in repository"),
            )),
            Err(e) => Err(DocshelfError::fetch(format!("file read error: {e}"))),
        }
    }
}

#[async_trait]
impl Scraper for GitScraper {
    fn name(&self) -> &str {
        &self.name
    }

    async fn scrape(&self, cancel: &CancellationToken) -> Result<Vec<u8>> {
        if cancel.is_cancelled() {
            return Err(DocshelfError::fetch("clone cancelled"));
        }

        let clone_dir = std::env::temp_dir().join(format!("docshelf-clone-{}", Uuid::now_v7()));
        debug!(source = %self.name, dir = %clone_dir.display(), "cloning repository");

        let result = self.clone_and_read(&clone_dir, cancel).await;

        if let Err(e) = tokio::fs::remove_dir_all(&clone_dir).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                debug!(dir = %clone_dir.display(), error = %e, "failed to remove clone dir");
            }
        }

        result
    }
}

/// The `GIT_SSH_COMMAND` value for a given private key.
fn ssh_command(key: &Path) -> String {
    format!(
        "ssh -i {} -o IdentitiesOnly=yes -o StrictHostKeyChecking=accept-new",
        key.display()
    )
}
