//! libSQL storage layer for docshelf documents.
//!
//! The [`Storage`] struct wraps a libSQL database holding the latest snapshot
//! of every named document.
//!
//! **Access rules:**
//! - Importer: read-write (sole writer) via [`Storage::open`]
//! - HTTP server / list commands: read-only via [`Storage::open_readonly`]
//!
//! Upserts for distinct names are safe to issue concurrently from independent
//! tasks; each configured source feeds exactly one name.

mod migrations;

use std::path::Path;

use chrono::{DateTime, Utc};
use docshelf_shared::{DocshelfError, DocumentSummary, Result, StoredDocument, content_hash};
use libsql::{Connection, Database, params};

/// Primary storage handle wrapping a libSQL database.
pub struct Storage {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
    readonly: bool,
}

impl Storage {
    /// Open or create a database at `path` in read-write mode.
    pub async fn open(path: &Path) -> Result<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| DocshelfError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        let storage = Self {
            db,
            conn,
            readonly: false,
        };
        storage.run_migrations().await?;
        Ok(storage)
    }

    /// Open a database at `path` in read-only mode (serving path).
    pub async fn open_readonly(path: &Path) -> Result<Self> {
        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        Ok(Self {
            db,
            conn,
            readonly: true,
        })
    }

    /// Run pending schema migrations.
    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.get_schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn.execute_batch(migration.sql).await.map_err(|e| {
                    DocshelfError::Storage(format!("migration v{} failed: {e}", migration.version))
                })?;
            }
        }
        Ok(())
    }

    /// Get the current schema version, or 0 if no migrations have been applied.
    async fn get_schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => {
                if let Ok(Some(row)) = rows.next().await {
                    row.get::<u32>(0).unwrap_or(0)
                } else {
                    0
                }
            }
            Err(_) => 0, // Table doesn't exist yet
        }
    }

    /// Ensure we're in read-write mode before writing.
    fn check_writable(&self) -> Result<()> {
        if self.readonly {
            return Err(DocshelfError::Storage(
                "database is opened in read-only mode".into(),
            ));
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Document operations
    // -----------------------------------------------------------------------

    /// Upsert a document: insert if the name is absent, else fully replace
    /// the stored content. Empty content is valid and stored as-is.
    pub async fn upsert_document(
        &self,
        name: &str,
        content: &[u8],
        fetched_at: DateTime<Utc>,
    ) -> Result<()> {
        self.check_writable()?;
        let hash = content_hash(content);
        self.conn
            .execute(
                "INSERT INTO documents (name, content, content_hash, fetched_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(name) DO UPDATE SET
                   content = excluded.content,
                   content_hash = excluded.content_hash,
                   fetched_at = excluded.fetched_at",
                params![
                    name,
                    content.to_vec(),
                    hash.as_str(),
                    fetched_at.to_rfc3339()
                ],
            )
            .await
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;
        Ok(())
    }

    /// Get a document's content by name, or `None` if absent.
    pub async fn get_document(&self, name: &str) -> Result<Option<Vec<u8>>> {
        let mut rows = self
            .conn
            .query(
                "SELECT content FROM documents WHERE name = ?1",
                params![name],
            )
            .await
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(
                row.get::<Vec<u8>>(0)
                    .map_err(|e| DocshelfError::Storage(e.to_string()))?,
            )),
            Ok(None) => Ok(None),
            Err(e) => Err(DocshelfError::Storage(e.to_string())),
        }
    }

    /// Get a full document record by name, or `None` if absent.
    pub async fn get_document_record(&self, name: &str) -> Result<Option<StoredDocument>> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, content, content_hash, fetched_at
                 FROM documents WHERE name = ?1",
                params![name],
            )
            .await
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        match rows.next().await {
            Ok(Some(row)) => Ok(Some(row_to_document(&row)?)),
            Ok(None) => Ok(None),
            Err(e) => Err(DocshelfError::Storage(e.to_string())),
        }
    }

    /// List the names of all stored documents, ordered by name.
    pub async fn list_document_names(&self) -> Result<Vec<String>> {
        let mut rows = self
            .conn
            .query("SELECT name FROM documents ORDER BY name", params![])
            .await
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        let mut names = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            names.push(
                row.get::<String>(0)
                    .map_err(|e| DocshelfError::Storage(e.to_string()))?,
            );
        }
        Ok(names)
    }

    /// List summaries (name, size, fetch time) of all stored documents.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let mut rows = self
            .conn
            .query(
                "SELECT name, length(content), fetched_at
                 FROM documents ORDER BY name",
                params![],
            )
            .await
            .map_err(|e| DocshelfError::Storage(e.to_string()))?;

        let mut results = Vec::new();
        while let Ok(Some(row)) = rows.next().await {
            let name: String = row
                .get(0)
                .map_err(|e| DocshelfError::Storage(e.to_string()))?;
            let content_len: i64 = row
                .get(1)
                .map_err(|e| DocshelfError::Storage(e.to_string()))?;
            let fetched_at = parse_timestamp(&row, 2)?;
            results.push(DocumentSummary {
                name,
                content_len: content_len as usize,
                fetched_at,
            });
        }
        Ok(results)
    }
}

/// Convert a database row to a [`StoredDocument`].
fn row_to_document(row: &libsql::Row) -> Result<StoredDocument> {
    Ok(StoredDocument {
        name: row
            .get::<String>(0)
            .map_err(|e| DocshelfError::Storage(e.to_string()))?,
        content: row
            .get::<Vec<u8>>(1)
            .map_err(|e| DocshelfError::Storage(e.to_string()))?,
        content_hash: row
            .get::<String>(2)
            .map_err(|e| DocshelfError::Storage(e.to_string()))?,
        fetched_at: parse_timestamp(row, 3)?,
    })
}

/// Parse an RFC 3339 timestamp column.
fn parse_timestamp(row: &libsql::Row, idx: i32) -> Result<DateTime<Utc>> {
    let s: String = row
        .get(idx)
        .map_err(|e| DocshelfError::Storage(e.to_string()))?;
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| DocshelfError::Storage(format!("invalid date: {e}")))
}
