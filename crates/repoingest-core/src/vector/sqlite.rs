//! SQLite-backed vector index

use super::{embedding_to_bytes, IndexStats, VectorIndex};
use crate::error::{IngestError, Result};
use crate::models::EmbeddingRecord;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use tokio::sync::Mutex;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS vectors (
    id TEXT PRIMARY KEY,
    repo_id TEXT NOT NULL,
    file_path TEXT NOT NULL,
    embedding BLOB NOT NULL,
    metadata TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_vectors_repo ON vectors(repo_id);
"#;

/// Vector index persisted in a single SQLite file
pub struct SqliteVectorIndex {
    conn: Mutex<Connection>,
}

impl SqliteVectorIndex {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Self::init(Connection::open(path)?)
    }

    /// Open in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(CREATE_TABLES)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Number of records stored for one repository
    pub async fn count_for(&self, repo_id: &str) -> Result<usize> {
        let conn = self.conn.lock().await;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM vectors WHERE repo_id = ?1",
            params![repo_id],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn insert_all(conn: &Connection, records: &[EmbeddingRecord]) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    let mut stmt = conn.prepare(
        "INSERT OR REPLACE INTO vectors (id, repo_id, file_path, embedding, metadata, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
    )?;
    for record in records {
        let metadata = serde_json::to_string(&record.metadata)?;
        stmt.execute(params![
            record.id,
            record.repo_id,
            record.file_path,
            embedding_to_bytes(&record.embedding),
            metadata,
            now,
        ])?;
    }
    Ok(())
}

#[async_trait]
impl VectorIndex for SqliteVectorIndex {
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }
        let conn = self.conn.lock().await;

        let result = conn
            .execute("BEGIN IMMEDIATE", [])
            .map_err(IngestError::from)
            .and_then(|_| insert_all(&conn, records));

        match result {
            Ok(()) => {
                conn.execute("COMMIT", [])
                    .map_err(|e| IngestError::IndexFailure(e.to_string()))?;
                tracing::debug!(count = records.len(), "Upserted vectors");
                Ok(())
            }
            Err(e) => {
                let _ = conn.execute("ROLLBACK", []);
                Err(IngestError::IndexFailure(e.to_string()))
            }
        }
    }

    async fn delete_by_repo(&self, repo_id: &str) -> Result<usize> {
        let conn = self.conn.lock().await;
        let removed = conn.execute("DELETE FROM vectors WHERE repo_id = ?1", params![repo_id])?;
        Ok(removed)
    }

    async fn stats(&self) -> Result<IndexStats> {
        let conn = self.conn.lock().await;
        let (total, repositories): (i64, i64) = conn.query_row(
            "SELECT COUNT(*), COUNT(DISTINCT repo_id) FROM vectors",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let bytes: Option<i64> = conn
            .query_row("SELECT length(embedding) FROM vectors LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        Ok(IndexStats {
            total_records: total as usize,
            repositories: repositories as usize,
            dimensions: bytes.map(|b| b as usize / 4),
        })
    }
}
