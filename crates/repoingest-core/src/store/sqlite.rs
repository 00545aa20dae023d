//! SQLite-backed store, shared across CLI invocations

use super::KeyValueStore;
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use glob::Pattern;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;

const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    expires_at INTEGER
);

CREATE TABLE IF NOT EXISTS hashes (
    key TEXT NOT NULL,
    field TEXT NOT NULL,
    value TEXT NOT NULL,
    PRIMARY KEY (key, field)
);

CREATE TABLE IF NOT EXISTS sets (
    key TEXT NOT NULL,
    member TEXT NOT NULL,
    PRIMARY KEY (key, member)
);
"#;

/// Store persisted in a single SQLite file
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (creating parent directories) and initialize
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
}

fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

fn delete_key(conn: &Connection, key: &str) -> rusqlite::Result<bool> {
    let mut removed = conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
    removed += conn.execute("DELETE FROM hashes WHERE key = ?1", params![key])?;
    removed += conn.execute("DELETE FROM sets WHERE key = ?1", params![key])?;
    Ok(removed > 0)
}

#[async_trait]
impl KeyValueStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let value = conn
            .query_row(
                "SELECT value FROM kv WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2)",
                params![key, now_ms()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        let expires_at = ttl.map(|t| now_ms().saturating_add(t.as_millis() as i64));
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO kv (key, value, expires_at) VALUES (?1, ?2, ?3)",
            params![key, value, expires_at],
        )?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        Ok(delete_key(&conn, key)?)
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        let pattern = Pattern::new(pattern)?;
        let conn = self.conn.lock().await;

        let mut stmt = conn.prepare(
            "SELECT key FROM kv UNION SELECT key FROM hashes UNION SELECT key FROM sets",
        )?;
        let keys: HashSet<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<_>>()?;

        let mut removed = 0;
        for key in keys.iter().filter(|k| pattern.matches(k)) {
            if delete_key(&conn, key)? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let exists = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM kv WHERE key = ?1 AND (expires_at IS NULL OR expires_at > ?2))
                 OR EXISTS(SELECT 1 FROM hashes WHERE key = ?1)
                 OR EXISTS(SELECT 1 FROM sets WHERE key = ?1)",
            params![key, now_ms()],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        let conn = self.conn.lock().await;
        let value = conn
            .query_row(
                "SELECT value FROM hashes WHERE key = ?1 AND field = ?2",
                params![key, field],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        let conn = self.conn.lock().await;
        conn.execute(
            "INSERT OR REPLACE INTO hashes (key, field, value) VALUES (?1, ?2, ?3)",
            params![key, field, value],
        )?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT field, value FROM hashes WHERE key = ?1")?;
        let entries = stmt
            .query_map(params![key], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<rusqlite::Result<HashMap<String, String>>>()?;
        Ok(entries)
    }

    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let inserted = conn.execute(
            "INSERT OR IGNORE INTO sets (key, member) VALUES (?1, ?2)",
            params![key, member],
        )?;
        Ok(inserted > 0)
    }

    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let removed = conn.execute(
            "DELETE FROM sets WHERE key = ?1 AND member = ?2",
            params![key, member],
        )?;
        Ok(removed > 0)
    }

    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        let conn = self.conn.lock().await;
        let mut stmt = conn.prepare("SELECT member FROM sets WHERE key = ?1 ORDER BY member")?;
        let members = stmt
            .query_map(params![key], |row| row.get(0))?
            .collect::<rusqlite::Result<Vec<String>>>()?;
        Ok(members)
    }

    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        let conn = self.conn.lock().await;
        let present = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sets WHERE key = ?1 AND member = ?2)",
            params![key, member],
            |row| row.get(0),
        )?;
        Ok(present)
    }
}
