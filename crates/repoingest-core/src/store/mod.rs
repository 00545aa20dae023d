//! Durable key-value store
//!
//! A small Redis-shaped surface (plain keys with optional TTL, hashes and
//! sets) used for the job table and repository metadata. Backends return
//! errors; [`Cache`] turns them into logged misses for callers that must not
//! fail on store trouble.

mod cache;
mod memory;
mod sqlite;

pub use cache::Cache;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// Hash holding every job record, field = job id
pub const JOBS_KEY: &str = "ingestion:jobs";

/// Set of repository ids that completed at least one ingestion
pub const REPOS_KEY: &str = "ingestion:repos";

/// Key of the cached metadata record for one repository
pub fn repo_key(repo_id: &str) -> String {
    format!("repo:{}", repo_id)
}

/// Raw string-valued store
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set a plain key; `ttl` of `None` never expires
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()>;

    /// Delete a key of any kind; returns whether something was removed
    async fn delete(&self, key: &str) -> Result<bool>;

    /// Delete every key (of any kind) matching a glob such as `repo:*`
    async fn delete_pattern(&self, pattern: &str) -> Result<usize>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>>;

    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()>;

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>>;

    /// Returns whether the member was newly added
    async fn sadd(&self, key: &str, member: &str) -> Result<bool>;

    /// Returns whether the member was present
    async fn srem(&self, key: &str, member: &str) -> Result<bool>;

    async fn smembers(&self, key: &str) -> Result<Vec<String>>;

    async fn sismember(&self, key: &str, member: &str) -> Result<bool>;
}
