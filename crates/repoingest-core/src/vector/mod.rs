//! Vector index collaborators

mod memory;
mod sqlite;

pub use memory::MemoryVectorIndex;
pub use sqlite::SqliteVectorIndex;

use crate::error::Result;
use crate::models::EmbeddingRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Aggregate index size
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub total_records: usize,
    pub repositories: usize,
    /// Vector length, once anything is indexed
    pub dimensions: Option<usize>,
}

/// Store of embedding records keyed by record id
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Insert or replace every record by id
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<()>;

    /// Remove every record of a repository; returns how many went
    async fn delete_by_repo(&self, repo_id: &str) -> Result<usize>;

    async fn stats(&self) -> Result<IndexStats>;
}

/// Convert f32 embedding to little-endian bytes
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Convert little-endian bytes to f32 embedding
pub fn bytes_to_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}
