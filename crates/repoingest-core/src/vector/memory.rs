//! In-process vector index

use super::{IndexStats, VectorIndex};
use crate::error::Result;
use crate::models::EmbeddingRecord;
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

/// Vector index held in memory; used by tests and dry runs
#[derive(Default)]
pub struct MemoryVectorIndex {
    records: RwLock<HashMap<String, EmbeddingRecord>>,
}

impl MemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records currently indexed for one repository
    pub async fn records_for(&self, repo_id: &str) -> Vec<EmbeddingRecord> {
        self.records
            .read()
            .await
            .values()
            .filter(|r| r.repo_id == repo_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl VectorIndex for MemoryVectorIndex {
    async fn upsert(&self, records: &[EmbeddingRecord]) -> Result<()> {
        let mut map = self.records.write().await;
        for record in records {
            map.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn delete_by_repo(&self, repo_id: &str) -> Result<usize> {
        let mut map = self.records.write().await;
        let before = map.len();
        map.retain(|_, r| r.repo_id != repo_id);
        Ok(before - map.len())
    }

    async fn stats(&self) -> Result<IndexStats> {
        let map = self.records.read().await;
        let repositories: HashSet<&str> = map.values().map(|r| r.repo_id.as_str()).collect();
        Ok(IndexStats {
            total_records: map.len(),
            repositories: repositories.len(),
            dimensions: map.values().next().map(|r| r.embedding.len()),
        })
    }
}
