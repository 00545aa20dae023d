//! Ingestion job orchestration
//!
//! A job moves `queued → cloning → chunking → embedding → indexing →
//! completed`, or to `failed` from any non-terminal state. Every transition
//! is written to the job table before the stage's work starts, so readers
//! never see progress ahead of what actually happened.

use crate::config::Config;
use crate::error::{IngestError, Result};
use crate::git::{bytes_to_mb, directory_size, GitCli, RepositorySource};
use crate::index::{
    estimate_tokens, walk_repository, BatchPolicy, Chunker, EmbeddingBatcher, WalkOptions,
};
use crate::llm::{Embedder, HttpEmbedder};
use crate::models::{CodeChunk, IngestionJob, IngestionStats, JobStatus, RepositoryRecord};
use crate::store::{repo_key, Cache, KeyValueStore, SqliteStore, JOBS_KEY, REPOS_KEY};
use crate::vector::{IndexStats, SqliteVectorIndex, VectorIndex};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{error, info};

struct Inner {
    config: Config,
    chunker: Chunker,
    source: Arc<dyn RepositorySource>,
    batcher: EmbeddingBatcher,
    index: Arc<dyn VectorIndex>,
    cache: Cache,
    repo_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Entry point for submitting and inspecting ingestion jobs
#[derive(Clone)]
pub struct IngestionService {
    inner: Arc<Inner>,
}

impl IngestionService {
    pub fn new(
        config: Config,
        source: Arc<dyn RepositorySource>,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        let batcher = EmbeddingBatcher::new(embedder, BatchPolicy::from_config(&config.embedding));
        Self {
            inner: Arc::new(Inner {
                chunker: Chunker::new(config.chunking),
                config,
                source,
                batcher,
                index,
                cache: Cache::new(store),
                repo_locks: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Wire up the bundled collaborators: `git`, HTTP embeddings and SQLite storage
    pub fn from_config(config: Config) -> Result<Self> {
        let source = Arc::new(GitCli::new(config.repos_dir()));
        let embedder = Arc::new(HttpEmbedder::from_config(&config.embedding)?);
        let index = Arc::new(SqliteVectorIndex::open(config.index_path())?);
        let store = Arc::new(SqliteStore::open(config.store_path())?);
        Ok(Self::new(config, source, embedder, index, store))
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Create a queued job and start its pipeline in the background.
    ///
    /// Returns as soon as the job is recorded; poll [`get_job`](Self::get_job)
    /// for progress. Must be called from within a tokio runtime.
    pub async fn submit(&self, repo_url: &str, branch: &str) -> Result<IngestionJob> {
        let job = IngestionJob::new(repo_url, branch)?;
        self.inner.persist(&job).await;
        info!(job_id = %job.id, repo_id = %job.repo_id, branch, "Ingestion job queued");

        let inner = self.inner.clone();
        let queued = job.clone();
        tokio::spawn(async move {
            inner.run(queued).await;
        });

        Ok(job)
    }

    pub async fn get_job(&self, job_id: &str) -> Option<IngestionJob> {
        self.inner.cache.hget(JOBS_KEY, job_id).await
    }

    /// Every recorded job, newest first
    pub async fn list_jobs(&self) -> Vec<IngestionJob> {
        let mut jobs: Vec<IngestionJob> = self
            .inner
            .cache
            .hgetall(JOBS_KEY)
            .await
            .into_values()
            .collect();
        jobs.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        jobs
    }

    /// Poll until the job reaches a terminal state
    pub async fn wait_for(&self, job_id: &str, poll_interval: Duration) -> Result<IngestionJob> {
        loop {
            let job = self
                .get_job(job_id)
                .await
                .ok_or_else(|| IngestError::JobNotFound(job_id.to_string()))?;
            if job.status.is_terminal() {
                return Ok(job);
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    pub async fn get_repository(&self, repo_id: &str) -> Option<RepositoryRecord> {
        self.inner.cache.get(&repo_key(repo_id)).await
    }

    /// Ids of repositories with at least one completed ingestion
    pub async fn list_repositories(&self) -> Vec<String> {
        let mut ids = self.inner.cache.smembers(REPOS_KEY).await;
        ids.sort();
        ids
    }

    /// Remove a repository's vectors, clone and cached metadata.
    ///
    /// Absent pieces are skipped silently. Job records are left untouched.
    /// Returns the number of vector records removed.
    pub async fn delete_repository(&self, repo_id: &str) -> Result<usize> {
        let inner = &self.inner;
        let removed = inner.index.delete_by_repo(repo_id).await?;
        inner.source.remove(repo_id).await?;
        inner.cache.delete(&repo_key(repo_id)).await;
        inner.cache.srem(REPOS_KEY, repo_id).await;

        info!(repo_id, vectors_removed = removed, "Repository deleted");
        Ok(removed)
    }

    pub async fn index_stats(&self) -> Result<IndexStats> {
        self.inner.index.stats().await
    }
}

impl Inner {
    async fn persist(&self, job: &IngestionJob) {
        self.cache.hset(JOBS_KEY, &job.id, job).await;
    }

    async fn transition(&self, job: &mut IngestionJob, status: JobStatus) {
        job.advance(status);
        self.persist(job).await;
        info!(
            job_id = %job.id,
            repo_id = %job.repo_id,
            status = %status,
            progress = job.progress,
            "Job stage"
        );
    }

    async fn repo_lock(&self, repo_id: &str) -> Arc<Mutex<()>> {
        self.repo_locks
            .lock()
            .await
            .entry(repo_id.to_string())
            .or_default()
            .clone()
    }

    /// Drive one job to a terminal state and record it
    async fn run(&self, mut job: IngestionJob) -> IngestionJob {
        let lock = self.repo_lock(&job.repo_id).await;
        let _guard = lock.lock().await;

        let started = Instant::now();
        match self.execute(&mut job, started).await {
            Ok(stats) => {
                job.complete(stats.clone());
                self.persist(&job).await;

                let record = RepositoryRecord {
                    repo_id: job.repo_id.clone(),
                    url: job.repo_url.clone(),
                    branch: job.branch.clone(),
                    last_processed_at: Utc::now(),
                    stats,
                };
                self.cache.set(&repo_key(&job.repo_id), &record, None).await;
                self.cache.sadd(REPOS_KEY, &job.repo_id).await;

                info!(
                    job_id = %job.id,
                    repo_id = %job.repo_id,
                    files = record.stats.files_processed,
                    chunks = record.stats.chunks_created,
                    duration_ms = record.stats.duration_ms,
                    "Ingestion completed"
                );
            }
            Err(e) => {
                job.fail(e.to_string());
                self.persist(&job).await;
                error!(job_id = %job.id, repo_id = %job.repo_id, error = %e, "Ingestion failed");
            }
        }
        job
    }

    async fn execute(&self, job: &mut IngestionJob, started: Instant) -> Result<IngestionStats> {
        self.transition(job, JobStatus::Cloning).await;
        let path = self.source.fetch(&job.repo_url, &job.branch).await?;

        let size_mb = bytes_to_mb(self.measure(path.clone()).await?);
        let limit_mb = self.config.storage.max_repo_size_mb;
        if size_mb > limit_mb as f64 {
            return Err(IngestError::RepoTooLarge { size_mb, limit_mb });
        }

        self.transition(job, JobStatus::Chunking).await;
        let chunks = self.walk(path, job.repo_id.clone()).await?;
        if chunks.is_empty() {
            return Err(IngestError::NoProcessableFiles);
        }
        info!(repo_id = %job.repo_id, chunk_count = chunks.len(), "Repository chunked");

        self.transition(job, JobStatus::Embedding).await;
        let records = self.batcher.embed_chunks(&chunks).await?;
        info!(repo_id = %job.repo_id, embedding_count = records.len(), "Embeddings generated");

        self.transition(job, JobStatus::Indexing).await;
        self.index.upsert(&records).await.map_err(|e| match e {
            IngestError::IndexFailure(_) => e,
            other => IngestError::IndexFailure(other.to_string()),
        })?;

        let files: HashSet<&str> = chunks.iter().map(|c| c.file_path.as_str()).collect();
        Ok(IngestionStats {
            files_processed: files.len(),
            chunks_created: chunks.len(),
            embeddings_generated: records.len(),
            tokens_used: estimate_tokens(&chunks),
            duration_ms: started.elapsed().as_millis() as u64,
        })
    }

    async fn measure(&self, path: PathBuf) -> Result<u64> {
        Ok(tokio::task::spawn_blocking(move || directory_size(&path)).await?)
    }

    async fn walk(&self, path: PathBuf, repo_id: String) -> Result<Vec<CodeChunk>> {
        let options = WalkOptions::with_max_file_size_mb(self.config.storage.max_file_size_mb);
        let chunker = self.chunker.clone();
        let chunks = tokio::task::spawn_blocking(move || {
            walk_repository(&path, &repo_id, &options, &chunker)
        })
        .await?;
        Ok(chunks)
    }
}
