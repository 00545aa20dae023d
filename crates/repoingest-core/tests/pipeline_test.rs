//! End-to-end pipeline tests with in-process collaborators
//!
//! Covers:
//! 1. Stage order and progress checkpoints as seen by the job table
//! 2. Failure at each stage (clone, size ceiling, empty walk, embedding, indexing)
//! 3. Repository deletion and re-ingestion

use async_trait::async_trait;
use repoingest_core::error::{IngestError, Result};
use repoingest_core::models::EmbeddingRecord;
use repoingest_core::store::JOBS_KEY;
use repoingest_core::vector::IndexStats;
use repoingest_core::{
    normalize_repo_id, Config, Embedder, IngestionJob, IngestionService, JobStatus, KeyValueStore,
    MemoryStore, MemoryVectorIndex, RepositorySource, VectorIndex,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

const POLL: Duration = Duration::from_millis(5);

/// Serves `<root>/<owner>_<name>` as the clone, or fails like an unreachable remote
struct FixtureSource {
    root: PathBuf,
    unreachable: bool,
}

#[async_trait]
impl RepositorySource for FixtureSource {
    async fn fetch(&self, url: &str, branch: &str) -> Result<PathBuf> {
        if self.unreachable {
            return Err(IngestError::CloneFailure(format!(
                "fatal: Remote branch {} not found in upstream origin",
                branch
            )));
        }
        let path = self.local_path(&normalize_repo_id(url)?);
        std::fs::create_dir_all(&path)?;
        Ok(path)
    }

    async fn remove(&self, repo_id: &str) -> Result<()> {
        let path = self.local_path(repo_id);
        if path.exists() {
            std::fs::remove_dir_all(path)?;
        }
        Ok(())
    }

    fn local_path(&self, repo_id: &str) -> PathBuf {
        self.root.join(repo_id.replace('/', "_"))
    }
}

/// Returns a fixed vector per text, or fails every call
struct ScriptedEmbedder {
    fail: bool,
    calls: AtomicUsize,
}

impl ScriptedEmbedder {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Embedder for ScriptedEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(vec![text.len() as f32, 1.0])
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(IngestError::Embedding("HTTP 503: upstream unavailable".into()));
        }
        Ok(texts.iter().map(|t| vec![t.len() as f32, 1.0]).collect())
    }

    fn dimensions(&self) -> usize {
        2
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

/// Rejects every upsert
struct RejectingIndex;

#[async_trait]
impl VectorIndex for RejectingIndex {
    async fn upsert(&self, _records: &[EmbeddingRecord]) -> Result<()> {
        Err(IngestError::Other(anyhow::anyhow!("collection is read-only")))
    }

    async fn delete_by_repo(&self, _repo_id: &str) -> Result<usize> {
        Ok(0)
    }

    async fn stats(&self) -> Result<IndexStats> {
        Ok(IndexStats::default())
    }
}

/// Memory store that remembers every job-table write
#[derive(Default)]
struct RecordingStore {
    inner: MemoryStore,
    job_writes: Mutex<Vec<(JobStatus, u8)>>,
}

impl RecordingStore {
    fn writes(&self) -> Vec<(JobStatus, u8)> {
        self.job_writes.lock().unwrap().clone()
    }
}

#[async_trait]
impl KeyValueStore for RecordingStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<()> {
        self.inner.set(key, value, ttl).await
    }
    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }
    async fn delete_pattern(&self, pattern: &str) -> Result<usize> {
        self.inner.delete_pattern(pattern).await
    }
    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }
    async fn hget(&self, key: &str, field: &str) -> Result<Option<String>> {
        self.inner.hget(key, field).await
    }
    async fn hset(&self, key: &str, field: &str, value: &str) -> Result<()> {
        if key == JOBS_KEY {
            let job: IngestionJob = serde_json::from_str(value)?;
            self.job_writes
                .lock()
                .unwrap()
                .push((job.status, job.progress));
        }
        self.inner.hset(key, field, value).await
    }
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>> {
        self.inner.hgetall(key).await
    }
    async fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        self.inner.sadd(key, member).await
    }
    async fn srem(&self, key: &str, member: &str) -> Result<bool> {
        self.inner.srem(key, member).await
    }
    async fn smembers(&self, key: &str) -> Result<Vec<String>> {
        self.inner.smembers(key).await
    }
    async fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        self.inner.sismember(key, member).await
    }
}

struct Harness {
    _temp: TempDir,
    repos: PathBuf,
    service: IngestionService,
    store: Arc<RecordingStore>,
    index: Arc<MemoryVectorIndex>,
    embedder: Arc<ScriptedEmbedder>,
}

struct Options {
    unreachable: bool,
    failing_embedder: bool,
    rejecting_index: bool,
    max_repo_size_mb: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            unreachable: false,
            failing_embedder: false,
            rejecting_index: false,
            max_repo_size_mb: 1000,
        }
    }
}

fn harness(options: Options) -> Harness {
    let temp = TempDir::new().unwrap();
    let repos = temp.path().join("repos");

    let mut config = Config::default();
    config.storage.data_dir = temp.path().to_path_buf();
    config.storage.max_repo_size_mb = options.max_repo_size_mb;
    config.embedding.base_delay_ms = 1;
    config.embedding.max_delay_ms = 2;
    config.embedding.pacing_ms = 0;

    let store = Arc::new(RecordingStore::default());
    let index = Arc::new(MemoryVectorIndex::new());
    let embedder = Arc::new(ScriptedEmbedder::new(options.failing_embedder));
    let vector_index: Arc<dyn VectorIndex> = if options.rejecting_index {
        Arc::new(RejectingIndex)
    } else {
        index.clone()
    };

    let service = IngestionService::new(
        config,
        Arc::new(FixtureSource {
            root: repos.clone(),
            unreachable: options.unreachable,
        }),
        embedder.clone(),
        vector_index,
        store.clone(),
    );

    Harness {
        _temp: temp,
        repos,
        service,
        store,
        index,
        embedder,
    }
}

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, content).unwrap();
}

fn seed_sample_repo(h: &Harness) -> PathBuf {
    let root = h.repos.join("acme_widgets");
    write(
        &root,
        "src/a.ts",
        "function hello() {\n  console.log('Hello');\n}\n\nfunction world() {\n  console.log('World');\n}\n",
    );
    write(&root, "src/util.py", "def add(a, b):\n    return a + b\n");
    write(&root, "node_modules/dep/index.js", "function dep() {}\n");
    write(&root, "assets/logo.png", "not really a png");
    root
}

async fn ingest(h: &Harness, url: &str) -> IngestionJob {
    let job = h.service.submit(url, "main").await.unwrap();
    h.service.wait_for(&job.id, POLL).await.unwrap()
}

#[tokio::test]
async fn test_successful_ingestion_walks_every_stage() {
    let h = harness(Options::default());
    seed_sample_repo(&h);

    let done = ingest(&h, "https://github.com/acme/widgets").await;

    assert_eq!(done.status, JobStatus::Completed);
    assert!(done.error.is_none());
    assert!(done.completed_at.is_some());
    assert_eq!(
        h.store.writes(),
        vec![
            (JobStatus::Queued, 0),
            (JobStatus::Cloning, 10),
            (JobStatus::Chunking, 30),
            (JobStatus::Embedding, 50),
            (JobStatus::Indexing, 80),
            (JobStatus::Completed, 100),
        ]
    );

    let stats = done.stats.unwrap();
    assert_eq!(stats.files_processed, 2);
    assert_eq!(stats.chunks_created, 3);
    assert_eq!(stats.embeddings_generated, 3);

    let records = h.index.records_for("acme/widgets").await;
    assert_eq!(records.len(), 3);
    let total_chars: usize = records
        .iter()
        .map(|r| r.metadata.content.chars().count())
        .sum();
    assert_eq!(stats.tokens_used, total_chars.div_ceil(4) as u64);
    assert!(records
        .iter()
        .all(|r| !r.metadata.chunk.relative_path.contains("node_modules")));

    let repo = h.service.get_repository("acme/widgets").await.unwrap();
    assert_eq!(repo.branch, "main");
    assert_eq!(repo.stats.chunks_created, 3);
    assert_eq!(h.service.list_repositories().await, vec!["acme/widgets"]);
}

#[tokio::test]
async fn test_embedding_failure_fails_job() {
    let h = harness(Options {
        failing_embedder: true,
        ..Default::default()
    });
    seed_sample_repo(&h);

    let done = ingest(&h, "https://github.com/acme/widgets").await;

    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.progress, 50);
    assert!(done.error.as_deref().unwrap().contains("Embedding failed"));
    assert!(done.stats.is_none());
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 3);
    assert!(h
        .store
        .writes()
        .iter()
        .all(|(status, _)| *status != JobStatus::Completed));
    assert!(h.service.get_repository("acme/widgets").await.is_none());
    assert_eq!(h.index.stats().await.unwrap().total_records, 0);
}

#[tokio::test]
async fn test_clone_failure_fails_job() {
    let h = harness(Options {
        unreachable: true,
        ..Default::default()
    });

    let done = ingest(&h, "https://github.com/acme/ghost").await;

    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.progress, 10);
    assert!(done.error.unwrap().starts_with("Clone failed"));
}

#[tokio::test]
async fn test_oversized_repository_stops_before_chunking() {
    let h = harness(Options {
        max_repo_size_mb: 1,
        ..Default::default()
    });
    let root = seed_sample_repo(&h);
    write(&root, "data/blob.json", &"0".repeat(3 * 1024 * 1024 / 2));

    let done = ingest(&h, "https://github.com/acme/widgets").await;

    assert_eq!(done.status, JobStatus::Failed);
    assert!(done
        .error
        .unwrap()
        .contains("exceeds maximum allowed size (1MB)"));
    assert_eq!(
        h.store.writes().last().copied(),
        Some((JobStatus::Failed, 10))
    );
    assert_eq!(h.embedder.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_repository_without_code_fails() {
    let h = harness(Options::default());
    let root = h.repos.join("acme_empty");
    write(&root, "notes.txt", "just notes");
    write(&root, "dist/bundle.js", "function bundled() {}");

    let done = ingest(&h, "https://github.com/acme/empty").await;

    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.progress, 30);
    assert_eq!(
        done.error.as_deref(),
        Some("No processable files found in repository")
    );
}

#[tokio::test]
async fn test_index_rejection_fails_job() {
    let h = harness(Options {
        rejecting_index: true,
        ..Default::default()
    });
    seed_sample_repo(&h);

    let done = ingest(&h, "https://github.com/acme/widgets").await;

    assert_eq!(done.status, JobStatus::Failed);
    assert_eq!(done.progress, 80);
    assert!(done.error.unwrap().contains("read-only"));
}

#[tokio::test]
async fn test_reingestion_replaces_records() {
    let h = harness(Options::default());
    seed_sample_repo(&h);

    let first = ingest(&h, "https://github.com/acme/widgets").await;
    let second = ingest(&h, "https://github.com/acme/widgets").await;

    assert_ne!(first.id, second.id);
    assert_eq!(second.status, JobStatus::Completed);
    assert_eq!(h.index.stats().await.unwrap().total_records, 3);
    assert_eq!(h.service.list_jobs().await.len(), 2);
}

#[tokio::test]
async fn test_delete_repository_removes_everything() {
    let h = harness(Options::default());
    let root = seed_sample_repo(&h);
    let done = ingest(&h, "https://github.com/acme/widgets").await;

    let removed = h.service.delete_repository("acme/widgets").await.unwrap();

    assert_eq!(removed, 3);
    assert_eq!(h.index.stats().await.unwrap(), IndexStats::default());
    assert!(!root.exists());
    assert!(h.service.get_repository("acme/widgets").await.is_none());
    assert!(h.service.list_repositories().await.is_empty());
    // Job records survive
    assert_eq!(
        h.service.get_job(&done.id).await.unwrap().status,
        JobStatus::Completed
    );
}

#[tokio::test]
async fn test_delete_absent_repository_is_noop() {
    let h = harness(Options::default());
    assert_eq!(h.service.delete_repository("nobody/nothing").await.unwrap(), 0);
    assert_eq!(h.service.delete_repository("nobody/nothing").await.unwrap(), 0);
}

#[tokio::test]
async fn test_concurrent_jobs_for_different_repositories() {
    let h = harness(Options::default());
    seed_sample_repo(&h);
    write(&h.repos.join("acme_tools"), "main.go", "func main() {\n}\n");

    let a = h
        .service
        .submit("https://github.com/acme/widgets", "main")
        .await
        .unwrap();
    let b = h
        .service
        .submit("git@github.com:acme/tools.git", "main")
        .await
        .unwrap();

    let (a, b) = tokio::join!(h.service.wait_for(&a.id, POLL), h.service.wait_for(&b.id, POLL));
    assert_eq!(a.unwrap().status, JobStatus::Completed);
    assert_eq!(b.unwrap().status, JobStatus::Completed);

    let stats = h.index.stats().await.unwrap();
    assert_eq!(stats.repositories, 2);
    assert_eq!(stats.total_records, 4);
}
