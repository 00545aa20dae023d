//! Configuration management

use crate::error::{IngestError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Largest input count a single embeddings request may carry upstream
pub const MAX_PROVIDER_BATCH: usize = 2048;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Clone directory and size ceilings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Chunking engine parameters
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Embedding service and batching policy
    #[serde(default)]
    pub embedding: EmbeddingConfig,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Root for clones, the key-value store and the vector index
    pub data_dir: PathBuf,

    /// Files larger than this are skipped during the walk
    pub max_file_size_mb: u64,

    /// Repositories larger than this (after clone) fail the job
    pub max_repo_size_mb: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(crate::DATA_DIR_NAME),
            max_file_size_mb: 10,
            max_repo_size_mb: 1000,
        }
    }
}

/// Chunking configuration
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,

    /// Overlap between consecutive line-mode chunks, in characters
    pub chunk_overlap: usize,

    /// Hard cap on chunks produced for one file
    pub max_chunks_per_file: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            max_chunks_per_file: 100,
        }
    }
}

/// Embedding service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Base URL of an OpenAI-compatible embeddings service
    pub url: String,

    /// Model name for embeddings
    pub model: String,

    /// API key (optional, for authenticated services)
    pub api_key: Option<String>,

    /// Embedding dimensions reported by the model
    pub dimensions: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Chunks per embeddings request
    pub batch_size: usize,

    /// Attempts per batch before the job fails
    pub max_attempts: u32,

    /// First backoff delay; doubles on every retry
    pub base_delay_ms: u64,

    /// Backoff ceiling
    pub max_delay_ms: u64,

    /// Pause between successful batch submissions
    pub pacing_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:8000".to_string(),
            model: "text-embedding-3-small".to_string(),
            api_key: None,
            dimensions: 1536,
            timeout_secs: 30,
            batch_size: 50,
            max_attempts: 3,
            base_delay_ms: 1000,
            max_delay_ms: 10_000,
            pacing_ms: 100,
        }
    }
}

impl Config {
    /// Load config from `$REPOINGEST_CONFIG` or the default path, then apply env overrides
    pub fn load() -> Result<Self> {
        let path = std::env::var("REPOINGEST_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| Self::default_path());
        let mut config = Self::load_from(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load config from a YAML file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = serde_yaml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    /// Save config to a YAML file
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Get default config path
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(crate::CONFIG_DIR_NAME)
            .join("config.yml")
    }

    /// Override individual fields from `REPOINGEST_*` environment variables
    pub fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("REPOINGEST_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(v) = env_parse("REPOINGEST_MAX_FILE_SIZE_MB") {
            self.storage.max_file_size_mb = v;
        }
        if let Some(v) = env_parse("REPOINGEST_MAX_REPO_SIZE_MB") {
            self.storage.max_repo_size_mb = v;
        }
        if let Some(v) = env_parse("REPOINGEST_CHUNK_SIZE") {
            self.chunking.chunk_size = v;
        }
        if let Some(v) = env_parse("REPOINGEST_CHUNK_OVERLAP") {
            self.chunking.chunk_overlap = v;
        }
        if let Some(v) = env_parse("REPOINGEST_MAX_CHUNKS_PER_FILE") {
            self.chunking.max_chunks_per_file = v;
        }
        if let Ok(url) = std::env::var("REPOINGEST_EMBEDDING_URL") {
            self.embedding.url = url;
        }
        if let Ok(model) = std::env::var("REPOINGEST_EMBEDDING_MODEL") {
            self.embedding.model = model;
        }
        if let Ok(key) = std::env::var("REPOINGEST_EMBEDDING_API_KEY") {
            self.embedding.api_key = Some(key);
        }
        if let Some(v) = env_parse("REPOINGEST_EMBEDDING_DIMS") {
            self.embedding.dimensions = v;
        }
    }

    /// Reject settings the pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_size == 0 {
            return Err(IngestError::Config("chunking.chunk_size must be > 0".into()));
        }
        if self.chunking.max_chunks_per_file == 0 {
            return Err(IngestError::Config(
                "chunking.max_chunks_per_file must be > 0".into(),
            ));
        }
        if self.embedding.batch_size == 0 || self.embedding.batch_size > MAX_PROVIDER_BATCH {
            return Err(IngestError::Config(format!(
                "embedding.batch_size must be between 1 and {}",
                MAX_PROVIDER_BATCH
            )));
        }
        if self.embedding.max_attempts == 0 {
            return Err(IngestError::Config(
                "embedding.max_attempts must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Directory holding one clone per repository
    pub fn repos_dir(&self) -> PathBuf {
        self.storage.data_dir.join("repos")
    }

    /// Key-value store (job table, repository metadata)
    pub fn store_path(&self) -> PathBuf {
        self.storage.data_dir.join("state.sqlite")
    }

    /// Vector index database
    pub fn index_path(&self) -> PathBuf {
        self.storage.data_dir.join("vectors.sqlite")
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
