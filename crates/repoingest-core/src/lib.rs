//! Repoingest Core Library
//!
//! Turns a remote source repository into embedding records in a vector index.
//!
//! # Features
//! - Shallow clones through the `git` executable
//! - Heuristic block chunking with a line-window fallback
//! - Batched embedding with retry, exponential backoff and pacing
//! - Job state machine persisted after every transition
//! - SQLite-backed job table and vector index

pub mod config;
pub mod error;
pub mod git;
pub mod index;
pub mod jobs;
pub mod llm;
pub mod models;
pub mod store;
pub mod vector;

pub use config::{ChunkingConfig, Config, EmbeddingConfig, StorageConfig};
pub use error::{Error, IngestError, Result};
pub use git::{GitCli, RepositorySource};
pub use index::{walk_repository, BatchPolicy, Chunker, EmbeddingBatcher, Language, WalkOptions};
pub use jobs::IngestionService;
pub use llm::{Embedder, HttpEmbedder};
pub use models::{
    normalize_repo_id, ChunkMetadata, CodeChunk, EmbeddingRecord, IngestionJob, IngestionStats,
    JobStatus, RepositoryRecord,
};
pub use store::{Cache, KeyValueStore, MemoryStore, SqliteStore};
pub use vector::{IndexStats, MemoryVectorIndex, SqliteVectorIndex, VectorIndex};

/// Default data directory name
pub const DATA_DIR_NAME: &str = "repoingest";

/// Default config directory name
pub const CONFIG_DIR_NAME: &str = "repoingest";
