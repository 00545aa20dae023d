//! Data model shared by the pipeline stages

use crate::error::{IngestError, Result};
use crate::index::Language;
use chrono::{DateTime, Utc};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

lazy_static! {
    static ref GITHUB_URL: Regex = Regex::new(r"github\.com[:/]([^/]+)/([^/.]+)").unwrap();
}

/// Derive `owner/name` from a GitHub-style URL (https or scp-like ssh)
pub fn normalize_repo_id(url: &str) -> Result<String> {
    let caps = GITHUB_URL
        .captures(url.trim())
        .ok_or_else(|| IngestError::InvalidRepoUrl(url.to_string()))?;
    Ok(format!("{}/{}", &caps[1], &caps[2]))
}

/// Lifecycle state of an ingestion job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Cloning,
    Chunking,
    Embedding,
    Indexing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Cloning => "cloning",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Indexing => "indexing",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Progress value recorded when a job enters this state.
    ///
    /// `Failed` keeps whatever progress the job had reached, so it has no
    /// checkpoint of its own.
    pub fn checkpoint(&self) -> Option<u8> {
        match self {
            Self::Queued => Some(0),
            Self::Cloning => Some(10),
            Self::Chunking => Some(30),
            Self::Embedding => Some(50),
            Self::Indexing => Some(80),
            Self::Completed => Some(100),
            Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate counters attached to a completed job
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestionStats {
    pub files_processed: usize,
    pub chunks_created: usize,
    pub embeddings_generated: usize,
    pub tokens_used: u64,
    pub duration_ms: u64,
}

/// One ingestion run, persisted after every mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionJob {
    pub id: String,
    pub repo_id: String,
    pub repo_url: String,
    pub branch: String,
    pub status: JobStatus,
    pub progress: u8,
    pub started_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stats: Option<IngestionStats>,
}

impl IngestionJob {
    /// Create a queued job; fails if the URL has no `owner/name` shape
    pub fn new(repo_url: &str, branch: &str) -> Result<Self> {
        let repo_id = normalize_repo_id(repo_url)?;
        Ok(Self {
            id: uuid::Uuid::new_v4().to_string(),
            repo_id,
            repo_url: repo_url.to_string(),
            branch: branch.to_string(),
            status: JobStatus::Queued,
            progress: 0,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
            stats: None,
        })
    }

    /// Move to a non-terminal stage and set its progress checkpoint.
    ///
    /// Transitions out of a terminal state are ignored.
    pub fn advance(&mut self, status: JobStatus) {
        if self.status.is_terminal() {
            return;
        }
        self.status = status;
        if let Some(progress) = status.checkpoint() {
            self.progress = self.progress.max(progress);
        }
    }

    pub fn complete(&mut self, stats: IngestionStats) {
        if self.status.is_terminal() {
            return;
        }
        self.advance(JobStatus::Completed);
        self.completed_at = Some(Utc::now());
        self.stats = Some(stats);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        if self.status.is_terminal() {
            return;
        }
        self.status = JobStatus::Failed;
        self.error = Some(message.into());
        self.completed_at = Some(Utc::now());
    }
}

/// Metadata shared by every chunk of one file (except `context`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkMetadata {
    pub language: Language,
    /// Extension without the leading dot, or `unknown`
    pub file_type: String,
    /// Extension with the leading dot, or empty
    pub extension: String,
    pub relative_path: String,
    /// Byte size of the whole file content
    pub size: usize,
    pub is_code: bool,
    /// Enclosing construct name or a `lines a-b` label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

/// One retrievable span of a file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeChunk {
    pub id: String,
    pub repo_id: String,
    /// Absolute path in the clone
    pub file_path: String,
    pub content: String,
    /// 0-based, inclusive
    pub start_line: usize,
    /// 0-based, inclusive
    pub end_line: usize,
    pub chunk_index: usize,
    pub metadata: ChunkMetadata,
}

/// Chunk metadata plus the fields the vector index stores alongside the vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingMetadata {
    #[serde(flatten)]
    pub chunk: ChunkMetadata,
    pub content: String,
    pub start_line: usize,
    pub end_line: usize,
    pub chunk_index: usize,
}

/// A chunk plus its vector, ready for indexing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    pub id: String,
    pub chunk_id: String,
    pub repo_id: String,
    pub file_path: String,
    pub embedding: Vec<f32>,
    pub metadata: EmbeddingMetadata,
}

impl EmbeddingRecord {
    pub fn from_chunk(chunk: &CodeChunk, embedding: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            chunk_id: chunk.id.clone(),
            repo_id: chunk.repo_id.clone(),
            file_path: chunk.file_path.clone(),
            embedding,
            metadata: EmbeddingMetadata {
                chunk: chunk.metadata.clone(),
                content: chunk.content.clone(),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
                chunk_index: chunk.chunk_index,
            },
        }
    }
}

/// Compact per-repository record cached after a successful ingestion
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub repo_id: String,
    pub url: String,
    pub branch: String,
    pub last_processed_at: DateTime<Utc>,
    pub stats: IngestionStats,
}
