//! Error types for repoingest

use thiserror::Error;

/// Result type alias using IngestError
pub type Result<T> = std::result::Result<T, IngestError>;

/// Error type alias for convenience
pub type Error = IngestError;

/// Exit codes for CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const NOT_FOUND: i32 = 2;
    pub const INVALID_INPUT: i32 = 3;
}

/// Main error type for repoingest
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Invalid repository URL: {0}")]
    InvalidRepoUrl(String),

    #[error("Clone failed: {0}")]
    CloneFailure(String),

    #[error("Repository size ({size_mb:.2}MB) exceeds maximum allowed size ({limit_mb}MB)")]
    RepoTooLarge { size_mb: f64, limit_mb: u64 },

    #[error("No processable files found in repository")]
    NoProcessableFiles,

    #[error("Embedding failed after {attempts} attempts: {message}")]
    EmbeddingFailure { attempts: u32, message: String },

    #[error("Vector index error: {0}")]
    IndexFailure(String),

    #[error("Embedding service error: {0}")]
    Embedding(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error("Repository not found: {0}")]
    RepositoryNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Walk directory error: {0}")]
    WalkDir(#[from] walkdir::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Glob pattern error: {0}")]
    GlobPattern(#[from] glob::PatternError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Background task failed: {0}")]
    Task(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl IngestError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::JobNotFound(_) | Self::RepositoryNotFound(_) => exit_codes::NOT_FOUND,
            Self::InvalidRepoUrl(_) | Self::Config(_) => exit_codes::INVALID_INPUT,
            _ => exit_codes::GENERAL_ERROR,
        }
    }
}

impl From<tokio::task::JoinError> for IngestError {
    fn from(e: tokio::task::JoinError) -> Self {
        Self::Task(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_too_large_message() {
        let err = IngestError::RepoTooLarge {
            size_mb: 1234.567,
            limit_mb: 1000,
        };
        assert_eq!(
            err.to_string(),
            "Repository size (1234.57MB) exceeds maximum allowed size (1000MB)"
        );
    }

    #[test]
    fn test_embedding_failure_mentions_embedding() {
        let err = IngestError::EmbeddingFailure {
            attempts: 3,
            message: "HTTP 429".to_string(),
        };
        assert!(err.to_string().starts_with("Embedding failed after 3 attempts"));
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(
            IngestError::InvalidRepoUrl("x".into()).exit_code(),
            exit_codes::INVALID_INPUT
        );
        assert_eq!(
            IngestError::JobNotFound("x".into()).exit_code(),
            exit_codes::NOT_FOUND
        );
        assert_eq!(
            IngestError::NoProcessableFiles.exit_code(),
            exit_codes::GENERAL_ERROR
        );
    }
}
