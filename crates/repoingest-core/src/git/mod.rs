//! Local clones of remote repositories

use crate::error::{IngestError, Result};
use crate::models::normalize_repo_id;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{error, info};
use walkdir::WalkDir;

/// Clone provider consumed by the pipeline
#[async_trait]
pub trait RepositorySource: Send + Sync {
    /// Shallow-clone `url` at `branch`, or update an existing clone in place.
    /// Returns the clone directory.
    async fn fetch(&self, url: &str, branch: &str) -> Result<PathBuf>;

    /// Delete the clone of `repo_id`; absent clones are not an error
    async fn remove(&self, repo_id: &str) -> Result<()>;

    /// Where the clone of `repo_id` lives (whether or not it exists)
    fn local_path(&self, repo_id: &str) -> PathBuf;
}

/// Clone provider backed by the `git` executable
#[derive(Debug, Clone)]
pub struct GitCli {
    repos_dir: PathBuf,
}

impl GitCli {
    pub fn new(repos_dir: impl Into<PathBuf>) -> Self {
        Self {
            repos_dir: repos_dir.into(),
        }
    }

    pub fn repos_dir(&self) -> &Path {
        &self.repos_dir
    }

    async fn git(&self, args: &[&str], cwd: Option<&Path>) -> Result<()> {
        let mut cmd = Command::new("git");
        cmd.args(args);
        if let Some(dir) = cwd {
            cmd.current_dir(dir);
        }

        let output = cmd
            .output()
            .await
            .map_err(|e| IngestError::CloneFailure(format!("failed to execute git: {}", e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            error!(command = args.first().copied().unwrap_or_default(), stderr = %stderr, "git failed");
            return Err(IngestError::CloneFailure(stderr));
        }
        Ok(())
    }
}

#[async_trait]
impl RepositorySource for GitCli {
    async fn fetch(&self, url: &str, branch: &str) -> Result<PathBuf> {
        let repo_id = normalize_repo_id(url)?;
        let path = self.local_path(&repo_id);
        tokio::fs::create_dir_all(&self.repos_dir).await?;

        if path.join(".git").exists() {
            info!(repo_id = %repo_id, path = %path.display(), "Repository already cloned, pulling latest");
            self.git(&["checkout", branch], Some(&path)).await?;
            self.git(&["pull", "origin", branch], Some(&path)).await?;
            return Ok(path);
        }

        info!(url, branch, path = %path.display(), "Cloning repository");
        let target = path.to_string_lossy();
        self.git(
            &[
                "clone",
                "--depth",
                "1",
                "--single-branch",
                "--branch",
                branch,
                url,
                target.as_ref(),
            ],
            None,
        )
        .await?;

        info!(repo_id = %repo_id, "Repository cloned");
        Ok(path)
    }

    async fn remove(&self, repo_id: &str) -> Result<()> {
        let path = self.local_path(repo_id);
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => {
                info!(repo_id, path = %path.display(), "Clone removed");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn local_path(&self, repo_id: &str) -> PathBuf {
        self.repos_dir.join(repo_id.replace('/', "_"))
    }
}

/// Total size in bytes of the files under `path`, ignoring `.git`.
///
/// Advisory: unreadable entries are logged and count as zero.
pub fn directory_size(path: &Path) -> u64 {
    let mut total = 0;
    let walker = WalkDir::new(path)
        .into_iter()
        .filter_entry(|e| !(e.depth() > 0 && e.file_type().is_dir() && e.file_name() == ".git"));

    for entry in walker {
        match entry.and_then(|e| e.metadata().map(|m| (e, m))) {
            Ok((entry, meta)) if entry.file_type().is_file() => total += meta.len(),
            Ok(_) => {}
            Err(e) => error!(path = %path.display(), error = %e, "Failed to measure entry"),
        }
    }
    total
}

/// Bytes to megabytes, as used by the size ceilings
pub fn bytes_to_mb(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}
