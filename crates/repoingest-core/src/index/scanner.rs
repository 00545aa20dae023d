//! Repository walking for chunking

use super::chunker::Chunker;
use super::language::{is_binary_file, is_code_file, should_ignore_path, sanitize_path};
use crate::models::CodeChunk;
use std::path::Path;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

/// Walk options
#[derive(Debug, Clone)]
pub struct WalkOptions {
    /// Files above this size are skipped with a warning
    pub max_file_size_bytes: u64,
    pub follow_symlinks: bool,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 10 * 1024 * 1024,
            follow_symlinks: false,
        }
    }
}

impl WalkOptions {
    pub fn with_max_file_size_mb(max_file_size_mb: u64) -> Self {
        Self {
            max_file_size_bytes: max_file_size_mb.saturating_mul(1024 * 1024),
            ..Default::default()
        }
    }
}

/// Walk a clone and chunk every file of interest.
///
/// Per-entry problems (unreadable directories, non-UTF-8 files, oversized
/// files) are logged and skipped; the walk itself never fails.
pub fn walk_repository(
    root: &Path,
    repo_id: &str,
    options: &WalkOptions,
    chunker: &Chunker,
) -> Vec<CodeChunk> {
    let mut chunks = Vec::new();

    let walker = WalkDir::new(root)
        .follow_links(options.follow_symlinks)
        .into_iter()
        .filter_entry(|e| !should_skip(e, root));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(repo_id, error = %e, "Skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if is_binary_file(path) {
            continue;
        }

        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(e) => {
                warn!(repo_id, file = %path.display(), error = %e, "Skipping file without metadata");
                continue;
            }
        };
        if size > options.max_file_size_bytes {
            warn!(
                repo_id,
                file = %path.display(),
                size,
                limit = options.max_file_size_bytes,
                "Skipping large file"
            );
            continue;
        }

        if !is_code_file(path) {
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(repo_id, file = %path.display(), error = %e, "Skipping unreadable file");
                continue;
            }
        };

        let relative = relative_path(path, root);
        let file_chunks = chunker.chunk_file(repo_id, &path.to_string_lossy(), &content, &relative);
        debug!(file = %relative, chunk_count = file_chunks.len(), "Chunked file");
        chunks.extend(file_chunks);
    }

    chunks
}

fn relative_path(path: &Path, root: &Path) -> String {
    let relative = path
        .strip_prefix(root)
        .map(|p| p.to_string_lossy().to_string())
        .unwrap_or_else(|_| path.to_string_lossy().to_string());
    sanitize_path(&relative)
}

fn should_skip(entry: &DirEntry, root: &Path) -> bool {
    // Never prune the root itself, whatever it is called
    if entry.depth() == 0 {
        return false;
    }
    should_ignore_path(&relative_path(entry.path(), root))
}
