//! Chunk command

use crate::app::{ChunkArgs, OutputFormat};
use crate::output;
use anyhow::{Context, Result};
use repoingest_core::{Chunker, Config};

pub async fn run(args: ChunkArgs, config: &Config, format: OutputFormat) -> Result<()> {
    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let relative_path = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.file.display().to_string());

    let chunker = Chunker::new(config.chunking);
    let chunks = chunker.chunk_file(
        &args.repo_id,
        &args.file.to_string_lossy(),
        &content,
        &relative_path,
    );

    print!("{}", output::format_chunks(&chunks, args.full, format));
    Ok(())
}
