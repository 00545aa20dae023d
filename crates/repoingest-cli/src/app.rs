//! CLI argument definitions

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "repoingest")]
#[command(
    author,
    version,
    about = "Clone, chunk and embed source repositories into a local vector index"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "cli")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ingest a repository and follow the job until it finishes
    Ingest(IngestArgs),

    /// Show one ingestion job
    Status(StatusArgs),

    /// List ingestion jobs
    Jobs,

    /// Show metadata of an ingested repository
    Repo(RepoArgs),

    /// Delete a repository's vectors, clone and metadata
    Delete(RepoArgs),

    /// Show vector index statistics
    Stats,

    /// Chunk a local file and print the result
    Chunk(ChunkArgs),
}

#[derive(Args)]
pub struct IngestArgs {
    /// Repository URL (https://github.com/owner/name or git@github.com:owner/name)
    pub url: String,

    /// Branch to clone
    #[arg(short, long, default_value = "main")]
    pub branch: String,

    /// Poll interval in milliseconds while following the job
    #[arg(long, default_value = "500")]
    pub poll_ms: u64,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Job id returned by `ingest`
    pub job_id: String,
}

#[derive(Args)]
pub struct RepoArgs {
    /// Repository id (owner/name)
    pub repo_id: String,
}

#[derive(Args)]
pub struct ChunkArgs {
    /// File to chunk
    pub file: PathBuf,

    /// Repository id used for chunk ids
    #[arg(long, default_value = "local/preview")]
    pub repo_id: String,

    /// Print chunk contents, not just the table
    #[arg(long)]
    pub full: bool,
}

#[derive(Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Cli,
    Json,
}
