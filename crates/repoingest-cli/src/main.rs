//! Repoingest CLI
//!
//! Turns remote repositories into embedding records in a local vector index.

use anyhow::Result;
use clap::Parser;
use repoingest_core::error::exit_codes;
use repoingest_core::{Config, IngestError, IngestionService};

mod app;
mod commands;
mod output;
mod progress;

use app::{Cli, Commands};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    if let Err(e) = run(cli).await {
        eprintln!("Error: {:#}", e);
        let code = e
            .downcast_ref::<IngestError>()
            .map(IngestError::exit_code)
            .unwrap_or(exit_codes::GENERAL_ERROR);
        std::process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    // Only `chunk` runs without opening the data directory
    let service = || IngestionService::from_config(config.clone());

    match cli.command {
        Commands::Ingest(args) => commands::ingest::run(args, &service()?, cli.format).await,
        Commands::Status(args) => commands::status::run(args, &service()?, cli.format).await,
        Commands::Jobs => commands::jobs::run(&service()?, cli.format).await,
        Commands::Repo(args) => commands::repo::run(args, &service()?, cli.format).await,
        Commands::Delete(args) => commands::delete::run(args, &service()?, cli.format).await,
        Commands::Stats => commands::stats::run(&service()?, cli.format).await,
        Commands::Chunk(args) => commands::chunk::run(args, &config, cli.format).await,
    }
}
