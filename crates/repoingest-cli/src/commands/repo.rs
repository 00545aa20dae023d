//! Repo command

use crate::app::{OutputFormat, RepoArgs};
use crate::output;
use anyhow::Result;
use repoingest_core::{IngestError, IngestionService};

pub async fn run(args: RepoArgs, service: &IngestionService, format: OutputFormat) -> Result<()> {
    let record = service
        .get_repository(&args.repo_id)
        .await
        .ok_or(IngestError::RepositoryNotFound(args.repo_id))?;

    print!("{}", output::format_repository(&record, format));
    Ok(())
}
