//! Delete command

use crate::app::{OutputFormat, RepoArgs};
use anyhow::Result;
use repoingest_core::IngestionService;

pub async fn run(args: RepoArgs, service: &IngestionService, format: OutputFormat) -> Result<()> {
    let removed = service.delete_repository(&args.repo_id).await?;

    match format {
        OutputFormat::Json => {
            let value = serde_json::json!({
                "repo_id": args.repo_id,
                "vectors_removed": removed,
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Cli => {
            println!("Deleted {} ({} vectors removed)", args.repo_id, removed);
        }
    }
    Ok(())
}
