//! Stats command

use crate::app::OutputFormat;
use crate::output;
use anyhow::Result;
use repoingest_core::IngestionService;

pub async fn run(service: &IngestionService, format: OutputFormat) -> Result<()> {
    let stats = service.index_stats().await?;
    let repositories = service.list_repositories().await;

    print!("{}", output::format_stats(&stats, &repositories, format));
    Ok(())
}
