//! Jobs command

use crate::app::OutputFormat;
use crate::output;
use anyhow::Result;
use repoingest_core::IngestionService;

pub async fn run(service: &IngestionService, format: OutputFormat) -> Result<()> {
    let jobs = service.list_jobs().await;
    print!("{}", output::format_jobs(&jobs, format));
    Ok(())
}
