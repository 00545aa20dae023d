//! Status command

use crate::app::{OutputFormat, StatusArgs};
use crate::output;
use anyhow::Result;
use repoingest_core::{IngestError, IngestionService};

pub async fn run(args: StatusArgs, service: &IngestionService, format: OutputFormat) -> Result<()> {
    let job = service
        .get_job(&args.job_id)
        .await
        .ok_or(IngestError::JobNotFound(args.job_id))?;

    print!("{}", output::format_job(&job, format));
    Ok(())
}
