//! Ingest command

use crate::app::{IngestArgs, OutputFormat};
use crate::output;
use crate::progress::ProgressReporter;
use anyhow::{bail, Result};
use repoingest_core::{IngestError, IngestionService, JobStatus};
use std::time::Duration;

pub async fn run(args: IngestArgs, service: &IngestionService, format: OutputFormat) -> Result<()> {
    let job = service.submit(&args.url, &args.branch).await?;
    if format == OutputFormat::Cli {
        eprintln!("Submitted job {} for {}", job.id, job.repo_id);
    }

    let mut reporter = ProgressReporter::new(format == OutputFormat::Json);
    let poll = Duration::from_millis(args.poll_ms.max(10));
    let job = loop {
        let current = service
            .get_job(&job.id)
            .await
            .ok_or_else(|| IngestError::JobNotFound(job.id.clone()))?;
        reporter.update(&current);
        if current.status.is_terminal() {
            break current;
        }
        tokio::time::sleep(poll).await;
    };

    print!("{}", output::format_job(&job, format));

    if job.status == JobStatus::Failed {
        bail!(
            "Ingestion of {} failed: {}",
            job.repo_id,
            job.error.as_deref().unwrap_or("unknown error")
        );
    }
    Ok(())
}
