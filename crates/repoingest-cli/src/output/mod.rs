//! Output formatters

pub mod json;
pub mod terminal;

use crate::app::OutputFormat;
use repoingest_core::{CodeChunk, IndexStats, IngestionJob, RepositoryRecord};

pub fn format_job(job: &IngestionJob, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(job),
        OutputFormat::Cli => terminal::format_job(job),
    }
}

pub fn format_jobs(jobs: &[IngestionJob], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(jobs),
        OutputFormat::Cli => terminal::format_jobs(jobs),
    }
}

pub fn format_repository(record: &RepositoryRecord, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(record),
        OutputFormat::Cli => terminal::format_repository(record),
    }
}

pub fn format_stats(stats: &IndexStats, repositories: &[String], format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_stats(stats, repositories),
        OutputFormat::Cli => terminal::format_stats(stats, repositories),
    }
}

pub fn format_chunks(chunks: &[CodeChunk], full: bool, format: OutputFormat) -> String {
    match format {
        OutputFormat::Json => json::format_value(chunks),
        OutputFormat::Cli => terminal::format_chunks(chunks, full),
    }
}
