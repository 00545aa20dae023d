//! Terminal output formatter

use repoingest_core::{CodeChunk, IndexStats, IngestionJob, IngestionStats, RepositoryRecord};

const PREVIEW_LINES: usize = 5;

pub fn format_job(job: &IngestionJob) -> String {
    let mut output = String::new();
    output.push_str(&format!("Job:        {}\n", job.id));
    output.push_str(&format!("Repository: {} ({})\n", job.repo_id, job.branch));
    output.push_str(&format!("URL:        {}\n", job.repo_url));
    output.push_str(&format!(
        "Status:     {} ({}%)\n",
        job.status.as_str(),
        job.progress
    ));
    output.push_str(&format!(
        "Started:    {}\n",
        job.started_at.format("%Y-%m-%d %H:%M:%S")
    ));
    if let Some(done) = job.completed_at {
        output.push_str(&format!(
            "Finished:   {}\n",
            done.format("%Y-%m-%d %H:%M:%S")
        ));
    }
    if let Some(ref error) = job.error {
        output.push_str(&format!("Error:      {}\n", error));
    }
    if let Some(ref stats) = job.stats {
        output.push_str(&format_ingestion_stats(stats));
    }
    output
}

pub fn format_jobs(jobs: &[IngestionJob]) -> String {
    if jobs.is_empty() {
        return "No jobs\n".to_string();
    }

    let mut output = String::new();
    for job in jobs {
        output.push_str(&format!(
            "{}  {:<10} {:>3}%  {}  {}\n",
            job.id,
            job.status.as_str(),
            job.progress,
            job.started_at.format("%Y-%m-%d %H:%M"),
            job.repo_id
        ));
    }
    output
}

pub fn format_repository(record: &RepositoryRecord) -> String {
    let mut output = String::new();
    output.push_str(&format!("Repository: {}\n", record.repo_id));
    output.push_str(&format!("URL:        {}\n", record.url));
    output.push_str(&format!("Branch:     {}\n", record.branch));
    output.push_str(&format!(
        "Processed:  {}\n",
        record.last_processed_at.format("%Y-%m-%d %H:%M:%S")
    ));
    output.push_str(&format_ingestion_stats(&record.stats));
    output
}

pub fn format_stats(stats: &IndexStats, repositories: &[String]) -> String {
    let mut output = String::new();
    output.push_str(&format!("Records:       {}\n", stats.total_records));
    output.push_str(&format!("Repositories:  {}\n", stats.repositories));
    match stats.dimensions {
        Some(dims) => output.push_str(&format!("Dimensions:    {}\n", dims)),
        None => output.push_str("Dimensions:    -\n"),
    }
    if !repositories.is_empty() {
        output.push('\n');
        output.push_str("Ingested:\n");
        for repo_id in repositories {
            output.push_str(&format!("  {}\n", repo_id));
        }
    }
    output
}

pub fn format_chunks(chunks: &[CodeChunk], full: bool) -> String {
    if chunks.is_empty() {
        return "No chunks\n".to_string();
    }

    let mut output = String::new();
    for chunk in chunks {
        output.push_str(&format!(
            "#{:<3} {:>5}-{:<5} {:>6} chars  {}\n",
            chunk.chunk_index,
            chunk.start_line + 1,
            chunk.end_line + 1,
            chunk.content.chars().count(),
            chunk.metadata.context.as_deref().unwrap_or("-")
        ));

        if full {
            let lines: Vec<&str> = chunk.content.lines().take(PREVIEW_LINES).collect();
            for (i, line) in lines.iter().enumerate() {
                output.push_str(&format!("  {:>5} {}\n", chunk.start_line + i + 1, line));
            }
            if chunk.content.lines().count() > PREVIEW_LINES {
                output.push_str("  ...\n");
            }
        }
    }
    output
}

fn format_ingestion_stats(stats: &IngestionStats) -> String {
    format!(
        "Files:      {}\nChunks:     {}\nEmbeddings: {}\nTokens:     {}\nDuration:   {}ms\n",
        stats.files_processed,
        stats.chunks_created,
        stats.embeddings_generated,
        stats.tokens_used,
        stats.duration_ms
    )
}
