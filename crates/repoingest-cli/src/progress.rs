//! Job progress reporting

use repoingest_core::{IngestionJob, JobStatus};
use std::io::{self, Write};

/// Prints a line whenever a followed job changes status or progress
pub struct ProgressReporter {
    last: Option<(JobStatus, u8)>,
    quiet: bool,
}

impl ProgressReporter {
    pub fn new(quiet: bool) -> Self {
        Self { last: None, quiet }
    }

    /// Report the job if it moved since the last call; returns whether it did
    pub fn update(&mut self, job: &IngestionJob) -> bool {
        let current = (job.status, job.progress);
        if self.last == Some(current) {
            return false;
        }
        self.last = Some(current);
        if !self.quiet {
            eprintln!("[{:>3}%] {}", job.progress, job.status.as_str());
            io::stderr().flush().ok();
        }
        true
    }
}
