//! CLI command handlers

pub mod chunk;
pub mod delete;
pub mod ingest;
pub mod jobs;
pub mod repo;
pub mod stats;
pub mod status;
