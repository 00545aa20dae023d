//! JSON output formatter

use repoingest_core::IndexStats;
use serde::Serialize;

pub fn format_value<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "null".to_string()) + "\n"
}

pub fn format_stats(stats: &IndexStats, repositories: &[String]) -> String {
    format_value(&serde_json::json!({
        "total_records": stats.total_records,
        "repositories": stats.repositories,
        "dimensions": stats.dimensions,
        "ingested": repositories,
    }))
}
