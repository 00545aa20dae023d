//! Batched embedding with retry and pacing

use crate::config::EmbeddingConfig;
use crate::error::{IngestError, Result};
use crate::llm::Embedder;
use crate::models::{CodeChunk, EmbeddingRecord};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Grouping, retry and pacing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchPolicy {
    pub batch_size: usize,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub pacing: Duration,
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self::from_config(&EmbeddingConfig::default())
    }
}

impl BatchPolicy {
    pub fn from_config(config: &EmbeddingConfig) -> Self {
        Self {
            batch_size: config.batch_size.max(1),
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            pacing: Duration::from_millis(config.pacing_ms),
        }
    }

    /// Delay after failed attempt `attempt` (0-based): `base * 2^attempt`, capped
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 1u32.checked_shl(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Text sent to the provider: the context label, a blank line, then the content
pub fn embedding_text(chunk: &CodeChunk) -> String {
    match chunk.metadata.context.as_deref() {
        Some(context) if !context.is_empty() => format!("{}\n\n{}", context, chunk.content),
        _ => chunk.content.clone(),
    }
}

/// Rough token count: one token per four characters of chunk content, rounded up
pub fn estimate_tokens(chunks: &[CodeChunk]) -> u64 {
    let chars: u64 = chunks
        .iter()
        .map(|c| c.content.chars().count() as u64)
        .sum();
    chars.div_ceil(4)
}

/// Turns chunks into embedding records, one provider call per group
pub struct EmbeddingBatcher {
    embedder: Arc<dyn Embedder>,
    policy: BatchPolicy,
}

impl EmbeddingBatcher {
    pub fn new(embedder: Arc<dyn Embedder>, policy: BatchPolicy) -> Self {
        Self { embedder, policy }
    }

    pub fn policy(&self) -> &BatchPolicy {
        &self.policy
    }

    /// Embed every chunk, preserving input order
    pub async fn embed_chunks(&self, chunks: &[CodeChunk]) -> Result<Vec<EmbeddingRecord>> {
        let mut records = Vec::with_capacity(chunks.len());
        let groups: Vec<&[CodeChunk]> = chunks.chunks(self.policy.batch_size).collect();
        debug!(
            model = self.embedder.model_name(),
            dimensions = self.embedder.dimensions(),
            batches = groups.len(),
            "Embedding chunks"
        );

        for (i, group) in groups.iter().enumerate() {
            let texts: Vec<String> = group.iter().map(embedding_text).collect();
            let vectors = self.embed_with_retry(&texts).await?;

            records.extend(
                group
                    .iter()
                    .zip(vectors)
                    .map(|(chunk, embedding)| EmbeddingRecord::from_chunk(chunk, embedding)),
            );

            info!(
                processed = records.len(),
                total = chunks.len(),
                "Embedding progress"
            );

            if i + 1 < groups.len() && !self.policy.pacing.is_zero() {
                tokio::time::sleep(self.policy.pacing).await;
            }
        }

        Ok(records)
    }

    /// Submit one group, retrying the whole group on any failure
    pub async fn embed_with_retry(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut last_error = String::new();

        for attempt in 0..self.policy.max_attempts {
            let outcome = match self.embedder.embed_batch(texts).await {
                Ok(vectors) if vectors.len() == texts.len() => return Ok(vectors),
                Ok(vectors) => format!(
                    "provider returned {} vectors for {} inputs",
                    vectors.len(),
                    texts.len()
                ),
                Err(e) => e.to_string(),
            };

            warn!(
                attempt = attempt + 1,
                max_attempts = self.policy.max_attempts,
                error = %outcome,
                "Embedding generation failed, retrying"
            );
            last_error = outcome;

            if attempt + 1 < self.policy.max_attempts {
                tokio::time::sleep(self.policy.backoff_delay(attempt)).await;
            }
        }

        Err(IngestError::EmbeddingFailure {
            attempts: self.policy.max_attempts,
            message: last_error,
        })
    }
}
