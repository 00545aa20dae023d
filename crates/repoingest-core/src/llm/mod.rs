//! Embedding providers
//!
//! [`Embedder`] is the seam the batcher calls through. [`HttpEmbedder`] talks
//! to any OpenAI-compatible `/v1/embeddings` endpoint (vLLM, OpenAI, etc.).

mod http_embedder;

pub use http_embedder::HttpEmbedder;

use crate::error::Result;
use async_trait::async_trait;

/// Turns chunk text into vectors
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// One vector per input, in input order. A single failed call fails the
    /// whole batch; retries are the caller's concern.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Vector length the model produces
    fn dimensions(&self) -> usize;

    fn model_name(&self) -> &str;
}
