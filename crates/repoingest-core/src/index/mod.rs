//! Indexing pipeline
//!
//! Path classification, repository walking, chunking and batched embedding.

mod chunker;
mod embedder;
mod language;
mod scanner;

pub use chunker::*;
pub use embedder::*;
pub use language::*;
pub use scanner::*;
