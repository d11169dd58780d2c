// Embeddings module
// Text-to-vector providers behind a common trait

pub mod huggingface;
pub mod ngram;

use anyhow::Result;
use thiserror::Error;

use crate::config::{Config, EmbeddingProvider};

pub use huggingface::HfEmbeddingClient;
pub use ngram::NgramEmbedder;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding service returned HTTP {0}")]
    Status(u16),
    #[error("embedding service unreachable: {0}")]
    Transport(String),
    #[error("unexpected embedding response: {0}")]
    UnexpectedResponse(String),
    #[error("embedding count mismatch: sent {sent} texts, received {received} vectors")]
    CountMismatch { sent: usize, received: usize },
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A fixed-dimension text-to-vector function.
///
/// Implementations must return one vector per input text, in input order,
/// with every vector of length `dimension()`, and must be deterministic for
/// a fixed model: the same text always embeds to the same vector.
pub trait TextEmbedder {
    fn dimension(&self) -> usize;

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError>;

    #[inline]
    fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed(&[text.to_string()])?;
        vectors.pop().ok_or(EmbeddingError::CountMismatch {
            sent: 1,
            received: 0,
        })
    }
}

/// Construct the configured embedding provider.
#[inline]
pub fn embedder_from_config(config: &Config) -> Result<Box<dyn TextEmbedder>> {
    match config.service.embedding_provider {
        EmbeddingProvider::Remote => Ok(Box::new(HfEmbeddingClient::new(config)?)),
        EmbeddingProvider::Builtin => Ok(Box::new(NgramEmbedder::new(
            config.service.embedding_dimension as usize,
        ))),
    }
}
