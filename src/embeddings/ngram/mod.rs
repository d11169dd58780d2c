
use std::hash::{Hash, Hasher};

use super::{EmbeddingError, TextEmbedder};

const NGRAM_SIZE: usize = 3;

/// Deterministic character n-gram hashing embedder.
///
/// Each text is lowercased, padded with spaces, and its character trigrams
/// are hashed into a fixed number of buckets; the resulting count vector is
/// L2-normalized. No model download, no network: texts sharing character
/// n-grams land near each other, and identical texts always embed to the
/// identical vector, which also makes this the deterministic fixture for
/// tests.
#[derive(Debug, Clone, Copy)]
pub struct NgramEmbedder {
    dimension: usize,
}

impl NgramEmbedder {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension: dimension.max(1),
        }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        let normalized = text.to_lowercase();
        let mut chars: Vec<char> = Vec::with_capacity(normalized.chars().count() + 2);
        chars.push(' ');
        chars.extend(normalized.chars());
        chars.push(' ');

        for window in chars.windows(NGRAM_SIZE) {
            // DefaultHasher with fixed keys: stable across runs.
            let mut hasher = std::collections::hash_map::DefaultHasher::new();
            window.hash(&mut hasher);
            let bucket = (hasher.finish() % self.dimension as u64) as usize;
            vector[bucket] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

impl TextEmbedder for NgramEmbedder {
    #[inline]
    fn dimension(&self) -> usize {
        self.dimension
    }

    #[inline]
    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}
