// Vector index module
// Append-only exact nearest-neighbor search over fixed-dimension vectors


pub mod store;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use store::{PersistedIndex, StoreError};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IndexError {
    #[error("vector dimension mismatch: index holds {expected}-dimensional vectors, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error("index is not ready for search (zero dimension)")]
    NotReady,
    #[error("refusing misaligned merge: {vectors} vectors against {texts} texts")]
    Misaligned { vectors: usize, texts: usize },
}

/// One search result: insertion-order id plus squared L2 distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub id: usize,
    pub distance: f32,
}

/// Append-only collection of fixed-dimension vectors, addressable by
/// zero-based insertion-order ids.
///
/// Ids are never reused or reassigned; there is no update or delete. Vectors
/// are stored row-major in one contiguous buffer, and `search` scans the
/// full contents at call time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

impl VectorIndex {
    #[inline]
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            vectors: Vec::new(),
        }
    }

    #[inline]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of stored vectors; valid ids are `0..ntotal()`.
    #[inline]
    pub fn ntotal(&self) -> usize {
        if self.dimension == 0 {
            0
        } else {
            self.vectors.len() / self.dimension
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.ntotal() == 0
    }

    /// Append vectors in order, extending `ntotal`.
    ///
    /// Every vector is validated before anything is appended, so a
    /// mismatched batch never partially lands in the index.
    #[inline]
    pub fn add(&mut self, vectors: &[Vec<f32>]) -> Result<(), IndexError> {
        for vector in vectors {
            if vector.len() != self.dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        self.vectors
            .reserve(vectors.len().saturating_mul(self.dimension));
        for vector in vectors {
            self.vectors.extend_from_slice(vector);
        }

        Ok(())
    }

    /// Exact top-k search by squared L2 distance.
    ///
    /// Results are sorted by ascending distance with ties broken by
    /// ascending id, at most `k` of them (fewer when `ntotal < k`, empty on
    /// an empty index).
    #[inline]
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchHit>, IndexError> {
        if self.dimension == 0 {
            return Err(IndexError::NotReady);
        }
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }

        let mut hits: Vec<SearchHit> = self
            .vectors
            .chunks_exact(self.dimension)
            .enumerate()
            .map(|(id, row)| SearchHit {
                id,
                distance: squared_l2(query, row),
            })
            .collect();

        hits.sort_by(|a, b| {
            a.distance
                .total_cmp(&b.distance)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);

        Ok(hits)
    }

    /// Copy out stored vectors by id range, clamped to `ntotal`.
    ///
    /// This is the index's only read-back primitive; it exists so merges can
    /// copy a base index without touching its internals.
    #[inline]
    pub fn reconstruct_range(&self, start: usize, count: usize) -> Vec<Vec<f32>> {
        if self.dimension == 0 {
            return Vec::new();
        }

        let end = start.saturating_add(count).min(self.ntotal());
        (start..end)
            .map(|id| self.vectors[id * self.dimension..(id + 1) * self.dimension].to_vec())
            .collect()
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| {
            let d = x - y;
            d * d
        })
        .sum()
}

/// Combine a base index with freshly embedded vectors into one new index
/// plus a sentence store whose positions match the new index's ids.
///
/// The base is copied, never mutated, so a process-wide base index can be
/// shared across sessions without locks. A zero-entry, zero-dimension base
/// (the "no pretrained data" placeholder) is valid: the combined index then
/// adopts the new vectors' dimension.
#[inline]
pub fn merge_indices(
    base: &VectorIndex,
    base_sentences: &[String],
    new_vectors: &[Vec<f32>],
    new_texts: &[String],
) -> Result<(VectorIndex, Vec<String>), IndexError> {
    if base.ntotal() != base_sentences.len() {
        return Err(IndexError::Misaligned {
            vectors: base.ntotal(),
            texts: base_sentences.len(),
        });
    }
    if new_vectors.len() != new_texts.len() {
        return Err(IndexError::Misaligned {
            vectors: new_vectors.len(),
            texts: new_texts.len(),
        });
    }

    let dimension = if base.dimension() > 0 {
        base.dimension()
    } else {
        new_vectors.first().map_or(0, Vec::len)
    };

    let mut combined = VectorIndex::new(dimension);
    combined.add(&base.reconstruct_range(0, base.ntotal()))?;
    combined.add(new_vectors)?;

    let mut sentences = Vec::with_capacity(base_sentences.len() + new_texts.len());
    sentences.extend_from_slice(base_sentences);
    sentences.extend_from_slice(new_texts);

    Ok((combined, sentences))
}
