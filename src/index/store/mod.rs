
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::VectorIndex;

/// A loaded index/sentence-store pair. The two are only ever written and
/// read together; `sentences[i]` is the text embedded at index id `i`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedIndex {
    pub index: VectorIndex,
    pub sentences: Vec<String>,
}

impl PersistedIndex {
    /// The "no pretrained data" placeholder: a valid, zero-entry,
    /// zero-dimension index rather than an absent one.
    #[inline]
    pub fn empty() -> Self {
        Self {
            index: VectorIndex::new(0),
            sentences: Vec::new(),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("missing index artifact: {0}")]
    MissingArtifact(PathBuf),
    #[error("index and sentence artifacts disagree: {vectors} vectors vs {sentences} sentences")]
    LengthMismatch { vectors: usize, sentences: usize },
    #[error("failed to decode {path}: {reason}")]
    Decode { path: PathBuf, reason: String },
    #[error("failed to encode index artifacts: {0}")]
    Encode(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Persist an index and its sentence store as a consistent pair.
///
/// Refuses a misaligned pair outright; a half-written pair is still possible
/// on IO failure, which `load` treats as "no pretrained data".
#[inline]
pub fn save(
    index_path: &Path,
    sentences_path: &Path,
    index: &VectorIndex,
    sentences: &[String],
) -> Result<(), StoreError> {
    if index.ntotal() != sentences.len() {
        return Err(StoreError::LengthMismatch {
            vectors: index.ntotal(),
            sentences: sentences.len(),
        });
    }

    if let Some(parent) = index_path.parent() {
        fs::create_dir_all(parent)?;
    }
    if let Some(parent) = sentences_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let blob = bincode::serialize(index).map_err(|e| StoreError::Encode(e.to_string()))?;
    fs::write(index_path, blob)?;

    let json = serde_json::to_vec_pretty(sentences).map_err(|e| StoreError::Encode(e.to_string()))?;
    fs::write(sentences_path, json)?;

    info!(
        "Persisted index ({} vectors, {} dimensions) to {}",
        index.ntotal(),
        index.dimension(),
        index_path.display()
    );

    Ok(())
}

/// Load a persisted index/sentence-store pair.
#[inline]
pub fn load(index_path: &Path, sentences_path: &Path) -> Result<PersistedIndex, StoreError> {
    if !index_path.exists() {
        return Err(StoreError::MissingArtifact(index_path.to_path_buf()));
    }
    if !sentences_path.exists() {
        return Err(StoreError::MissingArtifact(sentences_path.to_path_buf()));
    }

    let blob = fs::read(index_path)?;
    let index: VectorIndex = bincode::deserialize(&blob).map_err(|e| StoreError::Decode {
        path: index_path.to_path_buf(),
        reason: e.to_string(),
    })?;

    let json = fs::read(sentences_path)?;
    let sentences: Vec<String> =
        serde_json::from_slice(&json).map_err(|e| StoreError::Decode {
            path: sentences_path.to_path_buf(),
            reason: e.to_string(),
        })?;

    if index.ntotal() != sentences.len() {
        return Err(StoreError::LengthMismatch {
            vectors: index.ntotal(),
            sentences: sentences.len(),
        });
    }

    Ok(PersistedIndex { index, sentences })
}

/// Load the base artifacts, degrading any failure to the zero-entry
/// placeholder so startup never aborts on stale or missing files.
#[inline]
pub fn load_or_empty(index_path: &Path, sentences_path: &Path) -> PersistedIndex {
    match load(index_path, sentences_path) {
        Ok(persisted) => {
            info!(
                "Loaded base index: {} vectors, {} dimensions",
                persisted.index.ntotal(),
                persisted.index.dimension()
            );
            persisted
        }
        Err(e) => {
            warn!("No pretrained data available: {}", e);
            PersistedIndex::empty()
        }
    }
}
