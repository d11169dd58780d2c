// Retriever module
// Maps a free-text query to concatenated top-k context


use tracing::{debug, error, warn};

use crate::embeddings::TextEmbedder;
use crate::index::VectorIndex;

pub const DEFAULT_TOP_K: usize = 3;

/// Outcome of a retrieval. `NoMatch` is a first-class value, not a magic
/// string: callers branch on it to present their own fallback wording.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetrievedContext {
    /// Concatenated text of the nearest chunks, most similar first.
    Context(String),
    /// Nothing searchable, or nothing mapped back to a stored sentence.
    NoMatch,
}

impl RetrievedContext {
    #[inline]
    pub fn is_no_match(&self) -> bool {
        matches!(self, RetrievedContext::NoMatch)
    }

    #[inline]
    pub fn into_context(self) -> Option<String> {
        match self {
            RetrievedContext::Context(text) => Some(text),
            RetrievedContext::NoMatch => None,
        }
    }
}

/// Retrieve the `k` chunks nearest to `query` and join them with single
/// spaces.
///
/// Degrades to `NoMatch` instead of failing: an absent or empty index, an
/// embedding/service failure, or a store/index desync all end in the
/// sentinel so the caller can answer gracefully. Ids at or beyond the
/// sentence-store length are skipped, not fatal.
#[inline]
pub fn retrieve(
    embedder: &dyn TextEmbedder,
    index: &VectorIndex,
    sentences: &[String],
    query: &str,
    k: usize,
) -> RetrievedContext {
    if index.is_empty() || sentences.is_empty() {
        debug!("Retrieval over empty index or sentence store");
        return RetrievedContext::NoMatch;
    }

    let query_vector = match embedder.embed_one(query) {
        Ok(vector) => vector,
        Err(e) => {
            error!("Failed to embed query: {}", e);
            return RetrievedContext::NoMatch;
        }
    };

    let hits = match index.search(&query_vector, k) {
        Ok(hits) => hits,
        Err(e) => {
            error!("Index search failed: {}", e);
            return RetrievedContext::NoMatch;
        }
    };

    let matched: Vec<&str> = hits
        .iter()
        .filter_map(|hit| {
            sentences.get(hit.id).map_or_else(
                || {
                    warn!(
                        "Search returned id {} beyond sentence store of {} entries",
                        hit.id,
                        sentences.len()
                    );
                    None
                },
                |sentence| Some(sentence.as_str()),
            )
        })
        .collect();

    if matched.is_empty() {
        return RetrievedContext::NoMatch;
    }

    debug!("Retrieved {} context chunks for query", matched.len());
    RetrievedContext::Context(matched.join(" "))
}
