// Offline index builder
// Turns a corpus directory of PDFs into a persistent index + sentence store


pub mod summarize;

use anyhow::Result;
use indicatif::ProgressBar;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::embeddings::TextEmbedder;
use crate::extract;
use crate::index::VectorIndex;
use summarize::Summarizer;

/// Outcome counters for one offline build.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub documents_processed: usize,
    pub documents_skipped: usize,
    pub chunks_collected: usize,
    pub sentences_indexed: usize,
}

#[derive(Debug)]
pub struct BuiltIndex {
    pub index: VectorIndex,
    pub sentences: Vec<String>,
    pub stats: BuildStats,
}

/// Build an index from every PDF in `corpus_dir`.
///
/// Per document: extract, chunk, optionally summarize each chunk (falling
/// back to the original text on failure), sentence-tokenize, collect. A
/// document that fails to read or parse is skipped with a warning; the batch
/// completes with partial data. All collected sentences are embedded in one
/// batch at the end. Zero documents produce a valid empty index of the
/// embedder's dimension.
#[inline]
pub fn build_from_dir(
    embedder: &dyn TextEmbedder,
    summarizer: Option<&Summarizer>,
    corpus_dir: &Path,
) -> Result<BuiltIndex> {
    let documents = pdf_files_in(corpus_dir)?;
    info!(
        "Building index from {} documents in {}",
        documents.len(),
        corpus_dir.display()
    );

    let mut stats = BuildStats::default();
    let mut sentences: Vec<String> = Vec::new();

    let progress = ProgressBar::new(documents.len() as u64);
    for path in &documents {
        progress.inc(1);
        let name = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Skipping unreadable document '{}': {}", name, e);
                stats.documents_skipped += 1;
                continue;
            }
        };

        let text = match extract::extract_text(&name, &bytes) {
            Ok(text) => text,
            Err(e) => {
                warn!("Skipping document that failed extraction: {}", e);
                stats.documents_skipped += 1;
                continue;
            }
        };

        let chunks = extract::chunk_lines(&text, &name);
        stats.chunks_collected += chunks.len();
        for chunk in chunks {
            let chunk_text = summarizer
                .map_or_else(|| chunk.text.clone(), |s| s.summarize_or_original(&chunk.text));
            sentences.extend(split_sentences(&chunk_text));
        }

        stats.documents_processed += 1;
        debug!("Collected {} sentences so far after '{}'", sentences.len(), name);
    }
    progress.finish_and_clear();

    let mut index = VectorIndex::new(embedder.dimension());
    if !sentences.is_empty() {
        let vectors = embedder.embed(&sentences)?;
        index.add(&vectors)?;
    }
    stats.sentences_indexed = sentences.len();

    info!(
        "Built index: {} vectors from {} documents ({} skipped)",
        index.ntotal(),
        stats.documents_processed,
        stats.documents_skipped
    );

    Ok(BuiltIndex {
        index,
        sentences,
        stats,
    })
}

/// Split a chunk into sentences on terminal punctuation, restoring a period
/// on each piece. Empty pieces are dropped.
#[inline]
pub fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .map(|piece| format!("{piece}."))
        .collect()
}

fn pdf_files_in(corpus_dir: &Path) -> Result<Vec<PathBuf>> {
    if !corpus_dir.exists() {
        warn!(
            "Corpus directory {} does not exist; building an empty index",
            corpus_dir.display()
        );
        return Ok(Vec::new());
    }

    let mut paths: Vec<PathBuf> = fs::read_dir(corpus_dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
        })
        .collect();

    // Deterministic build order.
    paths.sort();
    Ok(paths)
}
