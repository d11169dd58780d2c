// Document extraction module
// Turns PDF byte streams into normalized text and indexable chunks


use thiserror::Error;
use tracing::{debug, warn};
use unicode_normalization::UnicodeNormalization;

/// One indexable unit of document text, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Non-empty after trimming.
    pub text: String,
    /// Identifier of the document this chunk came from. Kept for
    /// traceability, not used for search.
    pub source: String,
}

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to parse document '{name}': {reason}")]
    Parse { name: String, reason: String },
}

/// Extract the text of a PDF byte stream, page by page in page order.
///
/// Each page's text is normalized (NFKD) so ligatures and other
/// special-character artifacts collapse into their plain equivalents, and a
/// newline is kept between pages so page boundaries stay chunk boundaries.
#[inline]
pub fn extract_text(name: &str, bytes: &[u8]) -> Result<String, ExtractError> {
    let document = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Parse {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    let mut text = String::new();
    for page_number in document.get_pages().keys() {
        match document.extract_text(&[*page_number]) {
            Ok(page_text) => {
                text.push_str(&normalize_text(&page_text));
                if !text.ends_with('\n') {
                    text.push('\n');
                }
            }
            Err(e) => {
                // A single unreadable page does not invalidate the document.
                warn!(
                    "Skipping page {} of '{}' during extraction: {}",
                    page_number, name, e
                );
            }
        }
    }

    debug!(
        "Extracted {} characters from '{}' ({} pages)",
        text.len(),
        name,
        document.get_pages().len()
    );

    Ok(text)
}

/// Collapse compatibility characters (ligatures, fullwidth forms) into plain
/// equivalents.
#[inline]
pub fn normalize_text(text: &str) -> String {
    text.nfkd().collect()
}

/// Split extracted text into chunks on line boundaries, dropping chunks that
/// are empty after trimming.
///
/// Deliberately naive: boundary splitting plus trim keeps the pipeline
/// reproducible end to end.
#[inline]
pub fn chunk_lines(text: &str, source: &str) -> Vec<Chunk> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| Chunk {
            text: line.to_string(),
            source: source.to_string(),
        })
        .collect()
}
