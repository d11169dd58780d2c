// Session module
// Per-session index state, document uploads, and the answer boundary


use thiserror::Error;
use tracing::{error, info};
use uuid::Uuid;

use crate::embeddings::{EmbeddingError, TextEmbedder};
use crate::extract::{self, ExtractError};
use crate::generation::{AnswerGenerator, build_prompt};
use crate::index::{IndexError, PersistedIndex, VectorIndex, merge_indices};
use crate::retriever::{RetrievedContext, retrieve};

/// Greeting emitted into a fresh session's history.
pub const GREETING: &str =
    "Hello! I am Askdocs, your document assistant. How can I help you today?";

/// Reply when retrieval finds nothing relevant. Fixed wording; the raw
/// retrieval outcome never reaches the user.
pub const NO_CONTEXT_REPLY: &str = "I'm sorry, I couldn't find any relevant information in the \
     indexed documents. Could you try rephrasing your question or uploading more documents?";

/// Reply when the generation service fails. Diagnostic detail goes to the
/// log only.
pub const SERVICE_TROUBLE_REPLY: &str = "I'm sorry, something went wrong while processing your \
     request. Please try again later.";

/// Index state of one session.
///
/// `Uninitialized` exists only before the base index is attached;
/// `BaseLoaded` answers from the shared base; `CombinedReady` answers from
/// the session-owned combined index built by the last upload.
#[derive(Debug, Default)]
pub enum SessionIndex {
    #[default]
    Uninitialized,
    BaseLoaded,
    CombinedReady {
        index: VectorIndex,
        sentences: Vec<String>,
    },
}

/// Explicit per-session state. The base index is process-wide read-only
/// state owned elsewhere; this struct never holds or mutates it.
#[derive(Debug)]
pub struct SessionState {
    session_id: Uuid,
    index: SessionIndex,
}

/// A document handed to the upload boundary.
#[derive(Debug, Clone)]
pub struct UploadedDocument {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// What an upload produced, distinguishing "nothing searchable at all" from
/// a normal combined index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// Base data plus the uploaded chunks.
    Combined { total: usize },
    /// No pretrained data existed; the index holds only the upload.
    NewOnly { total: usize },
    /// Neither pretrained data nor any text in the upload.
    NoData,
}

#[derive(Debug, Error)]
pub enum UploadError {
    #[error(transparent)]
    Extract(#[from] ExtractError),
    #[error(transparent)]
    Embedding(#[from] EmbeddingError),
    #[error(transparent)]
    Index(#[from] IndexError),
}

impl Default for SessionState {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    #[inline]
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            index: SessionIndex::Uninitialized,
        }
    }

    #[inline]
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    #[inline]
    pub fn index_state(&self) -> &SessionIndex {
        &self.index
    }

    /// Transition `Uninitialized -> BaseLoaded`. A session already past that
    /// point keeps its state; there is no way back.
    #[inline]
    pub fn attach_base(&mut self) {
        if matches!(self.index, SessionIndex::Uninitialized) {
            self.index = SessionIndex::BaseLoaded;
        }
    }

    #[inline]
    pub fn is_ready(&self) -> bool {
        !matches!(self.index, SessionIndex::Uninitialized)
    }

    /// The index/sentence view queries should run against: the session's
    /// combined index when one exists, the shared base otherwise.
    #[inline]
    pub fn active_view<'a>(&'a self, base: &'a PersistedIndex) -> (&'a VectorIndex, &'a [String]) {
        match &self.index {
            SessionIndex::CombinedReady { index, sentences } => (index, sentences.as_slice()),
            SessionIndex::Uninitialized | SessionIndex::BaseLoaded => {
                (&base.index, base.sentences.as_slice())
            }
        }
    }

    /// Process an upload batch into a fresh combined index.
    ///
    /// Interactive boundary policy: the first document that fails extraction
    /// aborts the whole upload and the session keeps its previous index. On
    /// success the previous combined index (if any) is replaced wholesale.
    #[inline]
    pub fn upload_documents(
        &mut self,
        base: &PersistedIndex,
        embedder: &dyn TextEmbedder,
        documents: &[UploadedDocument],
    ) -> Result<UploadOutcome, UploadError> {
        let mut texts: Vec<String> = Vec::new();
        for document in documents {
            let text = extract::extract_text(&document.name, &document.bytes)?;
            texts.extend(
                extract::chunk_lines(&text, &document.name)
                    .into_iter()
                    .map(|chunk| chunk.text),
            );
        }

        if texts.is_empty() && base.is_empty() {
            self.attach_base();
            return Ok(UploadOutcome::NoData);
        }

        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            embedder.embed(&texts)?
        };

        let (index, sentences) = merge_indices(&base.index, &base.sentences, &vectors, &texts)?;
        let total = index.ntotal();

        info!(
            "Session {}: combined index ready with {} entries ({} from upload)",
            self.session_id,
            total,
            texts.len()
        );

        self.index = SessionIndex::CombinedReady { index, sentences };

        Ok(if base.is_empty() {
            UploadOutcome::NewOnly { total }
        } else {
            UploadOutcome::Combined { total }
        })
    }
}

/// Answer one user message from the given index view.
///
/// Every failure class ends in fixed, friendly wording: no context found
/// and service trouble read differently, but neither ever leaks an internal
/// error string.
#[inline]
pub fn answer_message(
    embedder: &dyn TextEmbedder,
    generator: &dyn AnswerGenerator,
    index: &VectorIndex,
    sentences: &[String],
    question: &str,
    top_k: usize,
) -> String {
    match retrieve(embedder, index, sentences, question, top_k) {
        RetrievedContext::NoMatch => NO_CONTEXT_REPLY.to_string(),
        RetrievedContext::Context(context) => {
            let prompt = build_prompt(&context, question);
            match generator.generate(&prompt) {
                Ok(answer) if !answer.trim().is_empty() => answer,
                Ok(_) => {
                    error!("Generation service returned an empty answer");
                    SERVICE_TROUBLE_REPLY.to_string()
                }
                Err(e) => {
                    error!("Generation service failed: {}", e);
                    SERVICE_TROUBLE_REPLY.to_string()
                }
            }
        }
    }
}
