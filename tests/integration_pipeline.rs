#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, Stream, dictionary};
use tempfile::TempDir;

use askdocs::builder::build_from_dir;
use askdocs::embeddings::{NgramEmbedder, TextEmbedder};
use askdocs::generation::{AnswerGenerator, GenerationError};
use askdocs::index::store::{PersistedIndex, load, load_or_empty, save};
use askdocs::index::VectorIndex;
use askdocs::retriever::{DEFAULT_TOP_K, RetrievedContext, retrieve};
use askdocs::session::{
    NO_CONTEXT_REPLY, SessionState, UploadOutcome, UploadedDocument, answer_message,
};

/// Build a minimal in-memory PDF with one text line per page.
fn pdf_with_pages(lines: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for line in lines {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![100.into(), 600.into()]),
                Operation::new("Tj", vec![Object::string_literal(*line)]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            content.encode().expect("should encode page content"),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = i64::try_from(lines.len()).expect("page count fits i64");
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("should serialize pdf");
    bytes
}

struct CannedGenerator;

impl AnswerGenerator for CannedGenerator {
    fn generate(&self, _prompt: &str) -> Result<String, GenerationError> {
        Ok("A canned answer.".to_string())
    }
}

fn base_with(embedder: &NgramEmbedder, texts: &[String]) -> PersistedIndex {
    let vectors = embedder.embed(texts).expect("builtin embedder is total");
    let mut index = VectorIndex::new(embedder.dimension());
    index.add(&vectors).expect("fixture vectors should append");
    PersistedIndex {
        index,
        sentences: texts.to_vec(),
    }
}

// Scenario A: no base data; a three-chunk upload becomes the whole index,
// and querying with a chunk's own text returns that chunk as top-1 context.
#[test]
fn upload_without_base_then_exact_query() {
    let embedder = NgramEmbedder::new(128);
    let base = PersistedIndex::empty();
    let mut session = SessionState::new();
    session.attach_base();

    let document = UploadedDocument {
        name: "handbook.pdf".to_string(),
        bytes: pdf_with_pages(&[
            "annual leave covers fifteen days",
            "overtime pays time and a half",
            "remote work needs approval",
        ]),
    };

    let outcome = session
        .upload_documents(&base, &embedder, &[document])
        .expect("upload should succeed");
    assert_eq!(outcome, UploadOutcome::NewOnly { total: 3 });

    let (index, sentences) = session.active_view(&base);
    assert_eq!(index.ntotal(), 3);

    let context = retrieve(
        &embedder,
        index,
        sentences,
        "overtime pays time and a half",
        1,
    );
    assert_eq!(
        context,
        RetrievedContext::Context("overtime pays time and a half".to_string())
    );
}

// Scenario B: a populated base, but the session's combined store is empty.
// Search degrades to the sentinel instead of failing.
#[test]
fn search_over_empty_combined_store_returns_sentinel() {
    let embedder = NgramEmbedder::new(128);
    let texts: Vec<String> = (0..18).map(|i| format!("pretrained entry number {i}")).collect();
    let base = base_with(&embedder, &texts);
    assert_eq!(base.index.ntotal(), 18);

    // A combined view that lost its contents.
    let empty_combined = VectorIndex::new(embedder.dimension());
    let empty_sentences: Vec<String> = Vec::new();

    let context = retrieve(
        &embedder,
        &empty_combined,
        &empty_sentences,
        "pretrained entry number 7",
        DEFAULT_TOP_K,
    );
    assert!(context.is_no_match());

    let generator = CannedGenerator;
    let answer = answer_message(
        &embedder,
        &generator,
        &empty_combined,
        &empty_sentences,
        "pretrained entry number 7",
        DEFAULT_TOP_K,
    );
    assert_eq!(answer, NO_CONTEXT_REPLY);
}

// Scenario C: index and sentence store drift apart; ids beyond the store
// are skipped and the remaining valid matches still come back.
#[test]
fn desynced_store_skips_invalid_ids() {
    let embedder = NgramEmbedder::new(128);
    let texts = vec![
        "first stored sentence".to_string(),
        "second stored sentence".to_string(),
        "third stored sentence".to_string(),
    ];
    let vectors = embedder.embed(&texts).expect("builtin embedder is total");
    let mut index = VectorIndex::new(embedder.dimension());
    index.add(&vectors).expect("fixture vectors should append");

    // Drop the last sentence to simulate the desync.
    let truncated = &texts[..2];

    let context = retrieve(
        &embedder,
        &index,
        truncated,
        "third stored sentence",
        DEFAULT_TOP_K,
    );

    match context {
        RetrievedContext::Context(text) => {
            assert!(!text.contains("third stored sentence"));
            assert!(
                text.contains("first stored sentence")
                    || text.contains("second stored sentence")
            );
        }
        RetrievedContext::NoMatch => panic!("valid ids should still produce context"),
    }
}

// Persistence round-trip: build from a corpus, save, load, and verify the
// loaded pair answers like the original.
#[test]
fn build_save_load_round_trip() {
    let corpus = TempDir::new().expect("should create corpus dir");
    std::fs::write(
        corpus.path().join("policies.pdf"),
        pdf_with_pages(&["leave policy allows fifteen days", "bonuses pay out quarterly"]),
    )
    .expect("should write corpus pdf");

    let embedder = NgramEmbedder::new(128);
    let built = build_from_dir(&embedder, None, corpus.path()).expect("build should succeed");
    assert_eq!(built.index.ntotal(), built.sentences.len());

    let artifacts = TempDir::new().expect("should create artifacts dir");
    let index_path = artifacts.path().join("base_index.bin");
    let sentences_path = artifacts.path().join("base_sentences.json");

    save(&index_path, &sentences_path, &built.index, &built.sentences)
        .expect("should save artifacts");
    let loaded = load(&index_path, &sentences_path).expect("should load artifacts");

    assert_eq!(loaded.index.ntotal(), built.index.ntotal());
    assert_eq!(loaded.index.dimension(), built.index.dimension());
    assert_eq!(loaded.sentences, built.sentences);

    // The loaded base serves retrieval as-is.
    let context = retrieve(
        &embedder,
        &loaded.index,
        &loaded.sentences,
        "leave policy allows fifteen days",
        1,
    );
    assert_eq!(
        context,
        RetrievedContext::Context("leave policy allows fifteen days.".to_string())
    );
}

// Startup with missing artifacts degrades to the placeholder, and a later
// upload still produces a working session.
#[test]
fn missing_artifacts_degrade_then_upload_recovers() {
    let artifacts = TempDir::new().expect("should create artifacts dir");
    let base = load_or_empty(
        &artifacts.path().join("base_index.bin"),
        &artifacts.path().join("base_sentences.json"),
    );
    assert!(base.is_empty());

    let embedder = NgramEmbedder::new(128);
    let mut session = SessionState::new();
    session.attach_base();

    let outcome = session
        .upload_documents(
            &base,
            &embedder,
            &[UploadedDocument {
                name: "late.pdf".to_string(),
                bytes: pdf_with_pages(&["recovered content line"]),
            }],
        )
        .expect("upload should succeed");
    assert_eq!(outcome, UploadOutcome::NewOnly { total: 1 });

    let (index, sentences) = session.active_view(&base);
    let context = retrieve(&embedder, index, sentences, "recovered content line", 1);
    assert_eq!(
        context,
        RetrievedContext::Context("recovered content line".to_string())
    );
}
