use anyhow::{Context, Result, bail};
use console::style;
use dialoguer::Input;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};

use crate::builder::{self, summarize::Summarizer};
use crate::config::Config;
use crate::embeddings::{TextEmbedder, embedder_from_config};
use crate::generation::GenerationClient;
use crate::history::{ChatHistory, ChatTurn};
use crate::index::store::{self, PersistedIndex};
use crate::session::{
    GREETING, SessionState, UploadOutcome, UploadedDocument, answer_message,
};

/// Run the offline pipeline over the corpus directory and persist the base
/// index/sentence pair.
#[inline]
pub fn build_index(config: &Config) -> Result<()> {
    let embedder = embedder_from_config(config)?;
    let summarizer = if config.index.summarize_chunks {
        Some(Summarizer::new(config).context("Failed to initialize summarizer")?)
    } else {
        None
    };

    let built = builder::build_from_dir(
        embedder.as_ref(),
        summarizer.as_ref(),
        &config.corpus_dir_path(),
    )
    .context("Index build failed")?;

    store::save(
        &config.index_path(),
        &config.sentences_path(),
        &built.index,
        &built.sentences,
    )
    .context("Failed to persist index artifacts")?;

    println!("Index build complete:");
    println!("  Documents processed: {}", built.stats.documents_processed);
    println!("  Documents skipped: {}", built.stats.documents_skipped);
    println!("  Chunks collected: {}", built.stats.chunks_collected);
    println!("  Sentences indexed: {}", built.stats.sentences_indexed);
    println!("  Index written to: {}", config.index_path().display());

    Ok(())
}

/// Interactive chat loop: greeting, history replay, uploads, answers.
#[inline]
pub async fn chat(config: &Config) -> Result<()> {
    let base = store::load_or_empty(&config.index_path(), &config.sentences_path());
    let history = ChatHistory::new(config.history_db_path())
        .await
        .context("Failed to open chat history")?;
    let embedder = embedder_from_config(config)?;
    let generator = GenerationClient::new(config)?;

    let mut session = SessionState::new();
    session.attach_base();
    let session_id = session.session_id().to_string();
    info!("Starting chat session {}", session_id);

    if history.is_fresh(&session_id).await? {
        history.append(&session_id, None, GREETING).await?;
    }
    for turn in history.for_session(&session_id).await? {
        print_turn(&turn);
    }

    println!();
    println!(
        "{}",
        style("Ask a question, :upload <file.pdf ...> to add documents, :quit to leave.").dim()
    );

    loop {
        let line: String = match Input::new()
            .with_prompt("you")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                info!("Input closed, ending session: {}", e);
                break;
            }
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line == ":quit" || line == ":exit" {
            break;
        }
        if let Some(rest) = line.strip_prefix(":upload") {
            handle_upload(rest, &mut session, &base, embedder.as_ref());
            continue;
        }

        let (index, sentences) = session.active_view(&base);
        let response = answer_message(
            embedder.as_ref(),
            &generator,
            index,
            sentences,
            line,
            config.index.top_k,
        );

        history.append(&session_id, Some(line), &response).await?;
        println!("{} {}", style("bot:").bold().green(), response);
    }

    Ok(())
}

/// One-shot question, optionally against uploaded documents.
#[inline]
pub fn ask(config: &Config, question: &str, documents: &[PathBuf]) -> Result<()> {
    let base = store::load_or_empty(&config.index_path(), &config.sentences_path());
    let embedder = embedder_from_config(config)?;
    let generator = GenerationClient::new(config)?;

    let mut session = SessionState::new();
    session.attach_base();

    if !documents.is_empty() {
        let uploads = read_uploads(documents)?;
        match session.upload_documents(&base, embedder.as_ref(), &uploads) {
            Ok(outcome) => report_upload(&outcome),
            Err(e) => {
                error!("Upload failed: {}", e);
                bail!("Failed to process the uploaded documents; please make sure they are valid PDF files");
            }
        }
    }

    let (index, sentences) = session.active_view(&base);
    let answer = answer_message(
        embedder.as_ref(),
        &generator,
        index,
        sentences,
        question,
        config.index.top_k,
    );
    println!("{}", answer);

    Ok(())
}

/// Report the state of the persisted artifacts and chat history.
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("{}", style("Askdocs Status").bold().cyan());
    println!();
    println!("Config file: {}", config.config_file_path().display());

    match store::load(&config.index_path(), &config.sentences_path()) {
        Ok(persisted) => {
            println!(
                "Base index: {} vectors, {} dimensions",
                persisted.index.ntotal(),
                persisted.index.dimension()
            );
            println!("Sentence store: {} entries", persisted.sentences.len());
        }
        Err(e) => {
            println!("Base index: not available ({})", e);
        }
    }

    let corpus_dir = config.corpus_dir_path();
    if corpus_dir.exists() {
        let pdf_count = fs::read_dir(&corpus_dir)?
            .filter_map(std::result::Result::ok)
            .filter(|entry| {
                entry
                    .path()
                    .extension()
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"))
            })
            .count();
        println!("Corpus: {} PDF documents in {}", pdf_count, corpus_dir.display());
    } else {
        println!("Corpus: directory {} does not exist", corpus_dir.display());
    }

    if config.history_db_path().exists() {
        let history = ChatHistory::new(config.history_db_path()).await?;
        println!("Chat history: {} stored turns", history.total_turns().await?);
    } else {
        println!("Chat history: empty");
    }

    Ok(())
}

fn print_turn(turn: &ChatTurn) {
    if let Some(user) = &turn.user_message {
        println!("{} {}", style("you:").bold().cyan(), user);
    }
    println!("{} {}", style("bot:").bold().green(), turn.bot_response);
}

fn handle_upload(
    args: &str,
    session: &mut SessionState,
    base: &PersistedIndex,
    embedder: &dyn TextEmbedder,
) {
    let paths: Vec<PathBuf> = args.split_whitespace().map(PathBuf::from).collect();
    if paths.is_empty() {
        println!("Usage: :upload <file.pdf> [more.pdf ...]");
        return;
    }

    let uploads = match read_uploads(&paths) {
        Ok(uploads) => uploads,
        Err(e) => {
            error!("Failed to read uploads: {}", e);
            println!("Could not read the given files; nothing was uploaded.");
            return;
        }
    };

    match session.upload_documents(base, embedder, &uploads) {
        Ok(outcome) => report_upload(&outcome),
        Err(e) => {
            error!("Upload failed: {}", e);
            println!(
                "Failed to process the uploaded documents. Please make sure they are valid PDF files."
            );
        }
    }
}

fn read_uploads(paths: &[PathBuf]) -> Result<Vec<UploadedDocument>> {
    paths
        .iter()
        .map(|path| {
            let bytes = fs::read(path)
                .with_context(|| format!("Failed to read document: {}", path.display()))?;
            let name = document_name(path);
            Ok(UploadedDocument { name, bytes })
        })
        .collect()
}

fn document_name(path: &Path) -> String {
    path.file_name().map_or_else(
        || path.display().to_string(),
        |name| name.to_string_lossy().into_owned(),
    )
}

fn report_upload(outcome: &UploadOutcome) {
    match outcome {
        UploadOutcome::Combined { total } => println!(
            "Documents processed and combined with the pretrained data ({} searchable chunks).",
            total
        ),
        UploadOutcome::NewOnly { total } => println!(
            "Documents processed ({} searchable chunks). No pretrained data was found, so answers use only your uploads.",
            total
        ),
        UploadOutcome::NoData => println!(
            "The upload contained no extractable text and no pretrained data exists yet."
        ),
    }
}
