use anyhow::{Context, Result};
use console::style;
use dialoguer::{Confirm, Input, Select};

use super::{Config, EmbeddingProvider, api_token};

#[inline]
pub fn run_interactive_config() -> Result<()> {
    eprintln!("{}", style("Askdocs Configuration Setup").bold().cyan());
    eprintln!();

    let mut config = load_existing_config()?;

    eprintln!("{}", style("Inference Service").bold().yellow());
    eprintln!("Configure the hosted models used for embedding and answering.");
    eprintln!();

    configure_service(&mut config)?;

    eprintln!();
    if api_token().is_none() {
        eprintln!(
            "{}",
            style(format!(
                "Warning: {} is not set. Remote models may reject requests.",
                super::API_TOKEN_ENV
            ))
            .yellow()
        );
        eprintln!();
    }

    if Confirm::new()
        .with_prompt("Save configuration?")
        .default(true)
        .interact()?
    {
        config.save().context("Failed to save configuration")?;
        eprintln!("{}", style("Configuration saved successfully!").green());
        eprintln!(
            "Configuration saved to: {}",
            style(config.config_file_path().display()).cyan()
        );
    } else {
        eprintln!("Configuration not saved.");
    }

    Ok(())
}

#[inline]
pub fn show_config() -> Result<()> {
    let config = Config::load_default().context("Failed to load configuration")?;

    eprintln!("{}", style("Current Configuration").bold().cyan());
    eprintln!();

    eprintln!("{}", style("Service Settings:").bold().yellow());
    eprintln!("  API base: {}", style(&config.service.api_base).cyan());
    eprintln!(
        "  Embedding provider: {}",
        style(provider_label(config.service.embedding_provider)).cyan()
    );
    eprintln!(
        "  Embedding model: {} ({} dimensions)",
        style(&config.service.embedding_model).cyan(),
        config.service.embedding_dimension
    );
    eprintln!(
        "  Generation model: {}",
        style(&config.service.generation_model).cyan()
    );
    eprintln!(
        "  Summarization model: {}",
        style(&config.service.summarization_model).cyan()
    );
    eprintln!("  Batch size: {}", style(config.service.batch_size).cyan());

    eprintln!();
    eprintln!("{}", style("Index Settings:").bold().yellow());
    eprintln!("  Corpus dir: {}", style(config.corpus_dir_path().display()).cyan());
    eprintln!("  Top-k: {}", style(config.index.top_k).cyan());
    eprintln!(
        "  Summarize chunks: {}",
        style(config.index.summarize_chunks).cyan()
    );

    eprintln!();
    eprintln!(
        "Config file: {}",
        style(config.config_file_path().display()).dim()
    );

    Ok(())
}

fn load_existing_config() -> Result<Config> {
    Config::load_default().map_or_else(
        |_| {
            eprintln!(
                "{}",
                style("No existing configuration found. Using defaults.").yellow()
            );
            let config_dir = super::get_config_dir()?;
            Config::load(config_dir)
        },
        |config| {
            eprintln!("{}", style("Found existing configuration.").green());
            Ok(config)
        },
    )
}

fn configure_service(config: &mut Config) -> Result<()> {
    let providers = &[
        provider_label(EmbeddingProvider::Remote),
        provider_label(EmbeddingProvider::Builtin),
    ];
    let default_index = match config.service.embedding_provider {
        EmbeddingProvider::Remote => 0,
        EmbeddingProvider::Builtin => 1,
    };

    let provider_index = Select::new()
        .with_prompt("Embedding provider")
        .default(default_index)
        .items(providers)
        .interact()?;
    config.service.embedding_provider = if provider_index == 1 {
        EmbeddingProvider::Builtin
    } else {
        EmbeddingProvider::Remote
    };

    config.service.api_base = Input::new()
        .with_prompt("Inference API base URL")
        .default(config.service.api_base.clone())
        .interact_text()?;

    config.service.embedding_model = Input::new()
        .with_prompt("Embedding model")
        .default(config.service.embedding_model.clone())
        .interact_text()?;

    config.service.embedding_dimension = Input::new()
        .with_prompt("Embedding dimension")
        .default(config.service.embedding_dimension)
        .interact_text()?;

    config.service.generation_model = Input::new()
        .with_prompt("Generation model")
        .default(config.service.generation_model.clone())
        .interact_text()?;

    Ok(())
}

fn provider_label(provider: EmbeddingProvider) -> &'static str {
    match provider {
        EmbeddingProvider::Remote => "remote (hosted inference API)",
        EmbeddingProvider::Builtin => "builtin (offline n-gram hashing)",
    }
}
