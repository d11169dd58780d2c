use clap::{Parser, Subcommand};
use std::path::PathBuf;

use askdocs::Result;
use askdocs::commands::{ask, build_index, chat, show_status};
use askdocs::config::{Config, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "askdocs")]
#[command(about = "Document-grounded question answering over an embedded vector index")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure the inference service and index settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the base index from the corpus directory
    Build,
    /// Start an interactive chat session
    Chat,
    /// Ask a single question and exit
    Ask {
        /// The question to answer
        question: String,
        /// PDF documents to search in addition to the base index
        #[arg(long = "doc")]
        documents: Vec<PathBuf>,
    },
    /// Show the state of the index artifacts and chat history
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config()?;
            } else {
                run_interactive_config()?;
            }
        }
        Commands::Build => {
            let config = Config::load_default()?;
            build_index(&config)?;
        }
        Commands::Chat => {
            let config = Config::load_default()?;
            chat(&config).await?;
        }
        Commands::Ask {
            question,
            documents,
        } => {
            let config = Config::load_default()?;
            ask(&config, &question, &documents)?;
        }
        Commands::Status => {
            let config = Config::load_default()?;
            show_status(&config).await?;
        }
    }

    Ok(())
}
