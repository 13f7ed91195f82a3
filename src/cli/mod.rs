pub mod model;
pub mod score;
pub mod status;
pub mod summarize;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "condense", about = "Summarize long documents with a fixed-context model, and score the result.")]
#[command(version, propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Summarize a .txt, .md, .pdf or .docx file
    Summarize(SummarizeArgs),

    /// Score a generated summary against a reference with ROUGE
    Score {
        /// Reference summary file
        #[arg(short, long)]
        reference: PathBuf,

        /// Generated summary file
        #[arg(short, long)]
        generated: PathBuf,

        /// Comma-separated metrics (default: rouge1,rouge2,rougeL)
        #[arg(short, long)]
        metrics: Option<String>,
    },

    /// Start the HTTP API in the foreground
    Start {
        /// HTTP port (default: from config, 7438)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Stop the running daemon
    Stop,

    /// Show daemon status and the active model
    Status,

    /// Browse, download and switch summarization models
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
}

#[derive(Args)]
pub struct SummarizeArgs {
    /// Document to summarize
    pub path: PathBuf,

    /// Upper bound on summary length, in model tokens
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Lower bound on summary length, in model tokens
    #[arg(long)]
    pub min_length: Option<usize>,

    /// Reference summary file; prints ROUGE scores when given
    #[arg(short, long)]
    pub reference: Option<PathBuf>,

    /// Comma-separated metrics used with --reference
    #[arg(short, long)]
    pub metrics: Option<String>,

    /// Write the summary to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Show the first 3000 characters of the extracted text
    #[arg(long)]
    pub preview: bool,
}

#[derive(Subcommand)]
pub enum ModelAction {
    /// List registry models
    List,
    /// Show the active model and its local files
    Current,
    /// Fetch tokenizer.json for a model (default: the active one)
    Download {
        id: Option<String>,
    },
    /// Switch the active model
    Use {
        id: String,
    },
}
