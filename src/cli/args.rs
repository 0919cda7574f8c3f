//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    bin::BinCommands, completions::CompletionsArgs, init::InitArgs, sync::SyncCommands,
    wish::WishCommands,
};

#[derive(Parser)]
#[command(name = "stash")]
#[command(author, version, about = "Storage bin and wish list tracker")]
#[command(
    long_about = "Track storage bins labelled with QR codes and a wish list as plain-text YAML files."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output (debug logging on stderr)
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .stash/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new stash project
    Init(InitArgs),

    /// Wish list management (including CSV import)
    #[command(subcommand)]
    Wish(WishCommands),

    /// Storage bin management and QR labels
    #[command(subcommand)]
    Bin(BinCommands),

    /// Sync the project to a remote directory
    #[command(subcommand)]
    Sync(SyncCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (pretty for show, tsv for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (wish list CSV is re-importable)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}
