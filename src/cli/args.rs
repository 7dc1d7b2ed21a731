use std::path::PathBuf;

use clap::Parser;

use crate::Commands;

/// Main CLI application arguments and command structure
#[derive(Parser)]
#[clap(version, about = "Markdown note-taking with tags, trash, and version history")]
pub struct Cli {
    /// Path to the data directory
    #[clap(long, value_parser)]
    pub data_dir: Option<PathBuf>,

    /// Verbose output mode
    #[clap(short, long)]
    pub verbose: bool,

    /// Subcommands for the mdnotes application
    #[clap(subcommand)]
    pub command: Commands,
}
