//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Paginated ingestion engine CLI
#[derive(Parser, Debug)]
#[command(name = "paginate-cdk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Definition file (YAML)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run queries and stream chunks as JSON lines
    Fetch {
        /// Query to run (empty = all queries in the file)
        #[arg(short, long)]
        query: Option<String>,

        /// Stop after this many chunks per query
        #[arg(long)]
        max_chunks: Option<usize>,

        /// Print fetch statistics to stderr when done
        #[arg(long)]
        stats: bool,
    },

    /// Validate a definition file
    Validate,
}
