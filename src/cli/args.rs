//! CLI argument definitions using clap
//!
//! Commands:
//! - entity-query explain --config <path>
//! - entity-query query --config <path>

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compile entity queries to SQL and run them against a JSON dataset
#[derive(Parser, Debug)]
#[command(name = "entity-query")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compile the query read from stdin and print its plan
    Explain {
        /// Path to configuration file
        #[arg(long, default_value = "./entity-query.json")]
        config: PathBuf,
    },

    /// Execute the query read from stdin against the configured dataset
    Query {
        /// Path to configuration file
        #[arg(long, default_value = "./entity-query.json")]
        config: PathBuf,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
