//! CLI module
//!
//! Provides command-line interface for:
//! - explain: compile one query and print its plan
//! - query: compile and execute one query against a JSON dataset

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command};
pub use commands::{explain, explain_request, query, query_request, run, run_command, Config};
pub use errors::{CliError, CliResult};
pub use io::{parse_request, read_request, write_error, write_response};
