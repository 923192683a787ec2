//! CLI error types
//!
//! Every CLI error is fatal: it is reported once as a JSON error object and
//! the process exits non-zero.

use std::io;

use thiserror::Error;

use crate::backend::BackendError;
use crate::query::QueryError;
use crate::schema::SchemaError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration file missing, unreadable or invalid
    #[error("{0}")]
    Config(String),

    /// stdin/stdout failure or malformed request JSON
    #[error("{0}")]
    Io(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl CliError {
    pub fn config_error(message: impl Into<String>) -> Self {
        CliError::Config(message.into())
    }

    pub fn io_error(message: impl Into<String>) -> Self {
        CliError::Io(message.into())
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "CLI_CONFIG_ERROR",
            CliError::Io(_) => "CLI_IO_ERROR",
            CliError::Schema(e) => e.code(),
            CliError::Query(e) => e.code(),
            CliError::Backend(e) => e.code(),
        }
    }
}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}
