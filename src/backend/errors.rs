//! Backend error types
//!
//! Error codes:
//! - BACKEND_TABLE_NOT_FOUND
//! - BACKEND_UNKNOWN_ALIAS
//! - BACKEND_DATASET

use thiserror::Error;

/// Result type for statement execution
pub type BackendResult<T> = Result<T, BackendError>;

/// Statement execution failures.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Statement references a table the backend does not hold
    #[error("Table '{table}' does not exist")]
    TableNotFound { table: String },

    /// Statement references an alias nothing defines
    #[error("Unknown alias '{alias}' in statement")]
    UnknownAlias { alias: String },

    /// Dataset could not be loaded
    #[error("Dataset error in '{source_name}': {reason}")]
    Dataset { source_name: String, reason: String },
}

impl BackendError {
    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            BackendError::TableNotFound { .. } => "BACKEND_TABLE_NOT_FOUND",
            BackendError::UnknownAlias { .. } => "BACKEND_UNKNOWN_ALIAS",
            BackendError::Dataset { .. } => "BACKEND_DATASET",
        }
    }
}
