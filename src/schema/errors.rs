//! Catalog error types
//!
//! Error codes:
//! - CATALOG_UNREADABLE
//! - CATALOG_MALFORMED
//! - CATALOG_INVALID_IDENTIFIER
//! - CATALOG_DUPLICATE

use thiserror::Error;

/// Result type for catalog operations
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while loading or validating a schema catalog.
///
/// All of these are load-time failures; a catalog that loads is structurally
/// sound for the query compiler.
#[derive(Debug, Clone, Error)]
pub enum SchemaError {
    /// Catalog file could not be read
    #[error("Failed to read catalog '{path}': {reason}")]
    Unreadable { path: String, reason: String },

    /// Catalog content is invalid
    #[error("Malformed catalog '{source_name}': {reason}")]
    Malformed { source_name: String, reason: String },

    /// Table, column or entity type name is not a plain SQL identifier
    #[error("Invalid identifier '{identifier}' in {context}")]
    InvalidIdentifier { identifier: String, context: String },

    /// Same entity type, table or field declared twice
    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: String },
}

impl SchemaError {
    pub fn malformed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Malformed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            SchemaError::Unreadable { .. } => "CATALOG_UNREADABLE",
            SchemaError::Malformed { .. } => "CATALOG_MALFORMED",
            SchemaError::InvalidIdentifier { .. } => "CATALOG_INVALID_IDENTIFIER",
            SchemaError::Duplicate { .. } => "CATALOG_DUPLICATE",
        }
    }
}
