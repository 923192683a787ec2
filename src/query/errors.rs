//! Query error types
//!
//! Error codes:
//! - ENTITY_QUERY_UNKNOWN_ENTITY_TYPE (configuration)
//! - ENTITY_QUERY_NO_BASE_TABLE (configuration)
//! - ENTITY_QUERY_UNKNOWN_TABLE (configuration)
//! - ENTITY_QUERY_UNRESOLVABLE_FIELD (caller)
//! - ENTITY_QUERY_FIELD_NOT_ATTACHED (caller)
//! - ENTITY_QUERY_INVALID_SPECIFIER (caller)
//! - ENTITY_QUERY_INVALID_CONDITION (caller)
//! - ENTITY_QUERY_MALFORMED_ROW (backend)
//! - ENTITY_QUERY_BACKEND (backend)

use std::fmt;

use thiserror::Error;

use crate::backend::BackendError;

/// Result type for query compilation and execution
pub type QueryResult<T> = Result<T, QueryError>;

/// Broad class of a query failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Storage metadata cannot support the query. Not retryable.
    Configuration,
    /// The query references something that does not exist or is malformed.
    Caller,
    /// Statement execution failed below the compiler.
    Backend,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "CONFIGURATION"),
            ErrorCategory::Caller => write!(f, "CALLER"),
            ErrorCategory::Backend => write!(f, "BACKEND"),
        }
    }
}

/// Entity query errors.
///
/// Configuration and caller errors are raised before any statement reaches
/// a backend.
#[derive(Debug, Clone, Error)]
pub enum QueryError {
    /// Entity type is not in the catalog
    #[error("Unknown entity type '{entity_type}'")]
    UnknownEntityType { entity_type: String },

    /// Entity type has no base table
    #[error("No base table for entity type '{entity_type}', nothing to query.")]
    NoBaseTable { entity_type: String },

    /// A table the descriptor or field storage points at is not in the catalog
    #[error("Table '{table}' is not declared in the catalog")]
    UnknownTable { table: String },

    /// Property is in no entity table and is not a field of the entity type
    #[error("'{field}' not found on entity type '{entity_type}'")]
    UnresolvableField { field: String, entity_type: String },

    /// Field exists but no bundle of the entity type carries it
    #[error("Field '{field}' is not attached to entity type '{entity_type}'")]
    FieldNotAttached { field: String, entity_type: String },

    /// Malformed `name.column` specifier
    #[error("Invalid field specifier '{specifier}': {reason}")]
    InvalidSpecifier { specifier: String, reason: String },

    /// Operator and value do not fit together
    #[error("Invalid condition on '{field}': {reason}")]
    InvalidCondition { field: String, reason: String },

    /// Backend returned a row the compiler cannot key
    #[error("Malformed result row: {reason}")]
    MalformedRow { reason: String },

    /// Backend failure, passed through unchanged
    #[error(transparent)]
    Backend(#[from] BackendError),
}

impl QueryError {
    pub fn unresolvable(field: impl Into<String>, entity_type: impl Into<String>) -> Self {
        QueryError::UnresolvableField {
            field: field.into(),
            entity_type: entity_type.into(),
        }
    }

    pub fn invalid_condition(field: impl Into<String>, reason: impl Into<String>) -> Self {
        QueryError::InvalidCondition {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Returns the stable error code
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::UnknownEntityType { .. } => "ENTITY_QUERY_UNKNOWN_ENTITY_TYPE",
            QueryError::NoBaseTable { .. } => "ENTITY_QUERY_NO_BASE_TABLE",
            QueryError::UnknownTable { .. } => "ENTITY_QUERY_UNKNOWN_TABLE",
            QueryError::UnresolvableField { .. } => "ENTITY_QUERY_UNRESOLVABLE_FIELD",
            QueryError::FieldNotAttached { .. } => "ENTITY_QUERY_FIELD_NOT_ATTACHED",
            QueryError::InvalidSpecifier { .. } => "ENTITY_QUERY_INVALID_SPECIFIER",
            QueryError::InvalidCondition { .. } => "ENTITY_QUERY_INVALID_CONDITION",
            QueryError::MalformedRow { .. } => "ENTITY_QUERY_MALFORMED_ROW",
            QueryError::Backend(_) => "ENTITY_QUERY_BACKEND",
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QueryError::UnknownEntityType { .. }
            | QueryError::NoBaseTable { .. }
            | QueryError::UnknownTable { .. } => ErrorCategory::Configuration,
            QueryError::UnresolvableField { .. }
            | QueryError::FieldNotAttached { .. }
            | QueryError::InvalidSpecifier { .. }
            | QueryError::InvalidCondition { .. } => ErrorCategory::Caller,
            QueryError::MalformedRow { .. } | QueryError::Backend(_) => ErrorCategory::Backend,
        }
    }
}
