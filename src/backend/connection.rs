//! Statement execution seam

use serde_json::Value;

use crate::statement::{CountQuery, SelectStatement};

use super::errors::BackendResult;

/// One result row: select-list fields in order, then computed expressions.
pub type Row = Vec<Value>;

/// Something that can run compiled statements.
///
/// Implementations execute exactly what they are given; they do not retry
/// and do not reinterpret the statement.
pub trait Connection {
    /// Runs `statement` and returns every row in statement order.
    fn fetch_all(&self, statement: &SelectStatement) -> BackendResult<Vec<Row>>;

    /// Runs a count wrapper and returns its single value.
    fn fetch_count(&self, query: &CountQuery) -> BackendResult<u64>;
}

impl<T: Connection + ?Sized> Connection for &T {
    fn fetch_all(&self, statement: &SelectStatement) -> BackendResult<Vec<Row>> {
        (**self).fetch_all(statement)
    }

    fn fetch_count(&self, query: &CountQuery) -> BackendResult<u64> {
        (**self).fetch_count(query)
    }
}
