//! Statement Builder subsystem
//!
//! An abstract SELECT statement: fields, aggregate expressions, joins, a
//! WHERE tree, grouping, ordering, range, tags and a metadata bag. The query
//! compiler writes into it; backends render or evaluate it.

mod clause;
mod render;
mod select;

pub use clause::{
    AggregateFunction, ColumnRef, Conjunction, Join, JoinKind, JoinOn, OrderBy, OrderTarget,
    Range, SelectExpression, SelectField, SortDirection, SqlOperator, WhereClause,
};
pub use render::RenderedSql;
pub use select::{CountQuery, SelectStatement};
