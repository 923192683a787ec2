//! entity-query - compiles storage-agnostic entity queries into relational
//! SELECT statements
//!
//! An entity's properties may be spread over a base table, an optional
//! translated data table and one value table per configurable field. The
//! compiler joins what a query references, collapses the extra rows those
//! joins produce when counts or paging make them visible, and returns either
//! a count or an ordered key -> entity id mapping.

pub mod backend;
pub mod cli;
pub mod condition;
pub mod query;
pub mod schema;
pub mod statement;
pub mod tables;
