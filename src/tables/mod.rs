//! Table Resolver subsystem
//!
//! Maps logical property names to physical columns and joins the owning
//! table into the statement at most once per (table, language) pair.

mod registry;
mod resolver;

pub use registry::JoinRegistry;
pub use resolver::{ColumnSource, FieldResolution, Location, TableContext, Tables};
