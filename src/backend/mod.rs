//! Backend subsystem
//!
//! [`Connection`] is the single seam between the compiler and storage.
//! [`MemoryConnection`] evaluates statements over JSON rows and backs the
//! CLI and the test suites.

mod connection;
mod errors;
mod filters;
mod memory;
mod sorter;

pub use connection::{Connection, Row};
pub use errors::{BackendError, BackendResult};
pub use filters::{like_matches, ClauseFilter};
pub use memory::MemoryConnection;
pub use sorter::compare_values;
