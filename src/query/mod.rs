//! Query Compiler subsystem
//!
//! Entry point of the crate: callers build an [`EntityQuery`], compile it
//! with a [`QueryCompiler`] and run it with a [`QueryExecutor`].
//!
//! # Design Principles
//!
//! - One fresh statement per compile; nothing is shared between calls
//! - Fail closed: configuration and caller errors abort before any backend
//!   call
//! - Row order is statement order

mod compiler;
mod entity_query;
mod errors;
mod explain;
mod pager;
mod result;

pub use compiler::{CompiledQuery, QueryCompiler, QueryExecutor, BASE_TABLE_ALIAS};
pub use entity_query::{EntityQuery, SortSpec};
pub use errors::{ErrorCategory, QueryError, QueryResult};
pub use explain::ExplainPlan;
pub use pager::{PagerSpec, PagerState};
pub use result::{KeyedIds, QueryOutput};

pub use crate::condition::{
    and_condition_group, condition_group_factory, or_condition_group, ConditionGroup,
};
