//! Condition Tree subsystem
//!
//! Declarative conditions as callers build them, and their compilation into
//! the statement's WHERE tree.

mod ast;
mod compile;

pub use ast::{
    and_condition_group, condition_group_factory, or_condition_group, Condition, ConditionGroup,
    ConditionNode, Operator,
};
pub use compile::{compile, escape_like, CompiledCondition};
pub use crate::statement::Conjunction;
