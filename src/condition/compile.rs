//! Condition tree compilation
//!
//! Walks a [`ConditionGroup`] once, resolving every leaf's property through
//! the table resolver and producing the equivalent WHERE tree.
//!
//! Join type per leaf: INNER inside AND-only ancestry, LEFT as soon as any
//! enclosing group is OR, and LEFT for `IS NULL` (an inner join would drop
//! the very rows that lack a value).

use serde_json::Value;

use crate::query::{QueryError, QueryResult};
use crate::schema::SchemaCatalog;
use crate::statement::{Conjunction, JoinKind, SelectStatement, SqlOperator, WhereClause};
use crate::tables::Tables;

use super::ast::{Condition, ConditionGroup, ConditionNode, Operator};

/// Result of compiling a condition tree.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    /// WHERE tree with the group's own conjunction
    pub clause: WhereClause,
    /// True if compilation joined a field value table
    pub breaks_simple_query: bool,
}

/// Compiles `group` against `stmt`. Joins are added to `stmt` as properties
/// are resolved; the returned clause is not attached.
pub fn compile<C: SchemaCatalog + ?Sized>(
    group: &ConditionGroup,
    tables: &mut Tables<'_, C>,
    stmt: &mut SelectStatement,
) -> QueryResult<CompiledCondition> {
    let mut compiler = ConditionCompiler {
        tables,
        stmt,
        breaks_simple_query: false,
    };
    let clause = compiler.group(group, false)?;
    Ok(CompiledCondition {
        clause,
        breaks_simple_query: compiler.breaks_simple_query,
    })
}

struct ConditionCompiler<'t, 'a, 's, C: SchemaCatalog + ?Sized> {
    tables: &'t mut Tables<'a, C>,
    stmt: &'s mut SelectStatement,
    breaks_simple_query: bool,
}

impl<C: SchemaCatalog + ?Sized> ConditionCompiler<'_, '_, '_, C> {
    fn group(&mut self, group: &ConditionGroup, under_or: bool) -> QueryResult<WhereClause> {
        let under_or = under_or || group.conjunction == Conjunction::Or;
        let mut children = Vec::with_capacity(group.conditions.len());
        for node in &group.conditions {
            let child = match node {
                ConditionNode::Leaf(condition) => self.leaf(condition, under_or)?,
                ConditionNode::Group(nested) => self.group(nested, under_or)?,
            };
            children.push(child);
        }
        Ok(WhereClause::Group {
            conjunction: group.conjunction,
            children,
        })
    }

    fn leaf(&mut self, condition: &Condition, under_or: bool) -> QueryResult<WhereClause> {
        let operator = condition.operator();
        let (sql_operator, value) = translate(condition, operator)?;

        let kind = if under_or || operator == Operator::IsNull {
            JoinKind::Left
        } else {
            JoinKind::Inner
        };
        let resolved = self.tables.add_field(
            self.stmt,
            &condition.field,
            kind,
            condition.langcode.as_deref(),
        )?;
        self.breaks_simple_query |= resolved.breaks_simple_query;

        Ok(WhereClause::compare(resolved.column, sql_operator, value))
    }
}

/// Checks the value against the operator and maps both onto the statement
/// layer.
fn translate(condition: &Condition, operator: Operator) -> QueryResult<(SqlOperator, Value)> {
    let field = condition.field.as_str();
    let value = &condition.value;

    let scalar = |op: SqlOperator| -> QueryResult<(SqlOperator, Value)> {
        match value {
            Value::Array(_) | Value::Object(_) => Err(QueryError::invalid_condition(
                field,
                format!("operator {} needs a single value", operator),
            )),
            Value::Null => Err(QueryError::invalid_condition(
                field,
                format!("operator {} cannot compare against null", operator),
            )),
            _ => Ok((op, value.clone())),
        }
    };
    let pattern = |build: fn(&str) -> String| -> QueryResult<(SqlOperator, Value)> {
        match value {
            Value::String(s) => Ok((SqlOperator::Like, Value::String(build(&escape_like(s))))),
            Value::Number(n) => Ok((
                SqlOperator::Like,
                Value::String(build(&escape_like(&n.to_string()))),
            )),
            _ => Err(QueryError::invalid_condition(
                field,
                format!("operator {} needs a string", operator),
            )),
        }
    };

    match operator {
        Operator::Eq => scalar(SqlOperator::Eq),
        Operator::NotEq => scalar(SqlOperator::NotEq),
        Operator::Gt => scalar(SqlOperator::Gt),
        Operator::Gte => scalar(SqlOperator::Gte),
        Operator::Lt => scalar(SqlOperator::Lt),
        Operator::Lte => scalar(SqlOperator::Lte),
        Operator::StartsWith => pattern(|s| format!("{}%", s)),
        Operator::Contains => pattern(|s| format!("%{}%", s)),
        Operator::EndsWith => pattern(|s| format!("%{}", s)),
        Operator::In | Operator::NotIn => match value {
            Value::Array(items) if !items.is_empty() => {
                let op = if operator == Operator::In {
                    SqlOperator::In
                } else {
                    SqlOperator::NotIn
                };
                Ok((op, value.clone()))
            }
            _ => Err(QueryError::invalid_condition(
                field,
                format!("operator {} needs a non-empty array", operator),
            )),
        },
        Operator::Between => match value {
            Value::Array(items) if items.len() == 2 => Ok((SqlOperator::Between, value.clone())),
            _ => Err(QueryError::invalid_condition(
                field,
                "operator BETWEEN needs exactly two values",
            )),
        },
        Operator::IsNull => Ok((SqlOperator::IsNull, Value::Null)),
        Operator::IsNotNull => Ok((SqlOperator::IsNotNull, Value::Null)),
    }
}

/// Escapes LIKE wildcards so the value matches literally.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
