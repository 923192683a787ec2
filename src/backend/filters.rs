//! WHERE and ON evaluation for the in-memory backend
//!
//! SQL null semantics, simplified to two values: any comparison involving
//! null is false; only the null tests look at null.

use std::cmp::Ordering;

use regex::RegexBuilder;
use serde_json::{Map, Value};

use crate::statement::{ColumnRef, Conjunction, JoinOn, SqlOperator, WhereClause};

use super::sorter::compare_values;

static NULL: Value = Value::Null;

/// Rows of one joined result row, by table alias. An alias with no row
/// (unmatched LEFT join) reads as null everywhere.
pub type Scope<'r> = Vec<(&'r str, &'r Map<String, Value>)>;

/// Reads a column from a scope.
pub fn column_value<'r>(scope: &Scope<'r>, column: &ColumnRef) -> &'r Value {
    scope
        .iter()
        .find(|(alias, _)| *alias == column.table)
        .and_then(|(_, row)| row.get(&column.column))
        .unwrap_or(&NULL)
}

/// Evaluates WHERE trees and join conditions.
pub struct ClauseFilter;

impl ClauseFilter {
    /// Checks a WHERE tree. An empty group matches.
    pub fn matches(clause: &WhereClause, scope: &Scope<'_>) -> bool {
        match clause {
            WhereClause::Group {
                conjunction,
                children,
            } => {
                let mut effective = children.iter().filter(|c| !c.is_empty()).peekable();
                if effective.peek().is_none() {
                    return true;
                }
                match conjunction {
                    Conjunction::And => effective.all(|c| Self::matches(c, scope)),
                    Conjunction::Or => effective.any(|c| Self::matches(c, scope)),
                }
            }
            WhereClause::Compare {
                column,
                operator,
                value,
            } => Self::compare(column_value(scope, column), *operator, value),
        }
    }

    /// Checks every ON term of a join.
    pub fn join_matches(on: &[JoinOn], scope: &Scope<'_>) -> bool {
        on.iter().all(|term| match term {
            JoinOn::Columns(left, right) => {
                Self::eq(column_value(scope, left), column_value(scope, right))
            }
            JoinOn::Value(column, value) => Self::eq(column_value(scope, column), value),
        })
    }

    fn compare(actual: &Value, operator: SqlOperator, expected: &Value) -> bool {
        match operator {
            SqlOperator::IsNull => actual.is_null(),
            SqlOperator::IsNotNull => !actual.is_null(),
            _ if actual.is_null() => false,
            SqlOperator::Eq => Self::eq(actual, expected),
            SqlOperator::NotEq => Self::ordering(actual, expected).is_some_and(|o| o.is_ne()),
            SqlOperator::Gt => Self::ordering(actual, expected).is_some_and(|o| o.is_gt()),
            SqlOperator::Gte => Self::ordering(actual, expected).is_some_and(|o| o.is_ge()),
            SqlOperator::Lt => Self::ordering(actual, expected).is_some_and(|o| o.is_lt()),
            SqlOperator::Lte => Self::ordering(actual, expected).is_some_and(|o| o.is_le()),
            SqlOperator::In => Self::items(expected).iter().any(|v| Self::eq(actual, v)),
            SqlOperator::NotIn => {
                let items = Self::items(expected);
                !items.iter().any(Value::is_null) && !items.iter().any(|v| Self::eq(actual, v))
            }
            SqlOperator::Between => match expected {
                Value::Array(bounds) if bounds.len() == 2 => {
                    Self::ordering(actual, &bounds[0]).is_some_and(|o| o.is_ge())
                        && Self::ordering(actual, &bounds[1]).is_some_and(|o| o.is_le())
                }
                _ => false,
            },
            SqlOperator::Like => match expected {
                Value::String(pattern) => like_matches(&Self::text(actual), pattern),
                _ => false,
            },
        }
    }

    fn eq(a: &Value, b: &Value) -> bool {
        Self::ordering(a, b) == Some(Ordering::Equal)
    }

    /// Ordering of two non-null values of the same kind. Mixed kinds do not
    /// compare; there is no coercion.
    fn ordering(a: &Value, b: &Value) -> Option<Ordering> {
        match (a, b) {
            (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Bool(_), Value::Bool(_)) => Some(compare_values(a, b)),
            _ => None,
        }
    }

    fn items(value: &Value) -> &[Value] {
        match value {
            Value::Array(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    fn text(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Matches a LIKE pattern with `\` as the escape character. Case
/// insensitive, as with the usual collations.
pub fn like_matches(value: &str, pattern: &str) -> bool {
    let mut regex = String::with_capacity(pattern.len() + 2);
    regex.push('^');
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    regex.push_str(&regex::escape(escaped.encode_utf8(&mut [0; 4])));
                }
            }
            '%' => regex.push_str(".*"),
            '_' => regex.push('.'),
            other => regex.push_str(&regex::escape(other.encode_utf8(&mut [0; 4]))),
        }
    }
    regex.push('$');

    RegexBuilder::new(&regex)
        .case_insensitive(true)
        .dot_matches_new_line(true)
        .build()
        .map(|re| re.is_match(value))
        .unwrap_or(false)
}
