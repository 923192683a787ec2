//! Clause types of a SELECT statement
//!
//! Every clause is structured rather than stringly typed so that a backend
//! can either render it to SQL or evaluate it directly.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How sibling conditions combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Conjunction {
    /// All conditions must match
    #[default]
    And,
    /// At least one condition must match
    Or,
}

impl Conjunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Conjunction::And => "AND",
            Conjunction::Or => "OR",
        }
    }
}

impl fmt::Display for Conjunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// A column qualified by the alias of the table it is read from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ColumnRef {
    /// Table alias
    pub table: String,
    /// Column name
    pub column: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, column: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            column: column.into(),
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.table, self.column)
    }
}

/// Join type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum JoinKind {
    Inner,
    Left,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT OUTER JOIN",
        }
    }
}

/// One term of a join's ON clause. Terms are ANDed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum JoinOn {
    /// `left = right`
    Columns(ColumnRef, ColumnRef),
    /// `column = :value`
    Value(ColumnRef, Value),
}

/// A joined table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Join {
    pub kind: JoinKind,
    pub table: String,
    pub alias: String,
    pub on: Vec<JoinOn>,
}

/// Comparison operators understood by the statement layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SqlOperator {
    Eq,
    NotEq,
    Gt,
    Gte,
    Lt,
    Lte,
    Like,
    In,
    NotIn,
    Between,
    IsNull,
    IsNotNull,
}

impl SqlOperator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SqlOperator::Eq => "=",
            SqlOperator::NotEq => "<>",
            SqlOperator::Gt => ">",
            SqlOperator::Gte => ">=",
            SqlOperator::Lt => "<",
            SqlOperator::Lte => "<=",
            SqlOperator::Like => "LIKE",
            SqlOperator::In => "IN",
            SqlOperator::NotIn => "NOT IN",
            SqlOperator::Between => "BETWEEN",
            SqlOperator::IsNull => "IS NULL",
            SqlOperator::IsNotNull => "IS NOT NULL",
        }
    }
}

/// WHERE clause tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum WhereClause {
    /// Children combined by a conjunction
    Group {
        conjunction: Conjunction,
        children: Vec<WhereClause>,
    },
    /// A single comparison. `value` is an array for IN, NOT IN and BETWEEN,
    /// and null for the null tests.
    Compare {
        column: ColumnRef,
        operator: SqlOperator,
        value: Value,
    },
}

impl WhereClause {
    /// An empty group.
    pub fn group(conjunction: Conjunction) -> Self {
        WhereClause::Group {
            conjunction,
            children: Vec::new(),
        }
    }

    pub fn compare(column: ColumnRef, operator: SqlOperator, value: Value) -> Self {
        WhereClause::Compare {
            column,
            operator,
            value,
        }
    }

    /// Returns true for a group with no effective children.
    pub fn is_empty(&self) -> bool {
        match self {
            WhereClause::Group { children, .. } => children.iter().all(WhereClause::is_empty),
            WhereClause::Compare { .. } => false,
        }
    }
}

/// A plain column in the select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectField {
    pub column: ColumnRef,
    pub alias: String,
}

/// Aggregate functions usable in computed columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AggregateFunction {
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

/// A computed column in the select list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SelectExpression {
    pub function: AggregateFunction,
    pub argument: ColumnRef,
    pub alias: String,
}

impl fmt::Display for SelectExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.function.as_sql(), self.argument)
    }
}

/// What an ORDER BY entry sorts on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum OrderTarget {
    /// A select-list alias (field or expression)
    Alias(String),
    /// A column of a joined table
    Column(ColumnRef),
}

impl fmt::Display for OrderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrderTarget::Alias(alias) => f.write_str(alias),
            OrderTarget::Column(column) => write!(f, "{}", column),
        }
    }
}

/// One ORDER BY entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderBy {
    pub target: OrderTarget,
    pub direction: SortDirection,
}

/// LIMIT/OFFSET window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Range {
    pub start: u64,
    pub length: u64,
}

impl Range {
    pub fn new(start: u64, length: u64) -> Self {
        Self { start, length }
    }
}
