//! SQL rendering
//!
//! Values never appear in the SQL text; each is bound to a named
//! `:db_condition_placeholder_N` argument. Identifiers come from a validated
//! catalog and are emitted verbatim.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

use super::clause::{JoinOn, SqlOperator, WhereClause};
use super::select::{CountQuery, SelectStatement};

const PLACEHOLDER_PREFIX: &str = ":db_condition_placeholder_";

/// SQL text plus its bound arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedSql {
    pub sql: String,
    pub arguments: BTreeMap<String, Value>,
}

#[derive(Default)]
struct Renderer {
    arguments: BTreeMap<String, Value>,
    next: usize,
}

impl Renderer {
    fn bind(&mut self, value: &Value) -> String {
        let name = format!("{}{}", PLACEHOLDER_PREFIX, self.next);
        self.next += 1;
        self.arguments.insert(name.clone(), value.clone());
        name
    }

    fn select(&mut self, stmt: &SelectStatement) -> String {
        let mut sql = String::from("SELECT ");

        let mut columns: Vec<String> = stmt
            .fields()
            .iter()
            .map(|f| format!("{} AS {}", f.column, f.alias))
            .collect();
        columns.extend(
            stmt.expressions()
                .iter()
                .map(|e| format!("{} AS {}", e, e.alias)),
        );
        if columns.is_empty() {
            sql.push('1');
        } else {
            sql.push_str(&columns.join(", "));
        }

        sql.push_str(&format!("\nFROM {} {}", stmt.table(), stmt.alias()));

        for join in stmt.joins() {
            let on: Vec<String> = join
                .on
                .iter()
                .map(|term| match term {
                    JoinOn::Columns(left, right) => format!("{} = {}", left, right),
                    JoinOn::Value(column, value) => format!("{} = {}", column, self.bind(value)),
                })
                .collect();
            sql.push_str(&format!(
                "\n{} {} {} ON {}",
                join.kind.as_sql(),
                join.table,
                join.alias,
                on.join(" AND ")
            ));
        }

        if !stmt.condition().is_empty() {
            sql.push_str("\nWHERE ");
            let condition = self.clause(stmt.condition(), true);
            sql.push_str(&condition);
        }

        if !stmt.group_by_aliases().is_empty() {
            sql.push_str("\nGROUP BY ");
            sql.push_str(&stmt.group_by_aliases().join(", "));
        }

        if !stmt.orders().is_empty() {
            let orders: Vec<String> = stmt
                .orders()
                .iter()
                .map(|o| format!("{} {}", o.target, o.direction))
                .collect();
            sql.push_str("\nORDER BY ");
            sql.push_str(&orders.join(", "));
        }

        if let Some(range) = stmt.current_range() {
            sql.push_str(&format!("\nLIMIT {} OFFSET {}", range.length, range.start));
        }

        sql
    }

    fn clause(&mut self, clause: &WhereClause, root: bool) -> String {
        match clause {
            WhereClause::Group {
                conjunction,
                children,
            } => {
                let parts: Vec<String> = children
                    .iter()
                    .filter(|c| !c.is_empty())
                    .map(|c| self.clause(c, false))
                    .collect();
                let joined = parts.join(&format!(" {} ", conjunction.as_sql()));
                if root {
                    joined
                } else {
                    format!("({})", joined)
                }
            }
            WhereClause::Compare {
                column,
                operator,
                value,
            } => match operator {
                SqlOperator::IsNull | SqlOperator::IsNotNull => {
                    format!("{} {}", column, operator.as_sql())
                }
                SqlOperator::In | SqlOperator::NotIn => {
                    let items: Vec<String> = match value {
                        Value::Array(items) => items.iter().map(|v| self.bind(v)).collect(),
                        other => vec![self.bind(other)],
                    };
                    format!("{} {} ({})", column, operator.as_sql(), items.join(", "))
                }
                SqlOperator::Between => {
                    let (low, high) = match value {
                        Value::Array(items) if items.len() == 2 => (&items[0], &items[1]),
                        other => (other, other),
                    };
                    let low = self.bind(low);
                    let high = self.bind(high);
                    format!("{} BETWEEN {} AND {}", column, low, high)
                }
                SqlOperator::Like => {
                    format!("{} LIKE {} ESCAPE '\\'", column, self.bind(value))
                }
                _ => format!("{} {} {}", column, operator.as_sql(), self.bind(value)),
            },
        }
    }
}

impl SelectStatement {
    /// Renders SQL text and arguments.
    pub fn render(&self) -> RenderedSql {
        let mut renderer = Renderer::default();
        let sql = renderer.select(self);
        RenderedSql {
            sql,
            arguments: renderer.arguments,
        }
    }
}

impl CountQuery {
    /// Renders `SELECT COUNT(*) AS expression FROM (<inner>) subquery`.
    pub fn render(&self) -> RenderedSql {
        let mut renderer = Renderer::default();
        let inner = renderer.select(self.inner());
        RenderedSql {
            sql: format!("SELECT COUNT(*) AS expression\nFROM ({}) subquery", inner),
            arguments: renderer.arguments,
        }
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().sql)
    }
}

impl fmt::Display for CountQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().sql)
    }
}
