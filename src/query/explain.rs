//! Explain output
//!
//! Deterministic description of a compiled query: what was joined, how rows
//! are grouped and ordered, and the SQL a relational backend would run.

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::statement::{JoinOn, Range};

use super::compiler::CompiledQuery;

/// Explain plan output
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExplainPlan {
    pub entity_type: String,
    pub base_table: String,
    /// Alias of the result key column
    pub key_field: String,
    /// Alias of the entity id column
    pub value_field: String,
    pub simple_query: bool,
    pub count: bool,
    /// One line per join
    pub joins: Vec<String>,
    pub group_by: Vec<String>,
    pub order_by: Vec<String>,
    pub range: Option<Range>,
    pub tags: Vec<String>,
    /// SQL text; the COUNT wrapper in count mode
    pub sql: String,
    pub arguments: BTreeMap<String, Value>,
}

impl ExplainPlan {
    pub fn from_compiled(compiled: &CompiledQuery) -> Self {
        let stmt = &compiled.statement;

        let joins = stmt
            .joins()
            .iter()
            .map(|join| {
                let on: Vec<String> = join
                    .on
                    .iter()
                    .map(|term| match term {
                        JoinOn::Columns(left, right) => format!("{} = {}", left, right),
                        JoinOn::Value(column, value) => format!("{} = {}", column, value),
                    })
                    .collect();
                format!(
                    "{} {} {} ON {}",
                    join.kind.as_sql(),
                    join.table,
                    join.alias,
                    on.join(" AND ")
                )
            })
            .collect();

        let order_by = stmt
            .orders()
            .iter()
            .map(|o| format!("{} {}", o.target, o.direction))
            .collect();

        let rendered = if compiled.count {
            stmt.count_query().render()
        } else {
            stmt.render()
        };

        Self {
            entity_type: compiled.entity_type.clone(),
            base_table: stmt.table().to_string(),
            key_field: compiled.key_alias.clone(),
            value_field: compiled.value_alias.clone(),
            simple_query: compiled.simple_query,
            count: compiled.count,
            joins,
            group_by: stmt.group_by_aliases().to_vec(),
            order_by,
            range: stmt.current_range(),
            tags: stmt.tags().iter().cloned().collect(),
            sql: rendered.sql,
            arguments: rendered.arguments,
        }
    }
}

impl fmt::Display for ExplainPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== EXPLAIN ENTITY QUERY ===")?;
        writeln!(f, "Entity Type: {}", self.entity_type)?;
        writeln!(f, "Base Table: {}", self.base_table)?;
        writeln!(f, "Key: {} -> {}", self.key_field, self.value_field)?;
        writeln!(
            f,
            "Mode: {}{}",
            if self.simple_query { "SIMPLE" } else { "COMPLEX" },
            if self.count { " (COUNT)" } else { "" }
        )?;

        if !self.joins.is_empty() {
            writeln!(f, "Joins:")?;
            for join in &self.joins {
                writeln!(f, "  - {}", join)?;
            }
        }
        if !self.group_by.is_empty() {
            writeln!(f, "Group By: {}", self.group_by.join(", "))?;
        }
        if !self.order_by.is_empty() {
            writeln!(f, "Order By: {}", self.order_by.join(", "))?;
        }
        if let Some(range) = self.range {
            writeln!(f, "Range: {} rows from {}", range.length, range.start)?;
        }
        writeln!(f, "Tags: {}", self.tags.join(", "))?;
        writeln!(f, "SQL:")?;
        for line in self.sql.lines() {
            writeln!(f, "  {}", line)?;
        }
        if !self.arguments.is_empty() {
            writeln!(f, "Arguments:")?;
            for (name, value) in &self.arguments {
                writeln!(f, "  {} = {}", name, value)?;
            }
        }

        Ok(())
    }
}
