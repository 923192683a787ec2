//! In-memory reference backend
//!
//! Evaluates compiled statements directly over JSON rows instead of
//! rendering SQL. Evaluation order follows SQL: FROM and joins, WHERE,
//! GROUP BY with aggregates, ORDER BY, then LIMIT/OFFSET.
//!
//! Dataset file format:
//!
//! ```json
//! {"node": [{"nid": 1, "vid": 1, "type": "article"}],
//!  "field_data_field_tags": [{"entity_type": "node", "entity_id": 1, "revision_id": 1, "field_tags_tid": 3}]}
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::statement::{
    AggregateFunction, ColumnRef, CountQuery, JoinKind, JoinOn, OrderTarget, SelectStatement,
    WhereClause,
};

use super::connection::{Connection, Row};
use super::errors::{BackendError, BackendResult};
use super::filters::{column_value, ClauseFilter, Scope};
use super::sorter::{compare_values, RowSorter, SortableRow};

type Record = Map<String, Value>;

/// Tables of JSON objects held in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryConnection {
    tables: BTreeMap<String, Vec<Record>>,
}

impl MemoryConnection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a dataset file.
    pub fn load(path: &Path) -> BackendResult<Self> {
        let source_name = path.display().to_string();
        let content = fs::read_to_string(path).map_err(|e| BackendError::Dataset {
            source_name: source_name.clone(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content, &source_name)
    }

    /// Parses a dataset document: an object of table name to row array.
    pub fn from_json(content: &str, source_name: &str) -> BackendResult<Self> {
        let document: BTreeMap<String, Vec<Value>> =
            serde_json::from_str(content).map_err(|e| BackendError::Dataset {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        let mut connection = Self::new();
        for (table, rows) in document {
            connection
                .insert_table(&table, rows)
                .map_err(|e| BackendError::Dataset {
                    source_name: source_name.to_string(),
                    reason: e.to_string(),
                })?;
        }
        tracing::debug!(
            source = source_name,
            tables = connection.tables.len(),
            "loaded dataset"
        );
        Ok(connection)
    }

    /// Replaces the contents of `table`. Every row must be a JSON object.
    pub fn insert_table(&mut self, table: &str, rows: Vec<Value>) -> BackendResult<()> {
        let mut records = Vec::with_capacity(rows.len());
        for (i, row) in rows.into_iter().enumerate() {
            match row {
                Value::Object(record) => records.push(record),
                other => {
                    return Err(BackendError::Dataset {
                        source_name: table.to_string(),
                        reason: format!("row {} is not an object: {}", i, other),
                    })
                }
            }
        }
        self.tables.insert(table.to_string(), records);
        Ok(())
    }

    pub fn with_table(mut self, table: &str, rows: Vec<Value>) -> BackendResult<Self> {
        self.insert_table(table, rows)?;
        Ok(self)
    }

    pub fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.get(table).map(Vec::len)
    }

    fn rows(&self, table: &str) -> BackendResult<&[Record]> {
        self.tables
            .get(table)
            .map(Vec::as_slice)
            .ok_or_else(|| BackendError::TableNotFound {
                table: table.to_string(),
            })
    }

    fn evaluate(&self, stmt: &SelectStatement) -> BackendResult<Vec<Row>> {
        check_aliases(stmt)?;

        let mut scopes: Vec<Scope<'_>> = self
            .rows(stmt.table())?
            .iter()
            .map(|row| vec![(stmt.alias(), row)])
            .collect();

        for join in stmt.joins() {
            let rows = self.rows(&join.table)?;
            let mut joined = Vec::with_capacity(scopes.len());
            for scope in scopes {
                let mut matched = false;
                for row in rows {
                    let mut candidate = scope.clone();
                    candidate.push((join.alias.as_str(), row));
                    if ClauseFilter::join_matches(&join.on, &candidate) {
                        joined.push(candidate);
                        matched = true;
                    }
                }
                if !matched && join.kind == JoinKind::Left {
                    joined.push(scope);
                }
            }
            scopes = joined;
        }

        scopes.retain(|scope| ClauseFilter::matches(stmt.condition(), scope));

        let groups = group(stmt, scopes)?;

        let mut rows = Vec::with_capacity(groups.len());
        for group in &groups {
            rows.push(project(stmt, group)?);
        }

        let directions: Vec<_> = stmt.orders().iter().map(|o| o.direction).collect();
        RowSorter::sort(&mut rows, &directions);

        let rows = rows.into_iter().map(|r| r.values);
        let rows: Vec<Row> = match stmt.current_range() {
            Some(range) => rows
                .skip(usize::try_from(range.start).unwrap_or(usize::MAX))
                .take(usize::try_from(range.length).unwrap_or(usize::MAX))
                .collect(),
            None => rows.collect(),
        };
        Ok(rows)
    }
}

impl Connection for MemoryConnection {
    fn fetch_all(&self, statement: &SelectStatement) -> BackendResult<Vec<Row>> {
        self.evaluate(statement)
    }

    fn fetch_count(&self, query: &CountQuery) -> BackendResult<u64> {
        let rows = self.evaluate(query.inner())?;
        Ok(rows.len() as u64)
    }
}

/// Collapses rows by the GROUP BY aliases, in order of first appearance.
/// Without grouping every row is its own group.
fn group<'r>(stmt: &SelectStatement, scopes: Vec<Scope<'r>>) -> BackendResult<Vec<Vec<Scope<'r>>>> {
    if stmt.group_by_aliases().is_empty() {
        if stmt.expressions().is_empty() || scopes.is_empty() {
            return Ok(scopes.into_iter().map(|s| vec![s]).collect());
        }
        return Ok(vec![scopes]);
    }

    let mut columns = Vec::with_capacity(stmt.group_by_aliases().len());
    for alias in stmt.group_by_aliases() {
        let field = stmt
            .field(alias)
            .ok_or_else(|| BackendError::UnknownAlias {
                alias: alias.clone(),
            })?;
        columns.push(&field.column);
    }

    // JSON values are not hashable; their rendered text is an exact key.
    let mut groups: IndexMap<String, Vec<Scope<'r>>> = IndexMap::new();
    for scope in scopes {
        let key = Value::Array(
            columns
                .iter()
                .map(|c| column_value(&scope, c).clone())
                .collect(),
        )
        .to_string();
        groups.entry(key).or_default().push(scope);
    }
    Ok(groups.into_values().collect())
}

/// Builds the output row of one group. Plain columns read the group's first
/// row.
fn project(stmt: &SelectStatement, group: &[Scope<'_>]) -> BackendResult<SortableRow> {
    let first = &group[0];

    let mut values: Row = stmt
        .fields()
        .iter()
        .map(|f| column_value(first, &f.column).clone())
        .collect();
    for expression in stmt.expressions() {
        values.push(aggregate(expression.function, &expression.argument, group));
    }

    let mut keys = Vec::with_capacity(stmt.orders().len());
    for order in stmt.orders() {
        let key = match &order.target {
            OrderTarget::Column(column) => column_value(first, column).clone(),
            OrderTarget::Alias(alias) => {
                let position = stmt
                    .fields()
                    .iter()
                    .map(|f| &f.alias)
                    .chain(stmt.expressions().iter().map(|e| &e.alias))
                    .position(|a| a == alias)
                    .ok_or_else(|| BackendError::UnknownAlias {
                        alias: alias.clone(),
                    })?;
                values[position].clone()
            }
        };
        keys.push(key);
    }

    Ok(SortableRow { values, keys })
}

/// MIN/MAX over the non-null values of a column; null if there are none.
fn aggregate(function: AggregateFunction, column: &ColumnRef, group: &[Scope<'_>]) -> Value {
    let values = group
        .iter()
        .map(|scope| column_value(scope, column))
        .filter(|v| !v.is_null());
    let picked = match function {
        AggregateFunction::Min => values.min_by(|a, b| compare_values(a, b)),
        AggregateFunction::Max => values.max_by(|a, b| compare_values(a, b)),
    };
    picked.cloned().unwrap_or(Value::Null)
}

/// Every column reference must name the base alias or a join alias.
fn check_aliases(stmt: &SelectStatement) -> BackendResult<()> {
    let mut known = BTreeSet::new();
    known.insert(stmt.alias());
    for join in stmt.joins() {
        known.insert(join.alias.as_str());
    }

    let mut columns: Vec<&ColumnRef> = Vec::new();
    columns.extend(stmt.fields().iter().map(|f| &f.column));
    columns.extend(stmt.expressions().iter().map(|e| &e.argument));
    for join in stmt.joins() {
        for term in &join.on {
            match term {
                JoinOn::Columns(left, right) => {
                    columns.push(left);
                    columns.push(right);
                }
                JoinOn::Value(column, _) => columns.push(column),
            }
        }
    }
    collect_where_columns(stmt.condition(), &mut columns);
    for order in stmt.orders() {
        if let OrderTarget::Column(column) = &order.target {
            columns.push(column);
        }
    }

    match columns.into_iter().find(|c| !known.contains(c.table.as_str())) {
        Some(column) => Err(BackendError::UnknownAlias {
            alias: column.table.clone(),
        }),
        None => Ok(()),
    }
}

fn collect_where_columns<'s>(clause: &'s WhereClause, columns: &mut Vec<&'s ColumnRef>) {
    match clause {
        WhereClause::Group { children, .. } => {
            for child in children {
                collect_where_columns(child, columns);
            }
        }
        WhereClause::Compare { column, .. } => columns.push(column),
    }
}
