//! Property to column resolution
//!
//! Resolution order for a property:
//! 1. Entity tables, in the order the compiler listed them (data table
//!    before base table). First table with the column wins.
//! 2. Configurable fields attached to the entity type, read from their
//!    per-field value table for the query's revision age.
//!
//! Anything else is an error. A query is never compiled with a silently
//! dropped condition or sort.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::query::{QueryError, QueryResult};
use crate::schema::{
    field_column_name, field_table_name, RevisionAge, SchemaCatalog, DEFAULT_FIELD_COLUMN,
    DELTA_COLUMN, FIELD_ENTITY_TYPE_COLUMN, LANGCODE_COLUMN,
};
use crate::statement::{ColumnRef, JoinKind, JoinOn, SelectStatement};

use super::registry::JoinRegistry;

/// Statement-wide inputs to table resolution, fixed before the first join.
#[derive(Debug, Clone, PartialEq)]
pub struct TableContext {
    /// Entity type being queried
    pub entity_type: String,
    /// Base table name
    pub base_table: String,
    /// Tables searched for entity properties, in priority order
    pub entity_tables: Vec<String>,
    /// Revision age of the query
    pub age: RevisionAge,
    /// Base table column that entity and field tables join against
    pub entity_id_field: String,
    /// Field table column joined to `entity_id_field`
    pub field_id_field: String,
    /// Field name -> attached to a bundle of this entity type
    pub configurable_fields: BTreeMap<String, bool>,
}

/// Where a property physically lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Column of the base table or the data table
    EntityTable { table: String, column: String },
    /// Column of a configurable field's value table
    FieldTable { table: String, column: String },
    /// Neither
    NotFound,
}

/// Which kind of table a resolved column is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnSource {
    EntityTable,
    FieldTable,
}

/// A resolved property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldResolution {
    /// Column to reference in conditions, sorts and select lists
    pub column: ColumnRef,
    /// Kind of table the column belongs to
    pub source: ColumnSource,
    /// True when this call joined a field value table for the first time.
    /// Such a join can yield several rows per entity, so the statement is
    /// no longer a simple query.
    pub breaks_simple_query: bool,
}

/// Table resolver for one statement.
pub struct Tables<'a, C: SchemaCatalog + ?Sized> {
    catalog: &'a C,
    context: &'a TableContext,
    registry: JoinRegistry,
}

impl<'a, C: SchemaCatalog + ?Sized> Tables<'a, C> {
    pub fn new(catalog: &'a C, context: &'a TableContext) -> Self {
        Self {
            catalog,
            context,
            registry: JoinRegistry::new(),
        }
    }

    /// Number of joins this resolver has added.
    pub fn join_count(&self) -> usize {
        self.registry.len()
    }

    /// Finds the table and column holding `specifier` without touching any
    /// statement.
    pub fn locate(&self, specifier: &str) -> QueryResult<Location> {
        let (name, column) = parse_specifier(specifier)?;

        if column.is_none() {
            for table in &self.context.entity_tables {
                let schema = self
                    .catalog
                    .table_schema(table)
                    .ok_or_else(|| QueryError::UnknownTable {
                        table: table.clone(),
                    })?;
                if schema.has_column(name) {
                    return Ok(Location::EntityTable {
                        table: table.clone(),
                        column: name.to_string(),
                    });
                }
            }
        }

        match self.context.configurable_fields.get(name) {
            Some(true) => {
                let table = field_table_name(name, self.context.age);
                let schema = self
                    .catalog
                    .table_schema(&table)
                    .ok_or_else(|| QueryError::UnknownTable {
                        table: table.clone(),
                    })?;
                let column = match column.unwrap_or(DEFAULT_FIELD_COLUMN) {
                    DELTA_COLUMN => DELTA_COLUMN.to_string(),
                    column => field_column_name(name, column),
                };
                if !schema.has_column(&column) {
                    return Ok(Location::NotFound);
                }
                Ok(Location::FieldTable { table, column })
            }
            _ => Ok(Location::NotFound),
        }
    }

    /// Resolves `specifier` to a column, joining its table into `stmt` if
    /// this is the first reference to that (table, language) pair.
    ///
    /// `kind` applies to the join this call adds; a table already joined
    /// for the same language is reused as it is. The base table is never
    /// joined.
    pub fn add_field(
        &mut self,
        stmt: &mut SelectStatement,
        specifier: &str,
        kind: JoinKind,
        langcode: Option<&str>,
    ) -> QueryResult<FieldResolution> {
        match self.locate(specifier)? {
            Location::EntityTable { table, column } => {
                let alias = self.ensure_entity_table(stmt, &table, kind, langcode);
                Ok(FieldResolution {
                    column: ColumnRef::new(alias, column),
                    source: ColumnSource::EntityTable,
                    breaks_simple_query: false,
                })
            }
            Location::FieldTable { table, column } => {
                let (alias, joined) = self.ensure_field_table(stmt, &table, kind, langcode);
                Ok(FieldResolution {
                    column: ColumnRef::new(alias, column),
                    source: ColumnSource::FieldTable,
                    breaks_simple_query: joined,
                })
            }
            Location::NotFound => Err(self.not_found(specifier)),
        }
    }

    fn ensure_entity_table(
        &mut self,
        stmt: &mut SelectStatement,
        table: &str,
        kind: JoinKind,
        langcode: Option<&str>,
    ) -> String {
        if table == self.context.base_table {
            return stmt.alias().to_string();
        }
        if let Some(alias) = self.registry.get(table, langcode) {
            return alias.to_string();
        }

        let base = ColumnRef::new(stmt.alias(), &self.context.entity_id_field);
        let id_field = &self.context.entity_id_field;
        let alias = stmt.add_join(kind, table, |alias| {
            let mut on = vec![JoinOn::Columns(ColumnRef::new(alias, id_field), base)];
            if let Some(langcode) = langcode {
                on.push(JoinOn::Value(
                    ColumnRef::new(alias, LANGCODE_COLUMN),
                    Value::String(langcode.to_string()),
                ));
            }
            on
        });
        tracing::trace!(table, alias = alias.as_str(), langcode, "joined entity table");

        self.registry.register(table, langcode, alias.clone());
        alias
    }

    fn ensure_field_table(
        &mut self,
        stmt: &mut SelectStatement,
        table: &str,
        kind: JoinKind,
        langcode: Option<&str>,
    ) -> (String, bool) {
        if let Some(alias) = self.registry.get(table, langcode) {
            return (alias.to_string(), false);
        }

        let base = ColumnRef::new(stmt.alias(), &self.context.entity_id_field);
        let field_id_field = &self.context.field_id_field;
        let entity_type = &self.context.entity_type;
        let alias = stmt.add_join(kind, table, |alias| {
            let mut on = vec![
                JoinOn::Columns(ColumnRef::new(alias, field_id_field), base),
                JoinOn::Value(
                    ColumnRef::new(alias, FIELD_ENTITY_TYPE_COLUMN),
                    Value::String(entity_type.clone()),
                ),
            ];
            if let Some(langcode) = langcode {
                on.push(JoinOn::Value(
                    ColumnRef::new(alias, LANGCODE_COLUMN),
                    Value::String(langcode.to_string()),
                ));
            }
            on
        });
        tracing::trace!(table, alias = alias.as_str(), langcode, "joined field table");

        self.registry.register(table, langcode, alias.clone());
        (alias, true)
    }

    fn not_found(&self, specifier: &str) -> QueryError {
        let name = specifier.split('.').next().unwrap_or(specifier);
        if self.context.configurable_fields.get(name) == Some(&false) {
            QueryError::FieldNotAttached {
                field: name.to_string(),
                entity_type: self.context.entity_type.clone(),
            }
        } else {
            QueryError::unresolvable(specifier, &self.context.entity_type)
        }
    }
}

/// Splits `name` or `name.column`.
fn parse_specifier(specifier: &str) -> QueryResult<(&str, Option<&str>)> {
    let invalid = |reason: &str| QueryError::InvalidSpecifier {
        specifier: specifier.to_string(),
        reason: reason.to_string(),
    };

    let mut parts = specifier.split('.');
    let name = parts.next().unwrap_or_default();
    let column = parts.next();
    if parts.next().is_some() {
        return Err(invalid("at most one column may follow the field name"));
    }
    if name.is_empty() || column == Some("") {
        return Err(invalid("empty name"));
    }
    Ok((name, column))
}
