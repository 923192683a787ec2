//! Entity query compiler
//!
//! Translates an [`EntityQuery`] into one [`SelectStatement`] and, through
//! [`QueryExecutor`], runs it against a [`Connection`].
//!
//! # Simple and complex statements
//!
//! A statement is simple when every entity (or revision) yields exactly one
//! row, or when row multiplicity cannot matter because the caller asked for
//! neither a count nor a page/range. Joining a data table or a field value
//! table can yield several rows per entity; if row counts then matter the
//! statement is complex:
//!
//! - the key columns are grouped so each entity/revision collapses to one row
//! - sorts on field value columns order by `MIN` (ascending) or `MAX`
//!   (descending) of the group instead of by raw row value

use std::collections::BTreeMap;

use serde_json::json;

use crate::backend::Connection;
use crate::condition;
use crate::schema::{FieldRegistry, RevisionAge, SchemaCatalog};
use crate::statement::{
    AggregateFunction, JoinKind, OrderTarget, SelectStatement, SortDirection, WhereClause,
};
use crate::tables::{ColumnSource, FieldResolution, TableContext, Tables};

use super::entity_query::EntityQuery;
use super::errors::{QueryError, QueryResult};
use super::explain::ExplainPlan;
use super::pager::PagerSpec;
use super::result::{KeyedIds, QueryOutput};

/// Alias of the base table in every compiled statement.
pub const BASE_TABLE_ALIAS: &str = "base_table";

/// A compiled, not yet executed, query.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub statement: SelectStatement,
    pub entity_type: String,
    /// Alias of result column 0
    pub key_alias: String,
    /// Alias of result column 1, always the entity id
    pub value_alias: String,
    pub simple_query: bool,
    pub count: bool,
    /// Active pager; its range is already applied to `statement`
    pub pager: Option<PagerSpec>,
    pub join_count: usize,
}

/// Key columns selected from the base table, by property name.
struct KeyFields {
    entries: Vec<(String, String)>,
}

impl KeyFields {
    fn alias_of(&self, property: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(p, _)| p == property)
            .map(|(_, a)| a.as_str())
    }

    fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(_, a)| a.as_str())
    }
}

/// How one sort spec will be ordered.
enum SortSource {
    Key(String),
    Resolved(FieldResolution),
}

/// Compiles entity queries against a schema catalog.
pub struct QueryCompiler<'a, C: ?Sized> {
    catalog: &'a C,
}

impl<'a, C> QueryCompiler<'a, C>
where
    C: SchemaCatalog + FieldRegistry + ?Sized,
{
    pub fn new(catalog: &'a C) -> Self {
        Self { catalog }
    }

    /// Builds the statement for `query`. Fails before building anything if
    /// the entity type is unknown or has no base table.
    pub fn compile(&self, query: &EntityQuery) -> QueryResult<CompiledQuery> {
        let entity_type = query.entity_type();
        let descriptor =
            self.catalog
                .describe(entity_type)
                .ok_or_else(|| QueryError::UnknownEntityType {
                    entity_type: entity_type.to_string(),
                })?;
        let base_table = descriptor
            .base_table
            .clone()
            .ok_or_else(|| QueryError::NoBaseTable {
                entity_type: entity_type.to_string(),
            })?;

        let configurable_fields: BTreeMap<String, bool> = self
            .catalog
            .field_bundle_map()
            .into_iter()
            .map(|(field, types)| {
                let attached = types.get(entity_type).is_some_and(|b| !b.is_empty());
                (field, attached)
            })
            .collect();

        // Data table first: properties are read from it when both have them.
        let mut entity_tables = Vec::with_capacity(2);
        let mut resolver_simple = true;
        if let Some(data_table) = &descriptor.data_table {
            entity_tables.push(data_table.clone());
            resolver_simple = false;
        }
        entity_tables.push(base_table.clone());

        let mut stmt = SelectStatement::select(&base_table, BASE_TABLE_ALIAS, query.conjunction());
        stmt.add_meta_data("configurable_fields", json!(configurable_fields));
        stmt.add_meta_data("entity_type", json!(entity_type));

        // Column 0 is the key, column 1 the entity id.
        let keys = &descriptor.entity_keys;
        let mut key_fields = KeyFields {
            entries: Vec::with_capacity(2),
        };
        let mut keyed_by_revision = false;
        let key_alias = match &keys.revision {
            None => {
                let alias = stmt.add_field(BASE_TABLE_ALIAS, &keys.id);
                key_fields.entries.push((keys.id.clone(), alias.clone()));
                alias
            }
            Some(revision) => {
                let alias = stmt.add_field(BASE_TABLE_ALIAS, revision);
                key_fields.entries.push((revision.clone(), alias.clone()));
                keyed_by_revision = query.revision_age() == RevisionAge::Current;
                alias
            }
        };
        let value_alias = stmt.add_field(BASE_TABLE_ALIAS, &keys.id);
        if keys.revision.is_some() {
            key_fields.entries.push((keys.id.clone(), value_alias.clone()));
        }

        if query.access_check_enabled() {
            stmt.add_tag(format!("{}_access", entity_type));
        }
        stmt.add_tag("entity_query");
        stmt.add_tag(format!("entity_query_{}", entity_type));
        for tag in query.tags() {
            stmt.add_tag(tag.clone());
        }
        for (key, value) in query.metadata() {
            stmt.add_meta_data(key.clone(), value.clone());
        }

        let entity_id_field = match (&keys.revision, keyed_by_revision) {
            (Some(revision), true) => revision.clone(),
            _ => keys.id.clone(),
        };
        let field_id_field = if keyed_by_revision {
            crate::schema::FIELD_REVISION_ID_COLUMN
        } else {
            crate::schema::FIELD_ENTITY_ID_COLUMN
        };
        stmt.add_meta_data("entity_tables", json!(entity_tables));
        stmt.add_meta_data("age", json!(query.revision_age().as_str()));
        stmt.add_meta_data("entity_id_field", json!(entity_id_field));
        stmt.add_meta_data("field_id_field", json!(field_id_field));
        // overwritten once the window is known
        stmt.add_meta_data("simple_query", json!(resolver_simple));

        let context = TableContext {
            entity_type: entity_type.to_string(),
            base_table: base_table.clone(),
            entity_tables,
            age: query.revision_age(),
            entity_id_field,
            field_id_field: field_id_field.to_string(),
            configurable_fields,
        };
        let mut tables = Tables::new(self.catalog, &context);

        let compiled = condition::compile(query.conditions(), &mut tables, &mut stmt)?;
        if compiled.breaks_simple_query {
            resolver_simple = false;
        }
        if let WhereClause::Group { children, .. } = compiled.clause {
            for child in children {
                stmt.add_condition(child);
            }
        }

        // Resolve every sort first: a sort may join a field table and turn
        // the statement complex.
        let mut sorts = Vec::new();
        if !query.is_count() {
            for spec in query.sorts() {
                let source = match key_fields.alias_of(&spec.field) {
                    Some(alias) => SortSource::Key(alias.to_string()),
                    None => {
                        let resolved = tables.add_field(
                            &mut stmt,
                            &spec.field,
                            JoinKind::Left,
                            spec.langcode.as_deref(),
                        )?;
                        if resolved.breaks_simple_query {
                            resolver_simple = false;
                        }
                        SortSource::Resolved(resolved)
                    }
                };
                sorts.push((spec, source));
            }
        }

        let pager = query
            .pager_spec()
            .filter(|p| p.is_active() && !query.is_count())
            .copied();
        let unpaged = pager.is_none() && query.current_range().is_none() && !query.is_count();
        let simple_query = unpaged || resolver_simple;
        stmt.add_meta_data("simple_query", json!(simple_query));

        if !simple_query {
            for alias in key_fields.aliases() {
                stmt.group_by(alias);
            }
        }

        for (spec, source) in sorts {
            match source {
                SortSource::Key(alias) => stmt.order_by(OrderTarget::Alias(alias), spec.direction),
                SortSource::Resolved(resolved)
                    if simple_query || resolved.source == ColumnSource::EntityTable =>
                {
                    stmt.order_by(OrderTarget::Column(resolved.column), spec.direction)
                }
                SortSource::Resolved(resolved) => {
                    let function = match spec.direction {
                        SortDirection::Asc => AggregateFunction::Min,
                        SortDirection::Desc => AggregateFunction::Max,
                    };
                    let alias = order_alias(&spec.field, spec.direction);
                    let alias = stmt.add_expression(function, resolved.column, &alias);
                    stmt.order_by(OrderTarget::Alias(alias), spec.direction);
                }
            }
        }

        if let Some(range) = pager.and_then(|p| p.range()).or(query.current_range()) {
            stmt.range(range.start, range.length);
        }

        tracing::debug!(
            entity_type,
            simple_query,
            joins = tables.join_count(),
            count = query.is_count(),
            "compiled entity query"
        );

        Ok(CompiledQuery {
            join_count: tables.join_count(),
            statement: stmt,
            entity_type: entity_type.to_string(),
            key_alias,
            value_alias,
            simple_query,
            count: query.is_count(),
            pager,
        })
    }

    /// Compiles `query` and describes the result without executing it.
    pub fn explain(&self, query: &EntityQuery) -> QueryResult<ExplainPlan> {
        let compiled = self.compile(query)?;
        Ok(ExplainPlan::from_compiled(&compiled))
    }
}

/// `order_by_<property>_<DIRECTION>`, with anything that is not a word
/// character replaced.
fn order_alias(property: &str, direction: SortDirection) -> String {
    let property: String = property
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    format!("order_by_{}_{}", property, direction.as_sql())
}

/// Compiles and executes entity queries over one connection.
pub struct QueryExecutor<'a, C: ?Sized, B: ?Sized> {
    compiler: QueryCompiler<'a, C>,
    connection: &'a B,
}

impl<'a, C, B> QueryExecutor<'a, C, B>
where
    C: SchemaCatalog + FieldRegistry + ?Sized,
    B: Connection + ?Sized,
{
    pub fn new(catalog: &'a C, connection: &'a B) -> Self {
        Self {
            compiler: QueryCompiler::new(catalog),
            connection,
        }
    }

    pub fn compiler(&self) -> &QueryCompiler<'a, C> {
        &self.compiler
    }

    /// Runs `query`: a count in count mode, otherwise the keyed ids in
    /// statement order. Nothing reaches the connection if compilation fails.
    pub fn execute(&self, query: &EntityQuery) -> QueryResult<QueryOutput> {
        let compiled = self.compiler.compile(query)?;

        if compiled.count {
            let count = self.connection.fetch_count(&compiled.statement.count_query())?;
            tracing::info!(entity_type = compiled.entity_type.as_str(), count, "entity query counted");
            return Ok(QueryOutput::Count(count));
        }

        let pager = match compiled.pager {
            Some(spec) => {
                let total = self.count(&query.to_count_query())?;
                let state = spec.state(total);
                if state.is_beyond_last_page() {
                    tracing::warn!(
                        entity_type = compiled.entity_type.as_str(),
                        page = state.page,
                        total_pages = state.total_pages,
                        "requested page is beyond the last page"
                    );
                }
                Some(state)
            }
            None => None,
        };

        let rows = self.connection.fetch_all(&compiled.statement)?;
        let ids = KeyedIds::from_rows(&rows)?;
        tracing::info!(
            entity_type = compiled.entity_type.as_str(),
            rows = ids.len(),
            "entity query executed"
        );
        Ok(QueryOutput::Entities { ids, pager })
    }

    fn count(&self, query: &EntityQuery) -> QueryResult<u64> {
        let compiled = self.compiler.compile(query)?;
        Ok(self.connection.fetch_count(&compiled.statement.count_query())?)
    }
}
