//! Query Compiler Tests
//!
//! Statement shape produced for entity queries:
//! - key/value field selection per revision support
//! - tags and metadata
//! - simple vs complex mode, grouping and aggregate ordering
//! - fail-closed errors

mod common;

use entity_query::condition::{or_condition_group, Operator};
use entity_query::query::{EntityQuery, ErrorCategory, QueryCompiler};
use entity_query::schema::{CatalogValidator, RevisionAge};
use entity_query::statement::{
    AggregateFunction, ColumnRef, JoinKind, JoinOn, OrderTarget, SortDirection,
};
use serde_json::json;

// =============================================================================
// Key Fields
// =============================================================================

/// The fixture catalog is itself structurally valid.
#[test]
fn test_fixture_catalog_is_valid() {
    let catalog = common::catalog();
    CatalogValidator::new(&catalog, "fixture").validate().unwrap();
}

/// Revisionable types select the revision id as key and the entity id as value.
#[test]
fn test_revisionable_key_fields() {
    let catalog = common::catalog();
    let compiled = QueryCompiler::new(&catalog)
        .compile(&EntityQuery::new("node"))
        .unwrap();

    let fields: Vec<_> = compiled
        .statement
        .fields()
        .iter()
        .map(|f| (f.column.to_string(), f.alias.clone()))
        .collect();
    assert_eq!(
        fields,
        vec![
            ("base_table.vid".to_string(), "vid".to_string()),
            ("base_table.nid".to_string(), "nid".to_string()),
        ]
    );
    assert_eq!(compiled.key_alias, "vid");
    assert_eq!(compiled.value_alias, "nid");
    assert_eq!(
        compiled.statement.meta_data("entity_id_field"),
        Some(&json!("vid"))
    );
    assert_eq!(
        compiled.statement.meta_data("field_id_field"),
        Some(&json!("revision_id"))
    );
}

/// Types without revisions select the entity id twice.
#[test]
fn test_plain_key_fields() {
    let catalog = common::catalog();
    let compiled = QueryCompiler::new(&catalog)
        .compile(&EntityQuery::new("taxonomy_term"))
        .unwrap();

    assert_eq!(compiled.key_alias, "tid");
    assert_eq!(compiled.value_alias, "base_table_tid");
    assert_eq!(compiled.statement.field("base_table_tid").unwrap().column.column, "tid");
    assert_eq!(
        compiled.statement.meta_data("field_id_field"),
        Some(&json!("entity_id"))
    );
}

/// Querying every revision joins on entity ids.
#[test]
fn test_revision_age_joins_on_entity_id() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node")
        .age(RevisionAge::Revision)
        .condition("field_tags.tid", json!(4));
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();

    assert_eq!(compiled.key_alias, "vid");
    assert_eq!(compiled.statement.meta_data("age"), Some(&json!("revision")));
    assert_eq!(
        compiled.statement.meta_data("entity_id_field"),
        Some(&json!("nid"))
    );
    let join = &compiled.statement.joins()[0];
    assert_eq!(join.table, "field_revision_field_tags");
    assert_eq!(
        join.on[0],
        JoinOn::Columns(
            ColumnRef::new("field_revision_field_tags", "entity_id"),
            ColumnRef::new("base_table", "nid")
        )
    );
}

// =============================================================================
// Tags and Metadata
// =============================================================================

#[test]
fn test_tags_and_metadata() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node")
        .add_tag("node_listing")
        .add_meta_data("account", json!(3));
    let stmt = QueryCompiler::new(&catalog).compile(&query).unwrap().statement;

    for tag in ["node_access", "entity_query", "entity_query_node", "node_listing"] {
        assert!(stmt.has_tag(tag), "missing tag {}", tag);
    }
    assert_eq!(stmt.meta_data("account"), Some(&json!(3)));
    assert_eq!(stmt.meta_data("entity_type"), Some(&json!("node")));
    assert_eq!(
        stmt.meta_data("entity_tables"),
        Some(&json!(["node_field_data", "node"]))
    );
    assert_eq!(
        stmt.meta_data("configurable_fields"),
        Some(&json!({"field_avatar": false, "field_tags": true}))
    );
}

#[test]
fn test_simple_query_metadata_holds_final_decision() {
    let catalog = common::catalog();
    let compiler = QueryCompiler::new(&catalog);

    // a data table alone does not break an unpaged query
    let compiled = compiler.compile(&EntityQuery::new("node")).unwrap();
    assert!(compiled.simple_query);
    assert_eq!(compiled.statement.meta_data("simple_query"), Some(&json!(true)));

    let compiled = compiler
        .compile(&EntityQuery::new("node").range(0, 2))
        .unwrap();
    assert!(!compiled.simple_query);
    assert_eq!(compiled.statement.meta_data("simple_query"), Some(&json!(false)));
}

#[test]
fn test_access_check_disabled_drops_access_tag() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node").access_check(false);
    let stmt = QueryCompiler::new(&catalog).compile(&query).unwrap().statement;

    assert!(!stmt.has_tag("node_access"));
    assert!(stmt.has_tag("entity_query_node"));
}

// =============================================================================
// Simple and Complex Statements
// =============================================================================

/// node, status = 1, sorted by title, first ten rows.
#[test]
fn test_data_table_sort_with_range() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node")
        .condition("status", json!(1))
        .sort("title", SortDirection::Asc)
        .range(0, 10);
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();
    let stmt = &compiled.statement;

    assert!(!compiled.simple_query);
    assert_eq!(stmt.meta_data("simple_query"), Some(&json!(false)));
    assert_eq!(stmt.joins().len(), 1);
    assert_eq!(stmt.joins()[0].table, "node_field_data");
    assert_eq!(stmt.joins()[0].kind, JoinKind::Inner);
    assert_eq!(stmt.group_by_aliases(), ["vid".to_string(), "nid".to_string()]);
    assert_eq!(stmt.orders().len(), 1);
    assert_eq!(
        stmt.orders()[0].target,
        OrderTarget::Column(ColumnRef::new("node_field_data", "title"))
    );
    assert!(stmt.expressions().is_empty());

    let sql = stmt.render().sql;
    assert!(sql.contains(
        "INNER JOIN node_field_data node_field_data ON node_field_data.vid = base_table.vid"
    ));
    assert!(sql.contains("WHERE node_field_data.status = :db_condition_placeholder_0"));
    assert!(sql.contains("GROUP BY vid, nid"));
    assert!(sql.contains("ORDER BY node_field_data.title ASC"));
    assert!(sql.ends_with("LIMIT 10 OFFSET 0"));
}

/// Count mode over a plain type: no grouping, no ordering.
#[test]
fn test_plain_count_is_simple() {
    let catalog = common::catalog();
    let query = EntityQuery::new("taxonomy_term")
        .sort("name", SortDirection::Asc)
        .count();
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();

    assert!(compiled.simple_query);
    assert!(compiled.count);
    assert!(compiled.statement.group_by_aliases().is_empty());
    assert!(compiled.statement.orders().is_empty());
    assert!(compiled.statement.joins().is_empty());
    assert_eq!(
        compiled.statement.count_query().render().sql,
        "SELECT COUNT(*) AS expression\n\
         FROM (SELECT base_table.tid AS tid, base_table.tid AS base_table_tid\n\
         FROM taxonomy_term_data base_table) subquery"
    );
}

/// Multi-valued field sort under a pager orders by MAX of the group.
#[test]
fn test_field_sort_with_pager_uses_aggregate() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node")
        .sort("field_tags.tid", SortDirection::Desc)
        .pager(2, 0);
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();
    let stmt = &compiled.statement;

    assert!(!compiled.simple_query);
    assert_eq!(stmt.joins()[0].kind, JoinKind::Left);
    let expression = stmt.expression("order_by_field_tags_tid_DESC").unwrap();
    assert_eq!(expression.function, AggregateFunction::Max);
    assert_eq!(
        expression.argument,
        ColumnRef::new("field_data_field_tags", "field_tags_tid")
    );
    assert_eq!(
        stmt.orders()[0].target,
        OrderTarget::Alias("order_by_field_tags_tid_DESC".into())
    );
    assert_eq!(stmt.orders()[0].direction, SortDirection::Desc);
    assert!(stmt
        .render()
        .sql
        .contains("MAX(field_data_field_tags.field_tags_tid) AS order_by_field_tags_tid_DESC"));
    assert_eq!(stmt.current_range().map(|r| (r.start, r.length)), Some((0, 2)));
}

/// Ascending multi-valued sorts use MIN, and each sort gets its own column.
#[test]
fn test_independent_aggregates() {
    let catalog = common::catalog();
    let query = EntityQuery::new("user")
        .sort("field_avatar", SortDirection::Asc)
        .sort("name", SortDirection::Desc)
        .range(0, 5);
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();
    let stmt = &compiled.statement;

    assert!(!compiled.simple_query);
    assert_eq!(stmt.group_by_aliases(), ["uid".to_string()]);
    assert_eq!(stmt.expressions().len(), 1);
    assert_eq!(stmt.expressions()[0].function, AggregateFunction::Min);
    assert_eq!(stmt.expressions()[0].alias, "order_by_field_avatar_ASC");
    assert_eq!(
        stmt.orders()[1].target,
        OrderTarget::Column(ColumnRef::new("base_table", "name"))
    );

    let query = EntityQuery::new("node")
        .sort("field_tags.tid", SortDirection::Asc)
        .sort("field_tags.delta", SortDirection::Desc)
        .count();
    // count mode ignores sorts entirely
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();
    assert!(compiled.statement.expressions().is_empty());

    let query = EntityQuery::new("node")
        .sort("field_tags.tid", SortDirection::Asc)
        .sort("field_tags.delta", SortDirection::Desc)
        .range(0, 5);
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();
    let aliases: Vec<_> = compiled
        .statement
        .expressions()
        .iter()
        .map(|e| (e.function, e.alias.as_str()))
        .collect();
    assert_eq!(
        aliases,
        vec![
            (AggregateFunction::Min, "order_by_field_tags_tid_ASC"),
            (AggregateFunction::Max, "order_by_field_tags_delta_DESC"),
        ]
    );
    assert_eq!(compiled.statement.joins().len(), 1);
}

/// Without paging, range or count the statement stays simple even after a
/// field join, and field sorts order by the raw column.
#[test]
fn test_unpaged_field_sort_is_simple() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node").sort("field_tags.tid", SortDirection::Asc);
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();

    assert!(compiled.simple_query);
    assert!(compiled.statement.group_by_aliases().is_empty());
    assert_eq!(
        compiled.statement.orders()[0].target,
        OrderTarget::Column(ColumnRef::new("field_data_field_tags", "field_tags_tid"))
    );
}

/// Sorting on a key column reuses its select alias without a join.
#[test]
fn test_key_sort_reuses_alias() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node")
        .sort("nid", SortDirection::Desc)
        .pager(10, 0);
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();

    assert!(compiled.statement.joins().is_empty());
    assert_eq!(
        compiled.statement.orders()[0].target,
        OrderTarget::Alias("nid".into())
    );
}

// =============================================================================
// Joins
// =============================================================================

/// The same (table, language) pair is joined once across conditions and
/// sorts; another language gets its own join.
#[test]
fn test_join_once_per_table_and_language() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node")
        .condition("status", json!(1))
        .condition("sticky", json!(0))
        .condition_with("title", json!("Alpha DE"), Operator::Eq, Some("de"))
        .sort("title", SortDirection::Asc);
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();
    let joins = compiled.statement.joins();

    assert_eq!(joins.len(), 2);
    assert_eq!(compiled.join_count, 2);
    assert_eq!(joins[0].alias, "node_field_data");
    assert_eq!(joins[1].alias, "node_field_data_2");
    assert_eq!(
        joins[1].on[1],
        JoinOn::Value(ColumnRef::new("node_field_data_2", "langcode"), json!("de"))
    );
}

/// OR conditions join field tables with LEFT joins.
#[test]
fn test_or_group_uses_left_join() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node").condition_group(
        or_condition_group()
            .condition("field_tags.tid", json!(5))
            .condition("type", json!("page")),
    );
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();

    assert_eq!(compiled.statement.joins()[0].kind, JoinKind::Left);
    assert!(compiled
        .statement
        .render()
        .sql
        .contains("WHERE (field_data_field_tags.field_tags_tid = "));
}

/// A sort on a translated property must not filter: the data table is
/// LEFT joined for the requested language.
#[test]
fn test_language_sort_left_joins_data_table() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node").sort_with("title", SortDirection::Asc, Some("de"));
    let compiled = QueryCompiler::new(&catalog).compile(&query).unwrap();
    let join = &compiled.statement.joins()[0];

    assert_eq!(join.table, "node_field_data");
    assert_eq!(join.kind, JoinKind::Left);
    assert!(compiled
        .statement
        .render()
        .sql
        .contains("LEFT OUTER JOIN node_field_data node_field_data ON"));
}

/// Translated properties inside an OR, or tested for null, join LEFT.
#[test]
fn test_data_table_left_join_under_or_and_is_null() {
    let catalog = common::catalog();
    let compiler = QueryCompiler::new(&catalog);

    let query = EntityQuery::new("node").condition_group(
        or_condition_group()
            .condition_with("title", json!("Alpha DE"), Operator::Eq, Some("de"))
            .condition("type", json!("page")),
    );
    let compiled = compiler.compile(&query).unwrap();
    assert_eq!(compiled.statement.joins().len(), 1);
    assert_eq!(compiled.statement.joins()[0].kind, JoinKind::Left);

    let query = EntityQuery::new("node").not_exists("sticky");
    let compiled = compiler.compile(&query).unwrap();
    assert_eq!(compiled.statement.joins()[0].kind, JoinKind::Left);
}

// =============================================================================
// Errors
// =============================================================================

#[test]
fn test_no_base_table() {
    let catalog = common::catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(&EntityQuery::new("comment"))
        .unwrap_err();
    assert_eq!(err.code(), "ENTITY_QUERY_NO_BASE_TABLE");
    assert_eq!(err.category(), ErrorCategory::Configuration);
}

#[test]
fn test_unknown_entity_type() {
    let catalog = common::catalog();
    let err = QueryCompiler::new(&catalog)
        .compile(&EntityQuery::new("widget"))
        .unwrap_err();
    assert_eq!(err.code(), "ENTITY_QUERY_UNKNOWN_ENTITY_TYPE");
}

#[test]
fn test_unresolvable_properties() {
    let catalog = common::catalog();
    let compiler = QueryCompiler::new(&catalog);

    let err = compiler
        .compile(&EntityQuery::new("node").condition("colour", json!("red")))
        .unwrap_err();
    assert_eq!(err.code(), "ENTITY_QUERY_UNRESOLVABLE_FIELD");
    assert_eq!(err.category(), ErrorCategory::Caller);

    let err = compiler
        .compile(&EntityQuery::new("node").sort("colour", SortDirection::Asc))
        .unwrap_err();
    assert_eq!(err.code(), "ENTITY_QUERY_UNRESOLVABLE_FIELD");

    let err = compiler
        .compile(&EntityQuery::new("node").exists("field_avatar"))
        .unwrap_err();
    assert_eq!(err.code(), "ENTITY_QUERY_FIELD_NOT_ATTACHED");

    let err = compiler
        .compile(&EntityQuery::new("node").condition("field_tags.tid.x", json!(1)))
        .unwrap_err();
    assert_eq!(err.code(), "ENTITY_QUERY_INVALID_SPECIFIER");
}

// =============================================================================
// Explain
// =============================================================================

#[test]
fn test_explain_plan() {
    let catalog = common::catalog();
    let query = EntityQuery::new("node")
        .condition("status", json!(1))
        .sort("field_tags.tid", SortDirection::Desc)
        .pager(10, 0);
    let plan = QueryCompiler::new(&catalog).explain(&query).unwrap();

    assert_eq!(plan.entity_type, "node");
    assert_eq!(plan.key_field, "vid");
    assert_eq!(plan.value_field, "nid");
    assert!(!plan.simple_query);
    assert_eq!(plan.joins.len(), 2);
    assert_eq!(plan.group_by, vec!["vid".to_string(), "nid".to_string()]);
    assert_eq!(plan.order_by, vec!["order_by_field_tags_tid_DESC DESC".to_string()]);
    assert_eq!(plan.arguments.len(), 2);

    let text = plan.to_string();
    assert!(text.contains("Mode: COMPLEX"));
    assert!(text.contains("Group By: vid, nid"));

    let json = serde_json::to_value(&plan).unwrap();
    assert_eq!(json["range"], json!({"start": 0, "length": 10}));
}
