//! Property tests for the query compiler.
//!
//! Generates random node queries over the fixture catalog and checks the
//! structural guarantees of every compiled statement.

mod common;

use proptest::prelude::*;
use std::collections::HashSet;

use entity_query::query::{EntityQuery, QueryCompiler, QueryExecutor};
use entity_query::statement::{JoinOn, SortDirection};
use serde_json::json;

const PROPERTIES: [&str; 6] = ["status", "sticky", "title", "type", "field_tags.tid", "field_tags.delta"];
const LANGCODES: [Option<&str>; 3] = [None, Some("en"), Some("de")];

#[derive(Debug, Clone)]
struct QueryShape {
    conditions: Vec<(usize, usize, i64)>,
    sorts: Vec<(usize, bool)>,
    pager: Option<(u64, u64)>,
    range: Option<(u64, u64)>,
    count: bool,
}

fn arb_shape() -> impl Strategy<Value = QueryShape> {
    (
        prop::collection::vec((0..PROPERTIES.len(), 0..LANGCODES.len(), 0i64..10), 0..5),
        prop::collection::vec((0..PROPERTIES.len(), any::<bool>()), 0..3),
        prop::option::of((1u64..5, 0u64..4)),
        prop::option::of((0u64..5, 1u64..5)),
        any::<bool>(),
    )
        .prop_map(|(conditions, sorts, pager, range, count)| QueryShape {
            conditions,
            sorts,
            pager,
            range,
            count,
        })
}

fn build(shape: &QueryShape) -> EntityQuery {
    let mut query = EntityQuery::new("node");
    for &(property, langcode, value) in &shape.conditions {
        query = query.condition_with(
            PROPERTIES[property],
            json!(value),
            entity_query::condition::Operator::Eq,
            LANGCODES[langcode],
        );
    }
    for &(property, descending) in &shape.sorts {
        let direction = if descending {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        };
        query = query.sort(PROPERTIES[property], direction);
    }
    if let Some((start, length)) = shape.range {
        query = query.range(start, length);
    }
    if let Some((limit, page)) = shape.pager {
        query = query.pager(limit, 0).with_page(page);
    }
    if shape.count {
        query = query.count();
    }
    query
}

fn join_langcode(on: &[JoinOn]) -> Option<String> {
    on.iter().find_map(|term| match term {
        JoinOn::Value(column, value) if column.column == "langcode" => {
            value.as_str().map(str::to_string)
        }
        _ => None,
    })
}

proptest! {
    /// Compiling is a pure function of the query.
    #[test]
    fn compile_is_deterministic(shape in arb_shape()) {
        let catalog = common::catalog();
        let compiler = QueryCompiler::new(&catalog);
        let query = build(&shape);

        let first = compiler.compile(&query).unwrap();
        let second = compiler.compile(&query).unwrap();
        prop_assert_eq!(first, second);
    }

    /// Each (table, language) pair is joined at most once.
    #[test]
    fn joins_are_unique(shape in arb_shape()) {
        let catalog = common::catalog();
        let compiled = QueryCompiler::new(&catalog).compile(&build(&shape)).unwrap();

        let mut seen = HashSet::new();
        for join in compiled.statement.joins() {
            prop_assert!(seen.insert((join.table.clone(), join_langcode(&join.on))));
        }
        prop_assert_eq!(compiled.join_count, compiled.statement.joins().len());
    }

    /// Count mode never orders or aggregates.
    #[test]
    fn count_mode_has_no_ordering(shape in arb_shape()) {
        let catalog = common::catalog();
        let mut shape = shape;
        shape.count = true;
        let compiled = QueryCompiler::new(&catalog).compile(&build(&shape)).unwrap();

        prop_assert!(compiled.statement.orders().is_empty());
        prop_assert!(compiled.statement.expressions().is_empty());
        prop_assert!(compiled.pager.is_none());
    }

    /// Complex statements group by exactly the key columns, and only
    /// field value sorts are aggregated.
    #[test]
    fn complex_statements_group_by_keys(shape in arb_shape()) {
        let catalog = common::catalog();
        let compiled = QueryCompiler::new(&catalog).compile(&build(&shape)).unwrap();
        let stmt = &compiled.statement;

        if compiled.simple_query {
            prop_assert!(stmt.group_by_aliases().is_empty());
            prop_assert!(stmt.expressions().is_empty());
        } else {
            prop_assert_eq!(stmt.group_by_aliases(), &["vid".to_string(), "nid".to_string()][..]);
            for expression in stmt.expressions() {
                prop_assert!(expression.argument.table.starts_with("field_data_field_tags"));
            }
        }
    }

    /// An active pager decides the window, overriding any explicit range.
    #[test]
    fn pager_window_overrides_range(shape in arb_shape()) {
        let catalog = common::catalog();
        let compiled = QueryCompiler::new(&catalog).compile(&build(&shape)).unwrap();
        let range = compiled.statement.current_range().map(|r| (r.start, r.length));

        match (shape.count, shape.pager, shape.range) {
            (false, Some((limit, page)), _) => prop_assert_eq!(range, Some((page * limit, limit))),
            (_, _, Some(explicit)) => prop_assert_eq!(range, Some(explicit)),
            _ => prop_assert_eq!(range, None),
        }
    }

    /// Executed rows never repeat a key and respect the window.
    #[test]
    fn execution_respects_window(shape in arb_shape()) {
        let catalog = common::catalog();
        let connection = common::connection();
        let mut shape = shape;
        shape.count = false;
        let output = QueryExecutor::new(&catalog, &connection).execute(&build(&shape)).unwrap();
        let ids = output.as_ids().unwrap();

        let keys: HashSet<u64> = ids.keys().collect();
        prop_assert_eq!(keys.len(), ids.len());
        if let Some((limit, _)) = shape.pager {
            prop_assert!(ids.len() as u64 <= limit);
        } else if let Some((_, length)) = shape.range {
            prop_assert!(ids.len() as u64 <= length);
        }
    }
}
