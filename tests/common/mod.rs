//! Shared fixtures for the integration suites
//!
//! Entity types:
//! - node: revisionable, translated (node + node_field_data), field_tags on articles
//! - user: plain base table, field_avatar
//! - taxonomy_term: plain base table, no fields
//! - comment: no base table
//!
//! Data: three nodes (1, 2, 3 at revisions 11, 12, 13), node 1 translated to
//! German, node 1 tagged 5 and 7, node 3 tagged 6, four terms, two users.

#![allow(dead_code)]

use std::cell::Cell;

use entity_query::backend::{BackendResult, Connection, MemoryConnection, Row};
use entity_query::schema::{
    Catalog, EntityKeys, EntityTypeDescriptor, FieldDefinition, TableSchema,
};
use entity_query::statement::{CountQuery, SelectStatement};
use serde_json::json;

const FIELD_TABLE_COLUMNS: [&str; 4] = ["entity_type", "entity_id", "revision_id", "langcode"];

fn field_table(name: &str, value_column: &str) -> TableSchema {
    let mut columns: Vec<&str> = FIELD_TABLE_COLUMNS.to_vec();
    columns.push("delta");
    columns.push(value_column);
    TableSchema::new(name, columns)
}

pub fn catalog() -> Catalog {
    Catalog::new()
        .with_table(TableSchema::new("node", ["nid", "vid", "type", "uid", "created"]))
        .unwrap()
        .with_table(TableSchema::new(
            "node_field_data",
            ["nid", "vid", "langcode", "title", "status", "sticky"],
        ))
        .unwrap()
        .with_table(TableSchema::new("users", ["uid", "name", "status"]))
        .unwrap()
        .with_table(TableSchema::new(
            "taxonomy_term_data",
            ["tid", "vocabulary", "name", "weight"],
        ))
        .unwrap()
        .with_table(field_table("field_data_field_tags", "field_tags_tid"))
        .unwrap()
        .with_table(field_table("field_revision_field_tags", "field_tags_tid"))
        .unwrap()
        .with_table(field_table("field_data_field_avatar", "field_avatar_value"))
        .unwrap()
        .with_entity_type(
            EntityTypeDescriptor::new(
                "node",
                EntityKeys::id("nid").with_revision("vid").with_bundle("type"),
            )
            .with_base_table("node")
            .with_data_table("node_field_data"),
        )
        .unwrap()
        .with_entity_type(EntityTypeDescriptor::new("user", EntityKeys::id("uid")).with_base_table("users"))
        .unwrap()
        .with_entity_type(
            EntityTypeDescriptor::new(
                "taxonomy_term",
                EntityKeys::id("tid").with_bundle("vocabulary"),
            )
            .with_base_table("taxonomy_term_data"),
        )
        .unwrap()
        .with_entity_type(EntityTypeDescriptor::new("comment", EntityKeys::id("cid")))
        .unwrap()
        .with_field(FieldDefinition::new("field_tags").attach("node", "article"))
        .unwrap()
        .with_field(FieldDefinition::new("field_avatar").attach("user", "user"))
        .unwrap()
}

fn tag(nid: u64, vid: u64, delta: u64, tid: u64) -> serde_json::Value {
    json!({
        "entity_type": "node",
        "entity_id": nid,
        "revision_id": vid,
        "langcode": "en",
        "delta": delta,
        "field_tags_tid": tid
    })
}

pub fn connection() -> MemoryConnection {
    MemoryConnection::new()
        .with_table(
            "node",
            vec![
                json!({"nid": 1, "vid": 11, "type": "article", "uid": 1, "created": 100}),
                json!({"nid": 2, "vid": 12, "type": "page", "uid": 1, "created": 200}),
                json!({"nid": 3, "vid": 13, "type": "article", "uid": 2, "created": 300}),
            ],
        )
        .unwrap()
        .with_table(
            "node_field_data",
            vec![
                json!({"nid": 1, "vid": 11, "langcode": "en", "title": "Alpha", "status": 1, "sticky": 0}),
                json!({"nid": 1, "vid": 11, "langcode": "de", "title": "Alpha DE", "status": 1, "sticky": 0}),
                json!({"nid": 2, "vid": 12, "langcode": "en", "title": "Beta", "status": 1, "sticky": 1}),
                json!({"nid": 3, "vid": 13, "langcode": "en", "title": "Gamma", "status": 0, "sticky": 0}),
            ],
        )
        .unwrap()
        .with_table(
            "field_data_field_tags",
            vec![tag(1, 11, 0, 5), tag(1, 11, 1, 7), tag(3, 13, 0, 6)],
        )
        .unwrap()
        .with_table(
            "field_revision_field_tags",
            vec![
                tag(1, 10, 0, 4),
                tag(1, 11, 0, 5),
                tag(1, 11, 1, 7),
                tag(3, 13, 0, 6),
            ],
        )
        .unwrap()
        .with_table(
            "users",
            vec![
                json!({"uid": 1, "name": "ada", "status": 1}),
                json!({"uid": 2, "name": "bob", "status": 1}),
            ],
        )
        .unwrap()
        .with_table("field_data_field_avatar", vec![])
        .unwrap()
        .with_table(
            "taxonomy_term_data",
            vec![
                json!({"tid": 5, "vocabulary": "tags", "name": "rust", "weight": 0}),
                json!({"tid": 6, "vocabulary": "tags", "name": "sql", "weight": 1}),
                json!({"tid": 7, "vocabulary": "tags", "name": "php", "weight": 2}),
                json!({"tid": 8, "vocabulary": "topics", "name": "news", "weight": 0}),
            ],
        )
        .unwrap()
}

/// Wraps a connection and counts the statements that reach it.
pub struct CountingConnection<C> {
    inner: C,
    calls: Cell<usize>,
}

impl<C: Connection> CountingConnection<C> {
    pub fn new(inner: C) -> Self {
        Self {
            inner,
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl<C: Connection> Connection for CountingConnection<C> {
    fn fetch_all(&self, statement: &SelectStatement) -> BackendResult<Vec<Row>> {
        self.calls.set(self.calls.get() + 1);
        self.inner.fetch_all(statement)
    }

    fn fetch_count(&self, query: &CountQuery) -> BackendResult<u64> {
        self.calls.set(self.calls.get() + 1);
        self.inner.fetch_count(query)
    }
}
