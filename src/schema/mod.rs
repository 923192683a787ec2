//! Schema catalog subsystem
//!
//! Describes how entity types are laid out in relational storage: the base
//! table, the optional translated data table, key columns, and the
//! configurable fields stored in per-field value tables.
//!
//! # Design Principles
//!
//! - Read-only: the compiler never mutates the catalog
//! - Validated once at load; compile-time lookups assume a sound catalog
//! - Narrow seams: [`SchemaCatalog`] and [`FieldRegistry`] are the only
//!   interfaces the compiler depends on

mod catalog;
mod errors;
mod loader;
mod types;
mod validator;

pub use catalog::{Catalog, FieldRegistry, SchemaCatalog};
pub use errors::{SchemaError, SchemaResult};
pub use loader::{CatalogDocument, CatalogLoader};
pub use types::{
    field_column_name, field_table_name, EntityKeys, EntityTypeDescriptor, FieldBundleMap,
    FieldDefinition, RevisionAge, TableSchema, DEFAULT_FIELD_COLUMN, DELTA_COLUMN, FIELD_ENTITY_ID_COLUMN,
    FIELD_ENTITY_TYPE_COLUMN, FIELD_REVISION_ID_COLUMN, LANGCODE_COLUMN,
};
pub use validator::{is_identifier, CatalogValidator};
