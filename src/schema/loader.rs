//! Catalog loader for JSON catalog files
//!
//! File layout:
//!
//! ```json
//! {
//!   "entity_types": [{"entity_type": "node", "base_table": "node", ...}],
//!   "tables": [{"name": "node", "columns": ["nid", "vid"]}],
//!   "fields": [{"field_name": "field_tags", "bundles": {"node": ["article"]}}]
//! }
//! ```
//!
//! Unreadable or malformed files are load failures; nothing partial is
//! returned.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::catalog::Catalog;
use super::errors::{SchemaError, SchemaResult};
use super::types::{EntityTypeDescriptor, FieldDefinition, TableSchema};
use super::validator::CatalogValidator;

/// On-disk representation of a catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogDocument {
    #[serde(default)]
    pub entity_types: Vec<EntityTypeDescriptor>,
    #[serde(default)]
    pub tables: Vec<TableSchema>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Loads and validates catalogs.
pub struct CatalogLoader;

impl CatalogLoader {
    /// Loads a catalog file.
    pub fn load(path: &Path) -> SchemaResult<Catalog> {
        let content = fs::read_to_string(path).map_err(|e| SchemaError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::from_json(&content, &path.display().to_string())
    }

    /// Parses a catalog from JSON text. `source_name` labels errors.
    pub fn from_json(content: &str, source_name: &str) -> SchemaResult<Catalog> {
        let document: CatalogDocument = serde_json::from_str(content)
            .map_err(|e| SchemaError::malformed(source_name, format!("Invalid JSON: {}", e)))?;

        Self::from_document(document, source_name)
    }

    /// Builds a catalog from a parsed document and validates it.
    pub fn from_document(document: CatalogDocument, source_name: &str) -> SchemaResult<Catalog> {
        let mut catalog = Catalog::new();
        for table in document.tables {
            catalog.register_table(table)?;
        }
        for descriptor in document.entity_types {
            catalog.register_entity_type(descriptor)?;
        }
        for field in document.fields {
            catalog.register_field(field)?;
        }

        CatalogValidator::new(&catalog, source_name).validate()?;

        tracing::debug!(
            source = source_name,
            entity_types = catalog.entity_types().count(),
            tables = catalog.tables().count(),
            fields = catalog.fields().count(),
            "catalog loaded"
        );

        Ok(catalog)
    }
}
