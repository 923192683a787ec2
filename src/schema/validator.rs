//! Structural validation of a catalog
//!
//! Run once at load time. A catalog that passes guarantees that every
//! table named by an entity type exists, that key columns exist where the
//! compiler will reference them, and that every name is safe to splice into
//! SQL as an identifier.

use std::sync::OnceLock;

use regex::Regex;

use super::catalog::{Catalog, SchemaCatalog};
use super::errors::{SchemaError, SchemaResult};
use super::types::{
    field_table_name, RevisionAge, TableSchema, FIELD_ENTITY_ID_COLUMN, FIELD_ENTITY_TYPE_COLUMN,
    FIELD_REVISION_ID_COLUMN,
};

fn identifier_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("identifier pattern compiles")
    })
}

/// Returns true if `name` is a plain SQL identifier.
pub fn is_identifier(name: &str) -> bool {
    identifier_pattern().is_match(name)
}

/// Validates catalogs before they are handed to the compiler.
pub struct CatalogValidator<'a> {
    catalog: &'a Catalog,
    source_name: &'a str,
}

impl<'a> CatalogValidator<'a> {
    /// Creates a validator. `source_name` labels errors (usually a path).
    pub fn new(catalog: &'a Catalog, source_name: &'a str) -> Self {
        Self {
            catalog,
            source_name,
        }
    }

    /// Runs every check, stopping at the first failure.
    pub fn validate(&self) -> SchemaResult<()> {
        self.validate_identifiers()?;
        self.validate_entity_types()?;
        self.validate_fields()
    }

    fn validate_identifiers(&self) -> SchemaResult<()> {
        for table in self.catalog.tables() {
            check_identifier(&table.name, "table name")?;
            for column in &table.columns {
                check_identifier(column, &format!("table '{}'", table.name))?;
            }
        }
        for descriptor in self.catalog.entity_types() {
            check_identifier(&descriptor.entity_type, "entity type name")?;
        }
        for field in self.catalog.fields() {
            check_identifier(&field.field_name, "field name")?;
        }
        Ok(())
    }

    fn validate_entity_types(&self) -> SchemaResult<()> {
        for descriptor in self.catalog.entity_types() {
            let keys = &descriptor.entity_keys;

            // No base table is allowed here; querying such a type fails later.
            if let Some(base_table) = &descriptor.base_table {
                let schema = self.require_table(base_table, &descriptor.entity_type)?;
                self.require_column(schema.has_column(&keys.id), base_table, &keys.id)?;
                if let Some(revision) = &keys.revision {
                    self.require_column(schema.has_column(revision), base_table, revision)?;
                }
            } else if descriptor.data_table.is_some() {
                return Err(SchemaError::malformed(
                    self.source_name,
                    format!(
                        "entity type '{}' has a data table but no base table",
                        descriptor.entity_type
                    ),
                ));
            }

            if let Some(data_table) = &descriptor.data_table {
                let schema = self.require_table(data_table, &descriptor.entity_type)?;
                self.require_column(schema.has_column(&keys.id), data_table, &keys.id)?;
                if let Some(revision) = &keys.revision {
                    self.require_column(schema.has_column(revision), data_table, revision)?;
                }
            }
        }
        Ok(())
    }

    fn validate_fields(&self) -> SchemaResult<()> {
        for field in self.catalog.fields() {
            for entity_type in field.bundles.keys() {
                if self.catalog.describe(entity_type).is_none() {
                    return Err(SchemaError::malformed(
                        self.source_name,
                        format!(
                            "field '{}' is attached to unknown entity type '{}'",
                            field.field_name, entity_type
                        ),
                    ));
                }
            }
            if field.bundles.is_empty() {
                continue;
            }

            // Revision tables are optional; current data tables are not.
            let data_table = field_table_name(&field.field_name, RevisionAge::Current);
            let schema = self.require_table(&data_table, &field.field_name)?;
            for column in [
                FIELD_ENTITY_TYPE_COLUMN,
                FIELD_ENTITY_ID_COLUMN,
                FIELD_REVISION_ID_COLUMN,
            ] {
                self.require_column(schema.has_column(column), &data_table, column)?;
            }
        }
        Ok(())
    }

    fn require_table(
        &self,
        table: &str,
        owner: &str,
    ) -> SchemaResult<&'a TableSchema> {
        self.catalog.table_schema(table).ok_or_else(|| {
            SchemaError::malformed(
                self.source_name,
                format!("table '{}' used by '{}' is not declared", table, owner),
            )
        })
    }

    fn require_column(&self, present: bool, table: &str, column: &str) -> SchemaResult<()> {
        if present {
            Ok(())
        } else {
            Err(SchemaError::malformed(
                self.source_name,
                format!("table '{}' has no column '{}'", table, column),
            ))
        }
    }
}

fn check_identifier(name: &str, context: &str) -> SchemaResult<()> {
    if is_identifier(name) {
        Ok(())
    } else {
        Err(SchemaError::InvalidIdentifier {
            identifier: name.to_string(),
            context: context.to_string(),
        })
    }
}
