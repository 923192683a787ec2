//! Schema catalog and field registry
//!
//! The query compiler reads storage layout through two narrow traits so that
//! any metadata source can back it. [`Catalog`] is the in-memory
//! implementation used by the loader, the CLI and the tests.

use std::collections::BTreeMap;

use super::errors::{SchemaError, SchemaResult};
use super::types::{EntityTypeDescriptor, FieldBundleMap, FieldDefinition, TableSchema};

/// Read-only lookup of entity type descriptors and table schemas.
pub trait SchemaCatalog {
    /// Returns the descriptor of an entity type, if the type is known.
    fn describe(&self, entity_type: &str) -> Option<&EntityTypeDescriptor>;

    /// Returns the column set of a table, if the table is known.
    fn table_schema(&self, table: &str) -> Option<&TableSchema>;
}

/// Read-only lookup of configurable fields.
pub trait FieldRegistry {
    /// Field name -> entity type -> bundles the field is attached to.
    fn field_bundle_map(&self) -> FieldBundleMap;
}

/// In-memory schema catalog.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entity_types: BTreeMap<String, EntityTypeDescriptor>,
    tables: BTreeMap<String, TableSchema>,
    fields: BTreeMap<String, FieldDefinition>,
}

impl Catalog {
    /// Creates an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an entity type. Names are unique.
    pub fn register_entity_type(&mut self, descriptor: EntityTypeDescriptor) -> SchemaResult<()> {
        if self.entity_types.contains_key(&descriptor.entity_type) {
            return Err(SchemaError::Duplicate {
                kind: "entity type",
                name: descriptor.entity_type,
            });
        }
        self.entity_types
            .insert(descriptor.entity_type.clone(), descriptor);
        Ok(())
    }

    /// Registers a table. Names are unique.
    pub fn register_table(&mut self, table: TableSchema) -> SchemaResult<()> {
        if self.tables.contains_key(&table.name) {
            return Err(SchemaError::Duplicate {
                kind: "table",
                name: table.name,
            });
        }
        self.tables.insert(table.name.clone(), table);
        Ok(())
    }

    /// Registers a configurable field. Names are unique.
    pub fn register_field(&mut self, field: FieldDefinition) -> SchemaResult<()> {
        if self.fields.contains_key(&field.field_name) {
            return Err(SchemaError::Duplicate {
                kind: "field",
                name: field.field_name,
            });
        }
        self.fields.insert(field.field_name.clone(), field);
        Ok(())
    }

    /// Builder form of [`Catalog::register_entity_type`].
    pub fn with_entity_type(mut self, descriptor: EntityTypeDescriptor) -> SchemaResult<Self> {
        self.register_entity_type(descriptor)?;
        Ok(self)
    }

    /// Builder form of [`Catalog::register_table`].
    pub fn with_table(mut self, table: TableSchema) -> SchemaResult<Self> {
        self.register_table(table)?;
        Ok(self)
    }

    /// Builder form of [`Catalog::register_field`].
    pub fn with_field(mut self, field: FieldDefinition) -> SchemaResult<Self> {
        self.register_field(field)?;
        Ok(self)
    }

    pub fn entity_types(&self) -> impl Iterator<Item = &EntityTypeDescriptor> {
        self.entity_types.values()
    }

    pub fn tables(&self) -> impl Iterator<Item = &TableSchema> {
        self.tables.values()
    }

    pub fn fields(&self) -> impl Iterator<Item = &FieldDefinition> {
        self.fields.values()
    }

    pub fn field(&self, field_name: &str) -> Option<&FieldDefinition> {
        self.fields.get(field_name)
    }
}

impl SchemaCatalog for Catalog {
    fn describe(&self, entity_type: &str) -> Option<&EntityTypeDescriptor> {
        self.entity_types.get(entity_type)
    }

    fn table_schema(&self, table: &str) -> Option<&TableSchema> {
        self.tables.get(table)
    }
}

impl FieldRegistry for Catalog {
    fn field_bundle_map(&self) -> FieldBundleMap {
        self.fields
            .values()
            .map(|field| (field.field_name.clone(), field.bundles.clone()))
            .collect()
    }
}
