//! Entity type, table and field definitions
//!
//! These are the static descriptor records the catalog hands to the query
//! compiler. Nothing here is mutated during compilation.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Column that scopes a row to a language, on data tables and field tables.
pub const LANGCODE_COLUMN: &str = "langcode";

/// Field table column holding the owning entity id.
pub const FIELD_ENTITY_ID_COLUMN: &str = "entity_id";

/// Field table column holding the owning revision id.
pub const FIELD_REVISION_ID_COLUMN: &str = "revision_id";

/// Field table column holding the owning entity type.
pub const FIELD_ENTITY_TYPE_COLUMN: &str = "entity_type";

/// Field table column holding the position of a value within the field.
/// Read as-is rather than prefixed with the field name.
pub const DELTA_COLUMN: &str = "delta";

/// Column used when a field specifier names no column.
pub const DEFAULT_FIELD_COLUMN: &str = "value";

/// Key field names of an entity type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityKeys {
    /// Entity id column
    pub id: String,
    /// Revision id column, when the type is revisionable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Bundle column, when the type has bundles
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bundle: Option<String>,
}

impl EntityKeys {
    /// Keys for a type with only an id.
    pub fn id(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            revision: None,
            bundle: None,
        }
    }

    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    pub fn with_bundle(mut self, bundle: impl Into<String>) -> Self {
        self.bundle = Some(bundle.into());
        self
    }
}

/// Storage description of one entity type.
///
/// A descriptor without a base table is legal in the catalog (some entity
/// types are not stored in SQL at all) but cannot be queried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeDescriptor {
    /// Entity type name, e.g. `node`
    pub entity_type: String,
    /// Table holding the non-translatable core properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_table: Option<String>,
    /// Table holding per-language properties
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_table: Option<String>,
    /// Key field names
    pub entity_keys: EntityKeys,
}

impl EntityTypeDescriptor {
    pub fn new(entity_type: impl Into<String>, entity_keys: EntityKeys) -> Self {
        Self {
            entity_type: entity_type.into(),
            base_table: None,
            data_table: None,
            entity_keys,
        }
    }

    pub fn with_base_table(mut self, table: impl Into<String>) -> Self {
        self.base_table = Some(table.into());
        self
    }

    pub fn with_data_table(mut self, table: impl Into<String>) -> Self {
        self.data_table = Some(table.into());
        self
    }

    /// Returns true if the type keeps revisions.
    pub fn is_revisionable(&self) -> bool {
        self.entity_keys.revision.is_some()
    }

    /// Returns true if the type has a separate translated data table.
    pub fn is_translatable(&self) -> bool {
        self.data_table.is_some()
    }
}

/// Column set of one physical table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    /// Table name
    pub name: String,
    /// Column names
    pub columns: BTreeSet<String>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            columns: columns.into_iter().map(Into::into).collect(),
        }
    }

    /// Checks if the table has the given column.
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains(column)
    }
}

/// A configurable field and the bundles it is attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Field machine name, e.g. `field_tags`
    pub field_name: String,
    /// Entity type -> bundles carrying an instance of this field
    #[serde(default)]
    pub bundles: BTreeMap<String, BTreeSet<String>>,
}

impl FieldDefinition {
    pub fn new(field_name: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            bundles: BTreeMap::new(),
        }
    }

    /// Attaches the field to a bundle of an entity type.
    pub fn attach(mut self, entity_type: impl Into<String>, bundle: impl Into<String>) -> Self {
        self.bundles
            .entry(entity_type.into())
            .or_default()
            .insert(bundle.into());
        self
    }

    /// Returns true if any bundle of the entity type carries this field.
    pub fn is_attached_to(&self, entity_type: &str) -> bool {
        self.bundles
            .get(entity_type)
            .map_or(false, |bundles| !bundles.is_empty())
    }
}

/// Field name -> entity type -> bundles
pub type FieldBundleMap = BTreeMap<String, BTreeMap<String, BTreeSet<String>>>;

/// Which stored revision a query targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevisionAge {
    /// The current revision of each entity
    #[default]
    Current,
    /// Every stored revision
    Revision,
}

impl RevisionAge {
    pub fn as_str(&self) -> &'static str {
        match self {
            RevisionAge::Current => "current",
            RevisionAge::Revision => "revision",
        }
    }
}

/// Name of the table holding values of a configurable field for an age.
pub fn field_table_name(field_name: &str, age: RevisionAge) -> String {
    match age {
        RevisionAge::Current => format!("field_data_{}", field_name),
        RevisionAge::Revision => format!("field_revision_{}", field_name),
    }
}

/// Name of the physical column holding one column of a configurable field.
pub fn field_column_name(field_name: &str, column: &str) -> String {
    format!("{}_{}", field_name, column)
}
