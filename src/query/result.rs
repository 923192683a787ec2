//! Query results

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use serde_json::Value;

use super::errors::{QueryError, QueryResult};
use super::pager::PagerState;

/// Ordered mapping from row key to entity id.
///
/// The key is the revision id for entity types keyed by revision, otherwise
/// the entity id. Keys are unique and iteration follows statement row order.
/// Serializes as a list of `[key, entity_id]` pairs.
#[derive(Debug, Clone, Default)]
pub struct KeyedIds {
    entries: IndexMap<u64, u64>,
}

impl KeyedIds {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds from rows whose first two values are key and entity id.
    ///
    /// A repeated key keeps its first position and takes the later value.
    pub fn from_rows(rows: &[Vec<Value>]) -> QueryResult<Self> {
        let mut ids = Self::new();
        for row in rows {
            let (key, value) = match row.as_slice() {
                [key, value, ..] => (key, value),
                _ => {
                    return Err(QueryError::MalformedRow {
                        reason: format!("expected at least 2 columns, got {}", row.len()),
                    })
                }
            };
            ids.insert(as_id(key)?, as_id(value)?);
        }
        Ok(ids)
    }

    pub fn insert(&mut self, key: u64, entity_id: u64) {
        self.entries.insert(key, entity_id);
    }

    pub fn get(&self, key: u64) -> Option<u64> {
        self.entries.get(&key).copied()
    }

    pub fn keys(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.keys().copied()
    }

    pub fn entity_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.values().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        self.entries.iter().map(|(k, v)| (*k, *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// Order is part of the result.
impl PartialEq for KeyedIds {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len() && self.iter().eq(other.iter())
    }
}

impl Eq for KeyedIds {}

impl Serialize for KeyedIds {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}

/// Ids arrive as integers, or as numeric strings from backends that store
/// everything as text.
fn as_id(value: &Value) -> QueryResult<u64> {
    let id = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    };
    id.ok_or_else(|| QueryError::MalformedRow {
        reason: format!("{} is not an id", value),
    })
}

/// What executing a query returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryOutput {
    /// Count mode
    Count(u64),
    /// Row mode, with the resolved pager if one was requested
    Entities {
        ids: KeyedIds,
        #[serde(skip_serializing_if = "Option::is_none")]
        pager: Option<PagerState>,
    },
}

impl QueryOutput {
    pub fn as_count(&self) -> Option<u64> {
        match self {
            QueryOutput::Count(n) => Some(*n),
            QueryOutput::Entities { .. } => None,
        }
    }

    pub fn as_ids(&self) -> Option<&KeyedIds> {
        match self {
            QueryOutput::Count(_) => None,
            QueryOutput::Entities { ids, .. } => Some(ids),
        }
    }

    pub fn pager(&self) -> Option<&PagerState> {
        match self {
            QueryOutput::Count(_) => None,
            QueryOutput::Entities { pager, .. } => pager.as_ref(),
        }
    }
}
