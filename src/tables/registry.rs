//! Join registry
//!
//! Maps (table, language) to the alias of the join that brought the table
//! into the statement. One registry lives exactly as long as the statement
//! it describes.

use std::collections::BTreeMap;

/// (table, langcode) -> join alias
#[derive(Debug, Clone, Default)]
pub struct JoinRegistry {
    aliases: BTreeMap<(String, Option<String>), String>,
}

impl JoinRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the alias of an existing join.
    pub fn get(&self, table: &str, langcode: Option<&str>) -> Option<&str> {
        self.aliases
            .get(&(table.to_string(), langcode.map(str::to_string)))
            .map(String::as_str)
    }

    /// Records a join. The first registration for a key wins.
    pub fn register(&mut self, table: &str, langcode: Option<&str>, alias: String) {
        self.aliases
            .entry((table.to_string(), langcode.map(str::to_string)))
            .or_insert(alias);
    }

    /// Number of distinct joins recorded.
    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}
