//! Declarative entity query
//!
//! An [`EntityQuery`] is built incrementally by the caller and then handed to
//! a [`QueryCompiler`](super::QueryCompiler). Compilation never mutates it,
//! so the same query can be executed or explained any number of times.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::condition::{ConditionGroup, Operator};
use crate::schema::RevisionAge;
use crate::statement::{Conjunction, Range, SortDirection};

use super::pager::PagerSpec;

/// One requested ordering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: String,
    #[serde(default)]
    pub direction: SortDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub langcode: Option<String>,
}

/// A storage-agnostic query for entity ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityQuery {
    entity_type: String,
    /// Top-level conditions and the conjunction combining them
    #[serde(flatten)]
    conditions: ConditionGroup,
    #[serde(default)]
    sort: Vec<SortSpec>,
    #[serde(default)]
    range: Option<Range>,
    #[serde(default)]
    pager: Option<PagerSpec>,
    #[serde(default)]
    count: bool,
    /// Unset inherits the configured default
    #[serde(default)]
    access_check: Option<bool>,
    #[serde(default)]
    age: RevisionAge,
    #[serde(default)]
    tags: BTreeSet<String>,
    #[serde(default)]
    metadata: BTreeMap<String, Value>,
}

impl EntityQuery {
    /// Query over `entity_type` with AND-combined conditions.
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self::with_conjunction(entity_type, Conjunction::And)
    }

    pub fn with_conjunction(entity_type: impl Into<String>, conjunction: Conjunction) -> Self {
        Self {
            entity_type: entity_type.into(),
            conditions: ConditionGroup::new(conjunction),
            sort: Vec::new(),
            range: None,
            pager: None,
            count: false,
            access_check: None,
            age: RevisionAge::Current,
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }

    // ==================
    // Building
    // ==================

    /// `field = value`, or `field IN value` for arrays.
    pub fn condition(mut self, field: impl Into<String>, value: Value) -> Self {
        self.conditions = self.conditions.condition(field, value);
        self
    }

    pub fn condition_with(
        mut self,
        field: impl Into<String>,
        value: Value,
        operator: Operator,
        langcode: Option<&str>,
    ) -> Self {
        self.conditions = self
            .conditions
            .condition_with(field, value, operator, langcode);
        self
    }

    pub fn exists(mut self, field: impl Into<String>) -> Self {
        self.conditions = self.conditions.exists(field);
        self
    }

    pub fn not_exists(mut self, field: impl Into<String>) -> Self {
        self.conditions = self.conditions.not_exists(field);
        self
    }

    /// Nests a group built with [`condition_group_factory`](crate::condition::condition_group_factory).
    pub fn condition_group(mut self, group: ConditionGroup) -> Self {
        self.conditions = self.conditions.condition_group(group);
        self
    }

    pub fn sort(self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_with(field, direction, None)
    }

    /// Orders by `field`. A second sort on the same field replaces the first
    /// and keeps its position.
    pub fn sort_with(
        mut self,
        field: impl Into<String>,
        direction: SortDirection,
        langcode: Option<&str>,
    ) -> Self {
        let spec = SortSpec {
            field: field.into(),
            direction,
            langcode: langcode.map(str::to_string),
        };
        match self.sort.iter_mut().find(|s| s.field == spec.field) {
            Some(existing) => *existing = spec,
            None => self.sort.push(spec),
        }
        self
    }

    pub fn range(mut self, start: u64, length: u64) -> Self {
        self.range = Some(Range::new(start, length));
        self
    }

    /// Pages results `limit` at a time. The current page defaults to the
    /// first; see [`with_page`](Self::with_page).
    pub fn pager(mut self, limit: u64, element: u32) -> Self {
        self.pager = Some(PagerSpec::new(limit, element));
        self
    }

    /// Sets the current page of an existing pager.
    pub fn with_page(mut self, page: u64) -> Self {
        if let Some(pager) = self.pager.as_mut() {
            pager.page = page;
        }
        self
    }

    /// Returns a count instead of ids.
    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn access_check(mut self, enabled: bool) -> Self {
        self.access_check = Some(enabled);
        self
    }

    /// Sets access checking only if the caller has not decided.
    pub fn inherit_access_check(mut self, default: bool) -> Self {
        self.access_check.get_or_insert(default);
        self
    }

    pub fn age(mut self, age: RevisionAge) -> Self {
        self.age = age;
        self
    }

    /// Extra tag copied onto the compiled statement.
    pub fn add_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    /// Extra metadata copied onto the compiled statement.
    pub fn add_meta_data(mut self, key: impl Into<String>, value: Value) -> Self {
        self.metadata.insert(key.into(), value);
        self
    }

    /// Same query with pager and range removed, in count mode.
    pub(crate) fn to_count_query(&self) -> Self {
        let mut query = self.clone();
        query.pager = None;
        query.range = None;
        query.count = true;
        query
    }

    // ==================
    // Reading
    // ==================

    pub fn entity_type(&self) -> &str {
        &self.entity_type
    }

    pub fn conjunction(&self) -> Conjunction {
        self.conditions.conjunction
    }

    pub fn conditions(&self) -> &ConditionGroup {
        &self.conditions
    }

    pub fn sorts(&self) -> &[SortSpec] {
        &self.sort
    }

    pub fn current_range(&self) -> Option<Range> {
        self.range
    }

    pub fn pager_spec(&self) -> Option<&PagerSpec> {
        self.pager.as_ref()
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    /// Access checking is on unless turned off.
    pub fn access_check_enabled(&self) -> bool {
        self.access_check.unwrap_or(true)
    }

    pub fn revision_age(&self) -> RevisionAge {
        self.age
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_all_tags<'t>(&self, tags: impl IntoIterator<Item = &'t str>) -> bool {
        tags.into_iter().all(|t| self.has_tag(t))
    }

    pub fn has_any_tag<'t>(&self, tags: impl IntoIterator<Item = &'t str>) -> bool {
        tags.into_iter().any(|t| self.has_tag(t))
    }

    pub fn meta_data(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }
}
