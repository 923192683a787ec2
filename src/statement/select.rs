//! SELECT statement builder
//!
//! A statement is built once per query execution, mutated through `&mut`
//! methods while the compiler walks its phases, and then handed to a
//! backend by shared reference.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;

use super::clause::{
    AggregateFunction, ColumnRef, Conjunction, Join, JoinKind, JoinOn, OrderBy, OrderTarget,
    Range, SelectExpression, SelectField, SortDirection, WhereClause,
};

/// A SELECT statement against one base table.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectStatement {
    table: String,
    alias: String,
    fields: Vec<SelectField>,
    expressions: Vec<SelectExpression>,
    joins: Vec<Join>,
    condition: WhereClause,
    group_by: Vec<String>,
    order_by: Vec<OrderBy>,
    range: Option<Range>,
    tags: BTreeSet<String>,
    metadata: BTreeMap<String, Value>,
}

impl SelectStatement {
    /// Starts a statement selecting from `table AS alias`, with top-level
    /// conditions combined by `conjunction`.
    pub fn select(table: impl Into<String>, alias: impl Into<String>, conjunction: Conjunction) -> Self {
        Self {
            table: table.into(),
            alias: alias.into(),
            fields: Vec::new(),
            expressions: Vec::new(),
            joins: Vec::new(),
            condition: WhereClause::group(conjunction),
            group_by: Vec::new(),
            order_by: Vec::new(),
            range: None,
            tags: BTreeSet::new(),
            metadata: BTreeMap::new(),
        }
    }

    /// Adds a column to the select list and returns its alias.
    ///
    /// The alias is the column name unless that is taken, then
    /// `<table>_<column>`, then a numeric suffix.
    pub fn add_field(&mut self, table_alias: &str, column: &str) -> String {
        let mut alias = column.to_string();
        if self.has_select_alias(&alias) {
            alias = format!("{}_{}", table_alias, column);
        }
        let alias = self.unique(alias, |s, candidate| s.has_select_alias(candidate));

        self.fields.push(SelectField {
            column: ColumnRef::new(table_alias, column),
            alias: alias.clone(),
        });
        alias
    }

    /// Adds an aggregate computed column and returns its alias.
    pub fn add_expression(
        &mut self,
        function: AggregateFunction,
        argument: ColumnRef,
        alias: &str,
    ) -> String {
        let alias = self.unique(alias.to_string(), |s, candidate| s.has_select_alias(candidate));
        self.expressions.push(SelectExpression {
            function,
            argument,
            alias: alias.clone(),
        });
        alias
    }

    /// Joins `table` and returns the alias assigned to it. The alias is the
    /// table name, suffixed `_2`, `_3`, ... when already in use; `on`
    /// receives it to build the ON terms.
    pub fn add_join<F>(&mut self, kind: JoinKind, table: &str, on: F) -> String
    where
        F: FnOnce(&str) -> Vec<JoinOn>,
    {
        let alias = self.unique(table.to_string(), |s, candidate| s.has_table_alias(candidate));
        let on = on(&alias);
        self.joins.push(Join {
            kind,
            table: table.to_string(),
            alias: alias.clone(),
            on,
        });
        alias
    }

    /// Adds a clause to the top-level condition group.
    pub fn add_condition(&mut self, clause: WhereClause) {
        if let WhereClause::Group { children, .. } = &mut self.condition {
            children.push(clause);
        }
    }

    /// Groups by a select-list alias.
    pub fn group_by(&mut self, alias: impl Into<String>) {
        let alias = alias.into();
        if !self.group_by.contains(&alias) {
            self.group_by.push(alias);
        }
    }

    pub fn order_by(&mut self, target: OrderTarget, direction: SortDirection) {
        self.order_by.push(OrderBy { target, direction });
    }

    /// Restricts the result to `length` rows starting at `start`.
    pub fn range(&mut self, start: u64, length: u64) {
        self.range = Some(Range::new(start, length));
    }

    pub fn add_tag(&mut self, tag: impl Into<String>) {
        self.tags.insert(tag.into());
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    /// Attaches a metadata value, replacing any previous value for `key`.
    pub fn add_meta_data(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }

    pub fn meta_data(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Returns a count wrapper over a copy of this statement with ordering
    /// removed.
    pub fn count_query(&self) -> CountQuery {
        let mut inner = self.clone();
        inner.order_by.clear();
        CountQuery { inner }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn fields(&self) -> &[SelectField] {
        &self.fields
    }

    pub fn expressions(&self) -> &[SelectExpression] {
        &self.expressions
    }

    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    pub fn condition(&self) -> &WhereClause {
        &self.condition
    }

    pub fn group_by_aliases(&self) -> &[String] {
        &self.group_by
    }

    pub fn orders(&self) -> &[OrderBy] {
        &self.order_by
    }

    pub fn current_range(&self) -> Option<Range> {
        self.range
    }

    pub fn tags(&self) -> &BTreeSet<String> {
        &self.tags
    }

    pub fn metadata(&self) -> &BTreeMap<String, Value> {
        &self.metadata
    }

    /// Looks up a select-list field by alias.
    pub fn field(&self, alias: &str) -> Option<&SelectField> {
        self.fields.iter().find(|f| f.alias == alias)
    }

    /// Looks up a computed column by alias.
    pub fn expression(&self, alias: &str) -> Option<&SelectExpression> {
        self.expressions.iter().find(|e| e.alias == alias)
    }

    fn has_select_alias(&self, alias: &str) -> bool {
        self.field(alias).is_some() || self.expression(alias).is_some()
    }

    fn has_table_alias(&self, alias: &str) -> bool {
        self.alias == alias || self.joins.iter().any(|j| j.alias == alias)
    }

    fn unique(&self, base: String, taken: impl Fn(&Self, &str) -> bool) -> String {
        if !taken(self, &base) {
            return base;
        }
        let mut n = 2;
        loop {
            let candidate = format!("{}_{}", base, n);
            if !taken(self, &candidate) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// `SELECT COUNT(*)` over a wrapped statement.
#[derive(Debug, Clone, PartialEq)]
pub struct CountQuery {
    inner: SelectStatement,
}

impl CountQuery {
    /// The statement whose rows are counted.
    pub fn inner(&self) -> &SelectStatement {
        &self.inner
    }
}
