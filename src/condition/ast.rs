//! Condition tree structures
//!
//! Leaves compare one property against a value; groups combine children
//! with a conjunction. The JSON form is what the CLI reads from stdin:
//!
//! ```json
//! {"conjunction": "OR", "conditions": [
//!     {"field": "status", "value": 1},
//!     {"field": "title", "value": "Intro", "operator": "STARTS_WITH"}
//! ]}
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::statement::Conjunction;

/// Comparison operators accepted in conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "<>")]
    NotEq,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = ">=")]
    Gte,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Lte,
    #[serde(rename = "STARTS_WITH")]
    StartsWith,
    #[serde(rename = "CONTAINS")]
    Contains,
    #[serde(rename = "ENDS_WITH")]
    EndsWith,
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "NOT IN")]
    NotIn,
    #[serde(rename = "BETWEEN")]
    Between,
    #[serde(rename = "IS NULL")]
    IsNull,
    #[serde(rename = "IS NOT NULL")]
    IsNotNull,
}

impl Operator {
    /// `IN` for arrays, `=` for everything else.
    pub fn default_for(value: &Value) -> Self {
        if value.is_array() {
            Operator::In
        } else {
            Operator::Eq
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "<>",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::StartsWith => "STARTS_WITH",
            Operator::Contains => "CONTAINS",
            Operator::EndsWith => "ENDS_WITH",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::Between => "BETWEEN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A leaf comparison.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Property name, or `field_name.column` for a field column
    pub field: String,
    #[serde(default)]
    pub value: Value,
    /// Unset means the default for `value`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operator: Option<Operator>,
    /// Restricts the joined table to one language
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub langcode: Option<String>,
}

impl Condition {
    pub fn new(field: impl Into<String>, value: Value) -> Self {
        Self {
            field: field.into(),
            value,
            operator: None,
            langcode: None,
        }
    }

    pub fn with_operator(mut self, operator: Operator) -> Self {
        self.operator = Some(operator);
        self
    }

    pub fn with_langcode(mut self, langcode: impl Into<String>) -> Self {
        self.langcode = Some(langcode.into());
        self
    }

    /// The operator this condition compiles with.
    pub fn operator(&self) -> Operator {
        self.operator
            .unwrap_or_else(|| Operator::default_for(&self.value))
    }
}

/// A node of the condition tree.
///
/// Leaves are tried first when deserializing; a group has no `field`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionNode {
    Leaf(Condition),
    Group(ConditionGroup),
}

/// Children combined by a conjunction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConditionGroup {
    #[serde(default)]
    pub conjunction: Conjunction,
    #[serde(default)]
    pub conditions: Vec<ConditionNode>,
}

impl ConditionGroup {
    pub fn new(conjunction: Conjunction) -> Self {
        Self {
            conjunction,
            conditions: Vec::new(),
        }
    }

    /// Adds `field <default operator> value`.
    pub fn condition(self, field: impl Into<String>, value: Value) -> Self {
        self.push(Condition::new(field, value))
    }

    /// Adds a condition with an explicit operator and optional language.
    pub fn condition_with(
        self,
        field: impl Into<String>,
        value: Value,
        operator: Operator,
        langcode: Option<&str>,
    ) -> Self {
        let mut condition = Condition::new(field, value).with_operator(operator);
        condition.langcode = langcode.map(str::to_string);
        self.push(condition)
    }

    /// Property has a value.
    pub fn exists(self, field: impl Into<String>) -> Self {
        self.push(Condition::new(field, Value::Null).with_operator(Operator::IsNotNull))
    }

    /// Property has no value.
    pub fn not_exists(self, field: impl Into<String>) -> Self {
        self.push(Condition::new(field, Value::Null).with_operator(Operator::IsNull))
    }

    /// Nests another group.
    pub fn condition_group(mut self, group: ConditionGroup) -> Self {
        self.conditions.push(ConditionNode::Group(group));
        self
    }

    pub fn push(mut self, condition: Condition) -> Self {
        self.conditions.push(ConditionNode::Leaf(condition));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.conditions.len()
    }
}

/// New group with the given conjunction.
pub fn condition_group_factory(conjunction: Conjunction) -> ConditionGroup {
    ConditionGroup::new(conjunction)
}

pub fn and_condition_group() -> ConditionGroup {
    condition_group_factory(Conjunction::And)
}

pub fn or_condition_group() -> ConditionGroup {
    condition_group_factory(Conjunction::Or)
}
