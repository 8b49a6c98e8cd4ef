//! Scope filters for collection queries.
//!
//! Only the query shapes the document store supports are expressible:
//! equality on a top-level field, array-contains on a top-level array
//! (optionally matching one key of object elements) and a single ordering.

use serde_json::Value;

/// A single predicate over a document's top-level fields.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldCondition {
    /// `field == value`. A `Null` value matches missing or null fields.
    Equals { field: String, value: Value },
    /// `field` is an array containing `value`, or containing an object whose
    /// `key` equals `value` when a key is given.
    ArrayContains {
        field: String,
        key: Option<String>,
        value: Value,
    },
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// `createdAt` descending.
    NewestFirst,
    /// `name` ascending.
    NameAscending,
}

/// Conditions combined with AND, plus an optional ordering override.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DocumentFilter {
    pub conditions: Vec<FieldCondition>,
    pub order: Option<SortOrder>,
}

impl DocumentFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(FieldCondition::Equals {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(FieldCondition::ArrayContains {
            field: field.to_string(),
            key: None,
            value: value.into(),
        });
        self
    }

    pub fn array_contains_key(mut self, field: &str, key: &str, value: impl Into<Value>) -> Self {
        self.conditions.push(FieldCondition::ArrayContains {
            field: field.to_string(),
            key: Some(key.to_string()),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, order: SortOrder) -> Self {
        self.order = Some(order);
        self
    }

    pub fn is_unscoped(&self) -> bool {
        self.conditions.is_empty()
    }
}
