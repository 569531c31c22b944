//! Abstract repository query: a document-type tag plus an open bag of named
//! options. Mutable while being built, read-only once handed to the
//! pipeline. Options nothing recognizes are carried but ignored.

use crate::protocol::request::{SortOrder, SortSpec};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;

const IDS: &str = "ids";
const EXCLUDED_IDS: &str = "excluded_ids";
const FILTER_EXPRESSION: &str = "filter_expression";
const SEARCH_EXPRESSION: &str = "search_expression";
const AGGREGATIONS: &str = "aggregations";
const SORTS: &str = "sorts";
const INCLUDES: &str = "includes";
const EXCLUDES: &str = "excludes";
const ONLY_IDS: &str = "only_ids";
const DEFAULT_FIELD: &str = "default_field";
const SOFT_DELETE_MODE: &str = "soft_delete_mode";
const SOFT_DELETE_FIELD: &str = "soft_delete_field";

/// Which documents a soft-delete-aware query should see
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SoftDeleteMode {
    #[default]
    ActiveOnly,
    DeletedOnly,
    All,
}

/// Abstract query over one document type
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepositoryQuery {
    values: HashMap<String, Value>,
}

impl RepositoryQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access to the option bag
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    fn push_strings(&mut self, key: &str, items: Vec<String>) {
        let entry = self
            .values
            .entry(key.to_string())
            .or_insert_with(|| json!([]));
        if let Some(list) = entry.as_array_mut() {
            list.extend(items.into_iter().map(Value::String));
        }
    }

    fn get_strings(&self, key: &str) -> Vec<String> {
        self.values
            .get(key)
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default()
    }

    // --- builder methods ---

    pub fn with_id(self, id: impl Into<String>) -> Self {
        self.with_ids(vec![id.into()])
    }

    pub fn with_ids(mut self, ids: Vec<String>) -> Self {
        self.push_strings(IDS, ids);
        self
    }

    pub fn with_excluded_ids(mut self, ids: Vec<String>) -> Self {
        self.push_strings(EXCLUDED_IDS, ids);
        self
    }

    /// Non-scored filter expression
    pub fn with_filter_expression(mut self, expression: impl Into<String>) -> Self {
        self.set(FILTER_EXPRESSION, json!(expression.into()));
        self
    }

    /// Scored search criteria expression
    pub fn with_search_expression(mut self, expression: impl Into<String>) -> Self {
        self.set(SEARCH_EXPRESSION, json!(expression.into()));
        self
    }

    /// Add a named aggregation expression
    pub fn with_aggregation(mut self, expression: impl Into<String>) -> Self {
        self.push_strings(AGGREGATIONS, vec![expression.into()]);
        self
    }

    pub fn with_sort(self, field: impl Into<String>) -> Self {
        self.with_sort_order(field, SortOrder::Ascending)
    }

    pub fn with_sort_descending(self, field: impl Into<String>) -> Self {
        self.with_sort_order(field, SortOrder::Descending)
    }

    pub fn with_sort_order(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        let sort = serde_json::to_value(SortSpec {
            field: field.into(),
            order,
        })
        .unwrap_or(Value::Null);

        let entry = self
            .values
            .entry(SORTS.to_string())
            .or_insert_with(|| json!([]));
        if let Some(list) = entry.as_array_mut() {
            list.push(sort);
        }
        self
    }

    pub fn with_include(mut self, field: impl Into<String>) -> Self {
        self.push_strings(INCLUDES, vec![field.into()]);
        self
    }

    pub fn with_exclude(mut self, field: impl Into<String>) -> Self {
        self.push_strings(EXCLUDES, vec![field.into()]);
        self
    }

    pub fn with_excludes(mut self, fields: Vec<String>) -> Self {
        self.push_strings(EXCLUDES, fields);
        self
    }

    /// Return hit ids only, skipping document sources
    pub fn only_ids(mut self) -> Self {
        self.set(ONLY_IDS, json!(true));
        self
    }

    /// Field searched by bare (fieldless) expression terms
    pub fn with_default_field(mut self, field: impl Into<String>) -> Self {
        self.set(DEFAULT_FIELD, json!(field.into()));
        self
    }

    pub fn with_soft_delete_mode(mut self, mode: SoftDeleteMode) -> Self {
        self.set(SOFT_DELETE_MODE, json!(mode));
        self
    }

    /// Set by the repository from the document type's capability descriptor
    pub fn with_soft_delete_field(mut self, field: impl Into<String>) -> Self {
        self.set(SOFT_DELETE_FIELD, json!(field.into()));
        self
    }

    // --- typed accessors ---

    pub fn ids(&self) -> Vec<String> {
        self.get_strings(IDS)
    }

    pub fn excluded_ids(&self) -> Vec<String> {
        self.get_strings(EXCLUDED_IDS)
    }

    pub fn filter_expression(&self) -> Option<&str> {
        self.values.get(FILTER_EXPRESSION).and_then(|v| v.as_str())
    }

    pub fn search_expression(&self) -> Option<&str> {
        self.values.get(SEARCH_EXPRESSION).and_then(|v| v.as_str())
    }

    pub fn aggregations(&self) -> Vec<String> {
        self.get_strings(AGGREGATIONS)
    }

    pub fn sorts(&self) -> Vec<SortSpec> {
        self.values
            .get(SORTS)
            .and_then(|v| v.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(|v| serde_json::from_value(v.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn includes(&self) -> Vec<String> {
        self.get_strings(INCLUDES)
    }

    pub fn excludes(&self) -> Vec<String> {
        self.get_strings(EXCLUDES)
    }

    pub fn is_only_ids(&self) -> bool {
        self.values
            .get(ONLY_IDS)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn default_field(&self) -> Option<&str> {
        self.values.get(DEFAULT_FIELD).and_then(|v| v.as_str())
    }

    pub fn soft_delete_mode(&self) -> SoftDeleteMode {
        self.values
            .get(SOFT_DELETE_MODE)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
            .unwrap_or_default()
    }

    pub fn soft_delete_field(&self) -> Option<&str> {
        self.values.get(SOFT_DELETE_FIELD).and_then(|v| v.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_accumulates_options() {
        let query = RepositoryQuery::new()
            .with_ids(vec!["1".to_string(), "2".to_string()])
            .with_filter_expression("state:open")
            .with_sort_descending("created_at")
            .with_aggregation("terms:state");

        assert_eq!(query.ids(), vec!["1", "2"]);
        assert_eq!(query.filter_expression(), Some("state:open"));
        assert_eq!(query.sorts().len(), 1);
        assert_eq!(query.sorts()[0].order, SortOrder::Descending);
        assert_eq!(query.aggregations(), vec!["terms:state"]);
    }

    #[test]
    fn test_unknown_options_are_carried_but_ignored() {
        let mut query = RepositoryQuery::new();
        query.set("tenant_hint", json!("acme"));

        assert_eq!(query.get("tenant_hint"), Some(&json!("acme")));
        assert!(query.ids().is_empty());
        assert_eq!(query.soft_delete_mode(), SoftDeleteMode::ActiveOnly);
    }

    #[test]
    fn test_repeated_builder_calls_append() {
        let query = RepositoryQuery::new()
            .with_id("1")
            .with_id("2")
            .with_exclude("body")
            .with_exclude("attachments");

        assert_eq!(query.ids(), vec!["1", "2"]);
        assert_eq!(query.excludes(), vec!["body", "attachments"]);
    }
}
