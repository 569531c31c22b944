//! Find/count result model.
//!
//! Continuation state is an explicit [`PageCursor`] value rather than a
//! callable embedded in the result: results stay serializable, and a cached
//! payload can never replay single-use server state because the cursor is
//! skipped during serialization and recomputed on cache hits.

use crate::models::aggregations::AggregateResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Side-data key: physical index a hit came from
pub const HIT_DATA_INDEX: &str = "index";

/// How to fetch the page after this one
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PageCursor {
    /// No continuation: either the result is exhausted or paging was not
    /// requested
    #[default]
    None,

    /// Offset paging: re-run the original query at this page number
    Offset(u32),

    /// Cursor paging: sort-key values of the last document, the next page's
    /// lower bound
    SearchAfter(Vec<Value>),

    /// Snapshot paging: single-use server-held scroll token
    Snapshot(String),
}

/// One matched document with its retrieval metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindHit<T> {
    pub id: String,

    pub document: Option<T>,

    /// Relevance score; zero for unscored retrievals
    pub score: f64,

    /// Optimistic-concurrency version token, when the type tracks one
    pub version: Option<i64>,

    /// Per-hit side data (index provenance and anything builders attach)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub data: HashMap<String, Value>,
}

impl<T> FindHit<T> {
    pub fn index(&self) -> Option<&str> {
        self.data.get(HIT_DATA_INDEX).and_then(|v| v.as_str())
    }
}

/// Ordered result of a find operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindResults<T> {
    pub hits: Vec<FindHit<T>>,

    /// Total matches before pagination
    pub total: u64,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub aggregations: HashMap<String, AggregateResult>,

    /// Page this result represents (1-based; 0 when paging was not used)
    pub page: u32,

    /// Whether a further page exists
    pub has_more: bool,

    /// Continuation; never serialized, reattached by the repository
    #[serde(skip)]
    pub cursor: PageCursor,
}

impl<T> FindResults<T> {
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            aggregations: HashMap::new(),
            page: 0,
            has_more: false,
            cursor: PageCursor::None,
        }
    }

    /// Documents in hit order, skipping hits without a source
    pub fn documents(&self) -> impl Iterator<Item = &T> {
        self.hits.iter().filter_map(|h| h.document.as_ref())
    }

    pub fn into_documents(self) -> Vec<T> {
        self.hits.into_iter().filter_map(|h| h.document).collect()
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Result of a count operation, with any requested aggregations
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CountResult {
    pub total: u64,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub aggregations: HashMap<String, AggregateResult>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_cursor_is_not_serialized() {
        let results: FindResults<Value> = FindResults {
            hits: vec![],
            total: 10,
            aggregations: HashMap::new(),
            page: 2,
            has_more: true,
            cursor: PageCursor::Snapshot("scroll-token".to_string()),
        };

        let encoded = serde_json::to_value(&results).unwrap();
        assert!(encoded.get("cursor").is_none());

        let decoded: FindResults<Value> = serde_json::from_value(encoded).unwrap();
        assert_eq!(decoded.cursor, PageCursor::None);
        assert_eq!(decoded.page, 2);
        assert!(decoded.has_more);
    }

    #[test]
    fn test_hit_index_provenance() {
        let hit: FindHit<Value> = FindHit {
            id: "1".to_string(),
            document: Some(json!({"name": "a"})),
            score: 1.0,
            version: None,
            data: HashMap::from([(HIT_DATA_INDEX.to_string(), json!("orders-v3"))]),
        };

        assert_eq!(hit.index(), Some("orders-v3"));
    }
}
