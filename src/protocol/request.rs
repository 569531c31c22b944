//! Concrete search request model

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Sort order for search results
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// One sort key in a search request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn ascending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            order: SortOrder::Descending,
        }
    }
}

/// Concrete query node understood by the store.
///
/// Kept deliberately small: the repository layer only ever emits these
/// shapes, everything richer comes in through expression strings that the
/// pipeline lowers into this model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireQuery {
    MatchAll,
    MatchNone,
    Term {
        field: String,
        value: Value,
    },
    Terms {
        field: String,
        values: Vec<Value>,
    },
    Ids {
        values: Vec<String>,
    },
    Exists {
        field: String,
    },
    /// Scored full-text match against a single field
    Match {
        field: String,
        query: String,
    },
    Range {
        field: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gt: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        gte: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lt: Option<Value>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        lte: Option<Value>,
    },
    Bool {
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        must: Vec<WireQuery>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        should: Vec<WireQuery>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        filter: Vec<WireQuery>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        must_not: Vec<WireQuery>,
    },
}

impl WireQuery {
    /// AND of a scored part and a non-scored filter part. The filter part
    /// skips relevance scoring entirely.
    pub fn scored_and_filtered(must: Vec<WireQuery>, filter: Vec<WireQuery>) -> Self {
        WireQuery::Bool {
            must,
            should: Vec::new(),
            filter,
            must_not: Vec::new(),
        }
    }

    pub fn and(parts: Vec<WireQuery>) -> Self {
        WireQuery::Bool {
            must: parts,
            should: Vec::new(),
            filter: Vec::new(),
            must_not: Vec::new(),
        }
    }

    pub fn or(parts: Vec<WireQuery>) -> Self {
        WireQuery::Bool {
            must: Vec::new(),
            should: parts,
            filter: Vec::new(),
            must_not: Vec::new(),
        }
    }

    pub fn negate(part: WireQuery) -> Self {
        WireQuery::Bool {
            must: Vec::new(),
            should: Vec::new(),
            filter: Vec::new(),
            must_not: vec![part],
        }
    }
}

/// A fully-translated search request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Physical index names (or aliases) to search
    pub indices: Vec<String>,

    /// The query to execute
    pub query: WireQuery,

    /// Offset into the result set (offset paging)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<usize>,

    /// Max hits to return
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<usize>,

    /// Sort keys, in priority order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,

    /// Lower bound for cursor paging: sort-key values of the last hit of
    /// the previous page
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_after: Option<Vec<Value>>,

    /// Source fields to include (empty means all)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_includes: Vec<String>,

    /// Source fields to exclude
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_excludes: Vec<String>,

    /// Skip document sources entirely (id-only queries)
    #[serde(default)]
    pub ids_only: bool,

    /// Open a server-side snapshot context with this lifetime, in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_lifetime_secs: Option<u64>,

    /// Request per-hit optimistic-concurrency version tokens
    #[serde(default)]
    pub track_versions: bool,

    /// Named aggregation expressions to compute alongside the hits
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregations: Vec<String>,
}

impl SearchRequest {
    pub fn new(indices: Vec<String>) -> Self {
        Self {
            indices,
            query: WireQuery::MatchAll,
            from: None,
            size: None,
            sort: Vec::new(),
            search_after: None,
            source_includes: Vec::new(),
            source_excludes: Vec::new(),
            ids_only: false,
            scroll_lifetime_secs: None,
            track_versions: false,
            aggregations: Vec::new(),
        }
    }
}
