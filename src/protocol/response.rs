//! Wire response shapes decoded from the store

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single hit as returned by the store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireHit {
    /// Document id
    pub id: String,

    /// Physical index the hit came from
    pub index: String,

    /// Relevance score (absent for filter-only and fetch-by-id paths)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    /// Optimistic-concurrency version token, when tracked
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,

    /// Document source (absent for id-only queries)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<Value>,
}

/// One percentile→value pair of a percentiles aggregate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct WirePercentile {
    pub percentile: f64,
    pub value: f64,
}

/// One keyed bucket of a multi-bucket aggregate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireBucket {
    pub key: Value,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_as_string: Option<String>,

    pub doc_count: u64,

    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub aggregations: HashMap<String, WireAggregate>,
}

/// Aggregate shapes the store can report.
///
/// Decoded directly into a tagged sum type, one variant per wire shape; a
/// shape this crate does not recognize decodes to `Unknown` instead of
/// failing, so the decode stays total as the engine adds shapes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WireAggregate {
    Value {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        value: Option<f64>,
    },
    Stats {
        count: u64,
        min: Option<f64>,
        max: Option<f64>,
        avg: Option<f64>,
        sum: f64,
    },
    ExtendedStats {
        count: u64,
        min: Option<f64>,
        max: Option<f64>,
        avg: Option<f64>,
        sum: f64,
        std_deviation: Option<f64>,
        std_deviation_bounds_upper: Option<f64>,
        std_deviation_bounds_lower: Option<f64>,
        sum_of_squares: Option<f64>,
        variance: Option<f64>,
    },
    Percentiles {
        items: Vec<WirePercentile>,
    },
    SingleBucket {
        doc_count: u64,
        #[serde(default, skip_serializing_if = "HashMap::is_empty")]
        aggregations: HashMap<String, WireAggregate>,
    },
    Buckets {
        items: Vec<WireBucket>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        doc_count_error_upper_bound: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        sum_other_doc_count: Option<u64>,
    },
    #[serde(other)]
    Unknown,
}

/// Full response to a search or scroll call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matching hits, in result order
    pub hits: Vec<WireHit>,

    /// Total number of matches before pagination
    pub total: u64,

    /// Server-side snapshot token for the next scroll call
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scroll_id: Option<String>,

    /// Aggregation results keyed by the requesting expression's name
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub aggregations: HashMap<String, WireAggregate>,
}

impl SearchResponse {
    pub fn empty() -> Self {
        Self {
            hits: Vec::new(),
            total: 0,
            scroll_id: None,
            aggregations: HashMap::new(),
        }
    }
}
