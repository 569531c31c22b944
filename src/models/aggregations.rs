//! Uniform aggregation result model.
//!
//! One tagged variant per aggregate family; engine shapes the mapper does
//! not recognize surface as [`AggregateResult::Unknown`] so callers stay
//! forward-compatible with engine additions.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// A single metric value (min, max, cardinality, ...)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ValueAggregate {
    pub value: Option<f64>,
}

/// count/min/max/avg/sum
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct StatsAggregate {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
    pub sum: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct StandardDeviationBounds {
    pub upper: Option<f64>,
    pub lower: Option<f64>,
}

/// Stats plus dispersion measures
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Default)]
pub struct ExtendedStatsAggregate {
    pub count: u64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub average: Option<f64>,
    pub sum: f64,
    pub std_deviation: Option<f64>,
    pub std_deviation_bounds: StandardDeviationBounds,
    pub sum_of_squares: Option<f64>,
    pub variance: Option<f64>,
}

/// One percentile→value pair, in ascending percentile order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PercentileItem {
    pub percentile: f64,
    pub value: f64,
}

/// A bucket that is the sole child of its aggregation (filter, nested, ...)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct SingleBucketAggregate {
    pub doc_count: u64,
    #[serde(default)]
    pub aggregations: HashMap<String, AggregateResult>,
}

/// One keyed bucket of a multi-bucket aggregate
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct KeyedBucket {
    pub key: Value,
    pub key_as_string: Option<String>,
    pub doc_count: u64,
    #[serde(default)]
    pub aggregations: HashMap<String, AggregateResult>,
}

/// Ordered keyed buckets with the approximation bounds reported for
/// approximate bucketing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct BucketAggregate {
    pub buckets: Vec<KeyedBucket>,
    pub doc_count_error_upper_bound: Option<u64>,
    pub sum_other_doc_count: Option<u64>,
}

/// Uniform, engine-agnostic aggregation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AggregateResult {
    Value(ValueAggregate),
    Stats(StatsAggregate),
    ExtendedStats(ExtendedStatsAggregate),
    Percentiles { items: Vec<PercentileItem> },
    SingleBucket(SingleBucketAggregate),
    MultiBucket(BucketAggregate),
    Unknown,
}

impl AggregateResult {
    pub fn as_value(&self) -> Option<&ValueAggregate> {
        match self {
            AggregateResult::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_stats(&self) -> Option<&StatsAggregate> {
        match self {
            AggregateResult::Stats(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_buckets(&self) -> Option<&BucketAggregate> {
        match self {
            AggregateResult::MultiBucket(b) => Some(b),
            _ => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, AggregateResult::Unknown)
    }
}
