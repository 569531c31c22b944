//! Engine-agnostic result model and per-type document capabilities.

pub mod aggregations;
pub mod document;
pub mod results;

pub use aggregations::{
    AggregateResult, BucketAggregate, ExtendedStatsAggregate, KeyedBucket, PercentileItem,
    SingleBucketAggregate, StandardDeviationBounds, StatsAggregate,
};
pub use document::DocumentType;
pub use results::{CountResult, FindHit, FindResults, PageCursor};
