//! Wire-to-model mapping: hits into typed documents, engine aggregate
//! shapes into the uniform aggregation model.

use crate::error::Result;
use crate::models::aggregations::{
    AggregateResult, BucketAggregate, ExtendedStatsAggregate, KeyedBucket, PercentileItem,
    SingleBucketAggregate, StandardDeviationBounds, StatsAggregate, ValueAggregate,
};
use crate::models::document::DocumentType;
use crate::models::results::{FindHit, HIT_DATA_INDEX};
use crate::protocol::response::{WireAggregate, WireHit};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::collections::HashMap;

/// Deserialize a hit into a typed document, attaching index provenance and
/// copying the version token onto the document when the type tracks one.
pub(crate) fn map_hit<T: DeserializeOwned>(
    hit: WireHit,
    doc_type: Option<&DocumentType<T>>,
) -> Result<FindHit<T>> {
    let mut document: Option<T> = hit
        .source
        .map(serde_json::from_value)
        .transpose()?;

    if let (Some(doc_type), Some(version)) = (doc_type, hit.version) {
        if let Some(doc) = document.as_mut() {
            doc_type.apply_version(doc, version);
        }
    }

    Ok(FindHit {
        id: hit.id,
        document,
        score: hit.score.unwrap_or(0.0),
        version: hit.version,
        data: HashMap::from([(HIT_DATA_INDEX.to_string(), json!(hit.index))]),
    })
}

pub(crate) fn map_aggregations(
    aggregations: HashMap<String, WireAggregate>,
) -> HashMap<String, AggregateResult> {
    aggregations
        .into_iter()
        .map(|(name, agg)| (name, map_aggregate(agg)))
        .collect()
}

/// Map one wire aggregate; unrecognized shapes stay visible as `Unknown`
/// under their requested name instead of being dropped.
pub(crate) fn map_aggregate(aggregate: WireAggregate) -> AggregateResult {
    match aggregate {
        WireAggregate::Value { value } => AggregateResult::Value(ValueAggregate { value }),
        WireAggregate::Stats { count, min, max, avg, sum } => {
            AggregateResult::Stats(StatsAggregate {
                count,
                min,
                max,
                average: avg,
                sum,
            })
        }
        WireAggregate::ExtendedStats {
            count,
            min,
            max,
            avg,
            sum,
            std_deviation,
            std_deviation_bounds_upper,
            std_deviation_bounds_lower,
            sum_of_squares,
            variance,
        } => AggregateResult::ExtendedStats(ExtendedStatsAggregate {
            count,
            min,
            max,
            average: avg,
            sum,
            std_deviation,
            std_deviation_bounds: StandardDeviationBounds {
                upper: std_deviation_bounds_upper,
                lower: std_deviation_bounds_lower,
            },
            sum_of_squares,
            variance,
        }),
        WireAggregate::Percentiles { items } => {
            let mut items: Vec<PercentileItem> = items
                .into_iter()
                .map(|p| PercentileItem {
                    percentile: p.percentile,
                    value: p.value,
                })
                .collect();
            items.sort_by(|a, b| {
                a.percentile
                    .partial_cmp(&b.percentile)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            AggregateResult::Percentiles { items }
        }
        WireAggregate::SingleBucket { doc_count, aggregations } => {
            AggregateResult::SingleBucket(SingleBucketAggregate {
                doc_count,
                aggregations: map_aggregations(aggregations),
            })
        }
        WireAggregate::Buckets {
            items,
            doc_count_error_upper_bound,
            sum_other_doc_count,
        } => AggregateResult::MultiBucket(BucketAggregate {
            buckets: items
                .into_iter()
                .map(|bucket| KeyedBucket {
                    key: bucket.key,
                    key_as_string: bucket.key_as_string,
                    doc_count: bucket.doc_count,
                    aggregations: map_aggregations(bucket.aggregations),
                })
                .collect(),
            doc_count_error_upper_bound,
            sum_other_doc_count,
        }),
        WireAggregate::Unknown => AggregateResult::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::Value;

    #[derive(Debug, Deserialize)]
    struct Employee {
        name: String,
        #[serde(default)]
        version: i64,
    }

    #[test]
    fn test_map_hit_applies_version_and_provenance() {
        let doc_type: DocumentType<Employee> =
            DocumentType::new("Employee").with_version(|e, v| e.version = v);

        let hit = WireHit {
            id: "1".to_string(),
            index: "employees-v2".to_string(),
            score: Some(1.5),
            version: Some(7),
            source: Some(json!({"name": "alice"})),
        };

        let mapped = map_hit(hit, Some(&doc_type)).unwrap();
        assert_eq!(mapped.index(), Some("employees-v2"));
        assert_eq!(mapped.score, 1.5);
        let doc = mapped.document.unwrap();
        assert_eq!(doc.name, "alice");
        assert_eq!(doc.version, 7);
    }

    #[test]
    fn test_map_hit_without_source() {
        let hit = WireHit {
            id: "1".to_string(),
            index: "employees-v2".to_string(),
            score: None,
            version: None,
            source: None,
        };

        let mapped: FindHit<Value> = map_hit(hit, None).unwrap();
        assert!(mapped.document.is_none());
        assert_eq!(mapped.score, 0.0);
    }

    #[test]
    fn test_stats_mapping() {
        let mapped = map_aggregate(WireAggregate::Stats {
            count: 5,
            min: Some(1.0),
            max: Some(9.0),
            avg: Some(4.0),
            sum: 20.0,
        });

        let stats = mapped.as_stats().unwrap();
        assert_eq!(stats.count, 5);
        assert_eq!(stats.min, Some(1.0));
        assert_eq!(stats.max, Some(9.0));
        assert_eq!(stats.average, Some(4.0));
        assert_eq!(stats.sum, 20.0);
    }

    #[test]
    fn test_nested_buckets_map_recursively() {
        let mapped = map_aggregate(WireAggregate::Buckets {
            items: vec![crate::protocol::response::WireBucket {
                key: json!("open"),
                key_as_string: None,
                doc_count: 3,
                aggregations: HashMap::from([(
                    "avg:age".to_string(),
                    WireAggregate::Value { value: Some(7.5) },
                )]),
            }],
            doc_count_error_upper_bound: None,
            sum_other_doc_count: None,
        });

        let buckets = mapped.as_buckets().unwrap();
        assert_eq!(buckets.buckets[0].doc_count, 3);
        let inner = buckets.buckets[0].aggregations["avg:age"].as_value().unwrap();
        assert_eq!(inner.value, Some(7.5));
    }

    #[test]
    fn test_unknown_shape_survives_mapping() {
        assert!(map_aggregate(WireAggregate::Unknown).is_unknown());
    }

    #[test]
    fn test_percentiles_sorted_ascending() {
        let mapped = map_aggregate(WireAggregate::Percentiles {
            items: vec![
                crate::protocol::response::WirePercentile { percentile: 99.0, value: 9.0 },
                crate::protocol::response::WirePercentile { percentile: 50.0, value: 5.0 },
            ],
        });

        match mapped {
            AggregateResult::Percentiles { items } => {
                assert_eq!(items[0].percentile, 50.0);
                assert_eq!(items[1].percentile, 99.0);
            }
            other => panic!("expected percentiles, got {:?}", other),
        }
    }
}
