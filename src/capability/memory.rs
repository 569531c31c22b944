//! In-process search store used by tests and local development.
//!
//! Implements enough of the engine contract to exercise the full
//! repository stack: query evaluation, sorting, all three paging modes,
//! aliases, templates and the aggregation expressions the repository
//! emits. Call counters let tests assert which paths actually reached
//! the store.

use crate::capability::store::{SearchStore, StoreError, StoreResult};
use crate::protocol::request::{SearchRequest, SortOrder, SortSpec, WireQuery};
use crate::protocol::response::{
    SearchResponse, WireAggregate, WireBucket, WireHit, WirePercentile,
};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::cmp::Ordering;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::time::{Duration, Instant};
use uuid::Uuid;

struct StoredDoc {
    source: Value,
    version: i64,
}

struct ScrollState {
    hits: VecDeque<WireHit>,
    total: u64,
    page_size: usize,
    expires_at: Instant,
}

/// In-memory [`SearchStore`]
#[derive(Default)]
pub struct MemorySearchStore {
    indices: DashMap<String, HashMap<String, StoredDoc>>,
    aliases: DashMap<String, Vec<String>>,
    templates: DashMap<String, Value>,
    scrolls: Mutex<HashMap<String, ScrollState>>,
    search_calls: AtomicUsize,
    get_calls: AtomicUsize,
    multi_get_calls: AtomicUsize,
}

impl MemorySearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite a document, bumping its version
    pub fn index_document(&self, index: &str, id: &str, source: Value) {
        let mut docs = self.indices.entry(index.to_string()).or_default();
        let version = docs.get(id).map(|d| d.version + 1).unwrap_or(1);
        docs.insert(id.to_string(), StoredDoc { source, version });
    }

    pub fn remove_document(&self, index: &str, id: &str) {
        if let Some(mut docs) = self.indices.get_mut(index) {
            docs.remove(id);
        }
    }

    pub fn search_count(&self) -> usize {
        self.search_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn get_count(&self) -> usize {
        self.get_calls.load(AtomicOrdering::SeqCst)
    }

    pub fn multi_get_count(&self) -> usize {
        self.multi_get_calls.load(AtomicOrdering::SeqCst)
    }

    /// Expand aliases in a request's index list to physical names
    fn resolve_names(&self, names: &[String]) -> StoreResult<Vec<String>> {
        let mut resolved = Vec::new();
        for name in names {
            if let Some(bound) = self.aliases.get(name) {
                resolved.extend(bound.iter().cloned());
            } else if self.indices.contains_key(name) {
                resolved.push(name.clone());
            } else {
                return Err(StoreError::NotFound(format!("index '{}'", name)));
            }
        }
        Ok(resolved)
    }

    /// Resolve a name for a single-index operation. An alias qualifies only
    /// while it is bound to exactly one physical index; a direct get cannot
    /// pick among several.
    fn resolve_single(&self, name: &str) -> StoreResult<String> {
        if let Some(bound) = self.aliases.get(name) {
            return match bound.as_slice() {
                [single] => Ok(single.clone()),
                _ => Err(StoreError::IndexOperation(format!(
                    "alias '{}' is bound to {} indices",
                    name,
                    bound.len()
                ))),
            };
        }
        if self.indices.contains_key(name) {
            Ok(name.to_string())
        } else {
            Err(StoreError::NotFound(format!("index '{}'", name)))
        }
    }

    fn collect_matches(&self, request: &SearchRequest) -> StoreResult<Vec<WireHit>> {
        let physical = self.resolve_names(&request.indices)?;

        let mut matches = Vec::new();
        for index_name in &physical {
            let Some(docs) = self.indices.get(index_name) else {
                continue;
            };
            for (id, doc) in docs.iter() {
                if evaluate(&request.query, id, &doc.source)? {
                    matches.push(WireHit {
                        id: id.clone(),
                        index: index_name.clone(),
                        score: Some(1.0),
                        version: request.track_versions.then_some(doc.version),
                        source: Some(doc.source.clone()),
                    });
                }
            }
        }

        sort_hits(&mut matches, &request.sort);
        Ok(matches)
    }
}

#[async_trait]
impl SearchStore for MemorySearchStore {
    async fn search(&self, request: &SearchRequest) -> StoreResult<SearchResponse> {
        self.search_calls.fetch_add(1, AtomicOrdering::SeqCst);

        let mut matches = self.collect_matches(request)?;
        let total = matches.len() as u64;

        let aggregations = compute_aggregations(&request.aggregations, &matches)?;

        if let Some(after) = &request.search_after {
            matches.retain(|hit| {
                composite_cmp(&sort_key(hit, &request.sort), after, &request.sort)
                    == Ordering::Greater
            });
        }

        if let Some(from) = request.from {
            matches = matches.into_iter().skip(from).collect();
        }

        project_sources(&mut matches, request);

        let response = if let Some(lifetime) = request.scroll_lifetime_secs {
            let page_size = request.size.unwrap_or(matches.len());
            let mut remaining: VecDeque<WireHit> = matches.into();
            let hits: Vec<WireHit> = remaining.drain(..page_size.min(remaining.len())).collect();

            let token = Uuid::new_v4().to_string();
            self.scrolls.lock().insert(
                token.clone(),
                ScrollState {
                    hits: remaining,
                    total,
                    page_size,
                    expires_at: Instant::now() + Duration::from_secs(lifetime),
                },
            );

            SearchResponse {
                hits,
                total,
                scroll_id: Some(token),
                aggregations,
            }
        } else {
            if let Some(size) = request.size {
                matches.truncate(size);
            }
            SearchResponse {
                hits: matches,
                total,
                scroll_id: None,
                aggregations,
            }
        };

        Ok(response)
    }

    async fn scroll(&self, scroll_id: &str, lifetime: Duration) -> StoreResult<SearchResponse> {
        let mut scrolls = self.scrolls.lock();
        let Some(state) = scrolls.get_mut(scroll_id) else {
            return Err(StoreError::NotFound(format!("scroll '{}'", scroll_id)));
        };
        if state.expires_at < Instant::now() {
            scrolls.remove(scroll_id);
            return Err(StoreError::NotFound(format!(
                "scroll '{}' expired",
                scroll_id
            )));
        }

        state.expires_at = Instant::now() + lifetime;
        let take = state.page_size.min(state.hits.len());
        let hits: Vec<WireHit> = state.hits.drain(..take).collect();
        let total = state.total;
        let exhausted = state.hits.is_empty();
        if exhausted {
            scrolls.remove(scroll_id);
        }

        Ok(SearchResponse {
            hits,
            total,
            scroll_id: (!exhausted).then(|| scroll_id.to_string()),
            aggregations: HashMap::new(),
        })
    }

    async fn get(&self, index: &str, id: &str) -> StoreResult<Option<WireHit>> {
        self.get_calls.fetch_add(1, AtomicOrdering::SeqCst);

        let index_name = self.resolve_single(index)?;
        let Some(docs) = self.indices.get(&index_name) else {
            return Ok(None);
        };
        Ok(docs.get(id).map(|doc| WireHit {
            id: id.to_string(),
            index: index_name.clone(),
            score: None,
            version: Some(doc.version),
            source: Some(doc.source.clone()),
        }))
    }

    async fn multi_get(&self, requests: &[(String, String)]) -> StoreResult<Vec<WireHit>> {
        self.multi_get_calls.fetch_add(1, AtomicOrdering::SeqCst);

        let mut hits = Vec::new();
        for (index, id) in requests {
            // entries that cannot name a single index are misses, not
            // batch failures
            let Ok(index_name) = self.resolve_single(index) else {
                continue;
            };
            let Some(docs) = self.indices.get(&index_name) else {
                continue;
            };
            if let Some(doc) = docs.get(id) {
                hits.push(WireHit {
                    id: id.clone(),
                    index: index_name.clone(),
                    score: None,
                    version: Some(doc.version),
                    source: Some(doc.source.clone()),
                });
            }
        }
        Ok(hits)
    }

    async fn document_exists(&self, index: &str, id: &str) -> StoreResult<bool> {
        let Ok(physical) = self.resolve_names(std::slice::from_ref(&index.to_string())) else {
            return Ok(false);
        };
        Ok(physical
            .iter()
            .any(|name| self.indices.get(name).is_some_and(|docs| docs.contains_key(id))))
    }

    async fn create_index(&self, name: &str, _mapping: &Value) -> StoreResult<()> {
        if self.indices.contains_key(name) {
            return Err(StoreError::IndexOperation(format!(
                "index '{}' already exists",
                name
            )));
        }
        self.indices.insert(name.to_string(), HashMap::new());
        Ok(())
    }

    async fn put_template(&self, name: &str, mapping: &Value) -> StoreResult<()> {
        self.templates.insert(name.to_string(), mapping.clone());
        Ok(())
    }

    async fn index_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.indices.contains_key(name))
    }

    async fn template_exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.templates.contains_key(name))
    }

    async fn alias_exists(&self, alias: &str) -> StoreResult<bool> {
        Ok(self.aliases.contains_key(alias))
    }

    async fn bind_alias(&self, alias: &str, indices: &[String]) -> StoreResult<()> {
        self.aliases.insert(alias.to_string(), indices.to_vec());
        Ok(())
    }

    async fn resolve_alias(&self, alias: &str) -> StoreResult<Vec<String>> {
        match self.aliases.get(alias) {
            Some(bound) => Ok(bound.clone()),
            None => Err(StoreError::NotFound(format!("alias '{}'", alias))),
        }
    }

    async fn list_indices(&self, prefix: &str) -> StoreResult<Vec<String>> {
        let mut names: Vec<String> = self
            .indices
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort();
        Ok(names)
    }

    async fn delete_index(&self, name: &str) -> StoreResult<()> {
        if self.indices.remove(name).is_none() {
            return Err(StoreError::NotFound(format!("index '{}'", name)));
        }
        for mut bound in self.aliases.iter_mut() {
            bound.retain(|index| index != name);
        }
        Ok(())
    }
}

// --- query evaluation ---

fn evaluate(query: &WireQuery, id: &str, source: &Value) -> StoreResult<bool> {
    let matched = match query {
        WireQuery::MatchAll => true,
        WireQuery::MatchNone => false,
        WireQuery::Term { field, value } => field_value(source, field) == Some(value),
        WireQuery::Terms { field, values } => field_value(source, field)
            .map(|v| values.contains(v))
            .unwrap_or(false),
        WireQuery::Ids { values } => values.iter().any(|v| v == id),
        WireQuery::Exists { field } => {
            field_value(source, field).is_some_and(|v| !v.is_null())
        }
        WireQuery::Match { field, query } => match field_value(source, field) {
            Some(Value::String(text)) => text_matches(text, query),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str())
                .any(|text| text_matches(text, query)),
            _ => false,
        },
        WireQuery::Range { field, gt, gte, lt, lte } => {
            let Some(value) = field_value(source, field) else {
                return Ok(false);
            };
            range_matches(value, gt.as_ref(), gte.as_ref(), lt.as_ref(), lte.as_ref())
        }
        WireQuery::Bool { must, should, filter, must_not } => {
            for clause in must.iter().chain(filter.iter()) {
                if !evaluate(clause, id, source)? {
                    return Ok(false);
                }
            }
            for clause in must_not {
                if evaluate(clause, id, source)? {
                    return Ok(false);
                }
            }
            // should is only binding when there is nothing else to satisfy
            if !should.is_empty() && must.is_empty() && filter.is_empty() {
                let mut any = false;
                for clause in should {
                    if evaluate(clause, id, source)? {
                        any = true;
                        break;
                    }
                }
                any
            } else {
                true
            }
        }
    };
    Ok(matched)
}

fn text_matches(text: &str, query: &str) -> bool {
    let haystack = text.to_lowercase();
    query
        .split_whitespace()
        .all(|token| haystack.contains(&token.to_lowercase()))
}

fn range_matches(
    value: &Value,
    gt: Option<&Value>,
    gte: Option<&Value>,
    lt: Option<&Value>,
    lte: Option<&Value>,
) -> bool {
    if let Some(bound) = gt {
        if cmp_values(value, bound) != Ordering::Greater {
            return false;
        }
    }
    if let Some(bound) = gte {
        if cmp_values(value, bound) == Ordering::Less {
            return false;
        }
    }
    if let Some(bound) = lt {
        if cmp_values(value, bound) != Ordering::Less {
            return false;
        }
    }
    if let Some(bound) = lte {
        if cmp_values(value, bound) == Ordering::Greater {
            return false;
        }
    }
    true
}

/// Dotted-path field lookup
fn field_value<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = source;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        _ => 4,
    }
}

fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            let (x, y) = (x.as_f64().unwrap_or(0.0), y.as_f64().unwrap_or(0.0));
            x.partial_cmp(&y).unwrap_or(Ordering::Equal)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn sort_key(hit: &WireHit, sorts: &[SortSpec]) -> Vec<Value> {
    if sorts.is_empty() {
        return vec![json!(hit.id)];
    }
    let source = hit.source.as_ref().unwrap_or(&Value::Null);
    sorts
        .iter()
        .map(|spec| {
            field_value(source, &spec.field)
                .cloned()
                .unwrap_or(Value::Null)
        })
        .collect()
}

fn composite_cmp(doc: &[Value], other: &[Value], sorts: &[SortSpec]) -> Ordering {
    for i in 0..doc.len().min(other.len()) {
        let mut ord = cmp_values(&doc[i], &other[i]);
        if sorts.get(i).map(|s| s.order) == Some(SortOrder::Descending) {
            ord = ord.reverse();
        }
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

fn sort_hits(hits: &mut [WireHit], sorts: &[SortSpec]) {
    hits.sort_by(|a, b| {
        composite_cmp(&sort_key(a, sorts), &sort_key(b, sorts), sorts)
            .then_with(|| a.id.cmp(&b.id))
    });
}

fn project_sources(hits: &mut [WireHit], request: &SearchRequest) {
    if request.ids_only {
        for hit in hits.iter_mut() {
            hit.source = None;
        }
        return;
    }
    if request.source_includes.is_empty() && request.source_excludes.is_empty() {
        return;
    }
    for hit in hits.iter_mut() {
        if let Some(Value::Object(map)) = hit.source.as_mut() {
            if !request.source_includes.is_empty() {
                map.retain(|key, _| request.source_includes.iter().any(|f| f == key));
            }
            map.retain(|key, _| !request.source_excludes.iter().any(|f| f == key));
        }
    }
}

// --- aggregation evaluation ---

const PERCENTILE_POINTS: [f64; 7] = [1.0, 5.0, 25.0, 50.0, 75.0, 95.0, 99.0];

fn compute_aggregations(
    expressions: &[String],
    matches: &[WireHit],
) -> StoreResult<HashMap<String, WireAggregate>> {
    let mut results = HashMap::new();
    for expression in expressions {
        let Some((op, field)) = expression.split_once(':') else {
            return Err(StoreError::InvalidQuery(format!(
                "malformed aggregation expression '{}'",
                expression
            )));
        };
        results.insert(expression.clone(), compute_aggregate(op, field, matches));
    }
    Ok(results)
}

fn compute_aggregate(op: &str, field: &str, matches: &[WireHit]) -> WireAggregate {
    let values: Vec<&Value> = matches
        .iter()
        .filter_map(|hit| hit.source.as_ref())
        .filter_map(|source| field_value(source, field))
        .filter(|v| !v.is_null())
        .collect();

    let mut numbers: Vec<f64> = values.iter().filter_map(|v| v.as_f64()).collect();
    numbers.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    match op {
        "min" => WireAggregate::Value {
            value: numbers.first().copied(),
        },
        "max" => WireAggregate::Value {
            value: numbers.last().copied(),
        },
        "avg" => WireAggregate::Value {
            value: (!numbers.is_empty())
                .then(|| numbers.iter().sum::<f64>() / numbers.len() as f64),
        },
        "sum" => WireAggregate::Value {
            value: Some(numbers.iter().sum()),
        },
        "cardinality" => {
            let mut distinct: Vec<String> = values.iter().map(|v| v.to_string()).collect();
            distinct.sort();
            distinct.dedup();
            WireAggregate::Value {
                value: Some(distinct.len() as f64),
            }
        }
        "stats" => WireAggregate::Stats {
            count: numbers.len() as u64,
            min: numbers.first().copied(),
            max: numbers.last().copied(),
            avg: (!numbers.is_empty())
                .then(|| numbers.iter().sum::<f64>() / numbers.len() as f64),
            sum: numbers.iter().sum(),
        },
        "percentiles" => {
            let items = if numbers.is_empty() {
                Vec::new()
            } else {
                PERCENTILE_POINTS
                    .iter()
                    .map(|&p| {
                        let rank = ((p / 100.0) * numbers.len() as f64).ceil() as usize;
                        WirePercentile {
                            percentile: p,
                            value: numbers[rank.saturating_sub(1).min(numbers.len() - 1)],
                        }
                    })
                    .collect()
            };
            WireAggregate::Percentiles { items }
        }
        "terms" => {
            let mut counts: Vec<(Value, u64)> = Vec::new();
            for value in &values {
                match counts.iter_mut().find(|(key, _)| key == *value) {
                    Some((_, count)) => *count += 1,
                    None => counts.push(((*value).clone(), 1)),
                }
            }
            counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.to_string().cmp(&b.0.to_string())));
            WireAggregate::Buckets {
                items: counts
                    .into_iter()
                    .map(|(key, doc_count)| WireBucket {
                        key_as_string: (!key.is_string()).then(|| key.to_string()),
                        key,
                        doc_count,
                        aggregations: HashMap::new(),
                    })
                    .collect(),
                doc_count_error_upper_bound: Some(0),
                sum_other_doc_count: Some(0),
            }
        }
        _ => WireAggregate::Unknown,
    }
}
