//! Cache-aware typed read repository.
//!
//! Every read follows the same shape: normalize the query, consult the
//! cache, translate, execute, map, write back. Cache failures degrade to
//! direct store reads with a warning; a missing index normalizes to an
//! empty result. Capability checks happen before any I/O so a misuse of
//! an id operation on an identity-less type fails fast.

use crate::capability::cache::{CacheClient, NullCache, ScopedCache};
use crate::capability::store::SearchStore;
use crate::config::{CacheConfig, PagingConfig, RepositoryConfig};
use crate::error::{RepositoryError, Result};
use crate::index::descriptor::IndexDescriptor;
use crate::models::document::DocumentType;
use crate::models::results::{CountResult, FindHit, FindResults, PageCursor};
use crate::protocol::request::SortSpec;
use crate::protocol::response::SearchResponse;
use crate::query::builder::QueryPipeline;
use crate::query::expression::DefaultExpressionParser;
use crate::query::options::CommandOptions;
use crate::query::repository_query::{RepositoryQuery, SoftDeleteMode};
use crate::repository::mapper::{map_aggregations, map_hit};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Named cache set holding ids of recently soft-deleted documents, so
/// reads exclude them before the index has caught up
const DELETED_IDS_SET: &str = "deleted";

/// Cache key prefix separating count results from find results
const COUNT_PREFIX: &str = "count";

/// Page size of the id-query fallback used when a document's physical
/// index cannot be known up front
const ID_BATCH_LIMIT: usize = 1000;

#[derive(Clone, Copy, PartialEq)]
enum PagingMode {
    Offset,
    SearchAfter,
    Snapshot,
}

impl PagingMode {
    fn of(options: &CommandOptions) -> Self {
        if options.uses_snapshot_paging() {
            PagingMode::Snapshot
        } else if options.uses_search_after_paging() {
            PagingMode::SearchAfter
        } else {
            PagingMode::Offset
        }
    }
}

/// Read-only repository over one document type
pub struct ReadRepository<T> {
    doc_type: DocumentType<T>,
    descriptor: Arc<IndexDescriptor>,
    store: Arc<dyn SearchStore>,
    cache: ScopedCache,
    pipeline: QueryPipeline,
    paging: PagingConfig,
    cache_config: CacheConfig,
}

impl<T> ReadRepository<T>
where
    T: Serialize + DeserializeOwned + Send + Sync,
{
    pub fn new(
        doc_type: DocumentType<T>,
        descriptor: Arc<IndexDescriptor>,
        store: Arc<dyn SearchStore>,
        cache: Arc<dyn CacheClient>,
        config: &RepositoryConfig,
    ) -> Self {
        // a disabled cache is a null implementation, not a runtime branch
        let cache_client: Arc<dyn CacheClient> = if config.cache.enabled {
            cache
        } else {
            Arc::new(NullCache)
        };
        let cache = ScopedCache::new(cache_client, doc_type.name());
        let pipeline =
            QueryPipeline::standard(Arc::new(DefaultExpressionParser), config.paging.clone());

        Self {
            doc_type,
            descriptor,
            store,
            cache,
            pipeline,
            paging: config.paging.clone(),
            cache_config: config.cache.clone(),
        }
    }

    /// Replace the translation pipeline, e.g. to append custom builders
    pub fn with_pipeline(mut self, pipeline: QueryPipeline) -> Self {
        self.pipeline = pipeline;
        self
    }

    pub fn document_type(&self) -> &DocumentType<T> {
        &self.doc_type
    }

    pub fn descriptor(&self) -> &Arc<IndexDescriptor> {
        &self.descriptor
    }

    // --- find ---

    pub async fn find(
        &self,
        query: &RepositoryQuery,
        options: &CommandOptions,
    ) -> Result<FindResults<T>> {
        self.execute_find(query, options, Some(&self.doc_type)).await
    }

    /// Find, deserializing hits into a different shape (projections,
    /// partial documents). Version and sort accessors of the registered
    /// type do not apply to the alternate shape.
    pub async fn find_as<TOut>(
        &self,
        query: &RepositoryQuery,
        options: &CommandOptions,
    ) -> Result<FindResults<TOut>>
    where
        TOut: Serialize + DeserializeOwned + Send + Sync,
    {
        self.execute_find(query, options, None).await
    }

    pub async fn find_one(
        &self,
        query: &RepositoryQuery,
        options: &CommandOptions,
    ) -> Result<Option<FindHit<T>>> {
        let options = options.clone().with_limit(1);
        let results = self.find(query, &options).await?;
        Ok(results.hits.into_iter().next())
    }

    /// Fetch the page a previous result points at. A result without a
    /// continuation yields an empty page.
    pub async fn next_page(
        &self,
        results: &FindResults<T>,
        query: &RepositoryQuery,
        options: &CommandOptions,
    ) -> Result<FindResults<T>> {
        match &results.cursor {
            PageCursor::None => Ok(FindResults::empty()),
            PageCursor::Offset(page) => {
                self.find(query, &options.clone().with_page(*page)).await
            }
            PageCursor::SearchAfter(values) => {
                let options = options
                    .clone()
                    .with_page(results.page + 1)
                    .with_search_after_paging()
                    .with_search_after_values(values.clone());
                self.find(query, &options).await
            }
            PageCursor::Snapshot(token) => {
                let options = options
                    .clone()
                    .with_page(results.page + 1)
                    .with_scroll_id(token.clone());
                self.find(query, &options).await
            }
        }
    }

    pub async fn get_all(&self, options: &CommandOptions) -> Result<FindResults<T>> {
        self.find(&RepositoryQuery::new(), options).await
    }

    // --- count / exists ---

    pub async fn count(
        &self,
        query: &RepositoryQuery,
        options: &CommandOptions,
    ) -> Result<CountResult> {
        if options.cancellation().is_cancelled() {
            return Err(RepositoryError::Cancelled("count".to_string()));
        }

        let query = self.prepare_query(query).await;
        let mut request =
            self.pipeline
                .translate(&query, options, vec![self.descriptor.alias.clone()])?;
        request.size = Some(0);
        request.from = None;

        let cache_key = options
            .cache_key()
            .map(|key| format!("{}:{}", COUNT_PREFIX, key));

        if let Some(key) = &cache_key {
            if options.cache_reads_enabled() {
                match self.cache.get(key).await {
                    Ok(Some(cached)) => match serde_json::from_value::<CountResult>(cached) {
                        Ok(result) => return Ok(result),
                        Err(err) => {
                            tracing::warn!(key = %key, error = %err, "Discarding undecodable cached count");
                        }
                    },
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "Cache read failed, falling through to store");
                    }
                }
            }
        }

        let response = match self.store.search(&request).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => SearchResponse::empty(),
            Err(err) => return Err(err.into()),
        };

        let result = CountResult {
            total: response.total,
            aggregations: map_aggregations(response.aggregations),
        };

        if let Some(key) = &cache_key {
            if options.cache_writes_enabled() && !options.cancellation().is_cancelled() {
                let ttl = options.expires_in().unwrap_or(self.cache_config.default_ttl());
                match serde_json::to_value(&result) {
                    Ok(payload) => {
                        if let Err(err) = self.cache.set(key, payload, Some(ttl)).await {
                            tracing::warn!(key = %key, error = %err, "Cache write failed");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "Count not cacheable");
                    }
                }
            }
        }

        Ok(result)
    }

    pub async fn count_all(&self, options: &CommandOptions) -> Result<CountResult> {
        self.count(&RepositoryQuery::new(), options).await
    }

    pub async fn exists(&self, query: &RepositoryQuery) -> Result<bool> {
        let result = self.count(query, &CommandOptions::new()).await?;
        Ok(result.total > 0)
    }

    pub async fn exists_by_id(&self, id: &str) -> Result<bool> {
        self.require_identity("exists_by_id")?;
        match self.store.document_exists(&self.descriptor.alias, id).await {
            Ok(exists) => Ok(exists),
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    // --- id operations ---

    pub async fn get_by_id(
        &self,
        id: &str,
        options: &CommandOptions,
    ) -> Result<Option<FindHit<T>>> {
        self.require_identity("get_by_id")?;
        if options.cancellation().is_cancelled() {
            return Err(RepositoryError::Cancelled("get_by_id".to_string()));
        }

        if options.cache_reads_enabled() {
            match self.cache.get(id).await {
                Ok(Some(cached)) => match serde_json::from_value::<FindHit<T>>(cached) {
                    Ok(hit) => return Ok(Some(hit)),
                    Err(err) => {
                        tracing::warn!(id = %id, error = %err, "Discarding undecodable cached document");
                    }
                },
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "Cache read failed, falling through to store");
                }
            }
        }

        let hit = if self.descriptor.time_partitioned {
            // the physical index is not derivable from the id, so a direct
            // single-index get cannot be used; run an id query instead
            let query = RepositoryQuery::new().with_ids(vec![id.to_string()]);
            let find_options = CommandOptions::new()
                .with_limit(1)
                .with_cancellation(options.cancellation().clone());
            self.execute_find::<T>(&query, &find_options, Some(&self.doc_type))
                .await?
                .hits
                .into_iter()
                .next()
        } else {
            let wire = match self.store.get(&self.descriptor.alias, id).await {
                Ok(hit) => hit,
                Err(err) if err.is_not_found() => None,
                Err(err) => return Err(err.into()),
            };
            match wire {
                Some(wire) => Some(map_hit(wire, Some(&self.doc_type))?),
                None => None,
            }
        };

        let Some(hit) = hit else {
            // misses are not cached: a later write must be visible at once
            return Ok(None);
        };

        if options.cache_writes_enabled() && !options.cancellation().is_cancelled() {
            let ttl = options.expires_in().unwrap_or(self.cache_config.default_ttl());
            match serde_json::to_value(&hit) {
                Ok(payload) => {
                    if let Err(err) = self.cache.set(id, payload, Some(ttl)).await {
                        tracing::warn!(id = %id, error = %err, "Cache write failed");
                    }
                }
                Err(err) => {
                    tracing::warn!(id = %id, error = %err, "Document not cacheable");
                }
            }
        }

        Ok(Some(hit))
    }

    /// Batch get. Duplicate ids collapse; hits come back in request order
    /// with misses absent. Cache-missed ids go through the store's
    /// multi-fetch first; for time-partitioned types the ids it could not
    /// resolve fall back to paged id queries across the alias.
    pub async fn get_by_ids(
        &self,
        ids: &[String],
        options: &CommandOptions,
    ) -> Result<Vec<FindHit<T>>> {
        self.require_identity("get_by_ids")?;
        if options.cancellation().is_cancelled() {
            return Err(RepositoryError::Cancelled("get_by_ids".to_string()));
        }

        let mut distinct: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids {
            if !distinct.contains(id) {
                distinct.push(id.clone());
            }
        }
        if distinct.is_empty() {
            return Ok(Vec::new());
        }

        let mut found: HashMap<String, FindHit<T>> = HashMap::new();

        if options.cache_reads_enabled() {
            match self.cache.get_all(&distinct).await {
                Ok(cached) => {
                    for (id, value) in cached {
                        match serde_json::from_value::<FindHit<T>>(value) {
                            Ok(hit) => {
                                found.insert(id, hit);
                            }
                            Err(err) => {
                                tracing::warn!(id = %id, error = %err, "Discarding undecodable cached document");
                            }
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "Cache read failed, falling through to store");
                }
            }
        }

        let missing: Vec<String> = distinct
            .iter()
            .filter(|id| !found.contains_key(*id))
            .cloned()
            .collect();

        if !missing.is_empty() {
            let mut fetched = self.fetch_ids_by_multi_get(&missing).await?;
            if self.descriptor.time_partitioned {
                let unresolved: Vec<String> = missing
                    .iter()
                    .filter(|id| !fetched.iter().any(|hit| &hit.id == *id))
                    .cloned()
                    .collect();
                if !unresolved.is_empty() {
                    fetched.extend(self.fetch_ids_by_query(&unresolved).await?);
                }
            }

            if options.cache_writes_enabled() && !options.cancellation().is_cancelled() {
                let mut payload = HashMap::with_capacity(fetched.len());
                for hit in &fetched {
                    match serde_json::to_value(hit) {
                        Ok(value) => {
                            payload.insert(hit.id.clone(), value);
                        }
                        Err(err) => {
                            tracing::warn!(id = %hit.id, error = %err, "Document not cacheable");
                        }
                    }
                }
                if !payload.is_empty() {
                    let ttl = options.expires_in().unwrap_or(self.cache_config.default_ttl());
                    if let Err(err) = self.cache.set_all(payload, Some(ttl)).await {
                        tracing::warn!(error = %err, "Cache write failed");
                    }
                }
            }

            for hit in fetched {
                found.insert(hit.id.clone(), hit);
            }
        }

        Ok(distinct
            .into_iter()
            .filter_map(|id| found.remove(&id))
            .collect())
    }

    // --- cache maintenance ---

    /// Drop cached documents or query results by key.
    ///
    /// Unlike read-path caching, a failure here propagates: pretending an
    /// explicit invalidation worked would leave stale entries live.
    pub async fn invalidate_cache(&self, keys: &[String]) -> Result<()> {
        self.cache
            .remove_all(keys)
            .await
            .map_err(|err| RepositoryError::Internal(format!("cache invalidation failed: {}", err)))
    }

    /// Record ids as soft-deleted so reads exclude them before the index
    /// catches up, and drop their cached documents. Failures propagate for
    /// the same reason they do in [`invalidate_cache`](Self::invalidate_cache).
    pub async fn mark_soft_deleted(&self, ids: &[String]) -> Result<()> {
        self.cache
            .set_add(DELETED_IDS_SET, ids)
            .await
            .map_err(|err| RepositoryError::Internal(format!("deleted-id set update failed: {}", err)))?;
        self.invalidate_cache(ids).await
    }

    // --- internals ---

    fn require_identity(&self, operation: &str) -> Result<()> {
        if !self.doc_type.has_identity() {
            return Err(RepositoryError::CapabilityMismatch(format!(
                "{} requires an identity accessor on '{}'",
                operation,
                self.doc_type.name()
            )));
        }
        Ok(())
    }

    fn effective_limit(&self, options: &CommandOptions) -> usize {
        options
            .limit()
            .unwrap_or(self.paging.default_limit)
            .min(self.paging.max_limit)
    }

    /// Inject type-level query state: the soft-delete flag field, default
    /// source excludes and the recently-deleted id set
    async fn prepare_query(&self, query: &RepositoryQuery) -> RepositoryQuery {
        let mut query = query.clone();

        if self.doc_type.supports_soft_deletes() && query.soft_delete_field().is_none() {
            if let Some(field) = self.doc_type.soft_delete_field() {
                query = query.with_soft_delete_field(field);
            }
        }

        if query.excludes().is_empty() && !self.doc_type.default_excludes().is_empty() {
            query = query.with_excludes(self.doc_type.default_excludes().to_vec());
        }

        if self.doc_type.supports_soft_deletes()
            && query.soft_delete_mode() == SoftDeleteMode::ActiveOnly
        {
            match self.cache.set_members(DELETED_IDS_SET).await {
                Ok(deleted) if !deleted.is_empty() => {
                    query = query.with_excluded_ids(deleted);
                }
                Ok(_) => {}
                Err(err) => {
                    tracing::warn!(error = %err, "Deleted-id set unavailable, continuing without it");
                }
            }
        }

        query
    }

    async fn execute_find<TOut>(
        &self,
        query: &RepositoryQuery,
        options: &CommandOptions,
        doc_type: Option<&DocumentType<TOut>>,
    ) -> Result<FindResults<TOut>>
    where
        TOut: Serialize + DeserializeOwned,
    {
        if options.cancellation().is_cancelled() {
            return Err(RepositoryError::Cancelled("find".to_string()));
        }

        let limit = self.effective_limit(options);

        // snapshot continuation bypasses translation entirely
        if let Some(scroll_id) = options.scroll_id() {
            let lifetime = options
                .snapshot_lifetime()
                .unwrap_or_else(|| self.paging.snapshot_lifetime());
            let response = match self.store.scroll(scroll_id, lifetime).await {
                Ok(response) => response,
                Err(err) if err.is_not_found() => return Ok(FindResults::empty()),
                Err(err) => return Err(err.into()),
            };
            return self.assemble(response, options.page(), limit, PagingMode::Snapshot, &[], doc_type);
        }

        let query = self.prepare_query(query).await;
        let mut request =
            self.pipeline
                .translate(&query, options, vec![self.descriptor.alias.clone()])?;
        request.track_versions = self.doc_type.has_version();

        let mode = PagingMode::of(options);
        let cache_key = (mode != PagingMode::Snapshot)
            .then(|| self.result_cache_key(options, limit))
            .flatten();

        if let Some(key) = &cache_key {
            if options.cache_reads_enabled() {
                match self.cache.get(key).await {
                    Ok(Some(cached)) => {
                        match serde_json::from_value::<FindResults<TOut>>(cached) {
                            Ok(mut results) => {
                                self.reattach_cursor(&mut results, options, &request.sort, doc_type)?;
                                tracing::debug!(key = %key, "Find served from cache");
                                return Ok(results);
                            }
                            Err(err) => {
                                tracing::warn!(key = %key, error = %err, "Discarding undecodable cached result");
                            }
                        }
                    }
                    Ok(None) => {}
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "Cache read failed, falling through to store");
                    }
                }
            }
        }

        let response = match self.store.search(&request).await {
            Ok(response) => response,
            Err(err) if err.is_not_found() => SearchResponse::empty(),
            Err(err) => return Err(err.into()),
        };

        let sorts = request.sort.clone();
        let results = self.assemble(response, options.page(), limit, mode, &sorts, doc_type)?;

        if let Some(key) = &cache_key {
            if options.cache_writes_enabled() && !options.cancellation().is_cancelled() {
                let ttl = options.expires_in().unwrap_or(self.cache_config.default_ttl());
                match serde_json::to_value(&results) {
                    Ok(payload) => {
                        if let Err(err) = self.cache.set(key, payload, Some(ttl)).await {
                            tracing::warn!(key = %key, error = %err, "Cache write failed");
                        }
                    }
                    Err(err) => {
                        tracing::warn!(key = %key, error = %err, "Result not cacheable");
                    }
                }
            }
        }

        Ok(results)
    }

    /// Paged results cache under `{key}:{page}:{limit}` so every page is
    /// its own entry; a cursor page appends its lower bound as well
    fn result_cache_key(&self, options: &CommandOptions, limit: usize) -> Option<String> {
        let base = options.cache_key()?;
        let mut key = format!("{}:{}:{}", base, options.page(), limit);
        if let Some(values) = options.search_after_values() {
            let encoded = serde_json::to_string(&values).unwrap_or_default();
            key = format!("{}:after:{}", key, encoded);
        }
        Some(key)
    }

    /// Turn a wire response into typed results with paging state resolved
    fn assemble<TOut>(
        &self,
        response: SearchResponse,
        page: u32,
        limit: usize,
        mode: PagingMode,
        sorts: &[SortSpec],
        doc_type: Option<&DocumentType<TOut>>,
    ) -> Result<FindResults<TOut>>
    where
        TOut: Serialize + DeserializeOwned,
    {
        let total = response.total;
        let aggregations = map_aggregations(response.aggregations);

        let mut hits = Vec::with_capacity(response.hits.len());
        for wire in response.hits {
            hits.push(map_hit(wire, doc_type)?);
        }

        let (has_more, cursor) = if mode == PagingMode::Snapshot {
            // the scroll context knows its own end; a short page means done
            let has_more = hits.len() >= limit && limit > 0;
            let cursor = match (has_more, response.scroll_id) {
                (true, Some(token)) => PageCursor::Snapshot(token),
                _ => PageCursor::None,
            };
            (has_more, cursor)
        } else {
            // one extra hit was requested purely to detect a further page
            let has_more = hits.len() > limit;
            hits.truncate(limit);
            let cursor = match (has_more, hits.last()) {
                (true, Some(last)) if mode == PagingMode::SearchAfter => {
                    PageCursor::SearchAfter(self.cursor_values(last, sorts, doc_type)?)
                }
                (true, Some(_)) => PageCursor::Offset(page.max(1) + 1),
                _ => PageCursor::None,
            };
            (has_more, cursor)
        };

        Ok(FindResults {
            hits,
            total,
            aggregations,
            page,
            has_more,
            cursor,
        })
    }

    /// Sort-key values of a hit, for the next cursor page's lower bound.
    /// Declared accessors win, then name lookup on the serialized
    /// document, then the id when the result is unsorted. A sort field
    /// that resolves to nothing is a hard error: silently paging from a
    /// wrong bound would skip documents.
    fn cursor_values<TOut>(
        &self,
        hit: &FindHit<TOut>,
        sorts: &[SortSpec],
        doc_type: Option<&DocumentType<TOut>>,
    ) -> Result<Vec<Value>>
    where
        TOut: Serialize,
    {
        if sorts.is_empty() {
            return Ok(vec![Value::String(hit.id.clone())]);
        }

        let serialized = hit
            .document
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;

        let mut values = Vec::with_capacity(sorts.len());
        for spec in sorts {
            let value = doc_type
                .zip(hit.document.as_ref())
                .and_then(|(dt, doc)| dt.sort_value(&spec.field, doc))
                .or_else(|| {
                    serialized
                        .as_ref()
                        .and_then(|doc| json_path(doc, &spec.field))
                        .cloned()
                });

            match value {
                Some(value) => values.push(value),
                None => {
                    return Err(RepositoryError::CursorPaging(format!(
                        "sort field '{}' has no value on document '{}'",
                        spec.field, hit.id
                    )))
                }
            }
        }
        Ok(values)
    }

    /// A cache hit carries no continuation (it is skipped during
    /// serialization); rebuild it from the paging mode.
    fn reattach_cursor<TOut>(
        &self,
        results: &mut FindResults<TOut>,
        options: &CommandOptions,
        sorts: &[SortSpec],
        doc_type: Option<&DocumentType<TOut>>,
    ) -> Result<()>
    where
        TOut: Serialize,
    {
        if !results.has_more {
            results.cursor = PageCursor::None;
            return Ok(());
        }

        results.cursor = match (PagingMode::of(options), results.hits.last()) {
            (PagingMode::SearchAfter, Some(last)) => {
                PageCursor::SearchAfter(self.cursor_values(last, sorts, doc_type)?)
            }
            (PagingMode::SearchAfter, None) => PageCursor::None,
            _ => PageCursor::Offset(results.page.max(1) + 1),
        };
        Ok(())
    }

    async fn fetch_ids_by_multi_get(&self, ids: &[String]) -> Result<Vec<FindHit<T>>> {
        let requests: Vec<(String, String)> = ids
            .iter()
            .map(|id| (self.descriptor.alias.clone(), id.clone()))
            .collect();

        let wire_hits = match self.store.multi_get(&requests).await {
            Ok(hits) => hits,
            Err(err) if err.is_not_found() => Vec::new(),
            Err(err) => return Err(err.into()),
        };

        let mut hits = Vec::with_capacity(wire_hits.len());
        for wire in wire_hits {
            hits.push(map_hit(wire, Some(&self.doc_type))?);
        }
        Ok(hits)
    }

    /// For time-partitioned types a document's physical index is not
    /// derivable from its id, so batch gets run as paged id queries.
    async fn fetch_ids_by_query(&self, ids: &[String]) -> Result<Vec<FindHit<T>>> {
        let query = RepositoryQuery::new().with_ids(ids.to_vec());
        let mut hits = Vec::new();
        let mut page = 1;

        loop {
            let options = CommandOptions::new().with_page_limit(page, ID_BATCH_LIMIT);
            let results = self
                .execute_find::<T>(&query, &options, Some(&self.doc_type))
                .await?;
            let done = !results.has_more;
            hits.extend(results.hits);
            if done {
                break;
            }
            page += 1;
        }

        Ok(hits)
    }
}

/// Dotted-path lookup on a serialized document
fn json_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}
