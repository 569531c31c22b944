//! End-to-end repository tests over the in-memory store and cache.

use async_trait::async_trait;
use searchstore::capability::cache::{CacheClient, CacheError, CacheResult, MemoryCache};
use searchstore::capability::memory::MemorySearchStore;
use searchstore::capability::store::SearchStore;
use searchstore::index::descriptor::IndexDescriptor;
use searchstore::models::document::DocumentType;
use searchstore::models::results::PageCursor;
use searchstore::query::options::CommandOptions;
use searchstore::query::repository_query::{RepositoryQuery, SoftDeleteMode};
use searchstore::repository::ReadRepository;
use searchstore::RepositoryConfig;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct Order {
    id: String,
    state: String,
    total: i64,
    #[serde(default)]
    deleted: bool,
    #[serde(default)]
    version: i64,
}

fn order_type() -> DocumentType<Order> {
    DocumentType::<Order>::new("Order")
        .with_id(|o| o.id.clone())
        .with_soft_delete("deleted", |o| o.deleted)
        .with_version(|o, v| o.version = v)
        .with_sort_accessor("total", |o| json!(o.total))
}

fn build_repository(
    store: Arc<MemorySearchStore>,
    partitioned: bool,
) -> ReadRepository<Order> {
    let descriptor = if partitioned {
        IndexDescriptor::new("Order", "orders", 1).time_partitioned()
    } else {
        IndexDescriptor::new("Order", "orders", 1)
    };

    ReadRepository::new(
        order_type(),
        Arc::new(descriptor),
        store,
        Arc::new(MemoryCache::new(1_000, Duration::from_secs(300))),
        &RepositoryConfig::default(),
    )
}

async fn seed(store: &MemorySearchStore, count: usize) {
    store
        .create_index("orders-v1", &json!({}))
        .await
        .unwrap();
    store
        .bind_alias("orders", &["orders-v1".to_string()])
        .await
        .unwrap();

    for i in 1..=count {
        store.index_document(
            "orders-v1",
            &format!("o{:03}", i),
            json!({
                "id": format!("o{:03}", i),
                "state": if i % 2 == 0 { "open" } else { "closed" },
                "total": i as i64,
                "deleted": false,
            }),
        );
    }
}

#[tokio::test]
async fn test_get_by_id_second_call_is_served_from_cache() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 3).await;
    let repository = build_repository(store.clone(), false);

    let first = repository
        .get_by_id("o001", &CommandOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.document.as_ref().unwrap().total, 1);
    assert_eq!(store.get_count(), 1);

    let second = repository
        .get_by_id("o001", &CommandOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(second.document.as_ref().unwrap().total, 1);
    assert_eq!(store.get_count(), 1);
}

#[tokio::test]
async fn test_get_by_id_miss_is_not_cached() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 1).await;
    let repository = build_repository(store.clone(), false);

    assert!(repository
        .get_by_id("missing", &CommandOptions::new())
        .await
        .unwrap()
        .is_none());

    // the document appears later; the next read must see it
    store.index_document(
        "orders-v1",
        "missing",
        json!({"id": "missing", "state": "open", "total": 9, "deleted": false}),
    );
    assert!(repository
        .get_by_id("missing", &CommandOptions::new())
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_get_by_id_without_identity_is_a_capability_mismatch() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 1).await;

    let repository: ReadRepository<Order> = ReadRepository::new(
        DocumentType::new("Order"),
        Arc::new(IndexDescriptor::new("Order", "orders", 1)),
        store,
        Arc::new(MemoryCache::new(100, Duration::from_secs(60))),
        &RepositoryConfig::default(),
    );

    let err = repository
        .get_by_id("o001", &CommandOptions::new())
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "CAPABILITY_MISMATCH");
}

#[tokio::test]
async fn test_find_with_cache_key_skips_store_on_second_call() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 30).await;
    let repository = build_repository(store.clone(), false);

    let query = RepositoryQuery::new().with_filter_expression("state:open");
    let options = CommandOptions::new()
        .with_cache_key("open-orders")
        .with_page_limit(1, 10);

    let first = repository.find(&query, &options).await.unwrap();
    assert_eq!(first.hits.len(), 10);
    assert_eq!(first.total, 15);
    assert!(first.has_more);
    assert_eq!(store.search_count(), 1);

    let second = repository.find(&query, &options).await.unwrap();
    assert_eq!(second.hits.len(), 10);
    assert_eq!(store.search_count(), 1);

    // the continuation is rebuilt on the cached copy
    assert_eq!(second.cursor, PageCursor::Offset(2));
}

#[tokio::test]
async fn test_offset_paging_walks_all_pages() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 25).await;
    let repository = build_repository(store.clone(), false);

    let query = RepositoryQuery::new();
    let options = CommandOptions::new().with_page_limit(1, 10);

    let mut seen = HashSet::new();
    let mut page = repository.find(&query, &options).await.unwrap();
    let mut pages = 1;
    seen.extend(page.hits.iter().map(|h| h.id.clone()));

    while page.has_more {
        page = repository.next_page(&page, &query, &options).await.unwrap();
        pages += 1;
        seen.extend(page.hits.iter().map(|h| h.id.clone()));
    }

    assert_eq!(pages, 3);
    assert_eq!(seen.len(), 25);
}

#[tokio::test]
async fn test_cursor_paging_is_exhaustive_and_non_overlapping() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 25).await;
    let repository = build_repository(store.clone(), false);

    let query = RepositoryQuery::new().with_sort("total");
    let options = CommandOptions::new()
        .with_limit(10)
        .with_search_after_paging();

    let mut seen = Vec::new();
    let mut page = repository.find(&query, &options).await.unwrap();
    seen.extend(page.hits.iter().map(|h| h.document.as_ref().unwrap().total));

    while page.has_more {
        assert!(matches!(page.cursor, PageCursor::SearchAfter(_)));
        page = repository.next_page(&page, &query, &options).await.unwrap();
        seen.extend(page.hits.iter().map(|h| h.document.as_ref().unwrap().total));
    }

    // every document exactly once, in sort order
    assert_eq!(seen, (1..=25).collect::<Vec<i64>>());
}

#[tokio::test]
async fn test_snapshot_paging_is_never_cached() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 25).await;
    let repository = build_repository(store.clone(), false);

    let query = RepositoryQuery::new();
    let options = CommandOptions::new()
        .with_cache_key("snapshot-walk")
        .with_limit(10)
        .with_snapshot_paging();

    repository.find(&query, &options).await.unwrap();
    repository.find(&query, &options).await.unwrap();
    assert_eq!(store.search_count(), 2);
}

#[tokio::test]
async fn test_snapshot_paging_walks_the_full_snapshot() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 25).await;
    let repository = build_repository(store.clone(), false);

    let query = RepositoryQuery::new();
    let options = CommandOptions::new().with_limit(10).with_snapshot_paging();

    let mut seen = HashSet::new();
    let mut page = repository.find(&query, &options).await.unwrap();
    seen.extend(page.hits.iter().map(|h| h.id.clone()));
    assert!(matches!(page.cursor, PageCursor::Snapshot(_)));

    while page.has_more {
        page = repository.next_page(&page, &query, &options).await.unwrap();
        seen.extend(page.hits.iter().map(|h| h.id.clone()));
    }

    assert_eq!(seen.len(), 25);
}

#[tokio::test]
async fn test_missing_index_normalizes_to_empty_results() {
    let store = Arc::new(MemorySearchStore::new());
    let repository = build_repository(store, false);

    let results = repository
        .find(&RepositoryQuery::new(), &CommandOptions::new())
        .await
        .unwrap();
    assert!(results.is_empty());
    assert_eq!(results.total, 0);

    let count = repository.count_all(&CommandOptions::new()).await.unwrap();
    assert_eq!(count.total, 0);
}

#[tokio::test]
async fn test_count_with_aggregations_and_cache() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 20).await;
    let repository = build_repository(store.clone(), false);

    let query = RepositoryQuery::new().with_aggregation("stats:total");
    let options = CommandOptions::new().with_cache_key("order-stats");

    let count = repository.count(&query, &options).await.unwrap();
    assert_eq!(count.total, 20);
    let stats = count.aggregations["stats:total"].as_stats().unwrap();
    assert_eq!(stats.count, 20);
    assert_eq!(stats.min, Some(1.0));
    assert_eq!(stats.max, Some(20.0));
    assert_eq!(stats.sum, 210.0);

    let cached = repository.count(&query, &options).await.unwrap();
    assert_eq!(cached.total, 20);
    assert_eq!(store.search_count(), 1);
}

#[tokio::test]
async fn test_exists_and_exists_by_id() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 5).await;
    let repository = build_repository(store, false);

    assert!(repository
        .exists(&RepositoryQuery::new().with_filter_expression("state:open"))
        .await
        .unwrap());
    assert!(!repository
        .exists(&RepositoryQuery::new().with_filter_expression("state:archived"))
        .await
        .unwrap());

    assert!(repository.exists_by_id("o001").await.unwrap());
    assert!(!repository.exists_by_id("o999").await.unwrap());
}

#[tokio::test]
async fn test_get_by_ids_uses_multi_get_and_preserves_order() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 10).await;
    let repository = build_repository(store.clone(), false);

    let ids = vec![
        "o005".to_string(),
        "o001".to_string(),
        "o005".to_string(), // duplicate collapses
        "missing".to_string(),
        "o009".to_string(),
    ];

    let hits = repository
        .get_by_ids(&ids, &CommandOptions::new())
        .await
        .unwrap();
    let returned: Vec<&str> = hits.iter().map(|h| h.id.as_str()).collect();
    assert_eq!(returned, vec!["o005", "o001", "o009"]);
    assert_eq!(store.multi_get_count(), 1);
    assert_eq!(store.search_count(), 0);

    // second call is fully cache-served
    let hits = repository
        .get_by_ids(&ids, &CommandOptions::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), 3);
    assert_eq!(store.multi_get_count(), 1);
}

#[tokio::test]
async fn test_get_by_ids_falls_back_to_query_for_partitioned_types() {
    let store = Arc::new(MemorySearchStore::new());
    store.create_index("orders-v1-2026.07", &json!({})).await.unwrap();
    store.create_index("orders-v1-2026.08", &json!({})).await.unwrap();
    store
        .bind_alias(
            "orders",
            &["orders-v1-2026.07".to_string(), "orders-v1-2026.08".to_string()],
        )
        .await
        .unwrap();
    store.index_document(
        "orders-v1-2026.07",
        "july",
        json!({"id": "july", "state": "open", "total": 1, "deleted": false}),
    );
    store.index_document(
        "orders-v1-2026.08",
        "august",
        json!({"id": "august", "state": "open", "total": 2, "deleted": false}),
    );

    let repository = build_repository(store.clone(), true);

    let hits = repository
        .get_by_ids(
            &["july".to_string(), "august".to_string()],
            &CommandOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    // the multi-fetch runs first but cannot resolve the two-index alias,
    // so every id falls through to the query path
    assert_eq!(store.multi_get_count(), 1);
    assert!(store.search_count() >= 1);

    // provenance names the physical period index
    let july = hits.iter().find(|h| h.id == "july").unwrap();
    assert_eq!(july.index(), Some("orders-v1-2026.07"));
}

#[tokio::test]
async fn test_partitioned_get_by_ids_prefers_multi_get_when_resolvable() {
    let store = Arc::new(MemorySearchStore::new());
    // the alias is currently backed by a single period index, so the
    // multi-fetch satisfies everything and no query fallback runs
    store.create_index("orders-v1-2026.08", &json!({})).await.unwrap();
    store
        .bind_alias("orders", &["orders-v1-2026.08".to_string()])
        .await
        .unwrap();
    for id in ["a", "b"] {
        store.index_document(
            "orders-v1-2026.08",
            id,
            json!({"id": id, "state": "open", "total": 1, "deleted": false}),
        );
    }

    let repository = build_repository(store.clone(), true);

    let hits = repository
        .get_by_ids(&["a".to_string(), "b".to_string()], &CommandOptions::new())
        .await
        .unwrap();

    assert_eq!(hits.len(), 2);
    assert_eq!(store.multi_get_count(), 1);
    assert_eq!(store.search_count(), 0);
}

#[tokio::test]
async fn test_partitioned_get_by_id_uses_an_id_query() {
    let store = Arc::new(MemorySearchStore::new());
    store.create_index("orders-v1-2026.07", &json!({})).await.unwrap();
    store.create_index("orders-v1-2026.08", &json!({})).await.unwrap();
    store
        .bind_alias(
            "orders",
            &["orders-v1-2026.07".to_string(), "orders-v1-2026.08".to_string()],
        )
        .await
        .unwrap();
    store.index_document(
        "orders-v1-2026.08",
        "august",
        json!({"id": "august", "state": "open", "total": 2, "deleted": false}),
    );

    let repository = build_repository(store.clone(), true);

    // a direct get cannot pick among the period indices behind the alias
    let hit = repository
        .get_by_id("august", &CommandOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.index(), Some("orders-v1-2026.08"));
    assert_eq!(store.get_count(), 0);
    assert_eq!(store.search_count(), 1);

    // the fetched document still lands in the per-document cache
    repository
        .get_by_id("august", &CommandOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(store.search_count(), 1);
}

#[tokio::test]
async fn test_soft_deleted_ids_are_excluded_until_invalidated() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 5).await;
    let repository = build_repository(store.clone(), false);

    let all = repository
        .find(&RepositoryQuery::new(), &CommandOptions::new())
        .await
        .unwrap();
    assert_eq!(all.hits.len(), 5);

    // index still contains the document; only the side set knows
    repository
        .mark_soft_deleted(&["o003".to_string()])
        .await
        .unwrap();

    let remaining = repository
        .find(&RepositoryQuery::new(), &CommandOptions::new())
        .await
        .unwrap();
    assert_eq!(remaining.hits.len(), 4);
    assert!(remaining.hits.iter().all(|h| h.id != "o003"));
}

#[tokio::test]
async fn test_soft_delete_modes() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 4).await;
    store.index_document(
        "orders-v1",
        "gone",
        json!({"id": "gone", "state": "open", "total": 99, "deleted": true}),
    );
    let repository = build_repository(store, false);

    let active = repository
        .find(&RepositoryQuery::new(), &CommandOptions::new())
        .await
        .unwrap();
    assert_eq!(active.hits.len(), 4);

    let deleted = repository
        .find(
            &RepositoryQuery::new().with_soft_delete_mode(SoftDeleteMode::DeletedOnly),
            &CommandOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(deleted.hits.len(), 1);
    assert_eq!(deleted.hits[0].id, "gone");

    let all = repository
        .find(
            &RepositoryQuery::new().with_soft_delete_mode(SoftDeleteMode::All),
            &CommandOptions::new(),
        )
        .await
        .unwrap();
    assert_eq!(all.hits.len(), 5);
}

#[tokio::test]
async fn test_versions_are_applied_to_documents() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 1).await;
    // overwrite bumps the stored version
    store.index_document(
        "orders-v1",
        "o001",
        json!({"id": "o001", "state": "open", "total": 7, "deleted": false}),
    );
    let repository = build_repository(store, false);

    let results = repository
        .find(&RepositoryQuery::new(), &CommandOptions::new())
        .await
        .unwrap();
    let hit = &results.hits[0];
    assert_eq!(hit.version, Some(2));
    assert_eq!(hit.document.as_ref().unwrap().version, 2);
}

#[tokio::test]
async fn test_find_as_projects_into_another_shape() {
    #[derive(Debug, Serialize, Deserialize)]
    struct OrderSummary {
        id: String,
        state: String,
    }

    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 3).await;
    let repository = build_repository(store, false);

    let results = repository
        .find_as::<OrderSummary>(
            &RepositoryQuery::new().with_include("id").with_include("state"),
            &CommandOptions::new(),
        )
        .await
        .unwrap();

    assert_eq!(results.hits.len(), 3);
    assert!(results.hits.iter().all(|h| h.document.is_some()));
}

#[tokio::test]
async fn test_invalidate_cache_forces_a_store_read() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 2).await;
    let repository = build_repository(store.clone(), false);

    repository.get_by_id("o001", &CommandOptions::new()).await.unwrap();
    repository.get_by_id("o001", &CommandOptions::new()).await.unwrap();
    assert_eq!(store.get_count(), 1);

    repository.invalidate_cache(&["o001".to_string()]).await.unwrap();
    repository.get_by_id("o001", &CommandOptions::new()).await.unwrap();
    assert_eq!(store.get_count(), 2);
}

#[tokio::test]
async fn test_disabled_cache_always_reaches_the_store() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 2).await;

    let mut config = RepositoryConfig::default();
    config.cache.enabled = false;

    let repository: ReadRepository<Order> = ReadRepository::new(
        order_type(),
        Arc::new(IndexDescriptor::new("Order", "orders", 1)),
        store.clone(),
        Arc::new(MemoryCache::new(100, Duration::from_secs(60))),
        &config,
    );

    repository.get_by_id("o001", &CommandOptions::new()).await.unwrap();
    repository.get_by_id("o001", &CommandOptions::new()).await.unwrap();
    assert_eq!(store.get_count(), 2);
}

/// Deserializes fine but refuses to serialize, like a document carrying
/// engine-only payloads
#[derive(Debug, Clone, Deserialize, Default)]
struct Sealed {
    id: String,
}

impl Serialize for Sealed {
    fn serialize<S: serde::Serializer>(&self, _serializer: S) -> Result<S::Ok, S::Error> {
        Err(serde::ser::Error::custom("opaque payload"))
    }
}

#[tokio::test]
async fn test_unserializable_document_reads_without_cache_write_back() {
    let store = Arc::new(MemorySearchStore::new());
    store.create_index("sealed-v1", &json!({})).await.unwrap();
    store
        .bind_alias("sealed", &["sealed-v1".to_string()])
        .await
        .unwrap();
    store.index_document("sealed-v1", "s1", json!({"id": "s1"}));

    let repository: ReadRepository<Sealed> = ReadRepository::new(
        DocumentType::new("Sealed").with_id(|s: &Sealed| s.id.clone()),
        Arc::new(IndexDescriptor::new("Sealed", "sealed", 1)),
        store.clone(),
        Arc::new(MemoryCache::new(100, Duration::from_secs(60))),
        &RepositoryConfig::default(),
    );

    // the read succeeds; only the write-back is skipped
    let hit = repository
        .get_by_id("s1", &CommandOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(hit.document.as_ref().unwrap().id, "s1");
    assert_eq!(store.get_count(), 1);

    repository
        .get_by_id("s1", &CommandOptions::new())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(store.get_count(), 2);

    let hits = repository
        .get_by_ids(&["s1".to_string()], &CommandOptions::new())
        .await
        .unwrap();
    assert_eq!(hits.len(), 1);
}

/// Cache backend that is down hard: every operation fails
struct BrokenCache;

#[async_trait]
impl CacheClient for BrokenCache {
    async fn get(&self, _key: &str) -> CacheResult<Option<Value>> {
        Err(CacheError("cache offline".to_string()))
    }

    async fn set(&self, _key: &str, _value: Value, _ttl: Option<Duration>) -> CacheResult<()> {
        Err(CacheError("cache offline".to_string()))
    }

    async fn remove(&self, _key: &str) -> CacheResult<()> {
        Err(CacheError("cache offline".to_string()))
    }

    async fn get_all(&self, _keys: &[String]) -> CacheResult<HashMap<String, Value>> {
        Err(CacheError("cache offline".to_string()))
    }

    async fn set_all(
        &self,
        _values: HashMap<String, Value>,
        _ttl: Option<Duration>,
    ) -> CacheResult<()> {
        Err(CacheError("cache offline".to_string()))
    }

    async fn remove_all(&self, _keys: &[String]) -> CacheResult<()> {
        Err(CacheError("cache offline".to_string()))
    }

    async fn set_add(&self, _key: &str, _members: &[String]) -> CacheResult<()> {
        Err(CacheError("cache offline".to_string()))
    }

    async fn set_members(&self, _key: &str) -> CacheResult<Vec<String>> {
        Err(CacheError("cache offline".to_string()))
    }
}

#[tokio::test]
async fn test_cache_failures_degrade_reads_but_fail_maintenance() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 3).await;

    let repository: ReadRepository<Order> = ReadRepository::new(
        order_type(),
        Arc::new(IndexDescriptor::new("Order", "orders", 1)),
        store.clone(),
        Arc::new(BrokenCache),
        &RepositoryConfig::default(),
    );

    // reads fall through to the store
    assert!(repository
        .get_by_id("o001", &CommandOptions::new())
        .await
        .unwrap()
        .is_some());
    let results = repository
        .find(
            &RepositoryQuery::new(),
            &CommandOptions::new().with_cache_key("all-orders"),
        )
        .await
        .unwrap();
    assert_eq!(results.hits.len(), 3);

    // explicit maintenance must not pretend it worked
    assert!(repository.invalidate_cache(&["o001".to_string()]).await.is_err());
    assert!(repository.mark_soft_deleted(&["o001".to_string()]).await.is_err());
}

#[tokio::test]
async fn test_find_one_returns_first_hit_only() {
    let store = Arc::new(MemorySearchStore::new());
    seed(&store, 10).await;
    let repository = build_repository(store, false);

    let hit = repository
        .find_one(
            &RepositoryQuery::new()
                .with_filter_expression("state:open")
                .with_sort_descending("total"),
            &CommandOptions::new(),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(hit.document.unwrap().total, 10);
}
