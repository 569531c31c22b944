//! Store capability: the interface boundary to the search engine

use crate::protocol::{SearchRequest, SearchResponse, WireHit};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors reported by the store capability.
///
/// `NotFound` is structured and distinct from other failures: the repository
/// normalizes it to an empty result, never to an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Index, alias or document does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The store rejected the query as invalid
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Index/alias/template mutation failed
    #[error("Index operation failed: {0}")]
    IndexOperation(String),

    /// The store is unreachable or the call failed in transit
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Any other engine-reported failure
    #[error("Store failure: {0}")]
    Other(String),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound(_))
    }
}

/// Asynchronous capability interface to the search engine.
///
/// The concrete wire protocol and client live behind this trait; everything
/// above it works purely in terms of [`SearchRequest`]/[`SearchResponse`].
#[async_trait]
pub trait SearchStore: Send + Sync {
    /// Execute a translated search request
    async fn search(&self, request: &SearchRequest) -> StoreResult<SearchResponse>;

    /// Continue a snapshot with a previously-returned scroll token
    async fn scroll(&self, scroll_id: &str, lifetime: Duration) -> StoreResult<SearchResponse>;

    /// Fetch one document by id from a specific index
    async fn get(&self, index: &str, id: &str) -> StoreResult<Option<WireHit>>;

    /// Fetch many documents by (index, id); missing ids are simply absent
    /// from the result
    async fn multi_get(&self, requests: &[(String, String)]) -> StoreResult<Vec<WireHit>>;

    /// Check whether one document exists
    async fn document_exists(&self, index: &str, id: &str) -> StoreResult<bool>;

    /// Create a concrete physical index with the given field mapping
    async fn create_index(&self, name: &str, mapping: &Value) -> StoreResult<()>;

    /// Install a reusable index template applied to future indices whose
    /// names match the template's prefix
    async fn put_template(&self, name: &str, mapping: &Value) -> StoreResult<()>;

    async fn index_exists(&self, name: &str) -> StoreResult<bool>;

    async fn template_exists(&self, name: &str) -> StoreResult<bool>;

    async fn alias_exists(&self, alias: &str) -> StoreResult<bool>;

    /// Bind an alias to one or more physical indices
    async fn bind_alias(&self, alias: &str, indices: &[String]) -> StoreResult<()>;

    /// Resolve an alias to the physical index names it points at; an alias
    /// that points nowhere resolves to an empty list
    async fn resolve_alias(&self, alias: &str) -> StoreResult<Vec<String>>;

    /// List physical index names starting with the given prefix
    async fn list_indices(&self, prefix: &str) -> StoreResult<Vec<String>>;

    async fn delete_index(&self, name: &str) -> StoreResult<()>;
}
