//! Command options: execution directives orthogonal to the query itself.
//!
//! One value, two views: typed accessors layered over an untyped option
//! store. Options nothing recognizes are ignored, never an error. The
//! cancellation token rides alongside the bag because it is not data.

use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const PAGE: &str = "page";
const LIMIT: &str = "limit";
const CACHE_KEY: &str = "cache_key";
const READ_CACHE: &str = "read_cache";
const WRITE_CACHE: &str = "write_cache";
const EXPIRES_IN_SECS: &str = "expires_in_secs";
const SNAPSHOT: &str = "snapshot";
const SNAPSHOT_LIFETIME_SECS: &str = "snapshot_lifetime_secs";
const SCROLL_ID: &str = "scroll_id";
const SEARCH_AFTER: &str = "search_after";
const SEARCH_AFTER_VALUES: &str = "search_after_values";

/// Execution directives for one repository call
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    values: HashMap<String, Value>,
    token: CancellationToken,
}

impl CommandOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw access to the option bag
    pub fn set(&mut self, key: impl Into<String>, value: Value) -> &mut Self {
        self.values.insert(key.into(), value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    // --- builder methods ---

    pub fn with_page(mut self, page: u32) -> Self {
        self.set(PAGE, json!(page));
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.set(LIMIT, json!(limit));
        self
    }

    pub fn with_page_limit(self, page: u32, limit: usize) -> Self {
        self.with_page(page).with_limit(limit)
    }

    /// Canonical cache key; setting it enables cache read and write-back
    pub fn with_cache_key(mut self, key: impl Into<String>) -> Self {
        self.set(CACHE_KEY, json!(key.into()));
        self
    }

    pub fn without_cache_read(mut self) -> Self {
        self.set(READ_CACHE, json!(false));
        self
    }

    pub fn without_cache_write(mut self) -> Self {
        self.set(WRITE_CACHE, json!(false));
        self
    }

    pub fn with_expiry(mut self, expires_in: Duration) -> Self {
        self.set(EXPIRES_IN_SECS, json!(expires_in.as_secs()));
        self
    }

    /// Request snapshot (scroll) paging
    pub fn with_snapshot_paging(mut self) -> Self {
        self.set(SNAPSHOT, json!(true));
        self
    }

    pub fn with_snapshot_lifetime(mut self, lifetime: Duration) -> Self {
        self.set(SNAPSHOT_LIFETIME_SECS, json!(lifetime.as_secs()));
        self
    }

    /// Continue a snapshot with a server-held scroll token
    pub fn with_scroll_id(mut self, scroll_id: impl Into<String>) -> Self {
        self.set(SCROLL_ID, json!(scroll_id.into()));
        self
    }

    /// Request cursor ("search-after") paging
    pub fn with_search_after_paging(mut self) -> Self {
        self.set(SEARCH_AFTER, json!(true));
        self
    }

    /// Lower bound for the next cursor page: the previous page's last
    /// sort-key values
    pub fn with_search_after_values(mut self, values: Vec<Value>) -> Self {
        self.set(SEARCH_AFTER_VALUES, Value::Array(values));
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.token = token;
        self
    }

    // --- typed accessors ---

    pub fn has_page(&self) -> bool {
        self.values.contains_key(PAGE)
    }

    /// Page number, defaulting to the first page
    pub fn page(&self) -> u32 {
        self.values
            .get(PAGE)
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
            .unwrap_or(1)
    }

    pub fn has_limit(&self) -> bool {
        self.values.contains_key(LIMIT)
    }

    pub fn limit(&self) -> Option<usize> {
        self.values
            .get(LIMIT)
            .and_then(|v| v.as_u64())
            .map(|v| v as usize)
    }

    pub fn cache_key(&self) -> Option<&str> {
        self.values.get(CACHE_KEY).and_then(|v| v.as_str())
    }

    /// Whether cache reads are allowed at all. Id-based operations carry
    /// their own keys, so this is independent of `cache_key`.
    pub fn cache_reads_enabled(&self) -> bool {
        self.values
            .get(READ_CACHE)
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    pub fn cache_writes_enabled(&self) -> bool {
        self.values
            .get(WRITE_CACHE)
            .and_then(|v| v.as_bool())
            .unwrap_or(true)
    }

    pub fn should_read_cache(&self) -> bool {
        self.cache_key().is_some() && self.cache_reads_enabled()
    }

    pub fn should_write_cache(&self) -> bool {
        self.cache_key().is_some() && self.cache_writes_enabled()
    }

    pub fn expires_in(&self) -> Option<Duration> {
        self.values
            .get(EXPIRES_IN_SECS)
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs)
    }

    /// Snapshot mode: requested explicitly, or implied by holding a scroll
    /// token from a previous snapshot page
    pub fn uses_snapshot_paging(&self) -> bool {
        self.values
            .get(SNAPSHOT)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
            || self.scroll_id().is_some()
    }

    pub fn snapshot_lifetime(&self) -> Option<Duration> {
        self.values
            .get(SNAPSHOT_LIFETIME_SECS)
            .and_then(|v| v.as_u64())
            .map(Duration::from_secs)
    }

    pub fn scroll_id(&self) -> Option<&str> {
        self.values.get(SCROLL_ID).and_then(|v| v.as_str())
    }

    pub fn uses_search_after_paging(&self) -> bool {
        self.values
            .get(SEARCH_AFTER)
            .and_then(|v| v.as_bool())
            .unwrap_or(false)
    }

    pub fn search_after_values(&self) -> Option<Vec<Value>> {
        self.values
            .get(SEARCH_AFTER_VALUES)
            .and_then(|v| v.as_array())
            .cloned()
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging_defaults() {
        let options = CommandOptions::new();
        assert!(!options.has_page());
        assert_eq!(options.page(), 1);
        assert_eq!(options.limit(), None);

        let options = CommandOptions::new().with_page_limit(3, 25);
        assert!(options.has_page());
        assert_eq!(options.page(), 3);
        assert_eq!(options.limit(), Some(25));
    }

    #[test]
    fn test_cache_policy_requires_key() {
        let options = CommandOptions::new();
        assert!(!options.should_read_cache());
        assert!(!options.should_write_cache());

        let options = CommandOptions::new().with_cache_key("recent-orders");
        assert!(options.should_read_cache());
        assert!(options.should_write_cache());

        let options = CommandOptions::new()
            .with_cache_key("recent-orders")
            .without_cache_read();
        assert!(!options.should_read_cache());
        assert!(options.should_write_cache());
    }

    #[test]
    fn test_scroll_token_implies_snapshot_mode() {
        let options = CommandOptions::new().with_scroll_id("token-1");
        assert!(options.uses_snapshot_paging());
        assert_eq!(options.scroll_id(), Some("token-1"));
    }

    #[test]
    fn test_unrecognized_options_are_ignored() {
        let mut options = CommandOptions::new();
        options.set("consistency", json!("quorum"));
        assert_eq!(options.get("consistency"), Some(&json!("quorum")));
        // recognized accessors are unaffected
        assert!(!options.uses_snapshot_paging());
        assert!(!options.uses_search_after_paging());
    }
}
