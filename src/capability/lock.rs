//! Distributed lock capability.
//!
//! Production deployments back this with a process-external lock store so it
//! serializes across a fleet; the in-process implementations here serve
//! tests and single-node development.

use crate::config::ReindexConfig;
use async_trait::async_trait;
use dashmap::DashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Releases the underlying lock when dropped
pub struct LockGuard {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl LockGuard {
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    /// Guard for locks with nothing to release (throttle windows)
    pub fn noop() -> Self {
        Self { release: None }
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

/// Distributed lock capability
#[async_trait]
pub trait LockProvider: Send + Sync {
    /// Whether the named lock is currently held by anyone
    async fn is_locked(&self, key: &str) -> bool;

    /// Try to acquire the named lock within `timeout`; `None` when it could
    /// not be acquired or the token was cancelled first.
    async fn acquire(
        &self,
        key: &str,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Option<LockGuard>;
}

/// Run `action` only if the lock is acquired within `timeout`; otherwise a
/// no-op. Returns the action's output when it ran.
pub async fn try_using<F, T>(
    provider: &dyn LockProvider,
    key: &str,
    timeout: Duration,
    token: &CancellationToken,
    action: F,
) -> Option<T>
where
    F: Future<Output = T> + Send,
{
    let guard = provider.acquire(key, timeout, token).await?;
    let output = action.await;
    drop(guard);
    Some(output)
}

const ACQUIRE_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// In-process mutual-exclusion lock provider
#[derive(Clone, Default)]
pub struct MemoryLockProvider {
    held: Arc<DashMap<String, Instant>>,
}

impl MemoryLockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a lock as held without going through `acquire` (tests simulating
    /// a migration already running elsewhere)
    pub fn hold(&self, key: &str) {
        self.held.insert(key.to_string(), Instant::now());
    }

    pub fn release(&self, key: &str) {
        self.held.remove(key);
    }
}

#[async_trait]
impl LockProvider for MemoryLockProvider {
    async fn is_locked(&self, key: &str) -> bool {
        self.held.contains_key(key)
    }

    async fn acquire(
        &self,
        key: &str,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Option<LockGuard> {
        let deadline = Instant::now() + timeout;

        loop {
            if token.is_cancelled() {
                return None;
            }

            let mut acquired = false;
            self.held.entry(key.to_string()).or_insert_with(|| {
                acquired = true;
                Instant::now()
            });

            if acquired {
                let held = self.held.clone();
                let key = key.to_string();
                return Some(LockGuard::new(move || {
                    held.remove(&key);
                }));
            }

            if Instant::now() >= deadline {
                return None;
            }

            tokio::time::sleep(ACQUIRE_POLL_INTERVAL.min(deadline - Instant::now())).await;
        }
    }
}

struct ThrottleWindow {
    started: Instant,
    hits: u32,
}

/// Fixed-window throttling lock: at most `max_hits` acquisitions per key per
/// window. Used as the global reindex-enqueue throttle so a fleet of
/// concurrently-starting processes collapses into a single enqueue.
#[derive(Clone)]
pub struct ThrottlingLockProvider {
    windows: Arc<DashMap<String, ThrottleWindow>>,
    window: Duration,
    max_hits: u32,
}

impl ThrottlingLockProvider {
    pub fn new(max_hits: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            window,
            max_hits,
        }
    }

    /// Throttle sized from the reindex configuration:
    /// `throttle_max_hits` acquisitions per `throttle_window_secs` window
    pub fn from_config(config: &ReindexConfig) -> Self {
        Self::new(config.throttle_max_hits, config.throttle_window())
    }
}

#[async_trait]
impl LockProvider for ThrottlingLockProvider {
    async fn is_locked(&self, key: &str) -> bool {
        match self.windows.get(key) {
            Some(w) => w.started.elapsed() < self.window && w.hits >= self.max_hits,
            None => false,
        }
    }

    async fn acquire(
        &self,
        key: &str,
        timeout: Duration,
        token: &CancellationToken,
    ) -> Option<LockGuard> {
        let deadline = Instant::now() + timeout;

        loop {
            if token.is_cancelled() {
                return None;
            }

            let mut entry = self
                .windows
                .entry(key.to_string())
                .or_insert_with(|| ThrottleWindow {
                    started: Instant::now(),
                    hits: 0,
                });

            if entry.started.elapsed() >= self.window {
                entry.started = Instant::now();
                entry.hits = 0;
            }

            if entry.hits < self.max_hits {
                entry.hits += 1;
                // nothing to release: the consumed hit is the state
                return Some(LockGuard::noop());
            }

            let window_ends = entry.started + self.window;
            drop(entry);

            let now = Instant::now();
            if now >= deadline {
                return None;
            }

            tokio::time::sleep((window_ends - now).min(deadline - now)).await;
        }
    }
}
