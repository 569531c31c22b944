//! Reindex orchestration: enqueue a migration job exactly once when the
//! aliased schema version falls behind the descriptor.
//!
//! The orchestrator never performs the data copy; its job ends at a
//! successful enqueue. An external worker consumes the queue, copies
//! documents to the new physical index and repoints the alias.

use crate::capability::lock::{try_using, LockProvider};
use crate::capability::queue::WorkQueue;
use crate::config::ReindexConfig;
use crate::error::{RepositoryError, Result};
use crate::index::descriptor::IndexDescriptor;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

/// Global throttle key: at most one enqueue attempt fleet-wide per window
const ENQUEUE_LOCK_KEY: &str = "enqueue-reindex";

/// Parent/child routing a migration worker must preserve
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ParentMap {
    pub type_name: String,
    pub parent_field: String,
}

/// One migration job: copy `old_index` into `new_index`, repoint `alias`,
/// optionally delete the source. Owned by the queue until a worker claims it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReindexWorkItem {
    pub id: Uuid,
    pub old_index: String,
    pub new_index: String,
    pub alias: String,
    pub delete_old: bool,
    pub parent_maps: Vec<ParentMap>,
}

impl ReindexWorkItem {
    /// Lock key identifying this migration while it is in flight
    pub fn migration_lock_key(&self) -> String {
        format!("reindex:{}{}{}", self.alias, self.old_index, self.new_index)
    }
}

/// Decides whether a descriptor needs migration and enqueues the work item,
/// guarded by the per-migration lock and the global enqueue throttle.
pub struct ReindexOrchestrator {
    lock: Arc<dyn LockProvider>,
    queue: Arc<dyn WorkQueue<ReindexWorkItem>>,
    config: ReindexConfig,
}

impl ReindexOrchestrator {
    pub fn new(
        lock: Arc<dyn LockProvider>,
        queue: Arc<dyn WorkQueue<ReindexWorkItem>>,
        config: ReindexConfig,
    ) -> Self {
        Self {
            lock,
            queue,
            config,
        }
    }

    /// Enqueue a migration when `current_version` is behind the descriptor.
    /// Unknown versions (< 1) are never migrated. Returns whether an item
    /// was enqueued; "migration already running" and "throttled" are both
    /// expected steady-state outcomes, not errors.
    pub async fn ensure_current(
        &self,
        descriptor: &IndexDescriptor,
        current_version: i32,
        token: &CancellationToken,
    ) -> Result<bool> {
        if current_version >= descriptor.version || current_version < 1 {
            return Ok(false);
        }

        let item = ReindexWorkItem {
            id: Uuid::new_v4(),
            old_index: format!("{}-v{}", descriptor.alias, current_version),
            new_index: descriptor.versioned_name(),
            alias: descriptor.alias.clone(),
            delete_old: self.config.delete_old_index,
            parent_maps: descriptor
                .children
                .iter()
                .map(|c| ParentMap {
                    type_name: c.name.clone(),
                    parent_field: c.parent_field.clone(),
                })
                .collect(),
        };

        if self.lock.is_locked(&item.migration_lock_key()).await {
            tracing::debug!(
                alias = %item.alias,
                old_index = %item.old_index,
                new_index = %item.new_index,
                "Migration already running, skipping enqueue"
            );
            return Ok(false);
        }

        let enqueued = try_using(
            self.lock.as_ref(),
            ENQUEUE_LOCK_KEY,
            Duration::ZERO,
            token,
            self.queue.enqueue(item.clone()),
        )
        .await;

        match enqueued {
            Some(Ok(())) => {
                tracing::info!(
                    alias = %item.alias,
                    old_index = %item.old_index,
                    new_index = %item.new_index,
                    work_item = %item.id,
                    "Reindex work item enqueued"
                );
                Ok(true)
            }
            Some(Err(err)) => Err(RepositoryError::Internal(format!(
                "failed to enqueue reindex for {}: {}",
                item.alias, err
            ))),
            None => {
                // throttled out: another process enqueued inside this window
                tracing::debug!(alias = %item.alias, "Reindex enqueue throttled");
                Ok(false)
            }
        }
    }
}
