//! Work queue capability.
//!
//! The orchestrator only enqueues; consuming and executing work items is the
//! responsibility of external workers.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

/// Result type for queue operations
pub type QueueResult<T> = std::result::Result<T, QueueError>;

/// Queue operation failure
#[derive(Debug, thiserror::Error)]
#[error("Queue error: {0}")]
pub struct QueueError(pub String);

/// Work queue capability
#[async_trait]
pub trait WorkQueue<T: Send + Sync + 'static>: Send + Sync {
    async fn enqueue(&self, item: T) -> QueueResult<()>;
}

/// In-process FIFO queue
#[derive(Clone)]
pub struct MemoryWorkQueue<T> {
    items: Arc<Mutex<VecDeque<T>>>,
}

impl<T> MemoryWorkQueue<T> {
    pub fn new() -> Self {
        Self {
            items: Arc::new(Mutex::new(VecDeque::new())),
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    pub fn dequeue(&self) -> Option<T> {
        self.items.lock().pop_front()
    }
}

impl<T> Default for MemoryWorkQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<T: Send + Sync + 'static> WorkQueue<T> for MemoryWorkQueue<T> {
    async fn enqueue(&self, item: T) -> QueueResult<()> {
        self.items.lock().push_back(item);
        Ok(())
    }
}
