//! Collaborator capabilities: the store, cache, distributed lock and work
//! queue interfaces the repository layer is written against, plus the
//! in-process implementations used for tests and local development.

pub mod cache;
pub mod lock;
pub mod memory;
pub mod queue;
pub mod store;

pub use cache::{CacheClient, MemoryCache, NullCache, ScopedCache};
pub use lock::{LockProvider, MemoryLockProvider, ThrottlingLockProvider};
pub use memory::MemorySearchStore;
pub use queue::{MemoryWorkQueue, WorkQueue};
pub use store::{SearchStore, StoreError, StoreResult};
