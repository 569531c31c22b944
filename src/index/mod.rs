//! Index lifecycle management: versioned index creation, alias binding and
//! background reindex orchestration.

pub mod descriptor;
pub mod manager;
pub mod reindex;

pub use descriptor::{ChildTypeDescriptor, IndexDescriptor, UNKNOWN_VERSION};
pub use manager::{IndexConfigurator, IndexVersionManager};
pub use reindex::{ParentMap, ReindexOrchestrator, ReindexWorkItem};
