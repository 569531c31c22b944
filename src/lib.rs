//! Typed, cache-aware repository layer over a distributed search engine.
//!
//! The crate splits into a few layers:
//!
//! - [`capability`]: the async trait seams the repository is written
//!   against (search store, cache, distributed lock, work queue), plus
//!   in-process implementations for tests and local development.
//! - [`protocol`]: the concrete wire model, requests the pipeline emits
//!   and responses the store decodes.
//! - [`index`]: versioned index descriptors, alias management and the
//!   reindex orchestrator that reacts to schema version drift.
//! - [`query`]: the abstract query model, command options, expression
//!   parsing and the builder pipeline that lowers all of it into one
//!   search request.
//! - [`models`]: typed results, the uniform aggregation model and
//!   per-type capability descriptors.
//! - [`repository`]: [`repository::ReadRepository`], tying the layers
//!   together into cached, paginated, typed reads.

pub mod capability;
pub mod config;
pub mod error;
pub mod index;
pub mod models;
pub mod protocol;
pub mod query;
pub mod repository;

pub use config::RepositoryConfig;
pub use error::{RepositoryError, Result};
pub use models::{AggregateResult, CountResult, DocumentType, FindHit, FindResults, PageCursor};
pub use query::{CommandOptions, RepositoryQuery, SoftDeleteMode};
pub use repository::ReadRepository;
