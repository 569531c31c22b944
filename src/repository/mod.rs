//! The typed, cache-aware repository over the search store.

pub mod mapper;
pub mod read;

pub use read::ReadRepository;
