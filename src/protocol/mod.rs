//! Engine-facing wire model: the concrete search request produced by the
//! query pipeline and the response shapes decoded from the store.

pub mod request;
pub mod response;

pub use request::{SearchRequest, SortOrder, SortSpec, WireQuery};
pub use response::{SearchResponse, WireAggregate, WireBucket, WireHit, WirePercentile};
