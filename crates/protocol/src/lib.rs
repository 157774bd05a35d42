//! Wire and storage types for the SPFE chunk upload pipeline.
//!
//! JSON field names follow the original service (camelCase), so records
//! written by either implementation decode in the other.

pub mod keys;
pub mod messages;
pub mod types;

pub use keys::{chunk_index_from_key, escape_file_id, file_prefix, partial_key};
pub use messages::{ErrorResponse, MergeQuery, MergeResponse, StoreChunkRequest, StoreChunkResponse};
pub use types::{AggregateManifest, PartialRecord, now_millis};
