//! Durable storage of partial chunk records.
//!
//! A [`PartialStore`] writes to an optional primary [`PartialBackend`] and
//! degrades to a fallback backend when the primary fails. The two are not
//! replicas: each call picks whichever backend answers first, so a record
//! written to the fallback stays invisible to a listing the primary answers.
//!
//! On top of the store sit the two server-side operations:
//! [`ChunkUploader`] (hash + record + put) and [`MergeAggregator`]
//! (list + sort into an [`AggregateManifest`](spfe_protocol::AggregateManifest)).

mod backend;
mod fs;
mod memory;
mod merge;
mod store;
mod uploader;

pub use backend::{BackendError, BackendFuture, PartialBackend};
pub use fs::FsBackend;
pub use memory::MemoryBackend;
pub use merge::MergeAggregator;
pub use store::{BackendRole, Listing, PartialStore};
pub use uploader::ChunkUploader;

/// Errors produced by the partial store and the operations built on it.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Primary (if configured) and fallback both failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("undecodable record at {key}: {source}")]
    Parse {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
