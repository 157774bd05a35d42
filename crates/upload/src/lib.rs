//! Client-side chunk upload orchestration.
//!
//! The [`UploadOrchestrator`] plans a file into chunks and drains them with a
//! fixed pool of workers. Each worker claims the next index from a shared
//! counter, reads the chunk from a [`ChunkSource`], hands it to a
//! [`ChunkSink`] and publishes the chunk's new [`ChunkState`]. A failing
//! chunk never stops its siblings; it stays in `error` until the caller
//! retries it with [`UploadOrchestrator::retry`].
//!
//! This crate has no transport dependency. `LocalSink` stores chunks
//! in-process; the HTTP sink lives in `spfe-client`.

mod orchestrator;
mod sink;
mod source;
mod state;

pub use orchestrator::{UploadEvent, UploadOrchestrator};
pub use sink::{ChunkSink, LocalSink, SinkFuture};
pub use source::{ChunkSource, FileSource, MemorySource, SourceFuture};
pub use state::{ChunkState, ChunkStatus, ChunkTable};

/// Errors produced while uploading a chunk.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("read error: {0}")]
    Read(#[from] spfe_transfer::TransferError),

    #[error("store error: {0}")]
    Store(#[from] spfe_partial_store::StoreError),

    /// Network or protocol failure talking to a remote store.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote store refused the request as invalid.
    #[error("rejected: {0}")]
    Rejected(String),

    #[error("unknown chunk index {0}")]
    UnknownChunk(u32),

    #[error("chunk {index} is {status}, only failed chunks can be retried")]
    NotRetryable { index: u32, status: ChunkStatus },
}
