//! Chunk planning, hashing and ranged reads.
//!
//! Everything here is synchronous and free of shared state; async callers
//! wrap file reads in `spawn_blocking`.

mod chunked;
mod planner;
mod validation;

pub use chunked::{checksum_bytes, read_range};
pub use planner::{ChunkDescriptor, plan};
pub use validation::validate_key;

/// Default chunk size: 2 MiB.
pub const DEFAULT_CHUNK_SIZE: u64 = 2 * 1024 * 1024;

/// Errors produced by the transfer crate.
#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("short read at byte {offset}: wanted {wanted}, got {got}")]
    ShortRead { offset: u64, wanted: u64, got: u64 },

    #[error("invalid key: {0}")]
    InvalidKey(String),
}
