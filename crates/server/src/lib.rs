//! HTTP server for the partial store.
//!
//! Exposes the two external operations as JSON endpoints:
//!
//! - `POST /api/chunks` stores one base64-encoded chunk
//! - `GET /api/merge?fileId=..` returns the aggregate manifest
//!
//! Both are also mounted under their legacy serverless-function paths so
//! existing clients keep working.

mod error;
mod routes;
mod server;

pub use error::{ApiError, ApiResult};
pub use routes::{AppState, MAX_BODY_SIZE, MAX_CHUNK_SIZE, router};
pub use server::{ChunkServer, ServerConfig};

/// Errors produced by the server lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("server already running")]
    AlreadyRunning,
}
