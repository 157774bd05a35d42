//! Backend trait implemented by every key-value surface the store can use.

use std::future::Future;
use std::pin::Pin;

/// A boxed future returned by backend methods.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, BackendError>> + Send + 'a>>;

/// Errors reported by a single backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

/// Minimal key-value contract: `put`, `list` by prefix, point `get`.
///
/// Keys use `/` separators (see [`spfe_protocol::keys`]). Bodies are opaque
/// bytes; the store writes JSON-encoded records.
pub trait PartialBackend: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &str;

    /// Writes `body` under `key`, replacing any previous value.
    fn put<'a>(&'a self, key: &'a str, body: Vec<u8>) -> BackendFuture<'a, ()>;

    /// Returns every key under `prefix`, in no particular order.
    fn list<'a>(&'a self, prefix: &'a str) -> BackendFuture<'a, Vec<String>>;

    /// Reads `key`. Returns `Ok(None)` when it does not exist.
    fn get<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<Vec<u8>>>;
}
