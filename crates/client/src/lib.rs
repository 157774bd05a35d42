//! HTTP client for the partial store server.
//!
//! [`HttpClient`] implements [`ChunkSink`](spfe_upload::ChunkSink), so an
//! [`UploadOrchestrator`](spfe_upload::UploadOrchestrator) can push chunks
//! to a remote server, and fetches merge results.

mod client;

pub use client::HttpClient;

/// Errors from the HTTP client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("server error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ClientError {
    /// `true` when the server refused the request as invalid (4xx).
    pub fn is_rejection(&self) -> bool {
        matches!(self, Self::Api { status, .. } if (400..500).contains(status))
    }
}
