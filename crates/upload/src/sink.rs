//! Where chunk bytes go.

use std::future::Future;
use std::pin::Pin;

use spfe_partial_store::ChunkUploader;
use spfe_protocol::PartialRecord;

use crate::UploadError;

/// A boxed future returned by [`ChunkSink::store_chunk`].
pub type SinkFuture<'a> = Pin<Box<dyn Future<Output = Result<PartialRecord, UploadError>> + Send + 'a>>;

/// Destination of uploaded chunks.
///
/// Implemented in-process by [`LocalSink`] and over HTTP by
/// `spfe_client::HttpClient`. Keeping it a trait lets the orchestrator run
/// against mocks in tests.
pub trait ChunkSink: Send + Sync {
    /// Stores one chunk and returns the record the store persisted.
    fn store_chunk<'a>(
        &'a self,
        file_id: &'a str,
        chunk_index: u32,
        total_chunks: u32,
        data: Vec<u8>,
    ) -> SinkFuture<'a>;
}

/// Stores chunks directly through a [`ChunkUploader`].
#[derive(Clone)]
pub struct LocalSink {
    uploader: ChunkUploader,
}

impl LocalSink {
    pub fn new(uploader: ChunkUploader) -> Self {
        Self { uploader }
    }
}

impl ChunkSink for LocalSink {
    fn store_chunk<'a>(
        &'a self,
        file_id: &'a str,
        chunk_index: u32,
        total_chunks: u32,
        data: Vec<u8>,
    ) -> SinkFuture<'a> {
        Box::pin(async move {
            let record = self
                .uploader
                .upload(file_id, chunk_index, total_chunks, &data)
                .await?;
            Ok(record)
        })
    }
}
