//! Server-side handling of one uploaded chunk.

use std::sync::Arc;

use spfe_protocol::{PartialRecord, now_millis};
use spfe_transfer::checksum_bytes;
use tracing::debug;

use crate::{PartialStore, StoreError};

/// Hashes chunk bytes, builds the [`PartialRecord`] and persists it.
///
/// Exactly one store write per call and no internal retry: a failed write
/// surfaces as [`StoreError::Unavailable`] and retrying is up to the caller.
#[derive(Clone)]
pub struct ChunkUploader {
    store: Arc<PartialStore>,
}

impl ChunkUploader {
    pub fn new(store: Arc<PartialStore>) -> Self {
        Self { store }
    }

    /// Stores `bytes` as chunk `chunk_index` of `file_id`.
    ///
    /// Uploading the same bytes twice under the same index overwrites the
    /// record with an identical `hash` and `length`.
    pub async fn upload(
        &self,
        file_id: &str,
        chunk_index: u32,
        total_chunks: u32,
        bytes: &[u8],
    ) -> Result<PartialRecord, StoreError> {
        if file_id.is_empty() {
            return Err(StoreError::InvalidInput("missing fileId".into()));
        }

        let record = PartialRecord {
            file_id: file_id.to_string(),
            chunk_index,
            total_chunks,
            hash: checksum_bytes(bytes),
            length: bytes.len() as u64,
            stored_at: now_millis(),
        };

        let role = self.store.put(&record).await?;
        debug!(
            file_id = %file_id,
            chunk = chunk_index,
            bytes = record.length,
            backend = %role,
            "chunk stored"
        );
        Ok(record)
    }
}
