//! Reassembles the ordered manifest of a file from its stored partials.

use std::sync::Arc;

use spfe_protocol::{AggregateManifest, PartialRecord, chunk_index_from_key, file_prefix};
use tracing::{debug, info, warn};

use crate::{PartialStore, StoreError};

/// Lists and orders every partial record of a file.
#[derive(Clone)]
pub struct MergeAggregator {
    store: Arc<PartialStore>,
}

impl MergeAggregator {
    pub fn new(store: Arc<PartialStore>) -> Self {
        Self { store }
    }

    /// Builds the manifest for `file_id` from whatever is stored right now.
    ///
    /// Missing chunks are not an error and the declared `totalChunks` is
    /// not checked. Records that cannot be read or decoded are logged and
    /// skipped, as are keys that are not chunk records or records whose
    /// contents disagree with their key. When two records carry the same chunk index, the one with
    /// the highest `storedAt` is kept. Fails only when the listing itself
    /// fails on every backend.
    pub async fn merge(&self, file_id: &str) -> Result<AggregateManifest, StoreError> {
        if file_id.is_empty() {
            return Err(StoreError::InvalidInput("missing fileId".into()));
        }

        let prefix = file_prefix(file_id);
        let listing = self.store.list_by_prefix(&prefix).await?;
        debug!(file_id = %file_id, backend = %listing.role, keys = listing.keys.len(), "listed partials");

        let mut partials = Vec::with_capacity(listing.keys.len());
        for key in &listing.keys {
            let Some(index) = chunk_index_from_key(key) else {
                debug!(key = %key, "not a chunk record, ignoring");
                continue;
            };
            match self.store.get_from(listing.role, key).await {
                Ok(Some(record)) if record.chunk_index != index || record.file_id != file_id => {
                    warn!(
                        key = %key,
                        file_id = %record.file_id,
                        chunk = record.chunk_index,
                        "record does not match its key, skipping"
                    );
                }
                Ok(Some(record)) => partials.push(record),
                Ok(None) => debug!(key = %key, "partial vanished after listing"),
                Err(e) => warn!(key = %key, "skipping partial: {e}"),
            }
        }

        let partials = order_partials(partials);
        info!(file_id = %file_id, found = partials.len(), "merged partials");
        Ok(AggregateManifest::from_sorted(file_id, partials))
    }
}

/// Sorts by chunk index and keeps only the newest record per index.
fn order_partials(mut partials: Vec<PartialRecord>) -> Vec<PartialRecord> {
    partials.sort_by_key(|p| (p.chunk_index, p.stored_at));

    let mut out: Vec<PartialRecord> = Vec::with_capacity(partials.len());
    for record in partials {
        match out.last_mut() {
            Some(last) if last.chunk_index == record.chunk_index => {
                warn!(
                    chunk = record.chunk_index,
                    older = last.stored_at,
                    newer = record.stored_at,
                    "duplicate chunk index, keeping newest"
                );
                *last = record;
            }
            _ => out.push(record),
        }
    }
    out
}
