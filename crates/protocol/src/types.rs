use serde::{Deserialize, Serialize};

/// Durable metadata for one stored chunk.
///
/// Keyed in storage by `(file_id, chunk_index)`; a later write with the
/// same pair replaces this record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartialRecord {
    pub file_id: String,
    pub chunk_index: u32,
    /// Chunk count declared by the uploader. Never checked by the store.
    pub total_chunks: u32,
    /// Hex SHA-256 of the chunk bytes.
    pub hash: String,
    #[serde(alias = "len")]
    pub length: u64,
    /// Milliseconds since the Unix epoch.
    #[serde(alias = "ts")]
    pub stored_at: i64,
}

/// Ordered view of every partial record found for a file.
///
/// Derived on each merge request and never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateManifest {
    pub file_id: String,
    pub total_chunks_found: usize,
    pub hashes: Vec<String>,
    pub partials: Vec<PartialRecord>,
    pub generated_at: i64,
}

impl AggregateManifest {
    /// Builds a manifest from records already sorted by chunk index.
    pub fn from_sorted(file_id: impl Into<String>, partials: Vec<PartialRecord>) -> Self {
        Self {
            file_id: file_id.into(),
            total_chunks_found: partials.len(),
            hashes: partials.iter().map(|p| p.hash.clone()).collect(),
            partials,
            generated_at: now_millis(),
        }
    }

    /// Returns `true` when the found chunks cover every index declared by
    /// the first record, with no gaps.
    pub fn is_complete(&self) -> bool {
        let Some(first) = self.partials.first() else {
            return false;
        };
        self.total_chunks_found == first.total_chunks as usize
            && self
                .partials
                .iter()
                .enumerate()
                .all(|(i, p)| p.chunk_index as usize == i)
    }
}

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}
