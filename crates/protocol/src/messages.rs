use base64::{Engine, engine::general_purpose::STANDARD};
use serde::{Deserialize, Serialize};

use crate::types::{AggregateManifest, PartialRecord};

// ---------------------------------------------------------------------------
// Request payloads
// ---------------------------------------------------------------------------

/// Stores one chunk.
///
/// Fields stay optional so the server can reject an incomplete request
/// instead of storing it under a made-up index. The payload stays a raw
/// string so a missing chunk is told apart from a malformed one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreChunkRequest {
    #[serde(default)]
    pub file_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chunk_index: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_chunks: Option<u32>,
    #[serde(
        default,
        alias = "chunkBase64",
        skip_serializing_if = "Option::is_none"
    )]
    pub chunk_bytes_base64: Option<String>,
}

impl StoreChunkRequest {
    /// Builds a request, base64-encoding `data`.
    pub fn new(file_id: impl Into<String>, chunk_index: u32, total_chunks: u32, data: &[u8]) -> Self {
        Self {
            file_id: file_id.into(),
            chunk_index: Some(chunk_index),
            total_chunks: Some(total_chunks),
            chunk_bytes_base64: Some(STANDARD.encode(data)),
        }
    }

    /// Decodes the chunk payload.
    ///
    /// Returns `Ok(None)` when the payload is absent. An empty string is a
    /// valid zero-length chunk.
    pub fn decode_chunk(&self) -> Result<Option<Vec<u8>>, base64::DecodeError> {
        match &self.chunk_bytes_base64 {
            Some(s) => Ok(Some(STANDARD.decode(s)?)),
            None => Ok(None),
        }
    }
}

/// Query string of the merge operation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeQuery {
    #[serde(default)]
    pub file_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Response payloads
// ---------------------------------------------------------------------------

/// Successful store-chunk response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreChunkResponse {
    pub ok: bool,
    pub partial: PartialRecord,
}

/// Successful merge response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergeResponse {
    pub ok: bool,
    pub aggregate: AggregateManifest,
}

/// Body of every failed request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub ok: bool,
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            ok: false,
            error: error.into(),
        }
    }
}
