//! Route configuration and handlers.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{DefaultBodyLimit, Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{Value, json};
use spfe_partial_store::{ChunkUploader, MergeAggregator};
use spfe_protocol::{MergeQuery, MergeResponse, StoreChunkRequest, StoreChunkResponse};

use crate::error::{ApiError, ApiResult};

/// Largest accepted request body.
pub const MAX_BODY_SIZE: usize = 16 * 1024 * 1024;

/// Room left in the body for the JSON fields around the payload.
const ENVELOPE_ALLOWANCE: usize = 64 * 1024;

/// Largest chunk whose base64 request still fits in [`MAX_BODY_SIZE`].
pub const MAX_CHUNK_SIZE: u64 = ((MAX_BODY_SIZE - ENVELOPE_ALLOWANCE) / 4 * 3) as u64;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub uploader: ChunkUploader,
    pub merger: MergeAggregator,
}

/// Builds the application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/chunks", post(store_chunk))
        .route("/api/merge", get(merge))
        // Legacy serverless-function paths.
        .route("/.netlify/functions/upload-chunk", post(store_chunk))
        .route("/.netlify/functions/merge-results", get(merge))
        .layer(DefaultBodyLimit::max(MAX_BODY_SIZE))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

async fn store_chunk(
    State(state): State<AppState>,
    payload: Result<Json<StoreChunkRequest>, JsonRejection>,
) -> ApiResult<Json<StoreChunkResponse>> {
    let Json(req) = payload?;

    let bytes = req
        .decode_chunk()
        .map_err(|e| ApiError::InvalidInput(format!("invalid chunk encoding: {e}")))?
        .ok_or_else(|| ApiError::InvalidInput("no chunk".into()))?;
    if req.file_id.is_empty() {
        return Err(ApiError::InvalidInput("missing fileId".into()));
    }
    let chunk_index = req
        .chunk_index
        .ok_or_else(|| ApiError::InvalidInput("missing chunkIndex".into()))?;
    let total_chunks = match req.total_chunks {
        None => return Err(ApiError::InvalidInput("missing totalChunks".into())),
        Some(0) => {
            return Err(ApiError::InvalidInput("totalChunks must be at least 1".into()));
        }
        Some(n) => n,
    };

    let partial = state
        .uploader
        .upload(&req.file_id, chunk_index, total_chunks, &bytes)
        .await?;
    Ok(Json(StoreChunkResponse { ok: true, partial }))
}

async fn merge(
    State(state): State<AppState>,
    query: Result<Query<MergeQuery>, QueryRejection>,
) -> ApiResult<Json<MergeResponse>> {
    let Query(query) = query?;
    let file_id = query
        .file_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::InvalidInput("missing fileId".into()))?;

    let aggregate = state.merger.merge(&file_id).await?;
    Ok(Json(MergeResponse {
        ok: true,
        aggregate,
    }))
}
