//! Async HTTP client using `reqwest`.

use serde::Serialize;
use serde::de::DeserializeOwned;
use spfe_protocol::{
    AggregateManifest, ErrorResponse, MergeResponse, PartialRecord, StoreChunkRequest,
    StoreChunkResponse,
};
use spfe_upload::{ChunkSink, SinkFuture, UploadError};

use crate::ClientError;

const CHUNKS_PATH: &str = "/api/chunks";
const MERGE_PATH: &str = "/api/merge";

/// Client for one partial store server.
#[derive(Clone)]
pub struct HttpClient {
    http: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    /// Creates a client for the server at `base_url` (e.g. `http://127.0.0.1:8787`).
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stores one chunk and returns the persisted record.
    pub async fn store_chunk(
        &self,
        file_id: &str,
        chunk_index: u32,
        total_chunks: u32,
        data: &[u8],
    ) -> Result<PartialRecord, ClientError> {
        let req = StoreChunkRequest::new(file_id, chunk_index, total_chunks, data);
        let resp: StoreChunkResponse = self.post(CHUNKS_PATH, &req).await?;
        Ok(resp.partial)
    }

    /// Fetches the aggregate manifest of `file_id`.
    pub async fn merge(&self, file_id: &str) -> Result<AggregateManifest, ClientError> {
        let url = format!("{}{MERGE_PATH}", self.base_url);
        let resp = self
            .http
            .get(&url)
            .query(&[("fileId", file_id)])
            .send()
            .await?;
        let resp: MergeResponse = decode(resp).await?;
        Ok(resp.aggregate)
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ClientError> {
        let url = format!("{}{path}", self.base_url);
        let resp = self.http.post(&url).json(body).send().await?;
        decode(resp).await
    }
}

/// Decodes a success body, or turns an error body into [`ClientError::Api`].
async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, ClientError> {
    let status = resp.status();
    let body = resp.bytes().await?;

    if !status.is_success() {
        let message = serde_json::from_slice::<ErrorResponse>(&body)
            .map(|e| e.error)
            .unwrap_or_else(|_| String::from_utf8_lossy(&body).into_owned());
        return Err(ClientError::Api {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_slice(&body)?)
}

impl From<ClientError> for UploadError {
    fn from(e: ClientError) -> Self {
        match e {
            ClientError::Api { status, message } if (400..500).contains(&status) => {
                UploadError::Rejected(message)
            }
            other => UploadError::Transport(other.to_string()),
        }
    }
}

impl ChunkSink for HttpClient {
    fn store_chunk<'a>(
        &'a self,
        file_id: &'a str,
        chunk_index: u32,
        total_chunks: u32,
        data: Vec<u8>,
    ) -> SinkFuture<'a> {
        Box::pin(async move {
            let record = HttpClient::store_chunk(self, file_id, chunk_index, total_chunks, &data)
                .await?;
            tracing::debug!(file_id, chunk = chunk_index, "chunk sent");
            Ok(record)
        })
    }
}
