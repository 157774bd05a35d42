//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, bail};
use spfe_client::HttpClient;
use spfe_partial_store::{FsBackend, PartialBackend, PartialStore};
use spfe_server::{ChunkServer, ServerConfig};
use spfe_upload::{ChunkState, ChunkStatus, FileSource, UploadEvent, UploadOrchestrator};

use crate::config::Config;

/// Builds the store from the configured directories.
pub fn build_store(config: &Config) -> PartialStore {
    let primary = config.primary_dir.as_ref().map(|dir| {
        let backend = FsBackend::new("primary", dir);
        tracing::info!(dir = %backend.root().display(), "primary backend");
        Arc::new(backend) as Arc<dyn PartialBackend>
    });
    let fallback = match &config.fallback_dir {
        Some(dir) => FsBackend::new("fallback", dir),
        None => FsBackend::ephemeral(),
    };
    tracing::info!(dir = %fallback.root().display(), "fallback backend");
    PartialStore::new(primary, Arc::new(fallback))
}

pub async fn serve(config: &Config) -> anyhow::Result<()> {
    let store = Arc::new(build_store(config));
    let server = ChunkServer::new(ServerConfig { addr: config.bind }, store);

    let signal_server = Arc::clone(&server);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_server.shutdown();
        }
    });

    server
        .run()
        .await
        .with_context(|| format!("server on {} failed", config.bind))
}

pub async fn upload(
    config: &Config,
    path: &Path,
    file_id: Option<String>,
    retries: u32,
) -> anyhow::Result<()> {
    let file_id = match file_id {
        Some(id) => id,
        None => path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .context("cannot derive a file id from the path, pass --file-id")?,
    };

    let source = FileSource::open(path)
        .await
        .with_context(|| format!("failed to open {}", path.display()))?;
    tracing::info!(
        path = %source.path().display(),
        file_id = %file_id,
        server = %config.server_url,
        "uploading"
    );
    let client = HttpClient::new(config.server_url.clone())?;
    let mut orch = UploadOrchestrator::new(
        file_id.clone(),
        Arc::new(source),
        Arc::new(client),
        config.chunk_size,
    );

    let total = orch.descriptors().len();
    if let Some(mut events) = orch.take_events() {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                match event {
                    UploadEvent::Chunk(state) if state.status.is_terminal() => {
                        eprintln!("chunk {}/{total} {}", state.index + 1, state.status);
                    }
                    UploadEvent::Finished { done, failed } => {
                        eprintln!("run finished: {done} done, {failed} failed");
                    }
                    UploadEvent::Chunk(_) => {}
                }
            }
        });
    }

    let mut states = orch.run(config.concurrency).await;
    for round in 1..=retries {
        let failed: Vec<u32> = failed_indices(&states);
        if failed.is_empty() {
            break;
        }
        tracing::info!(round, chunks = failed.len(), "retrying failed chunks");
        for index in failed {
            if let Err(e) = orch.retry(index).await {
                tracing::warn!(chunk = index, "retry not possible: {e}");
            }
        }
        states = orch.states();
    }

    print_summary(&file_id, &states);

    let failed = failed_indices(&states);
    if !failed.is_empty() {
        bail!("{} of {} chunks failed: {:?}", failed.len(), states.len(), failed);
    }
    Ok(())
}

pub async fn merge(config: &Config, file_id: &str) -> anyhow::Result<()> {
    let client = HttpClient::new(config.server_url.clone())?;
    let manifest = client
        .merge(file_id)
        .await
        .with_context(|| format!("merge of {file_id} failed"))?;
    println!("{}", serde_json::to_string_pretty(&manifest)?);
    Ok(())
}

fn failed_indices(states: &[ChunkState]) -> Vec<u32> {
    states
        .iter()
        .filter(|s| s.status == ChunkStatus::Error)
        .map(|s| s.index)
        .collect()
}

fn print_summary(file_id: &str, states: &[ChunkState]) {
    println!("{file_id}: {} chunks", states.len());
    for state in states {
        let detail = match (&state.partial, &state.error) {
            (Some(partial), _) => format!("{} ({} bytes)", partial.hash, partial.length),
            (None, Some(error)) => error.clone(),
            (None, None) => String::new(),
        };
        println!("  chunk {:>4}  {:<9} {detail}", state.index, state.status.to_string());
    }
}
