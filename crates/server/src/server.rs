//! Server lifecycle: bind, serve, graceful shutdown.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use spfe_partial_store::{ChunkUploader, MergeAggregator, PartialStore};
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;

use crate::ServerError;
use crate::routes::{AppState, router};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (port 0 = OS-assigned).
    pub addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: ([127, 0, 0, 1], 0).into(),
        }
    }
}

/// HTTP server in front of a [`PartialStore`].
pub struct ChunkServer {
    addr: SocketAddr,
    state: AppState,
    cancel: CancellationToken,
    local_addr: Mutex<Option<SocketAddr>>,
    running: AtomicBool,
}

impl ChunkServer {
    pub fn new(config: ServerConfig, store: Arc<PartialStore>) -> Arc<Self> {
        Arc::new(Self {
            addr: config.addr,
            state: AppState {
                uploader: ChunkUploader::new(Arc::clone(&store)),
                merger: MergeAggregator::new(store),
            },
            cancel: CancellationToken::new(),
            local_addr: Mutex::new(None),
            running: AtomicBool::new(false),
        })
    }

    /// Returns the local address the server is listening on.
    ///
    /// Only available after [`run`](Self::run) binds the socket.
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock().await
    }

    /// Base URL clients should use, once bound.
    pub async fn base_url(&self) -> Option<String> {
        self.local_addr().await.map(|a| format!("http://{a}"))
    }

    /// Stops accepting requests and lets in-flight ones finish.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Runs the server until [`shutdown`](Self::shutdown) is called.
    pub async fn run(self: &Arc<Self>) -> Result<(), ServerError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ServerError::AlreadyRunning);
        }

        let result = self.serve().await;
        *self.local_addr.lock().await = None;
        self.running.store(false, Ordering::SeqCst);
        result
    }

    async fn serve(&self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.addr).await?;
        let local_addr = listener.local_addr()?;
        *self.local_addr.lock().await = Some(local_addr);
        tracing::info!("partial store server listening on {local_addr}");

        let cancel = self.cancel.clone();
        axum::serve(listener, router(self.state.clone()))
            .with_graceful_shutdown(async move {
                cancel.cancelled().await;
                tracing::info!("server shutting down");
            })
            .await?;
        Ok(())
    }
}
