//! Bounded worker pool driving every chunk of one file to a terminal state.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use spfe_transfer::{ChunkDescriptor, plan};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::UploadError;
use crate::sink::ChunkSink;
use crate::source::ChunkSource;
use crate::state::{ChunkState, ChunkStatus, ChunkTable};

/// Event channel capacity. Events are dropped, not awaited, when full.
const EVENT_BUFFER_SIZE: usize = 1024;

/// Progress event emitted while uploading.
#[derive(Debug, Clone, PartialEq)]
pub enum UploadEvent {
    /// A chunk's state was replaced.
    Chunk(ChunkState),
    /// A run finished; every chunk is terminal.
    Finished { done: usize, failed: usize },
}

/// Uploads the chunks of one file with a fixed number of workers.
pub struct UploadOrchestrator {
    inner: Arc<Inner>,
    events_rx: Option<mpsc::Receiver<UploadEvent>>,
}

struct Inner {
    file_id: String,
    descriptors: Vec<ChunkDescriptor>,
    source: Arc<dyn ChunkSource>,
    sink: Arc<dyn ChunkSink>,
    /// Chunk count declared to the sink.
    total_chunks: u32,
    table: ChunkTable,
    events_tx: mpsc::Sender<UploadEvent>,
}

impl UploadOrchestrator {
    /// Plans `source` into chunks of `chunk_size` bytes.
    ///
    /// A `chunk_size` of 0 uses [`spfe_transfer::DEFAULT_CHUNK_SIZE`].
    pub fn new(
        file_id: impl Into<String>,
        source: Arc<dyn ChunkSource>,
        sink: Arc<dyn ChunkSink>,
        chunk_size: u64,
    ) -> Self {
        let descriptors = plan(source.size(), chunk_size);
        let total_chunks = descriptors.last().map_or(1, |d| d.index + 1);
        let (events_tx, events_rx) = mpsc::channel(EVENT_BUFFER_SIZE);
        Self {
            inner: Arc::new(Inner {
                file_id: file_id.into(),
                total_chunks,
                table: ChunkTable::new(total_chunks),
                descriptors,
                source,
                sink,
                events_tx,
            }),
            events_rx: Some(events_rx),
        }
    }

    /// Takes the event receiver. Can only be called once.
    pub fn take_events(&mut self) -> Option<mpsc::Receiver<UploadEvent>> {
        self.events_rx.take()
    }

    pub fn file_id(&self) -> &str {
        &self.inner.file_id
    }

    /// The planned chunks, ordered by index.
    pub fn descriptors(&self) -> &[ChunkDescriptor] {
        &self.inner.descriptors
    }

    /// Current state of every chunk. Never blocks on in-flight uploads.
    pub fn states(&self) -> Vec<ChunkState> {
        self.inner.table.snapshot()
    }

    /// Current state of one chunk.
    pub fn state(&self, index: u32) -> Option<ChunkState> {
        self.inner.table.get(index)
    }

    /// Uploads every chunk with `concurrency` workers.
    ///
    /// Starts a fresh session: all chunks are reset to pending first.
    /// Workers claim indices in increasing order from a shared counter;
    /// completion order is unconstrained. Returns once every chunk the
    /// workers claimed is `done` or `error`. A failed chunk never aborts the
    /// run. A chunk being retried concurrently is reported as the retry
    /// left it at that moment.
    pub async fn run(&self, concurrency: usize) -> Vec<ChunkState> {
        let inner = &self.inner;
        let total = inner.descriptors.len();
        let workers = concurrency.clamp(1, total);

        inner.table.reset();
        info!(
            file_id = %inner.file_id,
            chunks = total,
            workers,
            "upload started"
        );

        let next = Arc::new(AtomicUsize::new(0));
        let mut pool = JoinSet::new();
        for worker in 0..workers {
            let inner = Arc::clone(inner);
            let next = Arc::clone(&next);
            pool.spawn(async move {
                loop {
                    let i = next.fetch_add(1, Ordering::SeqCst);
                    if i >= inner.descriptors.len() {
                        break;
                    }
                    // One task per chunk so a panic is pinned to its index.
                    let task = {
                        let inner = Arc::clone(&inner);
                        tokio::spawn(async move { inner.process(i).await })
                    };
                    if let Err(e) = task.await {
                        let index = inner.descriptors[i].index;
                        error!(file_id = %inner.file_id, chunk = index, "chunk upload aborted: {e}");
                        inner.publish(ChunkState::failed(index, "upload worker aborted"));
                    }
                }
                debug!(worker, "worker exiting");
            });
        }

        while let Some(joined) = pool.join_next().await {
            if let Err(e) = joined {
                error!(file_id = %inner.file_id, "upload worker aborted: {e}");
            }
        }

        let (done, failed) = inner.table.tally();
        info!(file_id = %inner.file_id, done, failed, "upload finished");
        inner.emit(UploadEvent::Finished { done, failed });
        inner.table.snapshot()
    }

    /// Re-uploads one failed chunk, outside the worker pool.
    ///
    /// Safe to call while a run is uploading other chunks. Callers must not
    /// retry the same index concurrently.
    pub async fn retry(&self, index: u32) -> Result<ChunkState, UploadError> {
        let inner = &self.inner;
        let current = inner
            .table
            .get(index)
            .ok_or(UploadError::UnknownChunk(index))?;
        if current.status != ChunkStatus::Error {
            return Err(UploadError::NotRetryable {
                index,
                status: current.status,
            });
        }

        info!(file_id = %inner.file_id, chunk = index, "retrying chunk");
        inner.publish(ChunkState::pending(index));
        Ok(inner.process(index as usize).await)
    }
}

impl Inner {
    /// Uploads chunk `i` and publishes its terminal state.
    async fn process(&self, i: usize) -> ChunkState {
        let desc = self.descriptors[i];
        self.publish(ChunkState::uploading(desc.index));

        let state = match self.upload(&desc).await {
            Ok(record) => {
                debug!(file_id = %self.file_id, chunk = desc.index, hash = %record.hash, "chunk done");
                ChunkState::done(desc.index, record)
            }
            Err(e) => {
                warn!(file_id = %self.file_id, chunk = desc.index, "chunk failed: {e}");
                ChunkState::failed(desc.index, e.to_string())
            }
        };
        self.publish(state.clone());
        state
    }

    async fn upload(
        &self,
        desc: &ChunkDescriptor,
    ) -> Result<spfe_protocol::PartialRecord, UploadError> {
        let data = self.source.read_chunk(desc).await?;
        self.sink
            .store_chunk(&self.file_id, desc.index, self.total_chunks, data)
            .await
    }

    fn publish(&self, state: ChunkState) {
        self.table.publish(state.clone());
        self.emit(UploadEvent::Chunk(state));
    }

    fn emit(&self, event: UploadEvent) {
        if let Err(mpsc::error::TrySendError::Full(_)) = self.events_tx.try_send(event) {
            debug!(file_id = %self.file_id, "event buffer full, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use spfe_partial_store::{
        ChunkUploader, MemoryBackend, MergeAggregator, PartialBackend, PartialStore, StoreError,
    };
    use spfe_protocol::PartialRecord;
    use spfe_transfer::checksum_bytes;

    use crate::sink::{LocalSink, SinkFuture};
    use crate::source::MemorySource;

    const MIB: usize = 1024 * 1024;

    /// Sink that records calls, can fail chosen indices a number of times,
    /// and tracks the peak number of concurrent calls.
    struct MockSink {
        calls: Mutex<HashMap<u32, usize>>,
        failures: Mutex<HashMap<u32, usize>>,
        in_flight: AtomicUsize,
        peak: AtomicUsize,
        delay: Duration,
    }

    impl MockSink {
        fn new(delay: Duration) -> Self {
            Self {
                calls: Mutex::new(HashMap::new()),
                failures: Mutex::new(HashMap::new()),
                in_flight: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
                delay,
            }
        }

        fn fail(self, index: u32, times: usize) -> Self {
            self.failures.lock().unwrap().insert(index, times);
            self
        }

        fn calls(&self, index: u32) -> usize {
            self.calls.lock().unwrap().get(&index).copied().unwrap_or(0)
        }
    }

    impl ChunkSink for MockSink {
        fn store_chunk<'a>(
            &'a self,
            file_id: &'a str,
            chunk_index: u32,
            total_chunks: u32,
            data: Vec<u8>,
        ) -> SinkFuture<'a> {
            Box::pin(async move {
                *self.calls.lock().unwrap().entry(chunk_index).or_default() += 1;
                let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
                self.peak.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(self.delay).await;
                self.in_flight.fetch_sub(1, Ordering::SeqCst);

                let should_fail = {
                    let mut failures = self.failures.lock().unwrap();
                    match failures.get_mut(&chunk_index) {
                        Some(n) if *n > 0 => {
                            *n -= 1;
                            true
                        }
                        _ => false,
                    }
                };
                if should_fail {
                    return Err(UploadError::Transport("connection reset".into()));
                }

                Ok(PartialRecord {
                    file_id: file_id.to_string(),
                    chunk_index,
                    total_chunks,
                    hash: checksum_bytes(&data),
                    length: data.len() as u64,
                    stored_at: 1,
                })
            })
        }
    }

    /// Wraps a sink and fails chosen indices once with a store outage.
    struct OutageSink {
        inner: LocalSink,
        down_once: Mutex<Vec<u32>>,
    }

    impl ChunkSink for OutageSink {
        fn store_chunk<'a>(
            &'a self,
            file_id: &'a str,
            chunk_index: u32,
            total_chunks: u32,
            data: Vec<u8>,
        ) -> SinkFuture<'a> {
            Box::pin(async move {
                let down = {
                    let mut list = self.down_once.lock().unwrap();
                    match list.iter().position(|&i| i == chunk_index) {
                        Some(pos) => {
                            list.remove(pos);
                            true
                        }
                        None => false,
                    }
                };
                if down {
                    return Err(UploadError::Store(StoreError::Unavailable(
                        "simulated outage".into(),
                    )));
                }
                self.inner
                    .store_chunk(file_id, chunk_index, total_chunks, data)
                    .await
            })
        }
    }

    fn bytes(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i % 251) as u8).collect()
    }

    fn orchestrator(
        data: Vec<u8>,
        sink: Arc<dyn ChunkSink>,
        chunk_size: u64,
    ) -> UploadOrchestrator {
        UploadOrchestrator::new("file.bin", Arc::new(MemorySource::new(data)), sink, chunk_size)
    }

    struct Stack {
        primary: Arc<MemoryBackend>,
        store: Arc<PartialStore>,
    }

    fn stack() -> Stack {
        let primary = Arc::new(MemoryBackend::new("primary"));
        let fallback = Arc::new(MemoryBackend::new("fallback"));
        let store = Arc::new(PartialStore::new(
            Some(primary.clone() as Arc<dyn PartialBackend>),
            fallback as Arc<dyn PartialBackend>,
        ));
        Stack { primary, store }
    }

    #[tokio::test]
    async fn every_chunk_terminal_exactly_once_for_any_concurrency() {
        let data = bytes(10);
        for concurrency in 1..=10 {
            let sink = Arc::new(MockSink::new(Duration::from_millis(1)));
            let orch = orchestrator(data.clone(), sink.clone(), 1);
            let states = orch.run(concurrency).await;

            assert_eq!(states.len(), 10);
            for s in &states {
                assert_eq!(s.status, ChunkStatus::Done, "concurrency {concurrency}");
                assert_eq!(sink.calls(s.index), 1, "chunk {} uploaded twice", s.index);
            }
        }
    }

    #[tokio::test]
    async fn concurrency_is_bounded() {
        let sink = Arc::new(MockSink::new(Duration::from_millis(20)));
        let orch = orchestrator(bytes(12), sink.clone(), 1);
        orch.run(3).await;
        let peak = sink.peak.load(Ordering::SeqCst);
        assert!(peak <= 3, "peak concurrency {peak} exceeds 3");
        assert!(peak >= 2, "workers never overlapped");
    }

    #[tokio::test]
    async fn zero_concurrency_runs_one_worker() {
        let sink = Arc::new(MockSink::new(Duration::ZERO));
        let orch = orchestrator(bytes(3), sink.clone(), 1);
        let states = orch.run(0).await;
        assert!(states.iter().all(|s| s.status == ChunkStatus::Done));
        assert_eq!(sink.peak.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failure_is_contained_to_one_chunk() {
        let sink = Arc::new(MockSink::new(Duration::ZERO).fail(1, 1));
        let orch = orchestrator(bytes(3), sink.clone(), 1);
        let states = orch.run(2).await;

        assert_eq!(states[0].status, ChunkStatus::Done);
        assert_eq!(states[1].status, ChunkStatus::Error);
        assert!(states[1].error.as_deref().unwrap().contains("connection reset"));
        assert!(states[1].partial.is_none());
        assert_eq!(states[2].status, ChunkStatus::Done);
    }

    #[tokio::test]
    async fn retry_moves_failed_chunk_to_done() {
        let sink = Arc::new(MockSink::new(Duration::ZERO).fail(1, 1));
        let orch = orchestrator(bytes(3), sink.clone(), 1);
        orch.run(2).await;

        let state = orch.retry(1).await.unwrap();
        assert_eq!(state.status, ChunkStatus::Done);
        assert_eq!(orch.state(1).unwrap().status, ChunkStatus::Done);
        assert_eq!(sink.calls(1), 2);
        assert_eq!(sink.calls(0), 1);
    }

    #[tokio::test]
    async fn retry_rejects_non_failed_and_unknown_chunks() {
        let sink = Arc::new(MockSink::new(Duration::ZERO));
        let orch = orchestrator(bytes(2), sink, 1);

        assert!(matches!(
            orch.retry(0).await,
            Err(UploadError::NotRetryable {
                index: 0,
                status: ChunkStatus::Pending
            })
        ));
        orch.run(1).await;
        assert!(matches!(
            orch.retry(1).await,
            Err(UploadError::NotRetryable {
                status: ChunkStatus::Done,
                ..
            })
        ));
        assert!(matches!(
            orch.retry(9).await,
            Err(UploadError::UnknownChunk(9))
        ));
    }

    /// Sink whose first call for `flaky` fails at once and whose later
    /// calls for it take `slow`; every other chunk takes `normal`.
    struct SlowRetrySink {
        flaky: u32,
        normal: Duration,
        slow: Duration,
        failed_once: AtomicUsize,
    }

    impl ChunkSink for SlowRetrySink {
        fn store_chunk<'a>(
            &'a self,
            file_id: &'a str,
            chunk_index: u32,
            total_chunks: u32,
            data: Vec<u8>,
        ) -> SinkFuture<'a> {
            Box::pin(async move {
                if chunk_index == self.flaky {
                    if self.failed_once.fetch_add(1, Ordering::SeqCst) == 0 {
                        return Err(UploadError::Transport("connection reset".into()));
                    }
                    tokio::time::sleep(self.slow).await;
                } else {
                    tokio::time::sleep(self.normal).await;
                }
                Ok(PartialRecord {
                    file_id: file_id.to_string(),
                    chunk_index,
                    total_chunks,
                    hash: checksum_bytes(&data),
                    length: data.len() as u64,
                    stored_at: 1,
                })
            })
        }
    }

    #[tokio::test]
    async fn retry_during_run_is_not_reported_as_aborted() {
        let sink = Arc::new(SlowRetrySink {
            flaky: 1,
            normal: Duration::from_millis(100),
            slow: Duration::from_millis(200),
            failed_once: AtomicUsize::new(0),
        });
        let mut orch = orchestrator(bytes(3), sink, 1);
        let mut events = orch.take_events().unwrap();
        let orch = Arc::new(orch);

        let runner = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.run(2).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(orch.state(1).unwrap().status, ChunkStatus::Error);

        let retrier = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.retry(1).await })
        };

        let from_run = runner.await.unwrap();
        assert_ne!(from_run[1].status, ChunkStatus::Error, "{:?}", from_run[1]);
        assert_eq!(from_run[0].status, ChunkStatus::Done);
        assert_eq!(from_run[2].status, ChunkStatus::Done);

        let retried = retrier.await.unwrap().unwrap();
        assert_eq!(retried.status, ChunkStatus::Done);
        assert_eq!(orch.state(1).unwrap().status, ChunkStatus::Done);

        drop(orch);
        let mut finished = None;
        while let Some(e) = events.recv().await {
            if let UploadEvent::Finished { done, failed } = e {
                finished = Some((done, failed));
            }
        }
        assert_eq!(finished, Some((2, 0)));
    }

    /// Sink that panics while storing one chunk.
    struct PanickingSink {
        bad: u32,
        inner: MockSink,
    }

    impl ChunkSink for PanickingSink {
        fn store_chunk<'a>(
            &'a self,
            file_id: &'a str,
            chunk_index: u32,
            total_chunks: u32,
            data: Vec<u8>,
        ) -> SinkFuture<'a> {
            if chunk_index == self.bad {
                panic!("sink blew up on chunk {chunk_index}");
            }
            self.inner.store_chunk(file_id, chunk_index, total_chunks, data)
        }
    }

    #[tokio::test]
    async fn panicking_chunk_fails_alone() {
        let sink = Arc::new(PanickingSink {
            bad: 1,
            inner: MockSink::new(Duration::ZERO),
        });
        let orch = orchestrator(bytes(3), sink.clone(), 1);
        let states = orch.run(1).await;

        assert_eq!(states[0].status, ChunkStatus::Done);
        assert_eq!(states[1].status, ChunkStatus::Error);
        assert_eq!(states[1].error.as_deref(), Some("upload worker aborted"));
        assert_eq!(states[2].status, ChunkStatus::Done);
        assert_eq!(sink.inner.calls(2), 1);
    }

    #[tokio::test]
    async fn sink_sees_declared_total() {
        let sink = Arc::new(MockSink::new(Duration::ZERO));
        let orch = orchestrator(bytes(5), sink, 2);
        let states = orch.run(2).await;
        assert!(
            states
                .iter()
                .all(|s| s.partial.as_ref().unwrap().total_chunks == 3)
        );
    }

    #[tokio::test]
    async fn rerun_starts_a_fresh_session() {
        let sink = Arc::new(MockSink::new(Duration::ZERO));
        let orch = orchestrator(bytes(2), sink.clone(), 1);
        orch.run(2).await;
        orch.run(2).await;
        assert_eq!(sink.calls(0), 2);
        assert_eq!(sink.calls(1), 2);
    }

    #[tokio::test]
    async fn events_report_each_transition() {
        let sink = Arc::new(MockSink::new(Duration::ZERO).fail(0, 1));
        let mut orch = orchestrator(bytes(2), sink, 1);
        let mut events = orch.take_events().unwrap();
        assert!(orch.take_events().is_none());

        orch.run(1).await;
        drop(orch);

        let mut seen = Vec::new();
        while let Some(e) = events.recv().await {
            seen.push(e);
        }

        let statuses_of = |index: u32| -> Vec<ChunkStatus> {
            seen.iter()
                .filter_map(|e| match e {
                    UploadEvent::Chunk(s) if s.index == index => Some(s.status),
                    _ => None,
                })
                .collect()
        };
        assert_eq!(statuses_of(0), vec![ChunkStatus::Uploading, ChunkStatus::Error]);
        assert_eq!(statuses_of(1), vec![ChunkStatus::Uploading, ChunkStatus::Done]);
        assert_eq!(
            seen.last(),
            Some(&UploadEvent::Finished { done: 1, failed: 1 })
        );
    }

    #[tokio::test]
    async fn states_observable_while_running() {
        let sink = Arc::new(MockSink::new(Duration::from_millis(50)));
        let orch = Arc::new(orchestrator(bytes(4), sink, 1));

        let runner = {
            let orch = Arc::clone(&orch);
            tokio::spawn(async move { orch.run(2).await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let mid = orch.states();
        assert!(mid.iter().any(|s| s.status == ChunkStatus::Uploading));

        let done = runner.await.unwrap();
        assert!(done.iter().all(|s| s.status.is_terminal()));
    }

    #[tokio::test]
    async fn empty_file_uploads_one_chunk() {
        let sink = Arc::new(MockSink::new(Duration::ZERO));
        let orch = orchestrator(Vec::new(), sink.clone(), 4);
        let states = orch.run(4).await;
        assert_eq!(states.len(), 1);
        assert_eq!(states[0].status, ChunkStatus::Done);
        assert_eq!(states[0].partial.as_ref().unwrap().length, 0);
    }

    #[tokio::test]
    async fn five_mib_file_in_two_mib_chunks() {
        let stack = stack();
        let sink = Arc::new(LocalSink::new(ChunkUploader::new(stack.store.clone())));
        let data = bytes(5 * MIB);
        let orch = orchestrator(data.clone(), sink, 2 * MIB as u64);
        assert_eq!(orch.descriptors().len(), 3);

        let states = orch.run(2).await;
        assert!(states.iter().all(|s| s.status == ChunkStatus::Done));

        let manifest = MergeAggregator::new(stack.store.clone())
            .merge("file.bin")
            .await
            .unwrap();
        assert_eq!(manifest.total_chunks_found, 3);
        let expected: Vec<String> = [0..2 * MIB, 2 * MIB..4 * MIB, 4 * MIB..5 * MIB]
            .into_iter()
            .map(|r| checksum_bytes(&data[r]))
            .collect();
        assert_eq!(manifest.hashes, expected);
        let lengths: Vec<u64> = manifest.partials.iter().map(|p| p.length).collect();
        assert_eq!(lengths, vec![2 * MIB as u64, 2 * MIB as u64, MIB as u64]);
    }

    #[tokio::test]
    async fn transient_outage_then_retry_completes_merge() {
        let stack = stack();
        let sink = Arc::new(OutageSink {
            inner: LocalSink::new(ChunkUploader::new(stack.store.clone())),
            down_once: Mutex::new(vec![1]),
        });
        let orch = orchestrator(bytes(30), sink, 10);

        let states = orch.run(3).await;
        assert_eq!(states[0].status, ChunkStatus::Done);
        assert_eq!(states[1].status, ChunkStatus::Error);
        assert_eq!(states[2].status, ChunkStatus::Done);

        let merger = MergeAggregator::new(stack.store.clone());
        assert_eq!(merger.merge("file.bin").await.unwrap().total_chunks_found, 2);

        assert_eq!(orch.retry(1).await.unwrap().status, ChunkStatus::Done);
        let manifest = merger.merge("file.bin").await.unwrap();
        assert_eq!(manifest.total_chunks_found, 3);
        assert!(manifest.is_complete());
    }

    #[tokio::test]
    async fn primary_down_for_whole_session_uses_fallback() {
        let stack = stack();
        stack.primary.set_online(false);
        let sink = Arc::new(LocalSink::new(ChunkUploader::new(stack.store.clone())));
        let orch = orchestrator(bytes(30), sink, 10);

        let states = orch.run(2).await;
        assert!(states.iter().all(|s| s.status == ChunkStatus::Done));
        assert!(stack.primary.is_empty());

        let manifest = MergeAggregator::new(stack.store.clone())
            .merge("file.bin")
            .await
            .unwrap();
        assert_eq!(manifest.total_chunks_found, 3);
        let indices: Vec<u32> = manifest.partials.iter().map(|p| p.chunk_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn store_failure_everywhere_leaves_chunks_retryable() {
        let primary = Arc::new(MemoryBackend::new("primary"));
        let fallback = Arc::new(MemoryBackend::new("fallback"));
        primary.set_online(false);
        fallback.set_online(false);
        let store = Arc::new(PartialStore::new(
            Some(primary.clone() as Arc<dyn PartialBackend>),
            fallback.clone() as Arc<dyn PartialBackend>,
        ));
        let sink = Arc::new(LocalSink::new(ChunkUploader::new(store)));
        let orch = orchestrator(bytes(4), sink, 2);

        let states = orch.run(2).await;
        assert!(states.iter().all(|s| s.status == ChunkStatus::Error));

        fallback.set_online(true);
        for i in 0..2 {
            assert_eq!(orch.retry(i).await.unwrap().status, ChunkStatus::Done);
        }
        assert_eq!(fallback.len(), 2);
    }
}
