//! Per-chunk lifecycle state.

use std::fmt;
use std::sync::RwLock;

use serde::Serialize;
use spfe_protocol::PartialRecord;

/// Lifecycle of one chunk within an upload session.
///
/// `pending → uploading → {done, error}`; `error → pending` via retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkStatus {
    Pending,
    Uploading,
    Done,
    Error,
}

impl ChunkStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Error)
    }
}

impl fmt::Display for ChunkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Uploading => "uploading",
            Self::Done => "done",
            Self::Error => "error",
        };
        f.write_str(s)
    }
}

/// Snapshot of one chunk. Always replaced whole, never patched in place.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkState {
    pub index: u32,
    pub status: ChunkStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partial: Option<PartialRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChunkState {
    pub fn pending(index: u32) -> Self {
        Self {
            index,
            status: ChunkStatus::Pending,
            partial: None,
            error: None,
        }
    }

    pub fn uploading(index: u32) -> Self {
        Self {
            status: ChunkStatus::Uploading,
            ..Self::pending(index)
        }
    }

    pub fn done(index: u32, partial: PartialRecord) -> Self {
        Self {
            status: ChunkStatus::Done,
            partial: Some(partial),
            ..Self::pending(index)
        }
    }

    pub fn failed(index: u32, error: impl Into<String>) -> Self {
        Self {
            status: ChunkStatus::Error,
            error: Some(error.into()),
            ..Self::pending(index)
        }
    }
}

/// Table of chunk states, one cell per index.
///
/// Writers swap a complete [`ChunkState`] into a cell; readers clone it out.
/// A reader therefore sees either the previous or the current state of a
/// chunk, never a mix, and never waits on an upload in flight.
pub struct ChunkTable {
    cells: Vec<RwLock<ChunkState>>,
}

impl ChunkTable {
    /// Creates `count` cells, all pending.
    pub fn new(count: u32) -> Self {
        Self {
            cells: (0..count)
                .map(|i| RwLock::new(ChunkState::pending(i)))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Replaces the state of `state.index`. Out-of-range indices are ignored.
    pub fn publish(&self, state: ChunkState) {
        if let Some(cell) = self.cells.get(state.index as usize) {
            *cell.write().unwrap() = state;
        }
    }

    /// Returns the current state of one chunk.
    pub fn get(&self, index: u32) -> Option<ChunkState> {
        self.cells
            .get(index as usize)
            .map(|cell| cell.read().unwrap().clone())
    }

    /// Returns every chunk's current state, ordered by index.
    pub fn snapshot(&self) -> Vec<ChunkState> {
        self.cells
            .iter()
            .map(|cell| cell.read().unwrap().clone())
            .collect()
    }

    /// Resets every chunk to pending.
    pub fn reset(&self) {
        for (cell, i) in self.cells.iter().zip(0u32..) {
            *cell.write().unwrap() = ChunkState::pending(i);
        }
    }

    /// Counts chunks per terminal status: `(done, error)`.
    pub fn tally(&self) -> (usize, usize) {
        self.snapshot()
            .iter()
            .fold((0, 0), |(done, failed), s| match s.status {
                ChunkStatus::Done => (done + 1, failed),
                ChunkStatus::Error => (done, failed + 1),
                _ => (done, failed),
            })
    }
}
