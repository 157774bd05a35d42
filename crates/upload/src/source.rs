//! Where chunk bytes come from.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::Arc;

use spfe_transfer::{ChunkDescriptor, read_range};

use crate::UploadError;

/// A boxed future returned by [`ChunkSource::read_chunk`].
pub type SourceFuture<'a> = Pin<Box<dyn Future<Output = Result<Vec<u8>, UploadError>> + Send + 'a>>;

/// Random-access byte source of the file being uploaded.
pub trait ChunkSource: Send + Sync {
    /// Total size in bytes, used for planning.
    fn size(&self) -> u64;

    /// Reads the bytes covered by `desc`.
    fn read_chunk<'a>(&'a self, desc: &'a ChunkDescriptor) -> SourceFuture<'a>;
}

/// Reads chunks from a file on disk.
pub struct FileSource {
    path: PathBuf,
    size: u64,
}

impl FileSource {
    /// Opens `path` and records its current size.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, UploadError> {
        let path = path.as_ref().to_path_buf();
        let meta = tokio::fs::metadata(&path).await?;
        if !meta.is_file() {
            return Err(UploadError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("not a regular file: {}", path.display()),
            )));
        }
        Ok(Self {
            path,
            size: meta.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ChunkSource for FileSource {
    fn size(&self) -> u64 {
        self.size
    }

    fn read_chunk<'a>(&'a self, desc: &'a ChunkDescriptor) -> SourceFuture<'a> {
        Box::pin(async move {
            let path = self.path.clone();
            let desc = *desc;
            let data = tokio::task::spawn_blocking(move || read_range(&path, &desc))
                .await
                .map_err(|e| UploadError::Io(std::io::Error::other(e)))??;
            Ok(data)
        })
    }
}

/// Serves chunks from an in-memory buffer.
#[derive(Clone)]
pub struct MemorySource {
    data: Arc<[u8]>,
}

impl MemorySource {
    pub fn new(data: impl Into<Arc<[u8]>>) -> Self {
        Self { data: data.into() }
    }
}

impl ChunkSource for MemorySource {
    fn size(&self) -> u64 {
        self.data.len() as u64
    }

    fn read_chunk<'a>(&'a self, desc: &'a ChunkDescriptor) -> SourceFuture<'a> {
        Box::pin(async move {
            let start = desc.byte_start as usize;
            let end = desc.byte_end as usize;
            self.data.get(start..end).map(<[u8]>::to_vec).ok_or_else(|| {
                UploadError::Read(spfe_transfer::TransferError::ShortRead {
                    offset: desc.byte_start,
                    wanted: desc.len(),
                    got: self.data.len().saturating_sub(start) as u64,
                })
            })
        })
    }
}
