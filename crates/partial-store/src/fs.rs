//! Directory-backed key-value backend.
//!
//! Each key maps to a file below the root. Used as the fallback (rooted in
//! the OS temp dir, so it may not survive a reboot) and, rooted somewhere
//! persistent, as a durable primary.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use spfe_transfer::validate_key;

use crate::backend::{BackendError, BackendFuture, PartialBackend};

/// Name of the default fallback directory below the OS temp dir.
pub const LOCAL_PARTIALS_DIR: &str = "local_partials";

/// Stores keys as files below a root directory.
pub struct FsBackend {
    name: String,
    root: PathBuf,
    tmp_seq: AtomicU64,
}

impl FsBackend {
    /// Creates a backend rooted at `root`. The directory is created lazily.
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            root: root.into(),
            tmp_seq: AtomicU64::new(0),
        }
    }

    /// Fallback backend at `<temp dir>/local_partials`.
    pub fn ephemeral() -> Self {
        Self::new("fallback", std::env::temp_dir().join(LOCAL_PARTIALS_DIR))
    }

    /// Returns the root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, key: &str) -> Result<PathBuf, BackendError> {
        validate_key(key).map_err(|e| BackendError::InvalidKey(e.to_string()))?;
        Ok(self.root.join(key))
    }

    async fn write_file(&self, key: &str, body: Vec<u8>) -> Result<(), BackendError> {
        let path = self.resolve(key)?;
        let parent = path
            .parent()
            .ok_or_else(|| BackendError::InvalidKey(format!("key has no parent: {key}")))?;
        tokio::fs::create_dir_all(parent).await?;

        // Write-then-rename so a concurrent reader never sees half a record.
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let seq = self.tmp_seq.fetch_add(1, Ordering::Relaxed);
        let tmp = parent.join(format!(".{file_name}.{}.{seq}.tmp", std::process::id()));

        tokio::fs::write(&tmp, &body).await?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        Ok(())
    }

    async fn list_dir(&self, prefix: &str) -> Result<Vec<String>, BackendError> {
        let dir = self.resolve(prefix.trim_end_matches('/'))?;
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let base = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };

        let mut keys = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            // In-flight writes.
            if name.starts_with('.') {
                continue;
            }
            match entry.file_type().await {
                Ok(ft) if ft.is_file() => keys.push(format!("{base}{name}")),
                Ok(_) => {}
                Err(e) => {
                    tracing::debug!(backend = %self.name, entry = %name, "skipping entry: {e}");
                }
            }
        }
        Ok(keys)
    }

    async fn read_file(&self, key: &str) -> Result<Option<Vec<u8>>, BackendError> {
        let path = self.resolve(key)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

impl PartialBackend for FsBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn put<'a>(&'a self, key: &'a str, body: Vec<u8>) -> BackendFuture<'a, ()> {
        Box::pin(self.write_file(key, body))
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BackendFuture<'a, Vec<String>> {
        Box::pin(self.list_dir(prefix))
    }

    fn get<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<Vec<u8>>> {
        Box::pin(self.read_file(key))
    }
}
