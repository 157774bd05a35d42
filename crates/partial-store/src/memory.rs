//! In-process key-value backend.

use std::collections::BTreeMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::backend::{BackendError, BackendFuture, PartialBackend};

/// Keeps every key in memory. Lost when the process exits.
///
/// Can be switched offline to simulate an outage: while offline every call
/// fails with [`BackendError::Unavailable`].
pub struct MemoryBackend {
    name: String,
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
    online: AtomicBool,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: RwLock::new(BTreeMap::new()),
            online: AtomicBool::new(true),
        }
    }

    /// Switches the backend on or off.
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// Number of stored keys (ignores the online flag).
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unavailable(format!("{} is offline", self.name)))
        }
    }
}

impl PartialBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn put<'a>(&'a self, key: &'a str, body: Vec<u8>) -> BackendFuture<'a, ()> {
        Box::pin(async move {
            self.check_online()?;
            self.entries.write().unwrap().insert(key.to_string(), body);
            Ok(())
        })
    }

    fn list<'a>(&'a self, prefix: &'a str) -> BackendFuture<'a, Vec<String>> {
        Box::pin(async move {
            self.check_online()?;
            let entries = self.entries.read().unwrap();
            Ok(entries
                .range(prefix.to_string()..)
                .take_while(|(k, _)| k.starts_with(prefix))
                .map(|(k, _)| k.clone())
                .collect())
        })
    }

    fn get<'a>(&'a self, key: &'a str) -> BackendFuture<'a, Option<Vec<u8>>> {
        Box::pin(async move {
            self.check_online()?;
            Ok(self.entries.read().unwrap().get(key).cloned())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_list_get() {
        let mem = MemoryBackend::new("primary");
        mem.put("partials/a/chunk_0.json", b"0".to_vec()).await.unwrap();
        mem.put("partials/a/chunk_1.json", b"1".to_vec()).await.unwrap();
        mem.put("partials/ab/chunk_0.json", b"x".to_vec()).await.unwrap();

        let keys = mem.list("partials/a/").await.unwrap();
        assert_eq!(keys, vec!["partials/a/chunk_0.json", "partials/a/chunk_1.json"]);
        assert_eq!(mem.get("partials/a/chunk_1.json").await.unwrap().unwrap(), b"1");
        assert!(mem.get("partials/a/chunk_2.json").await.unwrap().is_none());
        assert_eq!(mem.len(), 3);
    }

    #[tokio::test]
    async fn offline_rejects_everything() {
        let mem = MemoryBackend::new("primary");
        mem.put("k", b"v".to_vec()).await.unwrap();
        mem.set_online(false);

        assert!(matches!(
            mem.put("k", b"w".to_vec()).await,
            Err(BackendError::Unavailable(_))
        ));
        assert!(mem.list("").await.is_err());
        assert!(mem.get("k").await.is_err());

        mem.set_online(true);
        assert_eq!(mem.get("k").await.unwrap().unwrap(), b"v");
    }
}
