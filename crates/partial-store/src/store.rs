//! Primary/fallback partial record store.

use std::fmt;
use std::sync::Arc;

use spfe_protocol::{PartialRecord, partial_key};
use tracing::{debug, warn};

use crate::StoreError;
use crate::backend::{BackendError, PartialBackend};

/// Which backend answered a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendRole {
    Primary,
    Fallback,
}

impl fmt::Display for BackendRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primary => f.write_str("primary"),
            Self::Fallback => f.write_str("fallback"),
        }
    }
}

/// Keys found under a prefix, with the backend that listed them.
///
/// Records must be read back from the same backend via
/// [`PartialStore::get_from`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub role: BackendRole,
    pub keys: Vec<String>,
}

/// Shared store for partial records.
///
/// Each call tries the primary first (when one is configured) and falls
/// back on any primary error. Nothing is cached between calls. Writes to the
/// same key race; the last one to land wins.
pub struct PartialStore {
    primary: Option<Arc<dyn PartialBackend>>,
    fallback: Arc<dyn PartialBackend>,
}

impl PartialStore {
    pub fn new(primary: Option<Arc<dyn PartialBackend>>, fallback: Arc<dyn PartialBackend>) -> Self {
        Self { primary, fallback }
    }

    /// Returns `true` if a primary backend is configured.
    pub fn has_primary(&self) -> bool {
        self.primary.is_some()
    }

    fn backend(&self, role: BackendRole) -> Option<&Arc<dyn PartialBackend>> {
        match role {
            BackendRole::Primary => self.primary.as_ref(),
            BackendRole::Fallback => Some(&self.fallback),
        }
    }

    /// Persists `record` under `(file_id, chunk_index)`.
    ///
    /// Returns the backend that accepted the write.
    pub async fn put(&self, record: &PartialRecord) -> Result<BackendRole, StoreError> {
        let key = partial_key(&record.file_id, record.chunk_index);
        let body = serde_json::to_vec(record)?;

        let primary_err = match &self.primary {
            Some(primary) => match primary.put(&key, body.clone()).await {
                Ok(()) => {
                    debug!(key = %key, backend = primary.name(), "stored partial");
                    return Ok(BackendRole::Primary);
                }
                Err(e) => {
                    warn!(key = %key, backend = primary.name(), "primary put failed, using fallback: {e}");
                    Some(e)
                }
            },
            None => None,
        };

        match self.fallback.put(&key, body).await {
            Ok(()) => {
                debug!(key = %key, backend = self.fallback.name(), "stored partial");
                Ok(BackendRole::Fallback)
            }
            Err(e) => Err(unavailable("put", &key, primary_err, e)),
        }
    }

    /// Lists keys under `prefix`.
    ///
    /// The primary and fallback are alternative views: the fallback is only
    /// scanned when the primary errors, and the two are never merged.
    pub async fn list_by_prefix(&self, prefix: &str) -> Result<Listing, StoreError> {
        let primary_err = match &self.primary {
            Some(primary) => match primary.list(prefix).await {
                Ok(keys) => {
                    return Ok(Listing {
                        role: BackendRole::Primary,
                        keys,
                    });
                }
                Err(e) => {
                    warn!(prefix = %prefix, backend = primary.name(), "primary list failed, scanning fallback: {e}");
                    Some(e)
                }
            },
            None => None,
        };

        match self.fallback.list(prefix).await {
            Ok(keys) => Ok(Listing {
                role: BackendRole::Fallback,
                keys,
            }),
            Err(e) => Err(unavailable("list", prefix, primary_err, e)),
        }
    }

    /// Point read with the same primary-then-fallback order as [`put`](Self::put).
    ///
    /// The fallback is consulted only when the primary errors; a primary
    /// answer of "absent" is final.
    pub async fn get(&self, key: &str) -> Result<Option<PartialRecord>, StoreError> {
        let primary_err = match &self.primary {
            Some(primary) => match primary.get(key).await {
                Ok(body) => return decode(key, body),
                Err(e) => {
                    warn!(key = %key, backend = primary.name(), "primary get failed, using fallback: {e}");
                    Some(e)
                }
            },
            None => None,
        };

        match self.fallback.get(key).await {
            Ok(body) => decode(key, body),
            Err(e) => Err(unavailable("get", key, primary_err, e)),
        }
    }

    /// Reads `key` from one specific backend, without falling back.
    pub async fn get_from(
        &self,
        role: BackendRole,
        key: &str,
    ) -> Result<Option<PartialRecord>, StoreError> {
        let backend = self
            .backend(role)
            .ok_or_else(|| StoreError::Unavailable(format!("no {role} backend configured")))?;
        let body = backend
            .get(key)
            .await
            .map_err(|e| StoreError::Unavailable(format!("get {key} from {role}: {e}")))?;
        decode(key, body)
    }
}

fn decode(key: &str, body: Option<Vec<u8>>) -> Result<Option<PartialRecord>, StoreError> {
    match body {
        Some(bytes) => serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|source| StoreError::Parse {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

fn unavailable(
    op: &str,
    key: &str,
    primary_err: Option<BackendError>,
    fallback_err: BackendError,
) -> StoreError {
    let msg = match primary_err {
        Some(p) => format!("{op} {key}: primary: {p}; fallback: {fallback_err}"),
        None => format!("{op} {key}: fallback: {fallback_err}"),
    };
    StoreError::Unavailable(msg)
}
