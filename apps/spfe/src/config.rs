//! Configuration management.
//!
//! Reads JSON from `--config` or `~/.config/spfe/config.json`. Every key is
//! optional; CLI flags override whatever the file sets.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use spfe_server::MAX_CHUNK_SIZE;
use spfe_transfer::DEFAULT_CHUNK_SIZE;

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 8787);
const DEFAULT_CONCURRENCY: usize = 4;

/// On-disk config format.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    #[serde(default)]
    bind: Option<SocketAddr>,
    #[serde(default)]
    primary_dir: Option<PathBuf>,
    #[serde(default)]
    fallback_dir: Option<PathBuf>,
    #[serde(default)]
    chunk_size: Option<u64>,
    #[serde(default)]
    concurrency: Option<usize>,
    #[serde(default)]
    server_url: Option<String>,
}

/// Effective configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address `serve` listens on.
    pub bind: SocketAddr,
    /// Durable primary directory. No primary backend when unset.
    pub primary_dir: Option<PathBuf>,
    /// Fallback directory, used when the primary fails. Defaults to
    /// `local_partials` in the OS temp dir.
    pub fallback_dir: Option<PathBuf>,
    pub chunk_size: u64,
    pub concurrency: usize,
    /// Server that `upload` and `merge` talk to.
    pub server_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let bind = SocketAddr::from(DEFAULT_BIND);
        Self {
            bind,
            primary_dir: None,
            fallback_dir: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
            concurrency: DEFAULT_CONCURRENCY,
            server_url: format!("http://{bind}"),
        }
    }
}

impl Config {
    /// Loads configuration from `path`, or from the default location.
    ///
    /// A missing file yields defaults. An unparsable file is logged and
    /// ignored.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let file_path = match path {
            Some(p) => p.to_path_buf(),
            None => config_file_path()?,
        };
        let mut config = Config::default();

        if !file_path.exists() {
            if path.is_some() {
                tracing::warn!(path = %file_path.display(), "config file not found, using defaults");
            }
            return Ok(config);
        }

        let content = std::fs::read_to_string(&file_path)?;
        match serde_json::from_str::<ConfigFile>(&content) {
            Ok(file) => config.apply(file),
            Err(e) => {
                tracing::warn!(
                    path = %file_path.display(),
                    "failed to parse config, using defaults: {e}"
                );
            }
        }

        Ok(config)
    }

    /// Rejects settings the server could never accept.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.chunk_size > MAX_CHUNK_SIZE {
            anyhow::bail!(
                "chunk size {} exceeds the maximum of {MAX_CHUNK_SIZE} bytes",
                self.chunk_size
            );
        }
        Ok(())
    }

    fn apply(&mut self, file: ConfigFile) {
        if let Some(bind) = file.bind {
            self.bind = bind;
        }
        if file.primary_dir.is_some() {
            self.primary_dir = file.primary_dir;
        }
        if file.fallback_dir.is_some() {
            self.fallback_dir = file.fallback_dir;
        }
        if let Some(size) = file.chunk_size.filter(|&s| s > 0) {
            self.chunk_size = size;
        }
        if let Some(n) = file.concurrency.filter(|&n| n > 0) {
            self.concurrency = n;
        }
        if let Some(url) = file.server_url.filter(|u| !u.is_empty()) {
            self.server_url = url;
        }
    }
}

fn config_file_path() -> anyhow::Result<PathBuf> {
    Ok(config_base_dir()?.join("spfe").join("config.json"))
}

fn config_base_dir() -> anyhow::Result<PathBuf> {
    #[cfg(target_os = "windows")]
    {
        let appdata =
            std::env::var("APPDATA").unwrap_or_else(|_| "C:\\Users\\Default\\AppData".into());
        Ok(PathBuf::from(appdata))
    }

    #[cfg(not(target_os = "windows"))]
    {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".into());
        Ok(PathBuf::from(home).join(".config"))
    }
}
