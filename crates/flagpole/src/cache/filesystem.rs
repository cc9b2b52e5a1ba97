//! # Filesystem Cache Implementation
//!
//! Durable cache backend storing one JSON file per key.
//!
//! Each file holds `{"value": <serialized document>, "expires": <epoch
//! millis>|null}`. The cache directory is created recursively at
//! construction; if that fails the backend degrades to a no-op so a broken
//! cache path can never break flag evaluation. Missing or unparsable files
//! read as a miss.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::FlagCache;

/// Suffix distinguishing managed cache files from unrelated files in the
/// same directory. `clear` only touches files carrying it.
const FILE_SUFFIX: &str = ".flags.json";

#[derive(Debug, Serialize, Deserialize)]
struct StoredEntry {
    value: String,
    expires: Option<u64>,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        self.expires.is_some_and(|deadline| now_millis() >= deadline)
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Durable one-file-per-key cache backend.
#[derive(Debug)]
pub struct FilesystemCache {
    dir: PathBuf,
    available: bool,
}

impl FilesystemCache {
    /// Creates the cache directory if needed. On failure the backend is
    /// marked unavailable and every subsequent operation is a no-op.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        let available = match std::fs::create_dir_all(&dir) {
            Ok(()) => true,
            Err(error) => {
                warn!(dir = %dir.display(), %error, "cache directory unavailable, caching disabled");
                false
            }
        };
        FilesystemCache { dir, available }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        // Lossy encoding: the file name need not map back to the key.
        let encoded: String = key
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                    c
                } else {
                    '-'
                }
            })
            .collect();
        self.dir.join(format!("{encoded}{FILE_SUFFIX}"))
    }

    async fn read_entry(&self, path: &Path) -> Option<StoredEntry> {
        let body = tokio::fs::read_to_string(path).await.ok()?;
        match serde_json::from_str(&body) {
            Ok(entry) => Some(entry),
            Err(error) => {
                warn!(path = %path.display(), %error, "discarding unparsable cache file");
                None
            }
        }
    }
}

#[async_trait]
impl FlagCache for FilesystemCache {
    async fn get(&self, key: &str) -> Option<String> {
        if !self.available {
            return None;
        }
        let path = self.path_for(key);
        let entry = self.read_entry(&path).await?;
        if entry.is_expired() {
            let _ = tokio::fs::remove_file(&path).await;
            return None;
        }
        Some(entry.value)
    }

    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) {
        if !self.available {
            return;
        }
        let entry = StoredEntry {
            value: value.to_string(),
            expires: ttl.map(|ttl| now_millis() + ttl.as_millis() as u64),
        };
        let path = self.path_for(key);
        match serde_json::to_string(&entry) {
            Ok(body) => {
                if let Err(error) = tokio::fs::write(&path, body).await {
                    warn!(path = %path.display(), %error, "failed to write cache file");
                }
            }
            Err(error) => {
                warn!(%error, "failed to serialize cache entry");
            }
        }
    }

    async fn contains(&self, key: &str) -> bool {
        self.get(key).await.is_some()
    }

    async fn remove(&self, key: &str) {
        if !self.available {
            return;
        }
        let _ = tokio::fs::remove_file(self.path_for(key)).await;
    }

    async fn clear(&self) {
        if !self.available {
            return;
        }
        let Ok(mut entries) = tokio::fs::read_dir(&self.dir).await else {
            return;
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            let name = entry.file_name();
            if name.to_string_lossy().ends_with(FILE_SUFFIX) {
                debug!(file = %name.to_string_lossy(), "removing cache file");
                let _ = tokio::fs::remove_file(entry.path()).await;
            }
        }
    }
}
