//! Two-tier cache store
//!
//! The hot tier is an in-memory LRU of configured capacity. Entries
//! evicted from the hot tier are demoted to one JSON file per
//! fingerprint under the cache directory. A file's presence on disk is
//! itself the "already demoted" signal: demotion is idempotent, and an
//! existing file is trusted as valid across restarts.

use super::types::CacheEntry;
use crate::error::{Error, Result};
use crate::http::ResponseEnvelope;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Configuration for the response cache
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Hot tier capacity in entries
    pub capacity: usize,
    /// Directory for demoted entries
    pub dir: PathBuf,
}

impl CacheConfig {
    /// Create a config with the given capacity and directory
    pub fn new(capacity: usize, dir: impl Into<PathBuf>) -> Self {
        Self {
            capacity,
            dir: dir.into(),
        }
    }
}

/// Two-tier response cache keyed by request fingerprint
pub struct ResponseCache {
    hot: Mutex<LruCache<String, Arc<CacheEntry>>>,
    dir: PathBuf,
}

impl ResponseCache {
    /// Create a cache from its configuration
    pub fn new(config: CacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            hot: Mutex::new(LruCache::new(capacity)),
            dir: config.dir,
        }
    }

    /// Look up a fresh entry by fingerprint.
    ///
    /// The hot tier is checked first; on a miss the disk tier is read.
    /// Entries older than `max_age_ms` are treated as misses (a stale
    /// hot entry is dropped so the slot frees up). Corrupt disk entries
    /// degrade to misses, never to failures.
    pub async fn get(&self, fingerprint: &str, max_age_ms: u64) -> Option<Arc<CacheEntry>> {
        let mut hot = self.hot.lock().await;
        if let Some(entry) = hot.get(fingerprint) {
            if entry.is_fresh(max_age_ms) {
                debug!("Cache hit (hot) for {fingerprint}");
                return Some(Arc::clone(entry));
            }
            hot.pop(fingerprint);
        }
        drop(hot);

        let path = self.entry_path(fingerprint);
        let entry = read_entry(&path)?;
        if !entry.is_fresh(max_age_ms) {
            return None;
        }
        debug!("Cache hit (disk) for {fingerprint}");
        Some(Arc::new(entry))
    }

    /// Store a response under its fingerprint.
    ///
    /// Only status-200 responses with non-empty bodies are stored; all
    /// other envelopes are ignored. An entry evicted from the hot tier
    /// by this insert is demoted to disk.
    pub async fn put(&self, fingerprint: &str, envelope: &ResponseEnvelope) -> Result<()> {
        if !envelope.is_ok() || envelope.body.is_empty() {
            return Ok(());
        }

        let entry = Arc::new(CacheEntry::from_envelope(envelope));

        let mut hot = self.hot.lock().await;
        let evicted = hot.push(fingerprint.to_string(), entry);
        drop(hot);

        if let Some((evicted_key, evicted_entry)) = evicted {
            // push returns the replaced value when the key was already
            // present; only a different key is a true eviction
            if evicted_key != fingerprint {
                self.demote(&evicted_key, &evicted_entry)?;
            }
        }

        Ok(())
    }

    /// Number of entries currently in the hot tier
    pub async fn hot_len(&self) -> usize {
        self.hot.lock().await.len()
    }

    /// Whether a demoted file exists for the fingerprint
    pub fn is_demoted(&self, fingerprint: &str) -> bool {
        self.entry_path(fingerprint).exists()
    }

    /// Write an evicted entry to the disk tier.
    ///
    /// An existing file means the entry was already demoted once; it is
    /// left untouched.
    fn demote(&self, fingerprint: &str, entry: &CacheEntry) -> Result<()> {
        let path = self.entry_path(fingerprint);
        if path.exists() {
            return Ok(());
        }

        std::fs::create_dir_all(&self.dir).map_err(Error::Io)?;

        let contents = serde_json::to_string(entry).map_err(Error::JsonParse)?;

        // Write to temp file first, then rename for atomicity
        let temp_path = path.with_extension("tmp");
        std::fs::write(&temp_path, &contents).map_err(Error::Io)?;
        std::fs::rename(&temp_path, &path).map_err(Error::Io)?;

        debug!("Demoted cache entry {fingerprint} to disk");
        Ok(())
    }

    fn entry_path(&self, fingerprint: &str) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }
}

impl std::fmt::Debug for ResponseCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResponseCache")
            .field("dir", &self.dir)
            .finish_non_exhaustive()
    }
}

/// Read a demoted entry, degrading any failure to a miss
fn read_entry(path: &Path) -> Option<CacheEntry> {
    if !path.exists() {
        return None;
    }

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) => {
            warn!("Failed to read cache file {}: {e}", path.display());
            return None;
        }
    };

    match serde_json::from_str(&contents) {
        Ok(entry) => Some(entry),
        Err(e) => {
            warn!("Ignoring corrupt cache file {}: {e}", path.display());
            None
        }
    }
}
