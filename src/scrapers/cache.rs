//! In-memory TTL cache for fetched page content.
//!
//! Chapter bodies rarely change once published, so a fetched chapter page is
//! kept for the TTL window (60 minutes by default) to avoid repeated network or
//! browser work. Entries expire lazily on read; `clear_expired` sweeps them
//! explicitly.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use serde::Serialize;
use tokio::time::Instant;
use tracing::debug;

/// Default TTL in minutes.
pub const DEFAULT_TTL_MINUTES: u64 = 60;

/// A cached page body with its creation time.
struct CacheEntry {
    content: String,
    created_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.created_at.elapsed() > ttl
    }
}

/// Cache statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub size: usize,
    pub ttl_minutes: u64,
}

/// URL-keyed content cache.
///
/// Keys are BLAKE3 digests of the URL. Concurrent fetches of the same URL are
/// not de-duplicated; the last write wins.
pub struct ContentCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
}

impl ContentCache {
    /// Create a cache with the default TTL.
    pub fn new() -> Self {
        Self::with_ttl_minutes(DEFAULT_TTL_MINUTES)
    }

    /// Create a cache with a TTL in minutes.
    pub fn with_ttl_minutes(minutes: u64) -> Self {
        Self::with_ttl(Duration::from_secs(minutes * 60))
    }

    /// Create a cache with an arbitrary TTL.
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
        }
    }

    fn cache_key(url: &str) -> String {
        blake3::hash(url.as_bytes()).to_hex().to_string()
    }

    /// Get cached content, evicting the entry if it has expired.
    pub fn get(&self, url: &str) -> Option<String> {
        let key = Self::cache_key(url);
        let Ok(mut entries) = self.entries.lock() else {
            return None;
        };

        let expired = entries.get(&key)?.is_expired(self.ttl);
        if expired {
            debug!("Cache entry for {} expired", url);
            entries.remove(&key);
            return None;
        }

        entries.get(&key).map(|e| e.content.clone())
    }

    /// Store content for a URL, replacing any previous entry.
    pub fn set(&self, url: &str, content: impl Into<String>) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(
                Self::cache_key(url),
                CacheEntry {
                    content: content.into(),
                    created_at: Instant::now(),
                },
            );
        }
    }

    /// Whether a live entry exists for the URL.
    pub fn has(&self, url: &str) -> bool {
        self.get(url).is_some()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.clear();
        }
    }

    /// Drop expired entries.
    pub fn clear_expired(&self) {
        if let Ok(mut entries) = self.entries.lock() {
            let ttl = self.ttl;
            entries.retain(|_, entry| !entry.is_expired(ttl));
        }
    }

    /// Current size and configured TTL.
    pub fn stats(&self) -> CacheStats {
        let size = self.entries.lock().map(|e| e.len()).unwrap_or(0);
        CacheStats {
            size,
            ttl_minutes: self.ttl.as_secs() / 60,
        }
    }
}

impl Default for ContentCache {
    fn default() -> Self {
        Self::new()
    }
}
