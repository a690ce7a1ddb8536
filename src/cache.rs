//! Fingerprint-keyed report cache.
//!
//! Each entry is one JSON file `{timestamp, data}` named after a SHA-256
//! fingerprint of the scan inputs. Entries older than the TTL are ignored
//! but left on disk; only [`FingerprintCache::invalidate_all`] deletes data.
//!
//! # Cache Location
//!
//! By default the cache is stored in platform-specific directories:
//! - Linux: `~/.cache/baseline-scan/reports/`
//! - macOS: `~/Library/Caches/baseline-scan/reports/`
//! - Windows: `%LOCALAPPDATA%\baseline-scan\reports\`
//!
//! # Example
//!
//! ```no_run
//! use baseline_scan::cache::{fingerprint_inputs, FingerprintCache};
//! use baseline_scan::config::ScanConfig;
//!
//! let cache = FingerprintCache::new();
//! let key = fingerprint_inputs(&["./src"], &ScanConfig::default()).unwrap();
//!
//! cache.set(&key, &"cached value".to_string()).unwrap();
//! let value: Option<String> = cache.get(&key);
//! assert_eq!(value, Some("cached value".to_string()));
//! ```

use anyhow::Result;
use chrono::Utc;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

use crate::platform::{cache_dir, write_atomic};

/// Default cache TTL in hours.
const CACHE_TTL_HOURS: u64 = 24;

/// Fingerprint of a scan's inputs: the root paths and the full config.
///
/// Identical inputs always give the same key; any difference in either
/// gives a different key.
pub fn fingerprint_inputs<P: AsRef<Path>>(paths: &[P], config: &impl Serialize) -> Result<String> {
    let paths: Vec<String> = paths
        .iter()
        .map(|p| p.as_ref().to_string_lossy().into_owned())
        .collect();

    let mut hasher = Sha256::new();
    hasher.update(serde_json::to_vec(&paths)?);
    hasher.update(b"\n");
    hasher.update(serde_json::to_vec(config)?);
    Ok(hex::encode(hasher.finalize()))
}

/// Fingerprint of a piece of content plus metadata describing it.
pub fn fingerprint_content(content: &[u8], metadata: &impl Serialize) -> Result<String> {
    let mut hasher = Sha256::new();
    hasher.update((content.len() as u64).to_le_bytes());
    hasher.update(content);
    hasher.update(serde_json::to_vec(metadata)?);
    Ok(hex::encode(hasher.finalize()))
}

/// On-disk entry format.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry<T> {
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
    data: T,
}

/// Summary of what is on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub files: usize,
    pub total_bytes: u64,
}

/// A file-based cache with TTL support.
#[derive(Debug, Clone)]
pub struct FingerprintCache {
    dir: PathBuf,
    ttl: Duration,
}

impl FingerprintCache {
    /// Creates a cache in the platform cache directory with the default
    /// 24-hour TTL.
    pub fn new() -> Self {
        Self::with_dir(cache_dir())
    }

    /// Creates a cache rooted at `dir`.
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ttl: hours_to_duration(CACHE_TTL_HOURS),
        }
    }

    /// Replaces the TTL.
    pub fn with_ttl_hours(mut self, hours: u64) -> Self {
        self.ttl = hours_to_duration(hours);
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Converts a cache key to a safe filename.
    fn cache_path(&self, key: &str) -> PathBuf {
        let safe_key: String = key
            .chars()
            .map(|c| {
                if c.is_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.dir.join(format!("{}.json", safe_key))
    }

    /// Retrieves a value from the cache.
    ///
    /// Returns `None` if the key doesn't exist, the entry is corrupt, or it
    /// is older than the TTL. Stale entries are not removed.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let path = self.cache_path(key);
        let content = fs::read_to_string(&path).ok()?;

        let entry: CacheEntry<T> = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt cache entry");
                return None;
            }
        };

        let age_ms = Utc::now().timestamp_millis() - entry.timestamp;
        let ttl_ms = i64::try_from(self.ttl.as_millis()).unwrap_or(i64::MAX);
        if age_ms > ttl_ms {
            debug!(key, age_ms, "cache entry expired");
            return None;
        }

        Some(entry.data)
    }

    /// Stores a value, overwriting any existing entry.
    ///
    /// The entry is written to a temporary file and renamed into place, so a
    /// concurrent reader never sees a partial entry.
    pub fn set<T: Serialize>(&self, key: &str, value: &T) -> Result<()> {
        self.write_entry(key, value, Utc::now().timestamp_millis())
    }

    fn write_entry<T: Serialize>(&self, key: &str, value: &T, timestamp: i64) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let entry = CacheEntry {
            timestamp,
            data: value,
        };
        write_atomic(&self.cache_path(key), &serde_json::to_vec(&entry)?)?;
        Ok(())
    }

    /// Removes the whole cache directory.
    pub fn invalidate_all(&self) -> Result<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Counts cache entries and their total size.
    pub fn stats(&self) -> Result<CacheStats> {
        let mut stats = CacheStats::default();
        if !self.dir.exists() {
            return Ok(stats);
        }

        for entry in fs::read_dir(&self.dir)?.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "json").unwrap_or(false) {
                stats.files += 1;
                stats.total_bytes += entry.metadata().map(|m| m.len()).unwrap_or(0);
            }
        }
        Ok(stats)
    }
}

fn hours_to_duration(hours: u64) -> Duration {
    Duration::from_secs(hours.saturating_mul(3600))
}

impl Default for FingerprintCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScanConfig;
    use tempfile::TempDir;

    #[test]
    fn test_fingerprint_is_stable() {
        let config = ScanConfig::default();
        let a = fingerprint_inputs(&["src", "styles"], &config).unwrap();
        let b = fingerprint_inputs(&["src", "styles"], &config).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }

    #[test]
    fn test_fingerprint_changes_with_inputs() {
        let config = ScanConfig::default();
        let base = fingerprint_inputs(&["src"], &config).unwrap();

        assert_ne!(base, fingerprint_inputs(&["lib"], &config).unwrap());
        assert_ne!(base, fingerprint_inputs(&["src", "lib"], &config).unwrap());

        let mut changed = config.clone();
        changed.batch_size = 11;
        assert_ne!(base, fingerprint_inputs(&["src"], &changed).unwrap());
    }

    #[test]
    fn test_content_fingerprint() {
        let a = fingerprint_content(b"body", &"meta").unwrap();
        assert_eq!(a, fingerprint_content(b"body", &"meta").unwrap());
        assert_ne!(a, fingerprint_content(b"body", &"other").unwrap());
        assert_ne!(a, fingerprint_content(b"bod", &"ymeta").unwrap());
    }

    #[test]
    fn test_set_then_get() {
        let dir = TempDir::new().unwrap();
        let cache = FingerprintCache::with_dir(dir.path().join("cache"));

        assert_eq!(cache.get::<String>("k"), None);
        cache.set("k", &"v1".to_string()).unwrap();
        assert_eq!(cache.get::<String>("k"), Some("v1".to_string()));

        cache.set("k", &"v2".to_string()).unwrap();
        assert_eq!(cache.get::<String>("k"), Some("v2".to_string()));
    }

    #[test]
    fn test_stale_entry_is_ignored_not_deleted() {
        let dir = TempDir::new().unwrap();
        let cache = FingerprintCache::with_dir(dir.path());
        let old = Utc::now().timestamp_millis() - 25 * 3600 * 1000;
        cache.write_entry("old", &42u32, old).unwrap();

        assert_eq!(cache.get::<u32>("old"), None);
        assert!(cache.cache_path("old").exists());

        let lenient = cache.clone().with_ttl_hours(48);
        assert_eq!(lenient.get::<u32>("old"), Some(42));
    }

    #[test]
    fn test_corrupt_entry_is_a_miss() {
        let dir = TempDir::new().unwrap();
        let cache = FingerprintCache::with_dir(dir.path());
        fs::write(cache.cache_path("bad"), "{not json").unwrap();
        assert_eq!(cache.get::<u32>("bad"), None);

        fs::write(cache.cache_path("shape"), r#"{"data": 1}"#).unwrap();
        assert_eq!(cache.get::<u32>("shape"), None);
    }

    #[test]
    fn test_stats_and_invalidate_all() {
        let dir = TempDir::new().unwrap();
        let cache = FingerprintCache::with_dir(dir.path().join("cache"));
        assert_eq!(cache.stats().unwrap(), CacheStats::default());

        cache.set("a", &"x".to_string()).unwrap();
        cache.set("b", &"y".to_string()).unwrap();
        let stats = cache.stats().unwrap();
        assert_eq!(stats.files, 2);
        assert!(stats.total_bytes > 0);

        cache.invalidate_all().unwrap();
        assert!(!cache.dir().exists());
        assert_eq!(cache.get::<String>("a"), None);
    }

    #[test]
    fn test_huge_ttl_saturates() {
        let dir = TempDir::new().unwrap();
        let cache = FingerprintCache::with_dir(dir.path()).with_ttl_hours(u64::MAX);
        cache.set("k", &1u8).unwrap();
        assert_eq!(cache.get::<u8>("k"), Some(1));
    }

    #[test]
    fn test_unsafe_key_characters_are_replaced() {
        let dir = TempDir::new().unwrap();
        let cache = FingerprintCache::with_dir(dir.path());
        let path = cache.cache_path("../escape");
        assert_eq!(path, dir.path().join("___escape.json"));
    }
}
