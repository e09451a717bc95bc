use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

/// Prefix shared by every cache key.
pub const CACHE_KEY_PREFIX: &str = "muralla_cache_";

/// Consider cached data stale after 1 hour.
pub const CACHE_DURATION: Duration = Duration::from_secs(60 * 60);

/// One cached payload together with its write time (epoch millis).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: Value,
    pub timestamp: i64,
}

impl CacheEntry {
    pub fn new(data: Value) -> Self {
        Self {
            data,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Age in milliseconds. Negative ages (clock skew) clamp to zero.
    pub fn age_millis(&self) -> i64 {
        (Utc::now().timestamp_millis() - self.timestamp).max(0)
    }

    pub fn is_fresh(&self, max_age: Duration) -> bool {
        (self.age_millis() as u128) < max_age.as_millis()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_millis() / 60_000;
        if minutes < 1 {
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            let hours = minutes / 60;
            if minutes % 60 >= 30 {
                // Round up: 1h 30m+ becomes 2h
                format!("{}h ago", hours + 1)
            } else {
                format!("{}h ago", hours)
            }
        } else {
            let days = minutes / 1440;
            if (minutes % 1440) / 60 >= 12 {
                format!("{}d ago", days + 1)
            } else {
                format!("{}d ago", days)
            }
        }
    }
}

/// File-backed key/value store for source payloads.
///
/// Every public method is infallible from the caller's point of view:
/// unreadable, unwritable or malformed entries are logged and treated
/// as a cache miss.
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache directory {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    /// Default location: `<platform cache dir>/muralla`, or `./cache` when
    /// the platform has none.
    pub fn default_dir() -> PathBuf {
        dirs::cache_dir()
            .map(|dir| dir.join("muralla"))
            .unwrap_or_else(|| PathBuf::from("./cache"))
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}{}.json", CACHE_KEY_PREFIX, name))
    }

    fn read(&self, name: &str) -> Result<Option<CacheEntry>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let entry: CacheEntry = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(entry))
    }

    fn write(&self, name: &str, entry: &CacheEntry) -> Result<()> {
        let contents = serde_json::to_string(entry)?;
        // Write-then-rename so a crash never leaves a truncated entry behind
        let tmp = self.cache_dir.join(format!(".{}{}.tmp", CACHE_KEY_PREFIX, name));
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, self.cache_path(name))?;
        Ok(())
    }

    pub fn entry(&self, name: &str) -> Option<CacheEntry> {
        match self.read(name) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(cache = name, error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.entry(name).map(|entry| entry.data)
    }

    pub fn set(&self, name: &str, value: &Value) {
        let entry = CacheEntry::new(value.clone());
        if let Err(e) = self.write(name, &entry) {
            warn!(cache = name, error = %e, "Failed to write cache entry");
        }
    }

    pub fn is_fresh(&self, name: &str, max_age: Duration) -> bool {
        self.entry(name)
            .map(|entry| entry.is_fresh(max_age))
            .unwrap_or(false)
    }

    pub fn clear(&self, name: &str) {
        let path = self.cache_path(name);
        if path.exists() {
            if let Err(e) = std::fs::remove_file(&path) {
                warn!(cache = name, error = %e, "Failed to remove cache entry");
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
