//! Cache-First Loader.
//!
//! Tries, in order, the local cache, the bundled static JSON file and the
//! remote API. The first tier that answers wins; later tiers are not
//! contacted. Values coming from the network are written back to the
//! cache so the next page load is served locally.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, info};

use crate::cache::CacheStore;
use crate::fetch::SourceFetcher;

/// Where a source can be loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceDescriptor {
    pub local_url: Option<String>,
    pub remote_url: Option<String>,
    pub cache_key: String,
}

impl SourceDescriptor {
    pub fn new(cache_key: impl Into<String>) -> Self {
        Self {
            local_url: None,
            remote_url: None,
            cache_key: cache_key.into(),
        }
    }

    pub fn local(mut self, url: impl Into<String>) -> Self {
        self.local_url = Some(url.into());
        self
    }

    pub fn remote(mut self, url: impl Into<String>) -> Self {
        self.remote_url = Some(url.into());
        self
    }
}

/// The tier that produced a loaded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Cache,
    LocalFile,
    Remote,
}

/// Whether a cached value must also be recent to short-circuit a load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Any cached value is used, however old. The background refresh is
    /// what keeps it current.
    #[default]
    PresenceOnly,
    /// Cached values older than this are skipped.
    MaxAge(Duration),
}

#[derive(Clone)]
pub struct CacheFirstLoader {
    cache: Arc<CacheStore>,
    fetcher: SourceFetcher,
    policy: CachePolicy,
}

impl CacheFirstLoader {
    pub fn new(cache: Arc<CacheStore>, fetcher: SourceFetcher) -> Self {
        Self {
            cache,
            fetcher,
            policy: CachePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: CachePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn fetcher(&self) -> &SourceFetcher {
        &self.fetcher
    }

    fn cached(&self, key: &str) -> Option<Value> {
        let entry = self.cache.entry(key)?;
        match self.policy {
            CachePolicy::PresenceOnly => Some(entry.data),
            CachePolicy::MaxAge(max_age) if entry.is_fresh(max_age) => Some(entry.data),
            CachePolicy::MaxAge(_) => {
                debug!(cache = key, age = %entry.age_display(), "Cached value is stale, skipping");
                None
            }
        }
    }

    /// Load a source, returning the value and the tier that produced it.
    pub async fn load_with_tier(&self, source: &SourceDescriptor) -> Option<(Value, Tier)> {
        let key = source.cache_key.as_str();

        if let Some(value) = self.cached(key) {
            debug!(cache = key, "Loaded from cache");
            return Some((value, Tier::Cache));
        }

        let network_tiers = [
            (source.local_url.as_deref(), Tier::LocalFile),
            (source.remote_url.as_deref(), Tier::Remote),
        ];
        for (url, tier) in network_tiers {
            let Some(url) = url else { continue };
            if let Some(value) = self.fetcher.fetch(url).await {
                info!(cache = key, url, ?tier, "Loaded source");
                self.cache.set(key, &value);
                return Some((value, tier));
            }
        }

        debug!(cache = key, "Source unavailable on every tier");
        None
    }

    /// Load a source, `None` when every tier misses.
    pub async fn load(&self, source: &SourceDescriptor) -> Option<Value> {
        self.load_with_tier(source).await.map(|(value, _)| value)
    }
}
