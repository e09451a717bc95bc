//! Background Refresher.
//!
//! After the first render, every source with a remote API is fetched once
//! more, bypassing the cache and the bundled file. A payload that differs
//! structurally from the cached one replaces it and triggers a re-render
//! of that domain only. Failures are logged and otherwise invisible.

use std::time::Duration;

use serde_json::Value;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::loader::{CacheFirstLoader, SourceDescriptor};
use crate::state::Domain;

/// Delay between the initial render and the background refresh.
pub const REFRESH_DELAY: Duration = Duration::from_secs(1);

/// What a single refresh did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    /// New payload written to the cache and announced.
    Updated,
    /// Remote payload equals the cached one; nothing written.
    Unchanged,
    /// Remote fetch failed; cache untouched.
    Failed,
    /// The source has no remote API.
    NoRemote,
}

/// Messages sent from the refresh task back to the page controller.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshResult {
    /// A domain's remote payload changed
    Changed(Domain, Value),
    /// Signal that all refresh work has completed
    Complete,
}

#[derive(Clone)]
pub struct Refresher {
    loader: CacheFirstLoader,
}

impl Refresher {
    pub fn new(loader: CacheFirstLoader) -> Self {
        Self { loader }
    }

    /// Re-fetch one source from its remote API and update the cache if the
    /// payload changed. `on_changed` runs at most once, only on change.
    pub async fn refresh<F>(&self, source: &SourceDescriptor, on_changed: F) -> RefreshOutcome
    where
        F: FnOnce(Value),
    {
        let key = source.cache_key.as_str();
        let Some(url) = source.remote_url.as_deref() else {
            return RefreshOutcome::NoRemote;
        };

        let Some(fresh) = self.loader.fetcher().fetch(url).await else {
            warn!(cache = key, url, "Background refresh failed");
            return RefreshOutcome::Failed;
        };

        let cache = self.loader.cache();
        if cache.get(key).as_ref() == Some(&fresh) {
            debug!(cache = key, "Background refresh: unchanged");
            return RefreshOutcome::Unchanged;
        }

        info!(cache = key, "Background refresh: new data");
        cache.set(key, &fresh);
        on_changed(fresh);
        RefreshOutcome::Updated
    }

    /// Spawn one task that waits `delay`, refreshes every domain in turn and
    /// reports changes through `tx`.
    pub fn spawn_all(
        &self,
        domains: Vec<Domain>,
        delay: Duration,
        tx: mpsc::Sender<RefreshResult>,
    ) -> tokio::task::JoinHandle<()> {
        let refresher = self.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            info!(count = domains.len(), "Background refresh task started");

            for domain in domains {
                let mut changed = None;
                refresher
                    .refresh(&domain.descriptor(), |value| changed = Some(value))
                    .await;
                if let Some(value) = changed {
                    send_result(&tx, RefreshResult::Changed(domain, value)).await;
                }
            }

            send_result(&tx, RefreshResult::Complete).await;
        })
    }
}

/// Helper to send refresh results, logging any channel errors
async fn send_result(tx: &mpsc::Sender<RefreshResult>, result: RefreshResult) {
    if let Err(e) = tx.send(result).await {
        error!(error = %e, "Failed to send refresh result - channel closed");
    }
}
