//! Page controller: initial cache-first load, first render, background
//! refresh and per-domain re-render.

use std::time::Duration;

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::loader::{CacheFirstLoader, Tier};
use crate::models::ApiConfig;
use crate::refresh::{RefreshResult, Refresher, REFRESH_DELAY};
use crate::state::{Domain, SiteState};

/// Browser-visible keys endpoint, fetched on every load.
pub const API_CONFIG_URL: &str = "/api/config";

/// Draws one domain of the current state.
pub trait Renderer {
    fn render(&mut self, domain: Domain, state: &SiteState);
}

/// Summary of an initial load.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub loaded: Vec<(Domain, Tier)>,
    pub fallback: Vec<Domain>,
}

pub struct Site<R: Renderer> {
    pub state: SiteState,
    loader: CacheFirstLoader,
    refresher: Refresher,
    renderer: R,
    refresh_rx: mpsc::Receiver<RefreshResult>,
    refresh_tx: mpsc::Sender<RefreshResult>,
    refresh_task: Option<JoinHandle<()>>,
    refresh_delay: Duration,
    refreshing: bool,
}

impl<R: Renderer> Site<R> {
    pub fn new(loader: CacheFirstLoader, renderer: R) -> Self {
        let (tx, rx) = mpsc::channel(32);
        Self {
            state: SiteState::default(),
            refresher: Refresher::new(loader.clone()),
            loader,
            renderer,
            refresh_rx: rx,
            refresh_tx: tx,
            refresh_task: None,
            refresh_delay: REFRESH_DELAY,
            refreshing: false,
        }
    }

    pub fn with_refresh_delay(mut self, delay: Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    /// Load every domain concurrently and render each once.
    ///
    /// Domains that miss on every tier keep their built-in dataset. The
    /// maps key from `/api/config` is merged in regardless of which tier
    /// answered for the site config.
    pub async fn load_all(&mut self) -> LoadReport {
        let loader = &self.loader;
        let loads = Domain::ALL.iter().map(|domain| async move {
            (*domain, loader.load_with_tier(&domain.descriptor()).await)
        });
        let (loaded, api_config) =
            futures::join!(join_all(loads), loader.fetcher().fetch(API_CONFIG_URL));

        let mut report = LoadReport::default();
        for (domain, result) in loaded {
            match result {
                Some((value, tier)) if self.state.apply(domain, &value) => {
                    report.loaded.push((domain, tier));
                }
                _ => {
                    debug!(domain = ?domain, "Using built-in data");
                    self.state.use_fallback(domain);
                    report.fallback.push(domain);
                }
            }
        }

        match api_config.map(serde_json::from_value::<ApiConfig>) {
            Some(Ok(api_config)) => self.state.set_api_config(api_config),
            Some(Err(e)) => warn!(error = %e, "Unexpected /api/config payload"),
            None => debug!("No /api/config available"),
        }

        info!(
            loaded = report.loaded.len(),
            fallback = report.fallback.len(),
            "Initial load complete"
        );

        for domain in Domain::ALL {
            self.renderer.render(domain, &self.state);
        }
        report
    }

    /// Spawn the one-shot background refresh of every remote-backed domain.
    pub fn refresh_all_background(&mut self) {
        let domains: Vec<Domain> = Domain::ALL.into_iter().filter(Domain::has_remote).collect();
        info!(count = domains.len(), "Starting background refresh");
        let task = self
            .refresher
            .spawn_all(domains, self.refresh_delay, self.refresh_tx.clone());
        self.refresh_task = Some(task);
        self.refreshing = true;
    }

    /// Apply whatever refresh results have arrived without waiting.
    /// Returns the domains that were re-rendered.
    pub fn check_background_tasks(&mut self) -> Vec<Domain> {
        let mut results = Vec::new();
        while let Ok(result) = self.refresh_rx.try_recv() {
            results.push(result);
        }

        results
            .into_iter()
            .filter_map(|result| self.process_refresh_result(result))
            .collect()
    }

    /// Block until the running background refresh reports completion
    /// or its task ends.
    pub async fn wait_for_refresh(&mut self) -> Vec<Domain> {
        let Some(mut task) = self.refresh_task.take() else {
            self.refreshing = false;
            return self.check_background_tasks();
        };

        let mut rendered = Vec::new();
        while self.refreshing {
            tokio::select! {
                Some(result) = self.refresh_rx.recv() => {
                    rendered.extend(self.process_refresh_result(result));
                }
                joined = &mut task => {
                    if let Err(e) = joined {
                        error!(error = %e, "Background refresh task failed");
                    }
                    rendered.extend(self.check_background_tasks());
                    self.refreshing = false;
                }
            }
        }
        rendered
    }

    fn process_refresh_result(&mut self, result: RefreshResult) -> Option<Domain> {
        match result {
            RefreshResult::Changed(domain, value) => self.apply_refreshed(domain, &value),
            RefreshResult::Complete => {
                debug!("Background refresh complete");
                self.refreshing = false;
                None
            }
        }
    }

    fn apply_refreshed(&mut self, domain: Domain, value: &Value) -> Option<Domain> {
        if !self.state.apply(domain, value) {
            return None;
        }
        info!(domain = ?domain, "Re-rendering refreshed domain");
        self.renderer.render(domain, &self.state);
        Some(domain)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::cache::CacheStore;
    use crate::fetch::SourceFetcher;

    struct NoopRenderer;

    impl Renderer for NoopRenderer {
        fn render(&mut self, _domain: Domain, _state: &SiteState) {}
    }

    #[tokio::test]
    async fn test_wait_for_refresh_returns_when_task_dies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache = Arc::new(CacheStore::new(dir.path().to_path_buf()).expect("store"));
        let loader = CacheFirstLoader::new(cache, SourceFetcher::new(None).expect("fetcher"));
        let mut site = Site::new(loader, NoopRenderer);

        site.refresh_task = Some(tokio::spawn(async { panic!("refresh task crashed") }));
        site.refreshing = true;

        let rendered = tokio::time::timeout(Duration::from_secs(5), site.wait_for_refresh())
            .await
            .expect("wait_for_refresh should not hang");
        assert!(rendered.is_empty());
        assert!(!site.is_refreshing());
    }
}
