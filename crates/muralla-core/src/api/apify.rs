//! Apify client for scraper runs and their datasets.
//!
//! The site never stores Apify identifiers: every request lists the most
//! recent successful runs and sniffs one item per dataset to guess what
//! the run scraped. The vendor gives no schema guarantee, so the sniff is
//! best-effort.

use std::collections::HashMap;

use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use super::client::{http_client, read_json};
use super::ApiError;

/// Base URL for the Apify v2 API
pub const APIFY_BASE_URL: &str = "https://api.apify.com/v2";

/// Maximum number of recent runs probed while looking for a dataset.
pub const MAX_PROBED_RUNS: usize = 20;

#[derive(Debug, Clone, Deserialize)]
pub struct ActorRun {
    pub id: String,
    #[serde(rename = "defaultDatasetId", default)]
    pub default_dataset_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RunsEnvelope {
    data: RunsPage,
}

#[derive(Debug, Deserialize)]
struct RunsPage {
    #[serde(default)]
    items: Vec<ActorRun>,
}

#[derive(Debug, Deserialize)]
struct RunEnvelope {
    data: ActorRun,
}

/// What a dataset appears to contain, judged from one sample item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatasetKind {
    InstagramPosts,
    InstagramComments,
    MapsPlace,
}

impl DatasetKind {
    pub fn matches(&self, item: &Value) -> bool {
        let has = |key: &str| is_truthy(item.get(key));
        match self {
            DatasetKind::InstagramPosts => has("shortCode") || has("displayUrl"),
            DatasetKind::InstagramComments => {
                has("text") && has("ownerUsername") && !has("displayUrl")
            }
            DatasetKind::MapsPlace => has("reviews") || has("totalScore") || has("placeId"),
        }
    }
}

/// JavaScript-style truthiness for sniffing loosely shaped vendor items.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

#[derive(Clone)]
pub struct ApifyClient {
    client: Client,
    base_url: String,
    token: String,
    user_id: Option<String>,
}

impl ApifyClient {
    pub fn new(token: impl Into<String>, user_id: Option<String>) -> Result<Self, ApiError> {
        Ok(Self::with_client(http_client()?, APIFY_BASE_URL, token, user_id))
    }

    /// Create a client sharing an existing connection pool, against any base URL.
    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        token: impl Into<String>,
        user_id: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            user_id,
        }
    }

    /// List the most recent successful runs, newest first.
    pub async fn list_runs(&self, limit: usize) -> Result<Vec<ActorRun>, ApiError> {
        let url = format!("{}/actor-runs", self.base_url);
        let limit = limit.to_string();
        let mut query = vec![
            ("token", self.token.as_str()),
            ("limit", limit.as_str()),
            ("status", "SUCCEEDED"),
            ("desc", "true"),
        ];
        if let Some(ref user_id) = self.user_id {
            query.push(("userId", user_id.as_str()));
        }

        let response = self.client.get(&url).query(&query).send().await?;
        let envelope: RunsEnvelope = read_json(response).await?;
        debug!(count = envelope.data.items.len(), "Listed Apify runs");
        Ok(envelope.data.items)
    }

    pub async fn dataset_items(
        &self,
        dataset_id: &str,
        limit: usize,
    ) -> Result<Vec<Value>, ApiError> {
        let url = format!("{}/datasets/{}/items", self.base_url, dataset_id);
        let limit = limit.to_string();
        let response = self
            .client
            .get(&url)
            .query(&[("token", self.token.as_str()), ("limit", limit.as_str())])
            .send()
            .await?;
        read_json(response).await
    }

    /// Probe recent runs for datasets of the wanted kinds.
    ///
    /// Samples one item from each run's default dataset, stopping once
    /// every wanted kind has a match. Runs whose sample fails to load are
    /// skipped. The first (newest) run matching a kind wins.
    pub async fn find_datasets(
        &self,
        wanted: &[DatasetKind],
    ) -> Result<HashMap<DatasetKind, ActorRun>, ApiError> {
        let runs = self.list_runs(MAX_PROBED_RUNS).await?;
        if runs.is_empty() {
            return Err(ApiError::NotFound("no successful runs yet".to_string()));
        }

        let mut found: HashMap<DatasetKind, ActorRun> = HashMap::new();
        for run in runs.into_iter().take(MAX_PROBED_RUNS) {
            let Some(dataset_id) = run.default_dataset_id.as_deref() else {
                continue;
            };

            let sample = match self.dataset_items(dataset_id, 1).await {
                Ok(items) => items,
                Err(e) => {
                    debug!(run = %run.id, error = %e, "Skipping run with unreadable dataset");
                    continue;
                }
            };
            let Some(item) = sample.first() else {
                continue;
            };

            for kind in wanted {
                if !found.contains_key(kind) && kind.matches(item) {
                    info!(run = %run.id, ?kind, "Found dataset");
                    found.insert(*kind, run.clone());
                }
            }

            if wanted.iter().all(|kind| found.contains_key(kind)) {
                break;
            }
        }

        Ok(found)
    }

    /// Start an actor run. Returns immediately; the run finishes in the background.
    pub async fn run_actor(&self, actor_id: &str, input: &Value) -> Result<ActorRun, ApiError> {
        let url = format!("{}/acts/{}/runs", self.base_url, actor_id);
        self.start_run(&url, input).await
    }

    /// Start a saved actor task run.
    pub async fn run_task(&self, task_id: &str, input: &Value) -> Result<ActorRun, ApiError> {
        let url = format!("{}/actor-tasks/{}/runs", self.base_url, task_id);
        self.start_run(&url, input).await
    }

    async fn start_run(&self, url: &str, input: &Value) -> Result<ActorRun, ApiError> {
        let response = self
            .client
            .post(url)
            .query(&[("token", self.token.as_str())])
            .json(input)
            .send()
            .await?;
        let envelope: RunEnvelope = read_json(response).await?;
        info!(run = %envelope.data.id, "Apify run started");
        Ok(envelope.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sniff_posts() {
        let item = json!({"shortCode": "Cx1", "caption": "hola"});
        assert!(DatasetKind::InstagramPosts.matches(&item));
        assert!(!DatasetKind::InstagramComments.matches(&item));
        assert!(!DatasetKind::MapsPlace.matches(&item));
    }

    #[test]
    fn test_sniff_comments() {
        let item = json!({"text": "rico", "ownerUsername": "ana", "postShortCode": "Cx1"});
        assert!(DatasetKind::InstagramComments.matches(&item));
        assert!(!DatasetKind::InstagramPosts.matches(&item));

        // A post carrying a caption-like text is still not a comment
        let post = json!({"text": "x", "ownerUsername": "muralla", "displayUrl": "https://x"});
        assert!(!DatasetKind::InstagramComments.matches(&post));
    }

    #[test]
    fn test_sniff_maps_place() {
        assert!(DatasetKind::MapsPlace.matches(&json!({"totalScore": 4.8})));
        assert!(DatasetKind::MapsPlace.matches(&json!({"placeId": "ChIJ"})));
        assert!(!DatasetKind::MapsPlace.matches(&json!({"totalScore": 0, "title": "x"})));
    }

    #[test]
    fn test_parse_runs_envelope() {
        let raw = r#"{"data":{"total":2,"items":[
            {"id":"r1","defaultDatasetId":"d1","status":"SUCCEEDED"},
            {"id":"r2"}
        ]}}"#;
        let envelope: RunsEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.data.items.len(), 2);
        assert_eq!(envelope.data.items[0].default_dataset_id.as_deref(), Some("d1"));
        assert!(envelope.data.items[1].default_dataset_id.is_none());
    }
}
