//! Endpoints that start Apify scrapes. They return as soon as the run is
//! queued; the feeds pick up the new dataset once it succeeds.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    Json,
};
use chrono::{SecondsFormat, Utc};
use muralla_core::api::DatasetKind;
use muralla_core::models::ScrapeTriggered;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::error::ProxyError;
use crate::state::AppState;

pub const PROFILE_SCRAPER_ACTOR: &str = "apify~instagram-profile-scraper";

const PROFILE_RESULTS_LIMIT: u32 = 10;

/// Posts whose URLs are handed to the comments scraper
const MAX_COMMENT_POSTS: usize = 200;

const APIFY_RUN_CONSOLE_URL: &str = "https://console.apify.com/actors/runs";

/// Scheduled scrape, authorized by `Authorization: Bearer $CRON_SECRET`.
pub async fn cron_update_instagram(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<ScrapeTriggered>, ProxyError> {
    let secret = state.config.cron_secret.as_deref().ok_or_else(|| {
        ProxyError::MissingConfiguration("CRON_SECRET must be set".to_string())
    })?;

    let authorized = headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| token == secret);
    if !authorized {
        warn!("Rejected cron trigger");
        return Err(ProxyError::Unauthorized("Unauthorized"));
    }

    info!("Starting scheduled Instagram scrape");
    start_profile_scrape(&state, "Instagram scraper triggered successfully").await
}

#[derive(Debug, Deserialize)]
pub struct SecretQuery {
    secret: Option<String>,
}

/// Manual scrape, authorized by `?secret=$INSTAGRAM_REFRESH_SECRET`.
pub async fn refresh_instagram(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SecretQuery>,
) -> Result<Json<ScrapeTriggered>, ProxyError> {
    let secret = state.config.refresh_secret.as_deref().ok_or_else(|| {
        ProxyError::MissingConfiguration("INSTAGRAM_REFRESH_SECRET must be set".to_string())
    })?;

    if query.secret.as_deref() != Some(secret) {
        warn!("Rejected manual refresh");
        return Err(ProxyError::Unauthorized("Unauthorized - invalid secret"));
    }

    info!("Starting manual Instagram scrape");
    start_profile_scrape(
        &state,
        "Instagram scraper triggered successfully. Posts will update in about 30 seconds.",
    )
    .await
}

async fn start_profile_scrape(
    state: &AppState,
    message: &str,
) -> Result<Json<ScrapeTriggered>, ProxyError> {
    let apify = state.apify_runs()?;
    let input = json!({
        "usernames": [state.config.instagram_username],
        "resultsLimit": PROFILE_RESULTS_LIMIT,
    });

    let run = apify
        .run_actor(PROFILE_SCRAPER_ACTOR, &input)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to start scraper"))?;
    info!(run = %run.id, dataset = ?run.default_dataset_id, "Scraper started");

    Ok(Json(ScrapeTriggered {
        success: true,
        message: message.to_string(),
        run_id: run.id,
        dataset_id: run.default_dataset_id,
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }))
}

#[derive(Debug, Serialize)]
pub struct CommentsTriggered {
    pub success: bool,
    pub message: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "runUrl")]
    pub run_url: String,
    #[serde(rename = "postCount")]
    pub post_count: usize,
}

/// Start the comments scraper task for every post in the latest posts dataset.
pub async fn trigger_comments(
    State(state): State<Arc<AppState>>,
) -> Result<Json<CommentsTriggered>, ProxyError> {
    let apify = state.apify_datasets()?;
    let task_id = state
        .config
        .instagram_comments_task_id
        .as_deref()
        .ok_or_else(|| {
            ProxyError::MissingConfiguration(
                "APIFY_API_TOKEN, APIFY_USER_ID, and INSTAGRAM_COMMENTS_TASK_ID must be set"
                    .to_string(),
            )
        })?;

    let found = apify
        .find_datasets(&[DatasetKind::InstagramPosts])
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to fetch runs"))?;
    let dataset = found
        .get(&DatasetKind::InstagramPosts)
        .and_then(|run| run.default_dataset_id.as_deref())
        .ok_or_else(|| ProxyError::NotFound("No posts dataset found".to_string()))?;

    let posts = apify
        .dataset_items(dataset, MAX_COMMENT_POSTS)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to fetch posts"))?;
    let post_urls = post_urls(&posts);
    info!(count = post_urls.len(), "Collected post URLs for comments scrape");

    let input = json!({
        "directUrls": post_urls,
        "resultsType": "comments",
        "resultsLimit": 200,
        "addParentData": false,
    });
    let run = apify
        .run_task(task_id, &input)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to trigger comments scraper"))?;

    Ok(Json(CommentsTriggered {
        success: true,
        message: "Comments scraper started".to_string(),
        run_url: format!("{APIFY_RUN_CONSOLE_URL}/{}", run.id),
        run_id: run.id,
        post_count: post_urls.len(),
    }))
}

fn post_urls(posts: &[Value]) -> Vec<String> {
    posts
        .iter()
        .filter_map(|post| {
            let url = post.get("url").and_then(Value::as_str).filter(|u| !u.is_empty());
            match url {
                Some(url) => Some(url.to_string()),
                None => post
                    .get("shortCode")
                    .and_then(Value::as_str)
                    .filter(|code| !code.is_empty())
                    .map(|code| format!("https://www.instagram.com/p/{code}/")),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_urls_prefer_url_then_short_code() {
        let posts = vec![
            json!({"url": "https://www.instagram.com/p/A1/", "shortCode": "A1"}),
            json!({"shortCode": "B2"}),
            json!({"caption": "no link"}),
        ];
        assert_eq!(
            post_urls(&posts),
            vec![
                "https://www.instagram.com/p/A1/".to_string(),
                "https://www.instagram.com/p/B2/".to_string(),
            ]
        );
    }
}
