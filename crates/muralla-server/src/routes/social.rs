//! Instagram and TikTok feed mirrors, read from Apify datasets.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, Json};
use chrono::Utc;
use muralla_core::api::DatasetKind;
use muralla_core::feeds::{self, MAX_FEED_POSTS};
use tracing::{info, warn};

use crate::error::ProxyError;
use crate::state::AppState;

/// Edge caches may serve the feed for an hour, then revalidate.
pub const FEED_CACHE_CONTROL: &str = "s-maxage=3600, stale-while-revalidate";

/// Comments fetched from the comments dataset
const MAX_COMMENTS: usize = 500;

pub async fn instagram(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ProxyError> {
    let apify = state.apify_datasets()?;

    let found = apify
        .find_datasets(&[DatasetKind::InstagramPosts, DatasetKind::InstagramComments])
        .await
        .map_err(|e| ProxyError::from_vendor(e, "No Instagram data available yet"))?;

    let posts_dataset = found
        .get(&DatasetKind::InstagramPosts)
        .and_then(|run| run.default_dataset_id.as_deref())
        .ok_or_else(|| {
            ProxyError::NotFound("No Instagram posts dataset found in recent runs".to_string())
        })?;

    let items = apify
        .dataset_items(posts_dataset, MAX_FEED_POSTS)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to fetch Instagram posts"))?;

    let comments = match found
        .get(&DatasetKind::InstagramComments)
        .and_then(|run| run.default_dataset_id.as_deref())
    {
        Some(dataset) => match apify.dataset_items(dataset, MAX_COMMENTS).await {
            Ok(items) => feeds::group_comments(&items),
            Err(e) => {
                warn!(error = %e, "Continuing without comments");
                HashMap::new()
            }
        },
        None => HashMap::new(),
    };

    let posts = feeds::instagram_posts(&items, &comments, Utc::now().date_naive());
    info!(items = items.len(), posts = posts.len(), "Serving Instagram feed");

    Ok(([(header::CACHE_CONTROL, FEED_CACHE_CONTROL)], Json(posts)))
}

pub async fn tiktok(State(state): State<Arc<AppState>>) -> Result<impl IntoResponse, ProxyError> {
    let apify = state.apify_datasets()?;

    let runs = apify
        .list_runs(1)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to fetch TikTok data"))?;
    let latest = runs
        .first()
        .ok_or_else(|| ProxyError::NotFound("No TikTok data available yet".to_string()))?;
    let dataset = latest
        .default_dataset_id
        .as_deref()
        .ok_or_else(|| ProxyError::NotFound("No dataset found".to_string()))?;

    let items = apify
        .dataset_items(dataset, MAX_FEED_POSTS)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to fetch TikTok videos"))?;

    let posts = feeds::tiktok_posts(&items, Utc::now().date_naive());
    info!(posts = posts.len(), "Serving TikTok feed");

    Ok(([(header::CACHE_CONTROL, FEED_CACHE_CONTROL)], Json(posts)))
}
