//! Reviews widget, backed by the configured vendor.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use chrono::Utc;
use muralla_core::api::DatasetKind;
use muralla_core::feeds;
use muralla_core::models::ReviewsResponse;
use serde::Deserialize;
use tracing::info;

use crate::config::ReviewsVendor;
use crate::error::ProxyError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ReviewsQuery {
    #[serde(rename = "placeId")]
    place_id: Option<String>,
}

pub async fn reviews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ReviewsQuery>,
) -> Result<Json<ReviewsResponse>, ProxyError> {
    let reviews = match state.config.reviews_vendor {
        ReviewsVendor::Apify => from_apify(&state).await?,
        ReviewsVendor::Google => {
            let place_id = query
                .place_id
                .filter(|id| !id.is_empty())
                .ok_or(ProxyError::BadRequest("placeId parameter required"))?;
            state
                .places()?
                .reviews(&place_id)
                .await
                .map_err(|e| ProxyError::from_vendor(e, "Failed to fetch reviews"))?
        }
    };

    info!(
        vendor = ?state.config.reviews_vendor,
        count = reviews.reviews.len(),
        rating = reviews.rating,
        "Serving reviews"
    );
    Ok(Json(reviews))
}

async fn from_apify(state: &AppState) -> Result<ReviewsResponse, ProxyError> {
    let apify = state.apify_datasets()?;

    let found = apify
        .find_datasets(&[DatasetKind::MapsPlace])
        .await
        .map_err(|e| ProxyError::from_vendor(e, "No Google Maps data available yet"))?;
    let dataset = found
        .get(&DatasetKind::MapsPlace)
        .and_then(|run| run.default_dataset_id.as_deref())
        .ok_or_else(|| {
            ProxyError::NotFound("No Google Maps dataset found in recent runs".to_string())
        })?;

    let places = apify
        .dataset_items(dataset, 1)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to fetch reviews"))?;
    let place = places
        .first()
        .ok_or_else(|| ProxyError::NotFound("No place data found".to_string()))?;

    Ok(feeds::reviews_from_place(place, Utc::now()))
}
