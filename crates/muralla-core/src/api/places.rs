//! Google Places client for the reviews widget.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::client::{http_client, read_json};
use super::ApiError;
use crate::models::{Review, ReviewsResponse};

pub const PLACES_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    #[serde(default)]
    result: Option<PlaceDetails>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    #[serde(default)]
    rating: f64,
    #[serde(default)]
    reviews: Vec<Review>,
    #[serde(default)]
    user_ratings_total: Option<usize>,
}

#[derive(Clone)]
pub struct PlacesClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PlacesClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self::with_client(http_client()?, PLACES_BASE_URL, api_key))
    }

    pub fn with_client(
        client: Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    /// Fetch rating and the newest reviews for a place.
    pub async fn reviews(&self, place_id: &str) -> Result<ReviewsResponse, ApiError> {
        let url = format!("{}/place/details/json", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", "rating,reviews,user_ratings_total"),
                ("language", "es"),
                ("reviews_sort", "newest"),
                ("key", self.api_key.as_str()),
            ])
            .send()
            .await?;

        let details: DetailsResponse = read_json(response).await?;
        if details.status != "OK" {
            return Err(ApiError::InvalidResponse(format!(
                "Places status {}: {}",
                details.status,
                details.error_message.unwrap_or_default()
            )));
        }

        let place = details.result.ok_or_else(|| {
            ApiError::InvalidResponse("Places response without result".to_string())
        })?;
        debug!(place_id, reviews = place.reviews.len(), "Fetched place details");

        Ok(ReviewsResponse {
            reviews: place.reviews,
            rating: place.rating,
            total_reviews: place.user_ratings_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_details() {
        let raw = r#"{
            "status": "OK",
            "result": {
                "rating": 4.7,
                "user_ratings_total": 120,
                "reviews": [{
                    "author_name": "Ana",
                    "rating": 5,
                    "text": "Muy rico",
                    "time": 1700000000,
                    "profile_photo_url": "https://lh3/x.png",
                    "relative_time_description": "hace un mes"
                }]
            }
        }"#;
        let details: DetailsResponse = serde_json::from_str(raw).unwrap();
        let place = details.result.unwrap();
        assert_eq!(place.reviews.len(), 1);
        assert_eq!(place.reviews[0].rating, 5);
        assert_eq!(place.user_ratings_total, Some(120));
    }
}
