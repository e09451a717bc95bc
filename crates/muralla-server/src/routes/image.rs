//! Image passthrough for social CDN URLs the browser cannot hotlink.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::{debug, error, warn};
use url::Url;

use crate::error::ProxyError;
use crate::state::AppState;

/// Host fragments accepted by the proxy. `tiktokcdn` also covers regional
/// hosts such as `tiktokcdn-us.com`.
pub const ALLOWED_HOSTS: [&str; 5] = [
    "cdninstagram.com",
    "fbcdn.net",
    "tiktokcdn",
    "tiktok.com",
    "bytedance.com",
];

pub const IMAGE_CACHE_CONTROL: &str = "public, max-age=86400, s-maxage=86400";

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Deserialize)]
pub struct ImageQuery {
    url: Option<String>,
}

/// Whether `url` points at an allowed CDN over http(s).
pub fn is_allowed(url: &Url) -> bool {
    matches!(url.scheme(), "http" | "https")
        && url
            .host_str()
            .is_some_and(|host| ALLOWED_HOSTS.iter().any(|allowed| host.contains(allowed)))
}

pub async fn instagram_image(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ImageQuery>,
) -> Result<Response, ProxyError> {
    let raw = query
        .url
        .filter(|url| !url.is_empty())
        .ok_or(ProxyError::BadRequest("URL parameter required"))?;

    let url = match Url::parse(&raw) {
        Ok(url) if is_allowed(&url) => url,
        _ => {
            warn!(url = %raw, "Blocked image URL");
            return Err(ProxyError::Forbidden(
                "Only Instagram and TikTok CDN URLs allowed",
            ));
        }
    };

    let upstream = state
        .http
        .get(url)
        .header(header::USER_AGENT, BROWSER_USER_AGENT)
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, "Image request failed");
            ProxyError::Internal("Failed to proxy image".to_string())
        })?;

    let status = upstream.status();
    if !status.is_success() {
        debug!(status = %status, "Upstream image error");
        return Err(ProxyError::Upstream {
            status: StatusCode::from_u16(status.as_u16()).unwrap_or(StatusCode::BAD_GATEWAY),
            error: "Failed to fetch image".to_string(),
            details: None,
        });
    }

    let content_type = upstream
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| HeaderValue::from_str(value).ok())
        .unwrap_or(HeaderValue::from_static(DEFAULT_CONTENT_TYPE));

    let body: Bytes = upstream.bytes().await.map_err(|e| {
        error!(error = %e, "Image body read failed");
        ProxyError::Internal("Failed to proxy image".to_string())
    })?;

    let mut response = body.into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, content_type);
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(IMAGE_CACHE_CONTROL),
    );
    Ok(response)
}
