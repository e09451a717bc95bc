//! Shared HTTP plumbing for the vendor clients.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use super::error::{preview, BODY_PREVIEW_LENGTH};
use super::ApiError;

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the HTTP client shared by every vendor client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
pub fn http_client() -> Result<Client, ApiError> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
        .build()?)
}

/// Check if response is successful, returning an error with body if not.
pub(crate) async fn check_response(response: Response) -> Result<Response, ApiError> {
    if response.status().is_success() {
        Ok(response)
    } else {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }
}

/// Parse a successful response body as JSON.
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let response = check_response(response).await?;
    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| ApiError::InvalidResponse(e.to_string()))
}

/// Read a vendor response whose JSON body is passed through verbatim.
///
/// Non-JSON bodies become `NotJson` with a short preview regardless of
/// status; JSON bodies with a non-2xx status become `Vendor`.
pub(crate) async fn read_passthrough(response: Response) -> Result<serde_json::Value, ApiError> {
    let status = response.status();
    let text = response.text().await?;

    let body: serde_json::Value = match serde_json::from_str(&text) {
        Ok(body) => body,
        Err(_) => {
            return Err(ApiError::NotJson {
                status: status.as_u16(),
                preview: preview(&text, BODY_PREVIEW_LENGTH),
            })
        }
    };

    if status.is_success() {
        Ok(body)
    } else {
        Err(ApiError::Vendor {
            status: status.as_u16(),
            body,
        })
    }
}
