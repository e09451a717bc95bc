//! Flowkick client for Instagram account verification.
//!
//! Responses are passed through to the browser unchanged, so both calls
//! return raw JSON rather than typed structs.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use super::client::{http_client, read_passthrough};
use super::ApiError;

pub const FLOWKICK_GENERATE_URL: &str = "https://flowkick.com/api/verification/generate";
pub const FLOWKICK_CHECK_URL: &str = "https://flowkick.kua.cl/api/verification/check";

/// Site the verification codes are issued for
pub const EXTERNAL_WEBSITE: &str = "qr.murallacafe.cl";
pub const DEFAULT_WEBHOOK_URL: &str = "https://qr.murallacafe.cl/api/ig-webhook";
pub const DEFAULT_EXPIRES_IN_MINUTES: u32 = 10;

/// Body accepted from the browser.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateRequest {
    #[serde(default)]
    pub external_user_id: Value,
    #[serde(default)]
    pub webhook_url: Option<String>,
    #[serde(default)]
    pub expires_in_minutes: Option<u32>,
}

/// Body sent to Flowkick, with site defaults filled in.
#[derive(Debug, Serialize)]
struct VendorGenerateRequest<'a> {
    external_website: &'a str,
    external_user_id: &'a Value,
    webhook_url: &'a str,
    expires_in_minutes: u32,
}

#[derive(Clone)]
pub struct FlowkickClient {
    client: Client,
    api_key: String,
    generate_url: String,
    check_url: String,
}

impl FlowkickClient {
    pub fn new(api_key: impl Into<String>) -> Result<Self, ApiError> {
        Ok(Self::with_client(
            http_client()?,
            api_key,
            FLOWKICK_GENERATE_URL,
            FLOWKICK_CHECK_URL,
        ))
    }

    pub fn with_client(
        client: Client,
        api_key: impl Into<String>,
        generate_url: impl Into<String>,
        check_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            generate_url: generate_url.into(),
            check_url: check_url.into(),
        }
    }

    /// Ask Flowkick for a new verification code.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Value, ApiError> {
        let body = VendorGenerateRequest {
            external_website: EXTERNAL_WEBSITE,
            external_user_id: &request.external_user_id,
            webhook_url: request
                .webhook_url
                .as_deref()
                .filter(|url| !url.is_empty())
                .unwrap_or(DEFAULT_WEBHOOK_URL),
            expires_in_minutes: request
                .expires_in_minutes
                .filter(|minutes| *minutes > 0)
                .unwrap_or(DEFAULT_EXPIRES_IN_MINUTES),
        };
        info!(user = %request.external_user_id, "Requesting verification code");

        let response = self
            .client
            .post(&self.generate_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        debug!(status = %response.status(), "Flowkick generate responded");

        read_passthrough(response).await
    }

    /// Poll the status of a verification session.
    pub async fn check(&self, session: &str) -> Result<Value, ApiError> {
        let response = self
            .client
            .get(&self.check_url)
            .bearer_auth(&self.api_key)
            .query(&[("session", session)])
            .send()
            .await?;
        debug!(session, status = %response.status(), "Flowkick check responded");

        read_passthrough(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_vendor_body_defaults() {
        let request: GenerateRequest =
            serde_json::from_value(json!({"external_user_id": "mesa-4"})).unwrap();
        let body = VendorGenerateRequest {
            external_website: EXTERNAL_WEBSITE,
            external_user_id: &request.external_user_id,
            webhook_url: request.webhook_url.as_deref().unwrap_or(DEFAULT_WEBHOOK_URL),
            expires_in_minutes: request.expires_in_minutes.unwrap_or(DEFAULT_EXPIRES_IN_MINUTES),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "external_website": "qr.murallacafe.cl",
                "external_user_id": "mesa-4",
                "webhook_url": "https://qr.murallacafe.cl/api/ig-webhook",
                "expires_in_minutes": 10
            })
        );
    }
}
