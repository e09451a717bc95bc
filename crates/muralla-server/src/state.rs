use std::sync::Arc;

use anyhow::{Context, Result};
use muralla_core::api::{client::http_client, ApifyClient, FlowkickClient, PlacesClient};
use reqwest::Client;

use super::config::ServerConfig;
use super::error::ProxyError;

pub struct AppState {
    pub config: ServerConfig,
    /// Shared pool for backend reads and image passthrough
    pub http: Client,
    pub apify: Option<ApifyClient>,
    pub flowkick: Option<FlowkickClient>,
    pub places: Option<PlacesClient>,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Result<Arc<Self>> {
        let http = http_client().context("Failed to build HTTP client")?;
        Ok(Self::with_client(config, http))
    }

    /// Build the state around an existing HTTP client; vendor clients share it.
    pub fn with_client(config: ServerConfig, http: Client) -> Arc<Self> {
        let apify = config.apify_token.as_ref().map(|token| {
            ApifyClient::with_client(
                http.clone(),
                &config.apify_base_url,
                token,
                config.apify_user_id.clone(),
            )
        });
        let flowkick = config.flowkick_api_key.as_ref().map(|key| {
            FlowkickClient::with_client(
                http.clone(),
                key,
                &config.flowkick_generate_url,
                &config.flowkick_check_url,
            )
        });
        let places = config
            .google_places_api_key
            .as_ref()
            .map(|key| PlacesClient::with_client(http.clone(), &config.places_base_url, key));

        Arc::new(Self {
            config,
            http,
            apify,
            flowkick,
            places,
        })
    }

    /// Apify client for triggering runs; needs only the token.
    pub fn apify_runs(&self) -> Result<&ApifyClient, ProxyError> {
        self.apify.as_ref().ok_or_else(|| {
            ProxyError::MissingConfiguration("APIFY_API_TOKEN must be set".to_string())
        })
    }

    /// Apify client for reading the account's datasets; needs token and user id.
    pub fn apify_datasets(&self) -> Result<&ApifyClient, ProxyError> {
        match (&self.apify, &self.config.apify_user_id) {
            (Some(apify), Some(_)) => Ok(apify),
            _ => Err(ProxyError::MissingConfiguration(
                "APIFY_API_TOKEN and APIFY_USER_ID must be set in environment variables"
                    .to_string(),
            )),
        }
    }

    pub fn flowkick(&self) -> Result<&FlowkickClient, ProxyError> {
        self.flowkick.as_ref().ok_or_else(|| {
            ProxyError::MissingConfiguration("FLOWKICK_API_KEY must be set".to_string())
        })
    }

    pub fn places(&self) -> Result<&PlacesClient, ProxyError> {
        self.places.as_ref().ok_or_else(|| {
            ProxyError::MissingConfiguration("GOOGLE_PLACES_API_KEY must be set".to_string())
        })
    }
}
