//! Source Fetcher: one GET, parsed JSON or nothing.

use reqwest::{header, Client};
use serde_json::Value;
use tracing::debug;
use url::Url;

use crate::api::client::http_client;
use crate::api::ApiError;

/// Issues uncached GET requests and swallows every failure.
///
/// Relative URLs such as `/api/today` are resolved against the site base
/// URL when one is configured.
#[derive(Clone)]
pub struct SourceFetcher {
    client: Client,
    base: Option<Url>,
}

impl SourceFetcher {
    pub fn new(base: Option<Url>) -> Result<Self, ApiError> {
        Ok(Self::with_client(http_client()?, base))
    }

    pub fn with_client(client: Client, base: Option<Url>) -> Self {
        Self { client, base }
    }

    pub fn resolve(&self, url: &str) -> Option<Url> {
        match Url::parse(url) {
            Ok(absolute) => Some(absolute),
            Err(url::ParseError::RelativeUrlWithoutBase) => {
                self.base.as_ref().and_then(|base| base.join(url).ok())
            }
            Err(_) => None,
        }
    }

    /// GET `url` and parse the body as JSON.
    ///
    /// Returns `None` on network failure, non-2xx status, or a body that
    /// is not JSON. Never retries.
    pub async fn fetch(&self, url: &str) -> Option<Value> {
        let Some(resolved) = self.resolve(url) else {
            debug!(url, "Cannot resolve source URL");
            return None;
        };

        let response = match self
            .client
            .get(resolved)
            .header(header::CACHE_CONTROL, "no-cache")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!(url, error = %e, "Source fetch failed");
                return None;
            }
        };

        if !response.status().is_success() {
            debug!(url, status = %response.status(), "Source returned error status");
            return None;
        }

        match response.json::<Value>().await {
            Ok(value) => Some(value),
            Err(e) => {
                debug!(url, error = %e, "Source body is not JSON");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_relative_against_base() {
        let fetcher = SourceFetcher::with_client(
            Client::new(),
            Some(Url::parse("https://qr.murallacafe.cl/menu/").unwrap()),
        );
        assert_eq!(
            fetcher.resolve("/api/today").unwrap().as_str(),
            "https://qr.murallacafe.cl/api/today"
        );
        assert_eq!(
            fetcher.resolve("https://example.com/x.json").unwrap().as_str(),
            "https://example.com/x.json"
        );
    }

    #[test]
    fn test_resolve_relative_without_base() {
        let fetcher = SourceFetcher::with_client(Client::new(), None);
        assert!(fetcher.resolve("/api/today").is_none());
    }
}
