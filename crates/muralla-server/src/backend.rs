//! Site data behind `/api/config`, `/api/today`, `/api/products` and
//! `/api/events`.
//!
//! Each document is read from the configured backend first, then from the
//! bundled `assets/data` directory, then from built-in data. A source that
//! fails or returns an unusable shape is skipped.

use std::path::Path;

use muralla_core::fallback;
use muralla_core::models::{ApiConfig, Event, ProductsPayload, Today};
use serde_json::Value;
use tracing::{debug, warn};

use super::config::{BackendSource, ServerConfig};
use super::state::AppState;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {
    Config,
    Today,
    Products,
    Events,
}

impl Document {
    pub fn file_name(&self) -> &'static str {
        match self {
            Document::Config => "config.json",
            Document::Today => "today.json",
            Document::Products => "products.json",
            Document::Events => "events.json",
        }
    }

    /// Normalize a raw document, `None` when the shape is unusable.
    fn normalize(&self, raw: Value) -> Option<Value> {
        match self {
            Document::Config => raw.is_object().then_some(raw),
            Document::Today => raw
                .is_object()
                .then(|| serde_json::to_value(Today::from_value(&raw)).ok())
                .flatten(),
            Document::Products => ProductsPayload::normalize(&raw)
                .and_then(|products| serde_json::to_value(products).ok()),
            Document::Events => serde_json::from_value::<Vec<Event>>(raw.clone())
                .ok()
                .map(|_| raw),
        }
    }

    fn builtin(&self) -> Value {
        let builtin = match self {
            Document::Config => serde_json::to_value(fallback::config()),
            Document::Today => serde_json::to_value(fallback::today()),
            Document::Products => serde_json::to_value(fallback::products()),
            Document::Events => serde_json::to_value(fallback::events()),
        };
        builtin.unwrap_or(Value::Null)
    }
}

/// Load a document through every source in order.
pub async fn load(state: &AppState, document: Document) -> Value {
    let from_backend = match &state.config.backend {
        BackendSource::Assets => None,
        BackendSource::Fs(dir) => read_file(&dir.join(document.file_name())).await,
        BackendSource::Http { base, paths } => {
            let path = match document {
                Document::Config => &paths.config,
                Document::Today => &paths.today,
                Document::Products => &paths.products,
                Document::Events => &paths.events,
            };
            fetch_json(state, base, path).await
        }
    };

    if let Some(value) = from_backend.and_then(|raw| document.normalize(raw)) {
        return value;
    }

    let bundled = state.config.assets_data_dir().join(document.file_name());
    if let Some(value) = read_file(&bundled).await.and_then(|raw| document.normalize(raw)) {
        debug!(file = %bundled.display(), "Serving bundled data");
        return value;
    }

    debug!(document = ?document, "Serving built-in data");
    document.builtin()
}

/// The site config with browser-visible keys merged in.
pub async fn site_config(state: &AppState) -> Value {
    let mut config = load(state, Document::Config).await;
    inject_api_keys(&mut config, &state.config);
    config
}

fn inject_api_keys(config: &mut Value, server: &ServerConfig) {
    let keys = ApiConfig {
        google_maps_api_key: server.google_maps_api_key.clone(),
        muralla_api_key: server.muralla_api_key.clone(),
    };
    if let (Some(target), Ok(Value::Object(keys))) =
        (config.as_object_mut(), serde_json::to_value(keys))
    {
        target.extend(keys);
    }
}

async fn read_file(path: &Path) -> Option<Value> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) => {
            debug!(file = %path.display(), error = %e, "Data file unavailable");
            return None;
        }
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(file = %path.display(), error = %e, "Data file is not valid JSON");
            None
        }
    }
}

async fn fetch_json(state: &AppState, base: &url::Url, path: &str) -> Option<Value> {
    let url = match base.join(path) {
        Ok(url) => url,
        Err(e) => {
            warn!(path, error = %e, "Invalid backend path");
            return None;
        }
    };

    let response = match state
        .http
        .get(url.clone())
        .header(reqwest::header::CACHE_CONTROL, "no-store")
        .send()
        .await
    {
        Ok(response) if response.status().is_success() => response,
        Ok(response) => {
            warn!(url = %url, status = %response.status(), "Backend returned error status");
            return None;
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Backend request failed");
            return None;
        }
    };

    match response.json().await {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(url = %url, error = %e, "Backend body is not JSON");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_products_are_normalized() {
        let raw = json!({
            "data": [{"_id": "x1", "name": "Mocha", "precio": "3500", "tags": [" Vegano "]}]
        });
        let value = Document::Products.normalize(raw).unwrap();
        assert_eq!(value[0]["id"], "x1");
        assert_eq!(value[0]["price"], 3500.0);
        assert_eq!(value[0]["tags"], json!(["vegano"]));
    }

    #[test]
    fn test_unusable_shapes_are_rejected() {
        assert!(Document::Config.normalize(json!([1, 2])).is_none());
        assert!(Document::Today.normalize(json!("today")).is_none());
        assert!(Document::Events.normalize(json!({"events": []})).is_none());
        assert!(Document::Products.normalize(json!({"error": "down"})).is_none());
    }

    #[test]
    fn test_builtin_today_has_items() {
        let today = Document::Today.builtin();
        assert_eq!(today["items"].as_array().map(Vec::len), Some(3));
    }

    #[test]
    fn test_inject_api_keys() {
        let server = ServerConfig::from_lookup(|key| match key {
            "STATIC_ROOT" => Some("/srv".to_string()),
            "GOOGLE_MAPS_API_KEY" => Some("AIza-1".to_string()),
            _ => None,
        })
        .unwrap();
        let mut config = json!({"instagram": "https://instagram.com/muralla.cafe"});
        inject_api_keys(&mut config, &server);
        assert_eq!(config["googleMapsApiKey"], "AIza-1");
        assert!(config.get("murallaApiKey").is_none());
        assert_eq!(config["instagram"], "https://instagram.com/muralla.cafe");
    }
}
