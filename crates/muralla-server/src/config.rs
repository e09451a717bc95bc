//! Server configuration, read once from the environment at startup.

use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use anyhow::{anyhow, bail, Context, Result};
use muralla_core::api::{apify::APIFY_BASE_URL, flowkick, places::PLACES_BASE_URL};
use tracing::{debug, info};
use url::Url;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8000;
pub const DEFAULT_INSTAGRAM_USERNAME: &str = "muralla.cafe";

/// Where `/api/config`, `/api/today`, `/api/products` and `/api/events`
/// read their data before falling back to the bundled assets.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendSource {
    /// Only `<static_root>/assets/data` and built-in data
    Assets,
    /// A directory holding `config.json`, `today.json`, `products.json`, `events.json`
    Fs(PathBuf),
    Http { base: Url, paths: BackendPaths },
}

#[derive(Debug, Clone, PartialEq)]
pub struct BackendPaths {
    pub config: String,
    pub today: String,
    pub products: String,
    pub events: String,
}

impl Default for BackendPaths {
    fn default() -> Self {
        Self {
            config: "/api/config".to_string(),
            today: "/api/today".to_string(),
            products: "/api/products".to_string(),
            events: "/api/events".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReviewsVendor {
    /// Google Maps scraper datasets, positive reviews only
    #[default]
    Apify,
    /// Google Places details, unfiltered
    Google,
}

impl FromStr for ReviewsVendor {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "apify" => Ok(ReviewsVendor::Apify),
            "google" => Ok(ReviewsVendor::Google),
            other => Err(anyhow!("unknown reviews vendor '{other}', expected apify or google")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub static_root: PathBuf,
    pub backend: BackendSource,
    pub log_dir: Option<PathBuf>,

    // Browser-visible keys
    pub google_maps_api_key: String,
    pub muralla_api_key: Option<String>,

    // Apify
    pub apify_token: Option<String>,
    pub apify_user_id: Option<String>,
    pub apify_base_url: String,
    pub instagram_username: String,
    pub instagram_comments_task_id: Option<String>,

    // Trigger secrets
    pub cron_secret: Option<String>,
    pub refresh_secret: Option<String>,

    // Flowkick
    pub flowkick_api_key: Option<String>,
    pub flowkick_generate_url: String,
    pub flowkick_check_url: String,

    // Reviews
    pub reviews_vendor: ReviewsVendor,
    pub google_places_api_key: Option<String>,
    pub places_base_url: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from any key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let static_root = match var("STATIC_ROOT") {
            Some(root) => PathBuf::from(root),
            None => env::current_dir().context("Failed to read current directory")?,
        };

        let config = Self {
            host: var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            port: parse_or(&var, "PORT", DEFAULT_PORT)?,
            backend: backend_source(&var, &static_root)?,
            static_root,
            log_dir: var("LOG_DIR").map(PathBuf::from),

            google_maps_api_key: var("GOOGLE_MAPS_API_KEY").unwrap_or_default(),
            muralla_api_key: var("MURALLA_API_KEY"),

            apify_token: var("APIFY_API_TOKEN"),
            apify_user_id: var("APIFY_USER_ID"),
            apify_base_url: var("APIFY_BASE_URL").unwrap_or_else(|| APIFY_BASE_URL.to_string()),
            instagram_username: var("INSTAGRAM_USERNAME")
                .unwrap_or_else(|| DEFAULT_INSTAGRAM_USERNAME.to_string()),
            instagram_comments_task_id: var("INSTAGRAM_COMMENTS_TASK_ID"),

            cron_secret: var("CRON_SECRET"),
            refresh_secret: var("INSTAGRAM_REFRESH_SECRET"),

            flowkick_api_key: var("FLOWKICK_API_KEY"),
            flowkick_generate_url: var("FLOWKICK_GENERATE_URL")
                .unwrap_or_else(|| flowkick::FLOWKICK_GENERATE_URL.to_string()),
            flowkick_check_url: var("FLOWKICK_CHECK_URL")
                .unwrap_or_else(|| flowkick::FLOWKICK_CHECK_URL.to_string()),

            reviews_vendor: parse_or(&var, "REVIEWS_VENDOR", ReviewsVendor::default())?,
            google_places_api_key: var("GOOGLE_PLACES_API_KEY"),
            places_base_url: var("GOOGLE_PLACES_BASE_URL")
                .unwrap_or_else(|| PLACES_BASE_URL.to_string()),
        };

        info!(
            host = %config.host,
            port = config.port,
            static_root = %config.static_root.display(),
            backend = %config.backend_label(),
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn backend_label(&self) -> String {
        match &self.backend {
            BackendSource::Assets => "fallback:assets/data".to_string(),
            BackendSource::Fs(path) => format!("fs:{}", path.display()),
            BackendSource::Http { base, .. } => format!("http:{base}"),
        }
    }

    /// Bundled data directory under the static root.
    pub fn assets_data_dir(&self) -> PathBuf {
        self.static_root.join("assets").join("data")
    }
}

fn parse_or<T, F>(var: &F, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: Display,
    F: Fn(&str) -> Option<String>,
{
    match var(key) {
        Some(raw) => raw
            .parse()
            .map_err(|e| anyhow!("Invalid {key} value '{raw}': {e}")),
        None => {
            debug!("{key} not set, using default");
            Ok(default)
        }
    }
}

fn backend_source<F>(var: &F, static_root: &std::path::Path) -> Result<BackendSource>
where
    F: Fn(&str) -> Option<String>,
{
    let mode = var("BACKEND_MODE").map(|m| m.to_lowercase()).unwrap_or_default();
    match mode.as_str() {
        "" => Ok(BackendSource::Assets),
        "fs" => {
            let path = var("BACKEND_FS_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| static_root.join("assets").join("data"));
            Ok(BackendSource::Fs(path))
        }
        "http" => {
            let Some(base) = var("BACKEND_HTTP_BASE") else {
                // Matches the old server: http mode without a base reads assets only
                return Ok(BackendSource::Assets);
            };
            let base = Url::parse(&base)
                .with_context(|| format!("Invalid BACKEND_HTTP_BASE '{base}'"))?;
            let defaults = BackendPaths::default();
            let paths = BackendPaths {
                config: var("BACKEND_HTTP_CONFIG_PATH").unwrap_or(defaults.config),
                today: var("BACKEND_HTTP_TODAY_PATH").unwrap_or(defaults.today),
                products: var("BACKEND_HTTP_PRODUCTS_PATH").unwrap_or(defaults.products),
                events: var("BACKEND_HTTP_EVENTS_PATH").unwrap_or(defaults.events),
            };
            Ok(BackendSource::Http { base, paths })
        }
        other => bail!("Invalid BACKEND_MODE '{other}', expected fs or http"),
    }
}
