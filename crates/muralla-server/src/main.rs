//! Muralla server binary.
//!
//! `muralla` serves the site and its proxy endpoints.
//! `muralla --prefetch <base-url>` runs the page data pipeline against a
//! running site: cache-first load, summary, one background refresh.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use muralla_core::hours;
use muralla_core::{
    CacheFirstLoader, CachePolicy, CacheStore, Domain, OpenStatus, Renderer, Site, SiteState,
    SourceFetcher,
};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use url::Url;

use muralla_server::config::ServerConfig;

/// Initialize the tracing subscriber for logging.
///
/// Logs go to stderr; with `log_dir` they are also written to a daily
/// rolling file. The returned guard must live until shutdown.
fn init_tracing(default_level: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "muralla.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_writer(writer).with_ansi(false)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--prefetch" {
        let base = args
            .get(2)
            .ok_or_else(|| anyhow::anyhow!("Usage: muralla --prefetch <base-url>"))?;
        let log_dir = std::env::var("LOG_DIR").ok().map(PathBuf::from);
        let _guard = init_tracing("warn", log_dir.as_deref());
        return prefetch(base).await;
    }

    let config = ServerConfig::from_env().context("Invalid configuration")?;
    let _guard = init_tracing("info", config.log_dir.as_deref());
    info!("Muralla server starting");

    muralla_server::start_server(config).await
}

/// Prints one line per rendered domain.
struct SummaryRenderer {
    today: String,
}

impl Renderer for SummaryRenderer {
    fn render(&mut self, domain: Domain, state: &SiteState) {
        let name = domain.display_name();
        match domain {
            Domain::Config => {
                let map_key = state
                    .config
                    .map
                    .as_ref()
                    .is_some_and(|map| !map.api_key.is_empty());
                eprintln!(
                    "{name}: mapa {} / {} ubicaciones especiales",
                    if map_key { "interactivo" } else { "embebido" },
                    state.config.special_locations.len()
                );
            }
            Domain::Today => {
                eprintln!("{name} ({}): {} productos", state.today.date, state.today.items.len())
            }
            Domain::Products => eprintln!("{name}: {} productos", state.products.len()),
            Domain::Events => match state.upcoming_events(&self.today).len() {
                0 => eprintln!("{name}: No hay eventos próximos por ahora"),
                n => eprintln!("{name}: {n} próximos"),
            },
            Domain::InstagramPosts | Domain::TiktokPosts => {
                let posts = if domain == Domain::InstagramPosts {
                    &state.instagram_posts
                } else {
                    &state.tiktok_posts
                };
                if posts.is_empty() {
                    eprintln!("{name}: No hay posts disponibles");
                } else {
                    eprintln!("{name}: {} posts", posts.len());
                }
            }
            Domain::Categories => eprintln!("{name}: {}", state.categories.join(", ")),
            Domain::RecentArrivals => eprintln!("{name}: {}", state.recent_arrivals.len()),
            Domain::Blog => eprintln!("{name}: {} entradas", state.blog.len()),
        }
    }
}

fn env_number<T: std::str::FromStr>(key: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("Invalid {key} value '{raw}': {e}")),
        _ => Ok(None),
    }
}

/// Load every source through the cache, print it, then refresh once.
async fn prefetch(base: &str) -> Result<()> {
    let base = Url::parse(base).with_context(|| format!("Invalid base URL '{base}'"))?;

    let cache_dir = std::env::var("MURALLA_CACHE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| CacheStore::default_dir());
    let cache = Arc::new(CacheStore::new(cache_dir)?);
    let fetcher = SourceFetcher::new(Some(base.clone()))?;

    let policy = match env_number::<u64>("MURALLA_CACHE_MAX_AGE_MINUTES")? {
        Some(minutes) => CachePolicy::MaxAge(Duration::from_secs(minutes * 60)),
        None => CachePolicy::PresenceOnly,
    };
    let loader = CacheFirstLoader::new(cache, fetcher).with_policy(policy);

    let offset_minutes = env_number::<i32>("STORE_UTC_OFFSET_MINUTES")?;
    let today = hours::local_time(Utc::now(), offset_minutes)
        .format("%Y-%m-%d")
        .to_string();

    eprintln!("Prefetching {base}\n");
    let mut site = Site::new(loader, SummaryRenderer { today });
    let report = site.load_all().await;

    for (domain, tier) in &report.loaded {
        info!(domain = ?domain, ?tier, "Loaded");
    }
    if !report.fallback.is_empty() {
        let names: Vec<&str> = report.fallback.iter().map(Domain::display_name).collect();
        eprintln!("\nDatos integrados: {}", names.join(", "));
    }

    let status = OpenStatus::now(offset_minutes, &site.state.config.special_locations);
    eprintln!("\nAhora: {} ({})", status.label(), status.message().replace('\n', " / "));

    eprintln!("\nRefreshing...");
    site.refresh_all_background();
    let changed = site.wait_for_refresh().await;
    if changed.is_empty() {
        eprintln!("Sin cambios");
    } else {
        let names: Vec<&str> = changed.iter().map(Domain::display_name).collect();
        eprintln!("Actualizado: {}", names.join(", "));
    }

    Ok(())
}
