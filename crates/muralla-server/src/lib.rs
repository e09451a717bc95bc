//! Muralla server - proxy endpoints and static file server for the café site.
//!
//! The browser loads its data from `/api/*` routes served here. Each route
//! is a small stateless translator in front of one vendor:
//!
//! - `/api/config`, `/api/today`, `/api/products`, `/api/events`: site data
//!   from the configured backend, bundled assets or built-in data
//! - `/api/instagram`, `/api/tiktok`: feed mirrors from Apify datasets
//! - `/api/reviews`: Google reviews through Apify or Google Places
//! - `/api/instagram-image`: CDN image passthrough behind an allow-list
//! - `/api/ig-verify-*`: Flowkick verification passthrough
//! - `/api/cron/update-instagram`, `/api/refresh-instagram`,
//!   `/api/trigger-comments`: scrape triggers guarded by shared secrets
//!
//! Everything else is served from the static root.
//!
//! # Configuration
//!
//! Settings are read from the environment (a `.env` file is honored). See
//! [`config::ServerConfig`] for the full list; the common ones are `HOST`,
//! `PORT`, `STATIC_ROOT`, `BACKEND_MODE`, `APIFY_API_TOKEN`,
//! `APIFY_USER_ID` and `GOOGLE_MAPS_API_KEY`.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    set_header::SetResponseHeaderLayer,
};
use tracing::{error, info};

pub mod backend;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;

use config::ServerConfig;
use routes::{image, method_not_allowed, reviews, site, social, triggers, verify};
use state::AppState;

/// Build the application router.
pub fn app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let static_files = ServeDir::new(&state.config.static_root);

    Router::new()
        .route("/api/config", get(site::config).fallback(method_not_allowed))
        .route("/api/today", get(site::today).fallback(method_not_allowed))
        .route("/api/products", get(site::products).fallback(method_not_allowed))
        .route("/api/events", get(site::events).fallback(method_not_allowed))
        .route("/api/instagram", get(social::instagram).fallback(method_not_allowed))
        .route("/api/tiktok", get(social::tiktok).fallback(method_not_allowed))
        .route("/api/reviews", get(reviews::reviews).fallback(method_not_allowed))
        .route(
            "/api/instagram-image",
            get(image::instagram_image).fallback(method_not_allowed),
        )
        .route(
            "/api/ig-verify-generate",
            post(verify::generate).fallback(method_not_allowed),
        )
        .route(
            "/api/ig-verify-check",
            get(verify::check).fallback(method_not_allowed),
        )
        .route(
            "/api/cron/update-instagram",
            get(triggers::cron_update_instagram).post(triggers::cron_update_instagram),
        )
        .route(
            "/api/refresh-instagram",
            get(triggers::refresh_instagram).post(triggers::refresh_instagram),
        )
        .route(
            "/api/trigger-comments",
            post(triggers::trigger_comments).fallback(method_not_allowed),
        )
        .fallback_service(static_files)
        .layer(SetResponseHeaderLayer::if_not_present(
            header::CACHE_CONTROL,
            HeaderValue::from_static("no-cache"),
        ))
        .layer(cors)
        .with_state(state)
}

/// Serve on an already bound listener until a shutdown signal arrives.
pub async fn serve(listener: TcpListener, state: Arc<AppState>) -> Result<()> {
    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")
}

pub async fn start_server(config: ServerConfig) -> Result<()> {
    info!("Initializing state...");
    let address = config.address();
    let source = config.backend_label();
    let state = AppState::new(config)?;

    info!("Binding to {address}");
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;
    info!("Muralla server listening on http://{address} (source {source})");

    serve(listener, state).await?;

    info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        match ctrl_c().await {
            Ok(()) => info!("Received Ctrl+C, shutting down"),
            Err(e) => {
                error!(error = %e, "Failed to install Ctrl+C handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut terminate) => {
                terminate.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
