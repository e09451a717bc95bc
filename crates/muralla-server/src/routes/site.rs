//! Site data endpoints.

use std::sync::Arc;

use axum::{extract::State, http::header, response::IntoResponse, Json};

use crate::backend::{self, Document};
use crate::state::AppState;

const NO_STORE: [(header::HeaderName, &str); 1] = [(header::CACHE_CONTROL, "no-store")];

pub async fn config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (NO_STORE, Json(backend::site_config(&state).await))
}

pub async fn today(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (NO_STORE, Json(backend::load(&state, Document::Today).await))
}

pub async fn products(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (NO_STORE, Json(backend::load(&state, Document::Products).await))
}

pub async fn events(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (NO_STORE, Json(backend::load(&state, Document::Events).await))
}
