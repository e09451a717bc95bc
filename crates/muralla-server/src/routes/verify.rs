//! Instagram account verification through Flowkick.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    Json,
};
use muralla_core::api::GenerateRequest;
use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::error::ProxyError;
use crate::state::AppState;

pub async fn generate(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<Json<Value>, ProxyError> {
    let Json(request) = payload?;
    let flowkick = state.flowkick()?;
    let code = flowkick
        .generate(&request)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to generate verification code"))?;

    info!("Verification code generated");
    Ok(Json(code))
}

#[derive(Debug, Deserialize)]
pub struct CheckQuery {
    session: Option<String>,
}

pub async fn check(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CheckQuery>,
) -> Result<Json<Value>, ProxyError> {
    let session = query
        .session
        .filter(|session| !session.is_empty())
        .ok_or(ProxyError::BadRequest("Missing session parameter"))?;

    let status = state
        .flowkick()?
        .check(&session)
        .await
        .map_err(|e| ProxyError::from_vendor(e, "Failed to check verification status"))?;

    info!(session = %session, status = ?status.get("status"), "Verification status");
    Ok(Json(status))
}
