use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use muralla_core::api::ApiError;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::{error, warn};

/// Errors surfaced by the proxy endpoints as `{error, details?}` JSON.
#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("Missing configuration")]
    MissingConfiguration(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("{0}")]
    BadRequest(&'static str),

    /// The request body could not be read as the expected JSON.
    #[error("Invalid request body")]
    InvalidBody(String),

    #[error("{0}")]
    Forbidden(&'static str),

    #[error("{0}")]
    NotFound(String),

    /// The vendor answered with something that is not JSON.
    #[error("{error}")]
    BadGateway { error: &'static str, details: String },

    /// A vendor failure passed through with its own status.
    #[error("{error}")]
    Upstream {
        status: StatusCode,
        error: String,
        details: Option<Value>,
    },

    #[error("Internal server error")]
    Internal(String),
}

impl ProxyError {
    /// Map a vendor client error, using `fallback` as the message when the
    /// vendor did not provide one.
    pub fn from_vendor(err: ApiError, fallback: &'static str) -> Self {
        match err {
            ApiError::NotJson { status, preview } => {
                warn!(status, "Vendor returned a non-JSON body");
                ProxyError::BadGateway {
                    error: "Invalid response from vendor",
                    details: preview,
                }
            }
            ApiError::Vendor { status, body } => {
                let message = body
                    .get("error")
                    .and_then(Value::as_str)
                    .unwrap_or(fallback)
                    .to_string();
                ProxyError::Upstream {
                    status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                    error: message,
                    details: Some(body),
                }
            }
            ApiError::NotFound(details) => {
                warn!(%details, "Vendor resource not found");
                ProxyError::NotFound(fallback.to_string())
            }
            other => {
                error!(error = %other, "{fallback}");
                ProxyError::Upstream {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    error: fallback.to_string(),
                    details: Some(Value::String(other.to_string())),
                }
            }
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::MissingConfiguration(_) | ProxyError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            ProxyError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ProxyError::BadRequest(_) | ProxyError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            ProxyError::Forbidden(_) => StatusCode::FORBIDDEN,
            ProxyError::NotFound(_) => StatusCode::NOT_FOUND,
            ProxyError::BadGateway { .. } => StatusCode::BAD_GATEWAY,
            ProxyError::Upstream { status, .. } => *status,
        }
    }

    fn details(&self) -> Option<Value> {
        match self {
            ProxyError::MissingConfiguration(details)
            | ProxyError::InvalidBody(details)
            | ProxyError::Internal(details) => Some(Value::String(details.clone())),
            ProxyError::BadGateway { details, .. } => Some(Value::String(details.clone())),
            ProxyError::Upstream { details, .. } => details.clone(),
            _ => None,
        }
    }
}

impl From<ApiError> for ProxyError {
    fn from(err: ApiError) -> Self {
        ProxyError::from_vendor(err, "Vendor request failed")
    }
}

impl From<JsonRejection> for ProxyError {
    fn from(rejection: JsonRejection) -> Self {
        warn!(error = %rejection, "Rejected request body");
        ProxyError::InvalidBody(rejection.body_text())
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self.details() {
            Some(details) => json!({ "error": self.to_string(), "details": details }),
            None => json!({ "error": self.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}
