//! One handler per route. Handlers validate input and configuration, call
//! a single vendor (or a short fixed sequence) and reshape the answer.

pub mod image;
pub mod reviews;
pub mod site;
pub mod social;
pub mod triggers;
pub mod verify;

use super::error::ProxyError;

/// Fallback for routes hit with a method they do not serve.
pub async fn method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}
