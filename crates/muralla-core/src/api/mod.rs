//! Vendor API clients.
//!
//! This module provides thin typed clients for the third-party services
//! the site proxies:
//! - `ApifyClient`: scraper runs and datasets (Instagram, TikTok, Google Maps)
//! - `FlowkickClient`: Instagram account verification codes
//! - `PlacesClient`: Google Places details (rating and reviews)
//!
//! None of them retry; a failed call surfaces as an `ApiError` and the
//! caller decides how to degrade.

pub mod apify;
pub mod client;
pub mod error;
pub mod flowkick;
pub mod places;

pub use apify::{ActorRun, ApifyClient, DatasetKind};
pub use error::ApiError;
pub use flowkick::{FlowkickClient, GenerateRequest};
pub use places::PlacesClient;
