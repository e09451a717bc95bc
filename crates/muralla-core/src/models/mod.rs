//! Data models for the site's JSON contracts.
//!
//! This module contains the shapes exchanged between the browser, the
//! proxy endpoints and the cache:
//!
//! - `Product`, `Today`: menu items, normalized from every upstream shape
//! - `Event`: upcoming events
//! - `SocialPost`: Instagram/TikTok feed mirror entries
//! - `Review`, `ReviewsResponse`: Google reviews widget
//! - `SiteConfig`, `ApiConfig`: site settings and browser-visible keys

pub mod event;
pub mod product;
pub mod review;
pub mod site;
pub mod social;

pub use event::Event;
pub use product::{normalize_tag, Product, ProductsPayload, Today};
pub use review::{Review, ReviewsResponse, MIN_POSITIVE_RATING};
pub use site::{ApiConfig, BlogPost, MapConfig, ScrapeTriggered, SiteConfig, SpecialLocation};
pub use social::SocialPost;

use serde_json::Value;

/// First non-empty string among `keys`, mirroring `a || b || c` lookups on
/// loosely shaped vendor JSON.
pub(crate) fn first_str<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(Value::as_str))
        .find(|s| !s.is_empty())
}

/// First non-zero number among `keys`.
pub(crate) fn first_number(value: &Value, keys: &[&str]) -> Option<f64> {
    keys.iter()
        .filter_map(|key| value.get(*key).and_then(as_number))
        .find(|n| *n != 0.0)
}

/// Numbers, and numeric strings such as `"3200"`.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
