//! Muralla core - data pipeline for the Muralla Café website.
//!
//! Every source of displayed data (site config, today's specials, menu,
//! events, social feeds) is loaded cache-first, rendered, then refreshed
//! once in the background. Failures never surface to the caller: a source
//! that cannot be loaded falls back to built-in data.

pub mod api;
pub mod cache;
pub mod fallback;
pub mod feeds;
pub mod fetch;
pub mod hours;
pub mod loader;
pub mod models;
pub mod refresh;
pub mod site;
pub mod state;

pub use cache::{CacheEntry, CacheStore};
pub use fetch::SourceFetcher;
pub use hours::OpenStatus;
pub use loader::{CacheFirstLoader, CachePolicy, SourceDescriptor, Tier};
pub use refresh::{RefreshOutcome, RefreshResult, Refresher};
pub use site::{LoadReport, Renderer, Site};
pub use state::{Domain, SiteState};
