//! Local caching module for offline-first page loads.
//!
//! This module provides the `CacheStore` for keeping the last good
//! payload of every data source on disk. Each source is stored as
//! `{data, timestamp}` JSON under a `muralla_cache_` prefixed key and
//! is considered stale after 60 minutes.
//!
//! Cached sources include:
//! - Site config and today's specials
//! - Product menu, categories, recent arrivals
//! - Events and blog entries
//! - Instagram and TikTok feed mirrors

pub mod store;

pub use store::{CacheEntry, CacheStore, CACHE_DURATION, CACHE_KEY_PREFIX};
