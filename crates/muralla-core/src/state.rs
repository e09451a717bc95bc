//! Application state: the data currently shown for every source domain.
//!
//! `SiteState` has one typed field per domain and a single update entry
//! point, `apply`, which decodes a raw JSON payload at the boundary. A
//! payload that does not decode leaves the previous value in place.

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use crate::fallback;
use crate::loader::SourceDescriptor;
use crate::models::{
    ApiConfig, BlogPost, Event, Product, ProductsPayload, SiteConfig, SocialPost, Today,
};

/// One named category of displayed data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Domain {
    Config,
    Today,
    Products,
    Events,
    InstagramPosts,
    TiktokPosts,
    Categories,
    RecentArrivals,
    Blog,
}

impl Domain {
    pub const ALL: [Domain; 9] = [
        Domain::Config,
        Domain::Today,
        Domain::Products,
        Domain::Events,
        Domain::InstagramPosts,
        Domain::TiktokPosts,
        Domain::Categories,
        Domain::RecentArrivals,
        Domain::Blog,
    ];

    pub fn cache_key(&self) -> &'static str {
        match self {
            Domain::Config => "config",
            Domain::Today => "today",
            Domain::Products => "products",
            Domain::Events => "events",
            Domain::InstagramPosts => "instagram",
            Domain::TiktokPosts => "tiktok",
            Domain::Categories => "categories",
            Domain::RecentArrivals => "recent_arrivals",
            Domain::Blog => "blog",
        }
    }

    pub fn descriptor(&self) -> SourceDescriptor {
        let source = SourceDescriptor::new(self.cache_key());
        match self {
            Domain::Config => source.local("/assets/data/config.json").remote("/api/config"),
            Domain::Today => source.local("/assets/data/today.json").remote("/api/today"),
            Domain::Products => source.local("/assets/data/products.json").remote("/api/products"),
            Domain::Events => source.local("/assets/data/events.json").remote("/api/events"),
            Domain::InstagramPosts => source
                .local("/assets/data/instagram.json")
                .remote("/api/instagram"),
            Domain::TiktokPosts => source.remote("/api/tiktok"),
            Domain::Categories => source.local("/assets/data/categories.json"),
            Domain::RecentArrivals => source.local("/assets/data/recent-arrivals.json"),
            Domain::Blog => source.local("/assets/data/blog.json"),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.descriptor().remote_url.is_some()
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Domain::Config => "Config",
            Domain::Today => "Hoy",
            Domain::Products => "Carta",
            Domain::Events => "Eventos",
            Domain::InstagramPosts => "Instagram",
            Domain::TiktokPosts => "TikTok",
            Domain::Categories => "Categorías",
            Domain::RecentArrivals => "Recién llegados",
            Domain::Blog => "Blog",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CategoryEntry {
    Name(String),
    Named { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SiteState {
    pub config: SiteConfig,
    pub api_config: ApiConfig,
    pub today: Today,
    pub products: Vec<Product>,
    pub events: Vec<Event>,
    pub instagram_posts: Vec<SocialPost>,
    pub tiktok_posts: Vec<SocialPost>,
    pub categories: Vec<String>,
    pub recent_arrivals: Vec<Product>,
    pub blog: Vec<BlogPost>,
}

impl Default for SiteState {
    fn default() -> Self {
        Self {
            config: fallback::config(),
            api_config: ApiConfig::default(),
            today: fallback::today(),
            products: fallback::products(),
            events: Vec::new(),
            instagram_posts: Vec::new(),
            tiktok_posts: Vec::new(),
            categories: fallback::categories(),
            recent_arrivals: Vec::new(),
            blog: Vec::new(),
        }
    }
}

fn decode<T: serde::de::DeserializeOwned>(domain: Domain, value: &Value) -> Option<T> {
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            warn!(domain = ?domain, error = %e, "Ignoring payload that does not decode");
            None
        }
    }
}

impl SiteState {
    /// Replace one domain's value from a raw payload. Returns whether the
    /// state changed shape-wise (false when the payload was rejected).
    pub fn apply(&mut self, domain: Domain, value: &Value) -> bool {
        match domain {
            Domain::Config => {
                let Some(config) = decode::<SiteConfig>(domain, value) else {
                    return false;
                };
                if let Some(api_config) = decode_api_config(value) {
                    self.api_config = api_config;
                }
                self.config = config;
                self.inject_api_key();
            }
            Domain::Today => {
                if !value.is_object() {
                    warn!(domain = ?domain, "Ignoring non-object payload");
                    return false;
                }
                self.today = Today::from_value(value);
            }
            Domain::Products => {
                let Some(products) = ProductsPayload::normalize(value) else {
                    warn!(domain = ?domain, "Ignoring unrecognized products payload");
                    return false;
                };
                self.products = products;
            }
            Domain::Events => match decode(domain, value) {
                Some(events) => self.events = events,
                None => return false,
            },
            Domain::InstagramPosts => match decode(domain, value) {
                Some(posts) => self.instagram_posts = posts,
                None => return false,
            },
            Domain::TiktokPosts => match decode(domain, value) {
                Some(posts) => self.tiktok_posts = posts,
                None => return false,
            },
            Domain::Categories => match decode::<Vec<CategoryEntry>>(domain, value) {
                Some(entries) => {
                    self.categories = entries
                        .into_iter()
                        .map(|entry| match entry {
                            CategoryEntry::Name(name) | CategoryEntry::Named { name } => name,
                        })
                        .collect()
                }
                None => return false,
            },
            Domain::RecentArrivals => match ProductsPayload::normalize(value) {
                Some(products) => self.recent_arrivals = products,
                None => return false,
            },
            Domain::Blog => match decode(domain, value) {
                Some(posts) => self.blog = posts,
                None => return false,
            },
        }
        true
    }

    /// Put a domain back on its built-in dataset after every tier missed.
    pub fn use_fallback(&mut self, domain: Domain) {
        match domain {
            Domain::Config => {
                self.config = fallback::config();
                self.inject_api_key();
            }
            Domain::Today => self.today = fallback::today(),
            Domain::Products => self.products = fallback::products(),
            Domain::Events => self.events = fallback::events(),
            Domain::Categories => self.categories = fallback::categories(),
            Domain::InstagramPosts => self.instagram_posts.clear(),
            Domain::TiktokPosts => self.tiktok_posts.clear(),
            Domain::RecentArrivals => self.recent_arrivals.clear(),
            Domain::Blog => self.blog.clear(),
        }
    }

    /// Record browser-visible keys from `/api/config` and push the maps key
    /// into the map block.
    pub fn set_api_config(&mut self, api_config: ApiConfig) {
        self.api_config = api_config;
        self.inject_api_key();
    }

    fn inject_api_key(&mut self) {
        let map = self.config.map.get_or_insert_with(fallback::map);
        if !self.api_config.google_maps_api_key.is_empty() {
            map.api_key = self.api_config.google_maps_api_key.clone();
        }
    }

    /// Events dated today or later, soonest first.
    pub fn upcoming_events(&self, today: &str) -> Vec<&Event> {
        let mut events: Vec<&Event> = self.events.iter().filter(|e| e.is_upcoming(today)).collect();
        events.sort_by(|a, b| a.date.cmp(&b.date));
        events
    }

    /// Products carrying every selected tag.
    pub fn products_with_tags(&self, tags: &[&str]) -> Vec<&Product> {
        self.products
            .iter()
            .filter(|p| tags.iter().all(|tag| p.tags.iter().any(|t| t == tag)))
            .collect()
    }
}

fn decode_api_config(value: &Value) -> Option<ApiConfig> {
    value.get("googleMapsApiKey")?;
    serde_json::from_value(value.clone()).ok()
}
