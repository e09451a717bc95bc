use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Site configuration document (`/assets/data/config.json`).
///
/// Only the parts the core reads are typed; every other key is kept in
/// `extra` so the document round-trips untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub map: Option<MapConfig>,
    #[serde(rename = "specialLocations", default, skip_serializing_if = "Vec::is_empty")]
    pub special_locations: Vec<SpecialLocation>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Empty means the page falls back to an iframe embed
    #[serde(rename = "apiKey", default)]
    pub api_key: String,
    #[serde(rename = "placeId", default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    #[serde(rename = "placeUrl", default, skip_serializing_if = "Option::is_none")]
    pub place_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lng: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom: Option<f64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A day the café pops up somewhere else.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecialLocation {
    /// `YYYY-MM-DD`
    pub date: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "mapsUrl", default, skip_serializing_if = "Option::is_none")]
    pub maps_url: Option<String>,
}

/// Browser-visible keys served by `/api/config`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ApiConfig {
    #[serde(rename = "googleMapsApiKey", default)]
    pub google_maps_api_key: String,
    #[serde(rename = "murallaApiKey", default, skip_serializing_if = "Option::is_none")]
    pub muralla_api_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub excerpt: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub image: String,
    #[serde(default)]
    pub url: String,
}

/// Reply of the scrape trigger endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ScrapeTriggered {
    pub success: bool,
    pub message: String,
    #[serde(rename = "runId")]
    pub run_id: String,
    #[serde(rename = "datasetId")]
    pub dataset_id: Option<String>,
    /// RFC 3339
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_site_config_round_trips_unknown_keys() {
        let raw = json!({
            "instagram": "https://instagram.com/muralla.cafe",
            "map": {"apiKey": "", "placeId": "ChIJ2Wmo", "lat": -33.44, "styles": []},
            "specialLocations": [{
                "date": "2025-11-02",
                "name": "Feria",
                "address": "Carmen 1235",
                "description": "Venta"
            }]
        });
        let config: SiteConfig = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(config.map.as_ref().and_then(|m| m.place_id.as_deref()), Some("ChIJ2Wmo"));
        assert_eq!(config.special_locations.len(), 1);
        assert_eq!(serde_json::to_value(&config).unwrap(), raw);
    }
}
