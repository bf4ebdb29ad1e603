//! Configuration of an API instance.

use portolan_types::cartesian::Rect;
use serde::{Deserialize, Deserializer};

/// Default URL path of the recentering service, relative to the base URL.
pub const DEFAULT_RECENTER_PATH: &str = "/recenter";
/// Default URL path of the highlighting service, relative to the base URL.
pub const DEFAULT_HIGHLIGHT_PATH: &str = "/geometry";
/// Default click tolerance of the query tool, in pixels.
pub const DEFAULT_SEARCH_TOLERANCE: f64 = 10.0;

/// Base configuration of an [`Api`](crate::Api) instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the site hosting the remote services.
    pub base_url: String,
    /// URL path of the recentering service, relative to `base_url`.
    pub recenter_path: String,
    /// URL path of the highlighting service, relative to `base_url`.
    pub highlight_path: String,
    /// Absolute URL of the map query service. Query-on-click is disabled when not set.
    pub query_url: Option<String>,
    /// Absolute URL of the search service used to fetch features by id. Defaults to the
    /// recentering service.
    pub search_url: Option<String>,
    /// Click tolerance of the query tool, in pixels.
    pub search_tolerance: f64,
    /// Extent the map is zoomed to when no explicit position is configured.
    pub initial_extent: Option<Rect>,
    /// Maximum navigable extent of the map.
    pub max_extent: Option<Rect>,
    /// Language code sent to the remote services.
    pub lang: Option<String>,
    /// Debug mode flag.
    #[serde(deserialize_with = "flexible_bool")]
    pub debug: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            recenter_path: DEFAULT_RECENTER_PATH.into(),
            highlight_path: DEFAULT_HIGHLIGHT_PATH.into(),
            query_url: None,
            search_url: None,
            search_tolerance: DEFAULT_SEARCH_TOLERANCE,
            initial_extent: None,
            max_extent: None,
            lang: None,
            debug: false,
        }
    }
}

impl ApiConfig {
    /// Absolute URL of the recentering service.
    pub fn recenter_url(&self) -> String {
        join_url(&self.base_url, &self.recenter_path)
    }

    /// Absolute URL of the highlighting service.
    pub fn highlight_url(&self) -> String {
        join_url(&self.base_url, &self.highlight_path)
    }

    /// Absolute URL of the feature search service.
    pub fn search_service_url(&self) -> String {
        self.search_url.clone().unwrap_or_else(|| self.recenter_url())
    }
}

/// Configuration of the map created by [`Api::create_map`](crate::Api::create_map).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    /// Easting coordinate of the initial map center.
    pub easting: Option<f64>,
    /// Northing coordinate of the initial map center.
    pub northing: Option<f64>,
    /// Initial zoom level.
    pub zoom: Option<u32>,
    /// Initial extent as `[x_min, y_min, x_max, y_max]`. Used when no center is given.
    pub bbox: Option<[f64; 4]>,
}

pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}

/// Accepts genuine booleans as well as the string spellings some integrations send
/// ("true"/"True"/"TRUE"). Any other string means `false`.
pub(crate) fn flexible_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        String(String),
    }

    Ok(match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(v) => v,
        BoolOrString::String(s) => matches!(s.as_str(), "true" | "True" | "TRUE"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config: ApiConfig = serde_json::from_str("{}").expect("empty config is valid");
        assert_eq!(config.recenter_path, "/recenter");
        assert_eq!(config.highlight_path, "/geometry");
        assert!(!config.debug);
        assert_eq!(config.search_tolerance, 10.0);
    }

    #[test]
    fn string_typed_booleans_are_normalized() {
        for spelling in ["\"true\"", "\"True\"", "\"TRUE\"", "true"] {
            let config: ApiConfig =
                serde_json::from_str(&format!("{{\"debug\": {spelling}}}")).expect("valid config");
            assert!(config.debug, "{spelling} should mean true");
        }

        for spelling in ["\"yes\"", "\"false\"", "\"1\"", "false"] {
            let config: ApiConfig =
                serde_json::from_str(&format!("{{\"debug\": {spelling}}}")).expect("valid config");
            assert!(!config.debug, "{spelling} should mean false");
        }
    }

    #[test]
    fn service_urls() {
        let config = ApiConfig {
            base_url: "https://example.com/".into(),
            ..Default::default()
        };

        assert_eq!(config.recenter_url(), "https://example.com/recenter");
        assert_eq!(config.highlight_url(), "https://example.com/geometry");
        assert_eq!(config.search_service_url(), "https://example.com/recenter");
    }
}
