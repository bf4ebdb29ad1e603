//! Markers shown on the drawing layer.

use portolan_types::cartesian::Point2d;
use portolan_types::Geom;
use serde::Deserialize;

use crate::config::flexible_bool;
use crate::feature::Feature;
use crate::layer::Style;

/// Icon used when the marker options do not name one, relative to the base URL.
pub const DEFAULT_ICON_PATH: &str = "/img/marker-gold.png";

const DEFAULT_GRAPHIC_SIZE: f64 = 25.0;

/// Options of [`Api::show_marker`](crate::Api::show_marker).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MarkerOptions {
    /// Easting coordinate of the marker. Defaults to the map center.
    pub easting: Option<f64>,
    /// Northing coordinate of the marker. Defaults to the map center.
    pub northing: Option<f64>,
    /// Path of a custom icon for the marker, absolute or relative to the base URL.
    pub icon_path: Option<String>,
    /// Whether the map is recentered at the marker position.
    #[serde(deserialize_with = "flexible_bool")]
    pub recenter: bool,
    /// Height of the icon in pixels.
    pub graphic_height: Option<f64>,
    /// Width of the icon in pixels.
    pub graphic_width: Option<f64>,
    /// Opacity of the marker, from 0 to 1.
    pub fill_opacity: Option<f64>,
}

impl Default for MarkerOptions {
    fn default() -> Self {
        Self {
            easting: None,
            northing: None,
            icon_path: None,
            recenter: false,
            graphic_height: None,
            graphic_width: None,
            fill_opacity: None,
        }
    }
}

/// Builds the marker feature at the given position.
pub(crate) fn marker_feature(options: &MarkerOptions, position: Point2d, base_url: &str) -> Feature {
    let icon = resolve_icon_path(base_url, options.icon_path.as_deref());

    let style = Style {
        external_graphic: Some(icon),
        fill_opacity: options.fill_opacity.unwrap_or(1.0),
        graphic_height: Some(options.graphic_height.unwrap_or(DEFAULT_GRAPHIC_SIZE)),
        graphic_width: Some(options.graphic_width.unwrap_or(DEFAULT_GRAPHIC_SIZE)),
        ..Default::default()
    };

    let mut feature = Feature::new(Geom::Point(position));
    feature.style = Some(style);
    feature
}

/// Resolves a marker icon path: absolute URLs are kept as is, anything else is joined
/// with the base URL.
pub(crate) fn resolve_icon_path(base_url: &str, icon_path: Option<&str>) -> String {
    let base = base_url.trim_end_matches('/');
    match icon_path {
        Some(path) if path.starts_with("http://") || path.starts_with("https://") => path.into(),
        Some(path) if path.starts_with('/') => format!("{base}{path}"),
        Some(path) => format!("{base}/{path}"),
        None => format!("{base}{DEFAULT_ICON_PATH}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_path_resolution() {
        let base = "https://example.com";

        assert_eq!(
            resolve_icon_path(base, Some("http://cdn.test/pin.png")),
            "http://cdn.test/pin.png"
        );
        assert_eq!(
            resolve_icon_path(base, Some("/img/pin.png")),
            "https://example.com/img/pin.png"
        );
        assert_eq!(
            resolve_icon_path(base, Some("img/pin.png")),
            "https://example.com/img/pin.png"
        );
        assert_eq!(
            resolve_icon_path(base, None),
            "https://example.com/img/marker-gold.png"
        );
    }

    #[test]
    fn marker_defaults() {
        let options: MarkerOptions = serde_json::from_str("{}").expect("valid options");
        let feature = marker_feature(&options, Point2d::new(10.0, 20.0), "https://example.com");

        let style = feature.style.expect("marker has its own style");
        assert_eq!(style.graphic_width, Some(25.0));
        assert_eq!(style.graphic_height, Some(25.0));
        assert_eq!(style.fill_opacity, 1.0);
        assert_eq!(feature.geometry, Geom::Point(Point2d::new(10.0, 20.0)));
    }
}
