//! Popups anchored to map locations.

use portolan_types::cartesian::Point2d;
use serde::Deserialize;

use crate::config::flexible_bool;

/// Content and placement of a popup window, ready for the host engine to display.
#[derive(Debug, Clone, PartialEq)]
pub struct Popup {
    /// Title of the popup window.
    pub title: String,
    /// HTML content of the popup.
    pub html: String,
    /// Map location the popup is anchored to.
    pub position: Point2d,
    /// Width of the popup in pixels.
    pub width: u32,
    /// Whether the popup can be collapsed by the user.
    pub collapsible: bool,
    /// Whether the popup can be detached from its anchor.
    pub unpinnable: bool,
    /// Whether the popup window has a border.
    pub border: bool,
}

/// Keeps at most one popup open at a time: opening a new popup always closes the
/// previous one first.
#[derive(Debug, Default)]
pub struct PopupManager {
    current: Option<Popup>,
}

impl PopupManager {
    /// Closes the current popup, then opens the given one.
    pub fn show(&mut self, popup: Popup) {
        self.hide();
        self.current = Some(popup);
    }

    /// Closes the current popup, returning it if one was open.
    pub fn hide(&mut self) -> Option<Popup> {
        self.current.take()
    }

    /// The currently open popup, if any.
    pub fn current(&self) -> Option<&Popup> {
        self.current.as_ref()
    }
}

/// Options of [`Api::show_popup`](crate::Api::show_popup).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PopupOptions {
    /// Easting coordinate of the popup anchor. Defaults to the map center.
    pub easting: Option<f64>,
    /// Northing coordinate of the popup anchor. Defaults to the map center.
    pub northing: Option<f64>,
    /// Title of the popup window.
    pub title: String,
    /// HTML content of the popup.
    pub html: String,
    /// Whether the map is recentered at the popup position.
    #[serde(deserialize_with = "flexible_bool")]
    pub recenter: bool,
    /// Width of the popup in pixels.
    pub width: u32,
    /// Whether the popup can be collapsed by the user.
    pub collapsible: bool,
    /// Whether the popup can be detached from its anchor.
    pub unpinnable: bool,
}

impl Default for PopupOptions {
    fn default() -> Self {
        Self {
            easting: None,
            northing: None,
            title: String::new(),
            html: String::new(),
            recenter: false,
            width: 200,
            collapsible: false,
            unpinnable: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn popup(title: &str) -> Popup {
        Popup {
            title: title.into(),
            html: String::new(),
            position: Point2d::new(0.0, 0.0),
            width: 200,
            collapsible: false,
            unpinnable: true,
            border: true,
        }
    }

    #[test]
    fn at_most_one_popup() {
        let mut popups = PopupManager::default();
        assert!(popups.current().is_none());

        popups.show(popup("first"));
        assert_eq!(popups.current().map(|p| p.title.as_str()), Some("first"));

        popups.show(popup("second"));
        assert_eq!(popups.current().map(|p| p.title.as_str()), Some("second"));

        assert_eq!(popups.hide().map(|p| p.title), Some("second".to_string()));
        assert!(popups.current().is_none());
    }

    #[test]
    fn options_defaults() {
        let options: PopupOptions = serde_json::from_str("{}").expect("valid options");
        assert_eq!(options.width, 200);
        assert!(!options.collapsible);
        assert!(options.unpinnable);
        assert!(!options.recenter);
    }

    #[test]
    fn options_string_recenter() {
        let options: PopupOptions =
            serde_json::from_str(r#"{"recenter": "True"}"#).expect("valid options");
        assert!(options.recenter);
    }
}
