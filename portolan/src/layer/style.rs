//! Styling of vector layer features.

use serde::{Deserialize, Serialize};

/// Color representation.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Color {
    r: u8,
    g: u8,
    b: u8,
    a: u8,
}

impl From<String> for Color {
    fn from(value: String) -> Self {
        Self::try_from_hex(&value).unwrap_or(Color::BLACK)
    }
}

impl From<Color> for String {
    fn from(val: Color) -> Self {
        val.to_hex()
    }
}

impl Color {
    /// Black color: `#000000FF`
    pub const BLACK: Color = Color::rgba(0, 0, 0, 255);
    /// White color: `#FFFFFFFF`
    pub const WHITE: Color = Color::rgba(255, 255, 255, 255);

    /// Constructs color from its RGBA channels.
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Constructs an opaque color from its RGB channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Converts the color into HEX8 string: `#RRGGBBAA`.
    pub fn to_hex(&self) -> String {
        format!("#{:02X}{:02X}{:02X}{:02X}", self.r, self.g, self.b, self.a)
    }

    /// Parses a color from the hex string. Hex string can be either HEX6 (`#RRGGBB`) or
    /// HEX8 (`#RRGGBBAA`).
    pub fn try_from_hex(hex_string: &str) -> Option<Self> {
        if hex_string.len() != 7 && hex_string.len() != 9 || hex_string.chars().next()? != '#' {
            return None;
        }

        let r = u8::from_str_radix(&hex_string[1..3], 16).ok()?;
        let g = u8::from_str_radix(&hex_string[3..5], 16).ok()?;
        let b = u8::from_str_radix(&hex_string[5..7], 16).ok()?;
        let a = if hex_string.len() == 9 {
            u8::from_str_radix(&hex_string[7..9], 16).ok()?
        } else {
            255
        };

        Some(Self { r, g, b, a })
    }
}

/// How the features of a vector layer are drawn by the host engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Radius of point features, in pixels.
    pub point_radius: f64,
    /// Fill color of points and polygons.
    pub fill_color: Color,
    /// Fill opacity, from 0 to 1.
    pub fill_opacity: f64,
    /// Stroke color of contours and outlines.
    pub stroke_color: Color,
    /// Stroke opacity, from 0 to 1.
    pub stroke_opacity: f64,
    /// Stroke width, in pixels.
    pub stroke_width: f64,
    /// URL of an image drawn instead of the point symbol.
    pub external_graphic: Option<String>,
    /// Width of the external graphic, in pixels.
    pub graphic_width: Option<f64>,
    /// Height of the external graphic, in pixels.
    pub graphic_height: Option<f64>,
    /// Mouse cursor shown over the feature.
    pub cursor: Option<String>,
}

impl Default for Style {
    fn default() -> Self {
        Self {
            point_radius: 6.0,
            fill_color: Color::rgb(0xEE, 0x99, 0x00),
            fill_opacity: 0.4,
            stroke_color: Color::rgb(0xEE, 0x99, 0x00),
            stroke_opacity: 1.0,
            stroke_width: 1.0,
            external_graphic: None,
            graphic_width: None,
            graphic_height: None,
            cursor: None,
        }
    }
}

/// Default and selection styles of a vector layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleMap {
    /// Style of features in their normal state.
    pub default: Style,
    /// Style of selected (e.g. hovered) features.
    pub select: Style,
}

impl Default for StyleMap {
    fn default() -> Self {
        let default = Style::default();
        Self {
            select: default.clone(),
            default,
        }
    }
}

impl StyleMap {
    /// Style map with the same style for normal and selected features.
    pub fn uniform(style: Style) -> Self {
        Self {
            select: style.clone(),
            default: style,
        }
    }

    /// Style of the drawing layer: yellow fill with an orange outline.
    pub fn drawing() -> Self {
        StyleMap::uniform(Style {
            point_radius: 10.0,
            fill_color: Color::rgb(0xFF, 0xFF, 0x00),
            fill_opacity: 0.8,
            stroke_color: Color::rgb(0xFF, 0x80, 0x00),
            stroke_opacity: 0.8,
            stroke_width: 2.0,
            ..Default::default()
        })
    }

    /// Style of the search marker layer: green markers that turn red when hovered.
    pub fn markers() -> Self {
        Self {
            default: Style {
                point_radius: 11.0,
                fill_color: Color::rgb(0xCC, 0xFF, 0x33),
                fill_opacity: 0.8,
                stroke_color: Color::rgb(0x66, 0x88, 0x00),
                stroke_opacity: 0.8,
                stroke_width: 1.0,
                ..Default::default()
            },
            select: Style {
                point_radius: 15.0,
                fill_color: Color::rgb(0xFF, 0x00, 0x00),
                stroke_color: Color::rgb(0x88, 0x00, 0x00),
                cursor: Some("pointer".into()),
                ..Default::default()
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parsing() {
        assert_eq!(Color::try_from_hex("#FFFF00"), Some(Color::rgb(255, 255, 0)));
        assert_eq!(
            Color::try_from_hex("#FF800080"),
            Some(Color::rgba(255, 128, 0, 128))
        );
        assert_eq!(Color::try_from_hex("FFFF00"), None);
        assert_eq!(Color::try_from_hex("#FFF"), None);
    }

    #[test]
    fn hex_round_trip() {
        let color = Color::rgba(18, 52, 86, 120);
        assert_eq!(Color::try_from_hex(&color.to_hex()), Some(color));
    }
}
