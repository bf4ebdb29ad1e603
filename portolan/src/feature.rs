//! Features: geometric objects with attributes, sourced from remote services.

use portolan_types::cartesian::{Point2d, Rect};
use portolan_types::Geom;
use serde::{Deserialize, Serialize};

use crate::error::PortolanError;
use crate::layer::Style;

/// Identifier of a feature within its layer.
pub type FeatureId = String;

/// Reference to a server-side object. The object itself is not owned by the client; it
/// is looked up through a remote call by the layer name and id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FeatureRef {
    /// Name of the server-side layer the object belongs to.
    pub layer: String,
    /// Identifier of the object within the layer.
    pub id: FeatureId,
}

impl FeatureRef {
    /// Creates a new feature reference.
    pub fn new(layer: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            id: id.into(),
        }
    }
}

/// Attributes of a feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureProperties {
    /// Display name of the feature, used as the popup title.
    pub name: Option<String>,
    /// HTML content shown in the popup for this feature.
    pub content: Option<String>,
    /// Any other attributes reported by the service.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// A geometric object with attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature id, when the source service reports one.
    pub id: Option<FeatureId>,
    /// Geometry of the feature.
    pub geometry: Geom,
    /// Feature attributes.
    pub properties: FeatureProperties,
    /// Style overriding the layer style, e.g. for markers with custom icons.
    pub style: Option<Style>,
}

impl Feature {
    /// Creates a feature with the given geometry and no attributes.
    pub fn new(geometry: impl Into<Geom>) -> Self {
        Self {
            id: None,
            geometry: geometry.into(),
            properties: FeatureProperties::default(),
            style: None,
        }
    }

    /// Bounding rectangle of the feature's geometry.
    pub fn bounds(&self) -> Option<Rect> {
        self.geometry.bounding_rect()
    }
}

impl TryFrom<geojson::Feature> for Feature {
    type Error = PortolanError;

    fn try_from(value: geojson::Feature) -> Result<Self, Self::Error> {
        let geometry = value
            .geometry
            .as_ref()
            .ok_or_else(|| PortolanError::Decoding("feature without geometry".into()))?;

        let properties = match value.properties {
            Some(map) => serde_json::from_value(serde_json::Value::Object(map))?,
            None => FeatureProperties::default(),
        };

        let id = match value.id {
            Some(geojson::feature::Id::String(v)) => Some(v),
            Some(geojson::feature::Id::Number(v)) => Some(v.to_string()),
            None => None,
        };

        Ok(Self {
            id,
            geometry: geom_from_geojson(geometry)?,
            properties,
            style: None,
        })
    }
}

fn geom_from_geojson(geometry: &geojson::Geometry) -> Result<Geom, PortolanError> {
    use geojson::Value;

    match &geometry.value {
        Value::Point(position) => Ok(Geom::Point(point(position)?)),
        Value::LineString(positions) => Ok(Geom::Contour(points(positions)?)),
        Value::Polygon(rings) => Ok(Geom::Polygon(
            rings.iter().map(|ring| points(ring)).collect::<Result<_, _>>()?,
        )),
        Value::MultiPolygon(polygons) => Ok(Geom::MultiPolygon(
            polygons
                .iter()
                .map(|rings| rings.iter().map(|ring| points(ring)).collect::<Result<_, _>>())
                .collect::<Result<_, _>>()?,
        )),
        other => Err(PortolanError::Decoding(format!(
            "unsupported geometry type: {}",
            geometry_type_name(other)
        ))),
    }
}

fn geometry_type_name(value: &geojson::Value) -> &'static str {
    use geojson::Value;

    match value {
        Value::Point(_) => "Point",
        Value::MultiPoint(_) => "MultiPoint",
        Value::LineString(_) => "LineString",
        Value::MultiLineString(_) => "MultiLineString",
        Value::Polygon(_) => "Polygon",
        Value::MultiPolygon(_) => "MultiPolygon",
        Value::GeometryCollection(_) => "GeometryCollection",
    }
}

fn point(position: &[f64]) -> Result<Point2d, PortolanError> {
    if position.len() < 2 {
        return Err(PortolanError::Decoding("invalid position".into()));
    }

    Ok(Point2d::new(position[0], position[1]))
}

fn points(positions: &[Vec<f64>]) -> Result<Vec<Point2d>, PortolanError> {
    positions.iter().map(|p| point(p)).collect()
}
