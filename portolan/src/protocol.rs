//! Client side of the remote services the API talks to.
//!
//! Every service sits behind an async trait so that coordinators can be exercised with
//! in-memory fakes. [`HttpGateway`] is the production implementation of all of them,
//! configured from an [`ApiConfig`].

use async_trait::async_trait;
use portolan_types::cartesian::{Point2d, Rect};
use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::config::ApiConfig;
use crate::error::PortolanError;
use crate::feature::Feature;

/// Loads single features by layer name and id. Used by the search recenter flow.
///
/// The service responds with a GeoJSON feature collection; only the first feature is
/// used.
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Loads the feature identified by the layer/id pair.
    async fn load_feature(&self, layer: &str, id: &str) -> Result<Feature, PortolanError>;
}

/// Reports the bounding box covering a set of server-side objects.
#[async_trait]
pub trait RecenterSource: Send + Sync {
    /// Bounding box covering the listed objects of the layer.
    async fn load_bbox(&self, layers: &str, ids: &[String]) -> Result<Rect, PortolanError>;
}

/// Loads the geometries of server-side objects for highlighting.
#[async_trait]
pub trait HighlightSource: Send + Sync {
    /// Features of the listed objects, to be drawn onto the drawing layer.
    async fn load_geometries(
        &self,
        layers: &str,
        ids: &[String],
    ) -> Result<Vec<Feature>, PortolanError>;
}

/// A query of the map content at a clicked point.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRequest {
    /// The clicked point in map coordinates.
    pub point: Point2d,
    /// Click tolerance in pixels.
    pub tolerance: f64,
    /// Names of the WMS sublayers currently visible on the map.
    pub layers: Vec<String>,
    /// Language code sent to the service.
    pub lang: Option<String>,
}

/// What the query service returned for a click.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryResult {
    /// Popup title.
    #[serde(default)]
    pub title: String,
    /// Popup HTML content.
    #[serde(default)]
    pub content: String,
}

/// Answers map queries at clicked points.
#[async_trait]
pub trait QuerySource: Send + Sync {
    /// Queries the map at the request point. `None` when nothing matched the click.
    async fn query(&self, request: &QueryRequest) -> Result<Option<QueryResult>, PortolanError>;
}

/// The `{"rows": [...], "results": n}` envelope the recenter and highlight services
/// wrap their payloads into.
#[derive(Debug, Deserialize)]
struct RowsEnvelope<T> {
    #[serde(default = "Vec::new")]
    rows: Vec<T>,
    #[serde(default)]
    #[allow(dead_code)]
    results: usize,
}

#[derive(Debug, Deserialize)]
struct BboxRow {
    bbox: [f64; 4],
}

#[derive(Debug, Deserialize)]
struct FeaturesRow {
    features: geojson::FeatureCollection,
}

#[derive(Debug, Deserialize)]
struct QueryEnvelope {
    features: Option<QueryResult>,
}

/// HTTP client of the remote services.
pub struct HttpGateway {
    http_client: reqwest::Client,
    search_url: String,
    recenter_url: String,
    highlight_url: String,
    query_url: Option<String>,
    lang: Option<String>,
}

impl HttpGateway {
    /// Creates a gateway for the services named in the config.
    pub fn new(config: &ApiConfig) -> Result<Self, PortolanError> {
        let http_client = reqwest::Client::builder()
            .user_agent("portolan/0.1")
            .build()?;

        Ok(Self {
            http_client,
            search_url: config.search_service_url(),
            recenter_url: config.recenter_url(),
            highlight_url: config.highlight_url(),
            query_url: config.query_url.clone(),
            lang: config.lang.clone(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<T, PortolanError> {
        log::trace!("Requesting {url}");

        let mut request = self.http_client.get(url).query(params);
        if let Some(lang) = &self.lang {
            request = request.query(&[("lang", lang.as_str())]);
        }

        let response = request.send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PortolanError::NotFound);
        }
        if !response.status().is_success() {
            log::info!("Failed to load {url}: response status {}", response.status());
            return Err(PortolanError::Io);
        }

        let bytes = response.bytes().await?;
        log::info!("Loaded {url}. Byte size: {}", bytes.len());

        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[async_trait]
impl FeatureSource for HttpGateway {
    async fn load_feature(&self, layer: &str, id: &str) -> Result<Feature, PortolanError> {
        let params = [("layer", layer.to_string()), ("id", id.to_string())];
        let collection: geojson::FeatureCollection =
            self.get_json(&self.search_url, &params).await?;

        log::trace!(
            "Feature {layer}/{id} loaded, {} features in response",
            collection.features.len()
        );

        let feature = collection
            .features
            .into_iter()
            .next()
            .ok_or(PortolanError::NotFound)?;
        Feature::try_from(feature)
    }
}

#[async_trait]
impl RecenterSource for HttpGateway {
    async fn load_bbox(&self, layers: &str, ids: &[String]) -> Result<Rect, PortolanError> {
        let params = [("layers", layers.to_string()), ("ids", ids.join(","))];
        let envelope: RowsEnvelope<BboxRow> = self.get_json(&self.recenter_url, &params).await?;

        let row = envelope.rows.into_iter().next().ok_or(PortolanError::NotFound)?;
        Ok(Rect::from_array(row.bbox))
    }
}

#[async_trait]
impl HighlightSource for HttpGateway {
    async fn load_geometries(
        &self,
        layers: &str,
        ids: &[String],
    ) -> Result<Vec<Feature>, PortolanError> {
        let params = [("layers", layers.to_string()), ("ids", ids.join(","))];
        let envelope: RowsEnvelope<FeaturesRow> =
            self.get_json(&self.highlight_url, &params).await?;

        let row = envelope.rows.into_iter().next().ok_or(PortolanError::NotFound)?;
        row.features
            .features
            .into_iter()
            .map(Feature::try_from)
            .collect()
    }
}

#[async_trait]
impl QuerySource for HttpGateway {
    async fn query(&self, request: &QueryRequest) -> Result<Option<QueryResult>, PortolanError> {
        let Some(url) = &self.query_url else {
            return Ok(None);
        };

        let params = [
            ("lon", request.point.x.to_string()),
            ("lat", request.point.y.to_string()),
            ("tolerance", request.tolerance.to_string()),
            ("layers", request.layers.join(",")),
        ];
        let envelope: QueryEnvelope = self.get_json(url, &params).await?;

        Ok(envelope.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bbox_envelope() {
        let envelope: RowsEnvelope<BboxRow> = serde_json::from_str(
            r#"{"rows": [{"bbox": [672518.0, 267450.24, 697695.0, 295935.0]}], "results": 1}"#,
        )
        .expect("valid envelope");

        assert_eq!(envelope.rows.len(), 1);
        assert_eq!(
            Rect::from_array(envelope.rows[0].bbox),
            Rect::new(672518.0, 267450.24, 697695.0, 295935.0)
        );
    }

    #[test]
    fn features_envelope() {
        let envelope: RowsEnvelope<FeaturesRow> = serde_json::from_str(
            r#"{"rows": [{"features": {"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Point", "coordinates": [1.0, 2.0]}}]}}],
                "results": 1}"#,
        )
        .expect("valid envelope");

        assert_eq!(envelope.rows[0].features.features.len(), 1);
    }

    #[test]
    fn query_envelope_with_no_match() {
        let envelope: QueryEnvelope =
            serde_json::from_str(r#"{"features": null}"#).expect("valid envelope");
        assert!(envelope.features.is_none());

        let envelope: QueryEnvelope = serde_json::from_str(
            r#"{"features": {"title": "Parcel 42", "content": "<p>owner: n/a</p>"}}"#,
        )
        .expect("valid envelope");
        let result = envelope.features.expect("query matched");
        assert_eq!(result.title, "Parcel 42");
    }

    #[test]
    fn empty_rows_deserialize() {
        let envelope: RowsEnvelope<BboxRow> =
            serde_json::from_str(r#"{"results": 0}"#).expect("valid envelope");
        assert!(envelope.rows.is_empty());
    }
}
