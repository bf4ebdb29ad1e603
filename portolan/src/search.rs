//! The search coordinator: recenter-by-id and query-on-click flows.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use portolan_types::cartesian::Point2d;

use crate::error::PortolanError;
use crate::feature::{Feature, FeatureId, FeatureRef};
use crate::layer::{Layer, StyleMap, VectorLayer};
use crate::map::Map;
use crate::popup::{Popup, PopupManager};
use crate::protocol::{FeatureSource, QueryRequest, QuerySource};

const RECENTER_POPUP_WIDTH: u32 = 250;
const QUERY_POPUP_WIDTH: u32 = 400;

/// Id of the search marker layer in the map's layer stack.
pub const MARKER_LAYER_ID: &str = "search_markers";

/// Behavior of the host engine's feature selection control over the marker layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectConfig {
    /// Select features on hover rather than on click.
    pub hover: bool,
    /// Allow selecting several features at once.
    pub multiple: bool,
}

impl Default for SelectConfig {
    fn default() -> Self {
        Self {
            hover: true,
            multiple: false,
        }
    }
}

/// Coordinates the search flows: fetching features by id, recentering the map on them,
/// and querying the map content at clicked points.
///
/// Fetched features are memoized by id for the lifetime of the session: a lookup miss
/// triggers exactly one remote fetch, and the result is cached before it is displayed,
/// so a later recenter on the same id never re-fetches. The cache is append-only; there
/// is no eviction.
pub struct Search {
    map: Arc<RwLock<Map>>,
    markers: Arc<RwLock<VectorLayer>>,
    popups: Arc<RwLock<PopupManager>>,
    features_cache: HashMap<FeatureId, Feature>,
    feature_source: Arc<dyn FeatureSource>,
    query_source: Option<Arc<dyn QuerySource>>,
    select: SelectConfig,
    tolerance: f64,
    lang: Option<String>,
}

impl Search {
    /// Creates a coordinator over the given map. A marker layer is added to the map.
    pub fn new(
        map: Arc<RwLock<Map>>,
        popups: Arc<RwLock<PopupManager>>,
        feature_source: Arc<dyn FeatureSource>,
        query_source: Option<Arc<dyn QuerySource>>,
        tolerance: f64,
        lang: Option<String>,
    ) -> Self {
        let markers = Arc::new(RwLock::new(VectorLayer::new(
            "Search markers",
            StyleMap::markers(),
        )));
        map.write()
            .add_layer(Layer::vector(MARKER_LAYER_ID, markers.clone()));

        Self {
            map,
            markers,
            popups,
            features_cache: HashMap::new(),
            feature_source,
            query_source,
            select: SelectConfig::default(),
            tolerance,
            lang,
        }
    }

    /// The marker layer the coordinator draws search results onto.
    pub fn markers(&self) -> &Arc<RwLock<VectorLayer>> {
        &self.markers
    }

    /// Selection behavior for the host engine's select control over the markers.
    pub fn select_config(&self) -> SelectConfig {
        self.select
    }

    /// Recenters the map on the referenced feature.
    ///
    /// A feature already seen in this session is displayed without any remote call;
    /// otherwise it is fetched once, cached, and then displayed. On a failed fetch
    /// nothing is displayed and the cache is left untouched.
    pub async fn recenter(&mut self, feature_ref: &FeatureRef) -> Result<(), PortolanError> {
        if let Some(feature) = self.features_cache.get(&feature_ref.id) {
            log::trace!("Feature cache hit for id {}", feature_ref.id);
            let feature = feature.clone();
            self.finish_recenter(&feature);
            return Ok(());
        }

        let feature = self
            .feature_source
            .load_feature(&feature_ref.layer, &feature_ref.id)
            .await?;

        self.features_cache
            .insert(feature_ref.id.clone(), feature.clone());
        self.finish_recenter(&feature);
        Ok(())
    }

    fn finish_recenter(&mut self, feature: &Feature) {
        self.hide_popup();

        let Some(bounds) = feature.bounds() else {
            log::warn!("feature has no geometry to recenter on");
            return;
        };

        self.map.write().zoom_to_extent(bounds);

        self.show_popup(
            feature.properties.name.clone().unwrap_or_default(),
            feature.properties.content.clone().unwrap_or_default(),
            bounds.center(),
            RECENTER_POPUP_WIDTH,
        );
    }

    /// Queries the map content at the clicked point and opens a popup with the result.
    ///
    /// The request combines the click tolerance with the names of the WMS sublayers
    /// currently visible on the map. Returns whether anything was displayed.
    pub async fn query_at_point(&mut self, point: Point2d) -> Result<bool, PortolanError> {
        let Some(query_source) = self.query_source.clone() else {
            return Ok(false);
        };

        let request = QueryRequest {
            point,
            tolerance: self.tolerance,
            layers: self.map.read().layers().visible_wms_layers(),
            lang: self.lang.clone(),
        };

        let Some(result) = query_source.query(&request).await? else {
            return Ok(false);
        };

        self.show_popup(result.title, result.content, point, QUERY_POPUP_WIDTH);
        Ok(true)
    }

    /// Adds a marker feature (e.g. an externally found search result) to the marker
    /// layer.
    pub fn add_marker(&mut self, feature: Feature) {
        self.markers.write().add_feature(feature);
    }

    /// Closes the popup, clears the markers and hides the marker layer.
    pub fn hide_layer(&mut self) {
        self.hide_popup();
        self.markers.write().clear_features();
        self.map
            .write()
            .set_layer_visibility(MARKER_LAYER_ID, false);
    }

    /// Shows the marker layer again after [`Search::hide_layer`].
    pub fn show_layer(&mut self) {
        self.map.write().set_layer_visibility(MARKER_LAYER_ID, true);
    }

    /// Closes the coordinator's popup if one is open.
    pub fn hide_popup(&mut self) {
        self.popups.write().hide();
    }

    fn show_popup(&mut self, title: String, html: String, position: Point2d, width: u32) {
        self.popups.write().show(Popup {
            title,
            html,
            position,
            width,
            collapsible: false,
            unpinnable: false,
            border: false,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use portolan_types::cartesian::{Rect, Size};
    use portolan_types::Geom;

    use super::*;
    use crate::protocol::QueryResult;

    struct FakeFeatureSource {
        calls: AtomicUsize,
    }

    impl FakeFeatureSource {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl FeatureSource for FakeFeatureSource {
        async fn load_feature(&self, _layer: &str, id: &str) -> Result<Feature, PortolanError> {
            self.calls.fetch_add(1, Ordering::SeqCst);

            let mut feature = Feature::new(Geom::Polygon(vec![vec![
                Point2d::new(672518.0, 267450.24),
                Point2d::new(672518.0, 295935.0),
                Point2d::new(697695.0, 295935.0),
                Point2d::new(697695.0, 267450.24),
            ]]));
            feature.id = Some(id.into());
            feature.properties.name = Some(format!("Object {id}"));
            feature.properties.content = Some("<p>details</p>".into());
            Ok(feature)
        }
    }

    struct FailingFeatureSource;

    #[async_trait]
    impl FeatureSource for FailingFeatureSource {
        async fn load_feature(&self, _layer: &str, _id: &str) -> Result<Feature, PortolanError> {
            Err(PortolanError::Io)
        }
    }

    struct FakeQuerySource {
        seen_layers: RwLock<Vec<String>>,
        result: Option<QueryResult>,
    }

    #[async_trait]
    impl QuerySource for FakeQuerySource {
        async fn query(
            &self,
            request: &QueryRequest,
        ) -> Result<Option<QueryResult>, PortolanError> {
            *self.seen_layers.write() = request.layers.clone();
            Ok(self.result.clone())
        }
    }

    fn test_map() -> Arc<RwLock<Map>> {
        let mut map = Map::default();
        map.set_size(Size::new(800.0, 600.0));
        Arc::new(RwLock::new(map))
    }

    fn searcher(
        map: Arc<RwLock<Map>>,
        feature_source: Arc<dyn FeatureSource>,
        query_source: Option<Arc<dyn QuerySource>>,
    ) -> (Search, Arc<RwLock<PopupManager>>) {
        let popups = Arc::new(RwLock::new(PopupManager::default()));
        let search = Search::new(map, popups.clone(), feature_source, query_source, 10.0, None);
        (search, popups)
    }

    #[tokio::test]
    async fn second_recenter_hits_cache() {
        let source = FakeFeatureSource::new();
        let map = test_map();
        let (mut search, popups) = searcher(map.clone(), source.clone(), None);

        let feature_ref = FeatureRef::new("parcels", "42");
        search.recenter(&feature_ref).await.expect("recenter succeeds");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        let popup = popups.read().current().cloned().expect("popup is open");
        assert_eq!(popup.title, "Object 42");
        assert_eq!(popup.html, "<p>details</p>");
        assert_eq!(popup.width, 250);

        let expected_bounds = Rect::new(672518.0, 267450.24, 697695.0, 295935.0);
        assert_eq!(map.read().center(), Some(expected_bounds.center()));

        search.recenter(&feature_ref).await.expect("recenter succeeds");
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);

        search
            .recenter(&FeatureRef::new("parcels", "43"))
            .await
            .expect("recenter succeeds");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failed_fetch_displays_nothing() {
        let map = test_map();
        let (mut search, popups) = searcher(map.clone(), Arc::new(FailingFeatureSource), None);

        let center_before = map.read().center();
        let result = search.recenter(&FeatureRef::new("parcels", "42")).await;

        assert!(result.is_err());
        assert!(popups.read().current().is_none());
        assert!(search.features_cache.is_empty());
        assert_eq!(map.read().center(), center_before);
    }

    #[tokio::test]
    async fn query_filters_by_visible_layers() {
        let map = test_map();
        map.write()
            .add_layer(Layer::wms("base", "Base", vec!["plan".into()]));
        map.write()
            .add_layer(Layer::wms("pois", "POIs", vec!["poi_shops".into()]));
        map.write().set_layer_visibility("pois", false);

        let query = Arc::new(FakeQuerySource {
            seen_layers: RwLock::new(Vec::new()),
            result: Some(QueryResult {
                title: "Parcel 42".into(),
                content: "<p>owner: n/a</p>".into(),
            }),
        });
        let (mut search, popups) = searcher(map, FakeFeatureSource::new(), Some(query.clone()));

        let click = Point2d::new(600100.0, 200100.0);
        let displayed = search.query_at_point(click).await.expect("query succeeds");

        assert!(displayed);
        assert_eq!(*query.seen_layers.read(), vec!["plan"]);

        let popup = popups.read().current().cloned().expect("popup is open");
        assert_eq!(popup.title, "Parcel 42");
        assert_eq!(popup.position, click);
        assert_eq!(popup.width, 400);
    }

    #[tokio::test]
    async fn popups_replace_each_other() {
        let source = FakeFeatureSource::new();
        let map = test_map();
        let query = Arc::new(FakeQuerySource {
            seen_layers: RwLock::new(Vec::new()),
            result: Some(QueryResult {
                title: "query result".into(),
                content: String::new(),
            }),
        });
        let (mut search, popups) = searcher(map, source, Some(query));

        search
            .recenter(&FeatureRef::new("parcels", "42"))
            .await
            .expect("recenter succeeds");
        search
            .query_at_point(Point2d::new(0.0, 0.0))
            .await
            .expect("query succeeds");

        let popup = popups.read().current().cloned().expect("popup is open");
        assert_eq!(popup.title, "query result");
    }

    #[tokio::test]
    async fn hide_layer_clears_markers_and_popup() {
        let source = FakeFeatureSource::new();
        let map = test_map();
        let (mut search, popups) = searcher(map.clone(), source, None);

        search.add_marker(Feature::new(Geom::Point(Point2d::new(1.0, 1.0))));
        search
            .recenter(&FeatureRef::new("parcels", "42"))
            .await
            .expect("recenter succeeds");

        search.hide_layer();

        assert!(popups.read().current().is_none());
        assert!(search.markers().read().features().is_empty());
        assert!(!map
            .read()
            .layers()
            .get(MARKER_LAYER_ID)
            .expect("marker layer exists")
            .is_visible());

        search.show_layer();
        assert!(map
            .read()
            .layers()
            .get(MARKER_LAYER_ID)
            .expect("marker layer exists")
            .is_visible());
    }
}
