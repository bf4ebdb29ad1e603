//! The API facade: one object wiring the map, the layer tree, the search coordinator,
//! the permalink synchronizer and the toolbar together.

use std::sync::Arc;

use parking_lot::RwLock;
use portolan_types::cartesian::{Point2d, Rect};
use url::Url;

use crate::config::{ApiConfig, MapConfig};
use crate::error::PortolanError;
use crate::feature::FeatureRef;
use crate::layer::tree::LayerTree;
use crate::layer::{Layer, LayerCollection, StyleMap, VectorLayer};
use crate::map::{Map, MapView, ZoomScheme, TOP_RESOLUTION};
use crate::marker::{marker_feature, MarkerOptions};
use crate::permalink::{ArgParser, CoordsParams, ParsedArgs, Permalink, PermalinkSlot};
use crate::popup::{Popup, PopupManager, PopupOptions};
use crate::protocol::{FeatureSource, HighlightSource, HttpGateway, QuerySource, RecenterSource};
use crate::search::Search;
use crate::toolbar::{ToolAction, ToolbarBuilder, ToolbarConfig};

/// Zoom level used when a recenter target turns out to be a point rather than an area.
const POINT_ZOOM: u32 = 19;

/// Number of zoom levels of the maps created by the facade.
const MAX_ZOOM: u32 = 21;

/// Id of the drawing layer every map gets on top of its stack.
pub const DRAW_LAYER_ID: &str = "drawings";

/// Index of an API instance in an [`ApiPool`].
pub type ApiId = usize;

/// Explicit table of live API instances.
///
/// When several instances coexist on one page, the embedder owns this table and passes
/// it by reference wherever an instance has to be looked up by id. There is no
/// process-wide registry.
#[derive(Default)]
pub struct ApiPool {
    refs: Vec<Api>,
}

impl ApiPool {
    /// Adds an instance to the pool and returns its id.
    pub fn insert(&mut self, api: Api) -> ApiId {
        let id = self.refs.len();
        self.refs.push(api);
        id
    }

    /// The instance with the given id.
    pub fn get(&self, id: ApiId) -> Option<&Api> {
        self.refs.get(id)
    }

    /// Mutable access to the instance with the given id.
    pub fn get_mut(&mut self, id: ApiId) -> Option<&mut Api> {
        self.refs.get_mut(id)
    }

    /// Number of instances in the pool.
    pub fn len(&self) -> usize {
        self.refs.len()
    }

    /// True when the pool holds no instances.
    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }
}

/// Remote services used by the facade and the search coordinator.
///
/// Production instances come from [`Services::http`]; tests and special hosts can
/// provide their own implementations.
#[derive(Clone)]
pub struct Services {
    /// Source of single features for the search/recenter flow.
    pub feature: Arc<dyn FeatureSource>,
    /// Source of bounding boxes for batch recentering.
    pub recenter: Arc<dyn RecenterSource>,
    /// Source of geometries for highlighting.
    pub highlight: Arc<dyn HighlightSource>,
    /// Source of query-on-click answers, when the query service is configured.
    pub query: Option<Arc<dyn QuerySource>>,
}

impl Services {
    /// HTTP clients of the services named in the config.
    pub fn http(config: &ApiConfig) -> Result<Self, PortolanError> {
        let gateway = Arc::new(HttpGateway::new(config)?);

        Ok(Self {
            feature: gateway.clone(),
            recenter: gateway.clone(),
            highlight: gateway.clone(),
            query: if config.query_url.is_some() {
                Some(gateway)
            } else {
                None
            },
        })
    }
}

/// Ready-to-embed description of a map panel: the map plus its optional toolbar.
pub struct MapPanel {
    /// The map shown by the panel.
    pub map: Arc<RwLock<Map>>,
    /// Toolbar actions. Empty when tools were not requested.
    pub toolbar: Vec<ToolAction>,
    /// Center the panel focuses at, if established.
    pub center: Option<Point2d>,
    /// Zoom level of the panel, if established.
    pub zoom: Option<u32>,
}

/// Configuration of [`Api::create_map_panel`].
#[derive(Debug, Clone, Default)]
pub struct MapPanelConfig {
    /// Map configuration used when the panel has to create the map itself.
    pub map_info: MapConfig,
    /// Whether the panel carries a toolbar.
    pub show_tools: bool,
    /// Toolbar configuration, honored when `show_tools` is set.
    pub toolbar: ToolbarConfig,
}

/// The top-level facade of the API.
///
/// An instance owns the map and lazily constructs the other moving parts (the search
/// coordinator, the layer tree, the permalink synchronizer) on demand. A site
/// integrator embeds an interactive map with a handful of calls:
///
/// ```no_run
/// use portolan::{Api, ApiConfig, MapConfig};
///
/// # tokio_test::block_on(async {
/// let config = ApiConfig {
///     base_url: "https://example.com".into(),
///     ..Default::default()
/// };
///
/// let mut api = Api::new(config).expect("HTTP client can be built");
/// api.create_map(
///     &MapConfig {
///         easting: Some(600000.0),
///         northing: Some(200000.0),
///         zoom: Some(12),
///         ..Default::default()
///     },
///     vec![],
/// );
/// api.show_features("parcels", &["42".into()]).await;
/// # });
/// ```
pub struct Api {
    config: ApiConfig,
    services: Services,
    map: Option<Arc<RwLock<Map>>>,
    draw_layer: Option<Arc<RwLock<VectorLayer>>>,
    popups: Arc<RwLock<PopupManager>>,
    searcher: Option<Search>,
    tree: Arc<RwLock<Option<LayerTree>>>,
    permalink: Option<Permalink>,
    layer_tree_nodes: Vec<String>,
    pending_args: ParsedArgs,
    debug: bool,
}

impl Api {
    /// Creates an instance talking to the remote services named in the config.
    pub fn new(config: ApiConfig) -> Result<Self, PortolanError> {
        let services = Services::http(&config)?;
        Ok(Self::with_services(config, services))
    }

    /// Creates an instance over custom service implementations.
    pub fn with_services(config: ApiConfig, services: Services) -> Self {
        let debug = config.debug;
        Self {
            config,
            services,
            map: None,
            draw_layer: None,
            popups: Arc::new(RwLock::new(PopupManager::default())),
            searcher: None,
            tree: Arc::new(RwLock::new(None)),
            permalink: None,
            layer_tree_nodes: Vec::new(),
            pending_args: ParsedArgs::default(),
            debug,
        }
    }

    /// The configuration the instance was created with.
    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    /// Debug mode flag.
    pub fn debug(&self) -> bool {
        self.debug
    }

    /// The map, once [`Api::create_map`] ran.
    pub fn map(&self) -> Result<Arc<RwLock<Map>>, PortolanError> {
        self.map.clone().ok_or(PortolanError::NoMap)
    }

    /// The popup manager shared by the facade and the search coordinator. At most one
    /// popup is open at any time.
    pub fn popups(&self) -> Arc<RwLock<PopupManager>> {
        self.popups.clone()
    }

    /// Creates the map with the given layers. The drawing layer is always appended on
    /// top of the stack.
    ///
    /// The initial position is taken from the first available of: URL parameters parsed
    /// by [`Api::setup_permalink`], the configured easting/northing (+zoom), the
    /// configured bbox, the instance's initial extent, the maximum extent.
    pub fn create_map(&mut self, config: &MapConfig, layers: Vec<Layer>) -> Arc<RwLock<Map>> {
        let mut collection = LayerCollection::default();
        for layer in layers {
            collection.push(layer);
        }
        collection.push(Layer::vector(DRAW_LAYER_ID, self.drawing_layer()));
        collection.pin_to_top(DRAW_LAYER_ID);

        let view = MapView::default().with_resolution(TOP_RESOLUTION / 16.0);
        let mut map = Map::new(
            view,
            collection,
            ZoomScheme::web(MAX_ZOOM),
            self.config.max_extent,
        );

        if let Some(permalink) = &self.permalink {
            map.add_handler(permalink.clone());
        }

        let args = std::mem::take(&mut self.pending_args);
        if let Some(center) = args.center {
            map.set_center(center, args.zoom);
        } else if let (Some(easting), Some(northing)) = (config.easting, config.northing) {
            map.set_center(Point2d::new(easting, northing), config.zoom);
        } else if let Some(bbox) = config.bbox {
            map.zoom_to_extent(Rect::from_array(bbox));
        } else if let Some(extent) = self.config.initial_extent {
            map.zoom_to_extent(extent);
        } else {
            map.zoom_to_max_extent();
        }

        let map = Arc::new(RwLock::new(map));
        self.map = Some(map.clone());
        map
    }

    /// Creates a map panel: the map (created on the fly when needed) bundled with its
    /// toolbar and current position.
    pub fn create_map_panel(
        &mut self,
        config: &MapPanelConfig,
        layers: Vec<Layer>,
    ) -> Result<MapPanel, PortolanError> {
        let map = match &self.map {
            Some(map) => map.clone(),
            None => self.create_map(&config.map_info, layers),
        };

        let (center, zoom) = {
            let map = map.read();
            (map.center(), map.zoom())
        };

        let toolbar = if config.show_tools {
            self.create_toolbar(&config.toolbar)?
        } else {
            Vec::new()
        };

        Ok(MapPanel {
            map,
            toolbar,
            center,
            zoom,
        })
    }

    /// Builds the toolbar actions for the created map.
    pub fn create_toolbar(
        &mut self,
        config: &ToolbarConfig,
    ) -> Result<Vec<ToolAction>, PortolanError> {
        let map = self.map()?;
        let draw_layer = self.drawing_layer();
        let actions = ToolbarBuilder::new(draw_layer).build(config, &mut map.write());
        Ok(actions)
    }

    /// Installs the layer tree. When `checked_nodes` is given it replaces the tree's
    /// default checked set. The checked state is synced to the map layers.
    pub fn create_layer_tree(&mut self, mut tree: LayerTree, checked_nodes: Option<&[String]>) {
        if let Some(nodes) = checked_nodes {
            tree.apply_checked_set(nodes);
        }

        *self.tree.write() = Some(tree);
        self.sync_tree_layers();
    }

    /// The installed layer tree, shared with the permalink synchronizer.
    pub fn layer_tree(&self) -> Arc<RwLock<Option<LayerTree>>> {
        self.tree.clone()
    }

    /// Checks or unchecks a tree node and syncs the map layers. Returns `false` when
    /// the node does not exist.
    pub fn set_node_checked(&mut self, node_id: &str, checked: bool) -> bool {
        let found = match self.tree.write().as_mut() {
            Some(tree) => tree.set_node_checked(node_id, checked),
            None => false,
        };

        if found {
            self.sync_tree_layers();
        }

        found
    }

    /// Applies the checked-node set restored from the permalink to the installed tree.
    pub fn update_layer_tree_from_permalink(&mut self) {
        if self.layer_tree_nodes.is_empty() {
            return;
        }

        let nodes = self.layer_tree_nodes.clone();
        if let Some(tree) = self.tree.write().as_mut() {
            tree.apply_checked_set(&nodes);
        }

        self.sync_tree_layers();
    }

    /// Enables the permalink synchronizer based on the given page URL.
    ///
    /// The URL's `lon`/`lat`/`zoom`/`layerNodes` parameters are consumed once: the
    /// position is applied to the map (immediately when it exists, at creation time
    /// otherwise), the node set is kept for [`Api::update_layer_tree_from_permalink`].
    pub fn setup_permalink(&mut self, base: Url, coords_params: Option<CoordsParams>) {
        let mut args = ArgParser::new(coords_params.clone()).parse(&base);
        self.layer_tree_nodes = std::mem::take(&mut args.layer_nodes);

        let permalink = Permalink::new(base, coords_params, self.tree.clone());

        if let Some(map) = &self.map {
            let mut map = map.write();
            map.add_handler(permalink.clone());
            if let Some(center) = args.center {
                map.set_center(center, args.zoom);
            } else {
                // make it so there is at least a link even before the map first moves
                permalink.update_link(&map);
            }
        } else {
            self.pending_args = args;
        }

        self.permalink = Some(permalink);
    }

    /// The current permalink, when the synchronizer is enabled and ran at least once.
    pub fn permalink_url(&self) -> Option<Url> {
        self.permalink.as_ref()?.current()
    }

    /// The slot the permalink synchronizer writes the current link into.
    pub fn permalink_slot(&self) -> Option<PermalinkSlot> {
        self.permalink.as_ref().map(|permalink| permalink.link())
    }

    /// The search coordinator, constructed on first use.
    pub fn get_searcher(&mut self) -> Result<&mut Search, PortolanError> {
        if self.searcher.is_none() {
            let map = self.map()?;
            self.searcher = Some(Search::new(
                map,
                self.popups.clone(),
                self.services.feature.clone(),
                self.services.query.clone(),
                self.config.search_tolerance,
                self.config.lang.clone(),
            ));
        }

        Ok(self.searcher.as_mut().expect("searcher was just created"))
    }

    /// Shows a marker on the drawing layer. The position defaults to the map center,
    /// per axis. With `recenter` set the map is moved to the marker.
    pub fn show_marker(&mut self, options: &MarkerOptions) -> Result<(), PortolanError> {
        let map = self.map()?;
        let center = map.read().center();

        let easting = options.easting.or_else(|| center.map(|c| c.x));
        let northing = options.northing.or_else(|| center.map(|c| c.y));
        let (Some(easting), Some(northing)) = (easting, northing) else {
            return Err(PortolanError::Generic(
                "marker position is not set and the map has no center".into(),
            ));
        };

        let position = Point2d::new(easting, northing);
        let feature = marker_feature(options, position, &self.config.base_url);
        self.drawing_layer().write().add_feature(feature);

        if options.recenter {
            map.write().set_center(position, None);
        }

        Ok(())
    }

    /// Opens a popup. The position defaults to the map center, per axis. With
    /// `recenter` set the map is moved to the popup anchor.
    pub fn show_popup(&mut self, options: &PopupOptions) -> Result<(), PortolanError> {
        let map = self.map()?;
        let center = map.read().center();

        let easting = options.easting.or_else(|| center.map(|c| c.x));
        let northing = options.northing.or_else(|| center.map(|c| c.y));
        let (Some(easting), Some(northing)) = (easting, northing) else {
            return Err(PortolanError::Generic(
                "popup position is not set and the map has no center".into(),
            ));
        };

        let position = Point2d::new(easting, northing);
        self.popups.write().show(Popup {
            title: options.title.clone(),
            html: options.html.clone(),
            position,
            width: options.width,
            collapsible: options.collapsible,
            unpinnable: options.unpinnable,
            border: true,
        });

        if options.recenter {
            map.write().set_center(position, None);
        }

        Ok(())
    }

    /// Recenters the map on the bounding box of the listed server-side objects.
    pub async fn recenter_on_objects(
        &mut self,
        layer: &str,
        ids: &[String],
    ) -> Result<(), PortolanError> {
        let map = self.map()?;
        let bbox = self.services.recenter.load_bbox(layer, ids).await?;
        recenter_on_bbox(&mut map.write(), bbox);
        Ok(())
    }

    /// Draws the geometries of the listed server-side objects onto the drawing layer.
    pub async fn highlight_objects(
        &mut self,
        layer: &str,
        ids: &[String],
    ) -> Result<(), PortolanError> {
        let features = self.services.highlight.load_geometries(layer, ids).await?;
        self.drawing_layer().write().add_features(features);
        Ok(())
    }

    /// Recenters on and highlights the listed objects. Service failures are logged and
    /// swallowed; a failed call displays nothing.
    pub async fn show_features(&mut self, layer: &str, ids: &[String]) {
        if let Err(error) = self.recenter_on_objects(layer, ids).await {
            log::warn!("recentering on {layer} objects failed: {error}");
        }

        if let Err(error) = self.highlight_objects(layer, ids).await {
            log::warn!("highlighting {layer} objects failed: {error}");
        }
    }

    /// Recenters the map on a single feature through the search coordinator, showing
    /// its info popup.
    pub async fn show_feature_tooltip(
        &mut self,
        layer: &str,
        id: &str,
    ) -> Result<(), PortolanError> {
        let feature_ref = FeatureRef::new(layer, id);
        self.get_searcher()?.recenter(&feature_ref).await
    }

    /// Queries the map content at the clicked point through the search coordinator.
    /// Returns whether anything was displayed.
    pub async fn query_at_point(&mut self, point: Point2d) -> Result<bool, PortolanError> {
        self.get_searcher()?.query_at_point(point).await
    }

    /// The drawing layer, created on first use.
    pub fn drawing_layer(&mut self) -> Arc<RwLock<VectorLayer>> {
        self.draw_layer
            .get_or_insert_with(|| {
                Arc::new(RwLock::new(VectorLayer::new(
                    "Drawings",
                    StyleMap::drawing(),
                )))
            })
            .clone()
    }

    fn sync_tree_layers(&mut self) {
        let Some(map) = &self.map else {
            return;
        };

        let states = match self.tree.read().as_ref() {
            Some(tree) => tree.layer_states(),
            None => return,
        };

        let mut map = map.write();
        for (layer_id, checked) in states {
            map.set_layer_visibility(&layer_id, checked);
        }

        // a tree change is a layer change even when no map layer is attached
        map.notify_layers_changed();
    }
}

fn recenter_on_bbox(map: &mut Map, bbox: Rect) {
    if !bbox.is_degenerate() {
        map.zoom_to_extent(bbox);
    } else {
        // the bbox is actually a point
        let zoom = map
            .zoom_scheme()
            .deepest()
            .map(|lod| lod.z_index().min(POINT_ZOOM))
            .unwrap_or(POINT_ZOOM);
        map.set_center(bbox.center(), Some(zoom));
    }
}
