//! Permalinks: serializing the current map state into a shareable URL and restoring it
//! from URL parameters at load time.

use std::sync::Arc;

use parking_lot::RwLock;
use portolan_types::cartesian::Point2d;
use url::Url;

use crate::layer::tree::LayerTree;
use crate::map::{Map, MapEvent, MapEventHandler};

/// Names of the URL parameters carrying the map center coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordsParams {
    /// Parameter name of the x (easting/longitude) coordinate.
    pub lon: String,
    /// Parameter name of the y (northing/latitude) coordinate.
    pub lat: String,
}

impl Default for CoordsParams {
    fn default() -> Self {
        Self {
            lon: "lon".into(),
            lat: "lat".into(),
        }
    }
}

/// Shared slot the permalink synchronizer writes the current URL into, the analog of
/// the link display element of a web page.
pub type PermalinkSlot = Arc<RwLock<Option<Url>>>;

/// Serializes the current map state (center, zoom, checked layer tree nodes) into URL
/// parameters after every map change.
///
/// The synchronizer has two states. Until the map has an established center it is
/// unbound: the serializer reproduces the base URL's own parameters unchanged. The
/// first center-establishing map event binds it, and from then on the full parameter
/// set is computed. Register a clone of the synchronizer as a map event handler to keep
/// the link current.
#[derive(Clone)]
pub struct Permalink {
    base: Url,
    coords_params: CoordsParams,
    tree: Arc<RwLock<Option<LayerTree>>>,
    link: PermalinkSlot,
}

impl Permalink {
    /// Creates a synchronizer producing links based on the given URL.
    pub fn new(
        base: Url,
        coords_params: Option<CoordsParams>,
        tree: Arc<RwLock<Option<LayerTree>>>,
    ) -> Self {
        Self {
            base,
            coords_params: coords_params.unwrap_or_default(),
            tree,
            link: Arc::default(),
        }
    }

    /// The slot the current link is written into.
    pub fn link(&self) -> PermalinkSlot {
        self.link.clone()
    }

    /// The current permalink, if [`Permalink::update_link`] ran at least once.
    pub fn current(&self) -> Option<Url> {
        self.link.read().clone()
    }

    /// Recomputes the link from the current map state and writes it into the slot.
    pub fn update_link(&self, map: &Map) {
        let mut href = self.base.clone();
        href.set_query(None);

        let params = self.create_params(map, None, None);
        if !params.is_empty() {
            let mut pairs = href.query_pairs_mut();
            for (key, value) in &params {
                pairs.append_pair(key, value);
            }
        }

        *self.link.write() = Some(href);
    }

    /// URL parameters encoding the given state. `center` and `zoom` default to the
    /// current map state when omitted.
    ///
    /// Coordinates are rounded to 5 decimal places. The `layerNodes` parameter is
    /// omitted entirely when no tree nodes are checked: absence, not an empty list, is
    /// the "default layers" signal. When the map has no center yet only the base URL's
    /// own parameters are returned.
    pub fn create_params(
        &self,
        map: &Map,
        center: Option<Point2d>,
        zoom: Option<u32>,
    ) -> Vec<(String, String)> {
        let mut params: Vec<(String, String)> = self
            .base
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let Some(center) = center.or_else(|| map.center()) else {
            return params;
        };

        if let Some(zoom) = zoom.or_else(|| map.zoom()) {
            set_param(&mut params, "zoom", zoom.to_string());
        }

        set_param(&mut params, &self.coords_params.lat, round5(center.y));
        set_param(&mut params, &self.coords_params.lon, round5(center.x));

        if let Some(tree) = self.tree.read().as_ref() {
            let nodes = tree.checked_ids();
            if !nodes.is_empty() {
                set_param(&mut params, "layerNodes", nodes.join(","));
            }
        }

        params
    }
}

impl MapEventHandler for Permalink {
    fn handle(&mut self, event: MapEvent, map: &Map) {
        match event {
            MapEvent::MoveEnd | MapEvent::LayerChange | MapEvent::BaseLayerChange => {
                self.update_link(map)
            }
        }
    }
}

fn round5(value: f64) -> String {
    ((value * 1e5).round() / 1e5).to_string()
}

fn set_param(params: &mut Vec<(String, String)>, key: &str, value: String) {
    match params.iter_mut().find(|(k, _)| k == key) {
        Some((_, v)) => *v = value,
        None => params.push((key.to_string(), value)),
    }
}

/// Map state restored from URL parameters.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedArgs {
    /// Restored map center.
    pub center: Option<Point2d>,
    /// Restored zoom level.
    pub zoom: Option<u32>,
    /// Ids of the layer tree nodes to check.
    pub layer_nodes: Vec<String>,
}

impl ParsedArgs {
    /// True when the URL carried no recognized parameters.
    pub fn is_empty(&self) -> bool {
        self.center.is_none() && self.zoom.is_none() && self.layer_nodes.is_empty()
    }
}

/// Parses map state from the page URL parameters at load time.
#[derive(Debug, Clone, Default)]
pub struct ArgParser {
    coords_params: CoordsParams,
}

impl ArgParser {
    /// Creates a parser using the given coordinate parameter names.
    pub fn new(coords_params: Option<CoordsParams>) -> Self {
        Self {
            coords_params: coords_params.unwrap_or_default(),
        }
    }

    /// Reads `lon`/`lat`/`zoom`/`layerNodes` from the URL.
    ///
    /// `layerNodes` is normalized to a list whether it arrives as a single value, a
    /// comma separated value, or a repeated key. The zoom is only honored together with
    /// a complete center.
    pub fn parse(&self, url: &Url) -> ParsedArgs {
        let mut lon = None;
        let mut lat = None;
        let mut zoom = None;
        let mut layer_nodes = Vec::new();

        for (key, value) in url.query_pairs() {
            if key == self.coords_params.lon.as_str() {
                lon = value.parse::<f64>().ok();
            } else if key == self.coords_params.lat.as_str() {
                lat = value.parse::<f64>().ok();
            } else {
                match key.as_ref() {
                    "zoom" => zoom = value.parse::<u32>().ok(),
                    "layerNodes" => layer_nodes.extend(
                        value
                            .split(',')
                            .filter(|node| !node.is_empty())
                            .map(String::from),
                    ),
                    _ => {}
                }
            }
        }

        let center = match (lon, lat) {
            (Some(lon), Some(lat)) => Some(Point2d::new(lon, lat)),
            _ => None,
        };

        ParsedArgs {
            zoom: if center.is_some() { zoom } else { None },
            center,
            layer_nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;
    use crate::layer::tree::TreeNode;
    use portolan_types::cartesian::Size;

    fn base() -> Url {
        Url::parse("https://example.com/map?theme=city").expect("valid URL")
    }

    fn tree_slot(checked: &[&str]) -> Arc<RwLock<Option<LayerTree>>> {
        let mut tree = LayerTree::new(vec![
            TreeNode::leaf("plan", "Plan", false),
            TreeNode::leaf("ortho", "Ortho", false),
            TreeNode::leaf("pois", "POIs", false),
        ]);
        for id in checked {
            tree.set_node_checked(id, true);
        }

        Arc::new(RwLock::new(Some(tree)))
    }

    fn bound_map(center: Point2d, zoom: u32) -> Map {
        let mut map = Map::default();
        map.set_size(Size::new(800.0, 600.0));
        map.set_center(center, Some(zoom));
        map
    }

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
        params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn unbound_map_keeps_base_params() {
        let permalink = Permalink::new(base(), None, tree_slot(&["plan"]));
        let map = Map::default();

        let params = permalink.create_params(&map, None, None);
        assert_eq!(params, vec![("theme".to_string(), "city".to_string())]);

        permalink.update_link(&map);
        assert_eq!(permalink.current(), Some(base()));
    }

    #[test]
    fn bound_map_produces_full_params() {
        let permalink = Permalink::new(base(), None, tree_slot(&["plan", "pois"]));
        let map = bound_map(Point2d::new(600000.123456, 199999.9999999), 12);

        let params = permalink.create_params(&map, None, None);

        assert_eq!(param(&params, "theme"), Some("city"));
        assert_eq!(param(&params, "zoom"), Some("12"));
        assert_eq!(param(&params, "lon"), Some("600000.12346"));
        assert_eq!(param(&params, "lat"), Some("200000"));
        assert_eq!(param(&params, "layerNodes"), Some("plan,pois"));
    }

    #[test]
    fn layer_nodes_omitted_when_none_checked() {
        let permalink = Permalink::new(base(), None, tree_slot(&[]));
        let map = bound_map(Point2d::new(0.0, 0.0), 5);

        let params = permalink.create_params(&map, None, None);
        assert_eq!(param(&params, "layerNodes"), None);
    }

    #[test]
    fn round_trip_reproduces_state() {
        let permalink = Permalink::new(base(), None, tree_slot(&["ortho", "pois"]));
        let map = bound_map(Point2d::new(600000.123456, 199999.654321), 14);
        permalink.update_link(&map);

        let url = permalink.current().expect("link updated");
        let parsed = ArgParser::new(None).parse(&url);

        let center = parsed.center.expect("center restored");
        assert_abs_diff_eq!(center.x, 600000.123456, epsilon = 1e-5);
        assert_abs_diff_eq!(center.y, 199999.654321, epsilon = 1e-5);
        assert_eq!(parsed.zoom, Some(14));
        assert_eq!(parsed.layer_nodes, vec!["ortho", "pois"]);
    }

    #[test]
    fn events_keep_link_current() {
        let permalink = Permalink::new(base(), None, tree_slot(&["plan"]));
        let mut map = Map::default();
        map.set_size(Size::new(800.0, 600.0));
        map.add_handler(permalink.clone());

        map.set_center(Point2d::new(700000.0, 250000.0), Some(8));

        let url = permalink.current().expect("link updated by the event");
        let parsed = ArgParser::new(None).parse(&url);
        assert_eq!(parsed.center, Some(Point2d::new(700000.0, 250000.0)));
        assert_eq!(parsed.zoom, Some(8));
    }

    #[test]
    fn layer_nodes_normalization() {
        let parser = ArgParser::new(None);

        let single = Url::parse("https://example.com/?layerNodes=plan").expect("valid URL");
        assert_eq!(parser.parse(&single).layer_nodes, vec!["plan"]);

        let list = Url::parse("https://example.com/?layerNodes=plan,ortho").expect("valid URL");
        assert_eq!(parser.parse(&list).layer_nodes, vec!["plan", "ortho"]);

        let repeated = Url::parse("https://example.com/?layerNodes=plan&layerNodes=ortho")
            .expect("valid URL");
        assert_eq!(parser.parse(&repeated).layer_nodes, vec!["plan", "ortho"]);
    }

    #[test]
    fn zoom_without_center_is_ignored() {
        let parser = ArgParser::new(None);
        let url = Url::parse("https://example.com/?zoom=12&lon=600000").expect("valid URL");

        let parsed = parser.parse(&url);
        assert_eq!(parsed.center, None);
        assert_eq!(parsed.zoom, None);
    }

    #[test]
    fn custom_coords_params() {
        let coords = CoordsParams {
            lon: "x".into(),
            lat: "y".into(),
        };

        let permalink = Permalink::new(base(), Some(coords.clone()), tree_slot(&[]));
        let map = bound_map(Point2d::new(1.5, 2.5), 3);
        let params = permalink.create_params(&map, None, None);

        assert_eq!(param(&params, "x"), Some("1.5"));
        assert_eq!(param(&params, "y"), Some("2.5"));
        assert_eq!(param(&params, "lon"), None);

        let url = Url::parse("https://example.com/?x=1.5&y=2.5&zoom=3").expect("valid URL");
        let parsed = ArgParser::new(Some(coords)).parse(&url);
        assert_eq!(parsed.center, Some(Point2d::new(1.5, 2.5)));
    }
}
