//! The toolbar builder: translates a declarative list of tool names into constructed
//! action objects the host UI renders as buttons.

use std::sync::Arc;

use parking_lot::RwLock;
use portolan_types::cartesian::{Point2d, Rect};
use serde::Deserialize;

use crate::layer::VectorLayer;
use crate::map::{Map, MapEvent, MapEventHandler, MapView};
use crate::measure::{Measure, MeasureControl, MeasureOptions};

/// Tools recognized by the toolbar builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    /// Zooms the map out to its maximum extent.
    ZoomToMaxExtent,
    /// Pan/navigation mode toggle.
    Navigation,
    /// Zoom-in by dragging a box.
    ZoomBox,
    /// Zoom-out by dragging a box.
    ZoomOut,
    /// Length measurement tool.
    LengthMeasure,
    /// Area measurement tool.
    AreaMeasure,
    /// Back/forward navigation through previously visited views.
    NavigationHistory,
    /// Freehand feature drawing onto the drawing layer.
    DrawFeature,
    /// Clears the drawing layer.
    ClearFeatures,
}

impl ToolKind {
    /// Parses a tool name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "ZoomToMaxExtent" => Some(Self::ZoomToMaxExtent),
            "Navigation" => Some(Self::Navigation),
            "ZoomBox" => Some(Self::ZoomBox),
            "ZoomOut" => Some(Self::ZoomOut),
            "LengthMeasure" => Some(Self::LengthMeasure),
            "AreaMeasure" => Some(Self::AreaMeasure),
            "NavigationHistory" => Some(Self::NavigationHistory),
            "DrawFeature" => Some(Self::DrawFeature),
            "ClearFeatures" => Some(Self::ClearFeatures),
            _ => None,
        }
    }
}

/// Geometry kinds the draw tool can sketch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum DrawHandler {
    /// Single points.
    Point,
    /// Open polylines.
    Path,
    /// Closed polygons.
    Polygon,
}

impl DrawHandler {
    fn icon_class(&self) -> &'static str {
        match self {
            DrawHandler::Point => "drawPoint",
            DrawHandler::Path => "drawPath",
            DrawHandler::Polygon => "drawPolygon",
        }
    }
}

/// Back/forward history of visited map views.
///
/// Registered as a map event handler, it records every finished move; the two history
/// actions of the toolbar pop views back out of it.
#[derive(Debug, Default)]
pub struct NavigationHistory {
    previous: Vec<MapView>,
    next: Vec<MapView>,
    current: Option<MapView>,
    restoring: bool,
}

/// Navigation history shared between the map handler and the toolbar actions.
pub type SharedHistory = Arc<RwLock<NavigationHistory>>;

impl NavigationHistory {
    /// True when there is a view to go back to.
    pub fn has_previous(&self) -> bool {
        !self.previous.is_empty()
    }

    /// True when there is a view to go forward to.
    pub fn has_next(&self) -> bool {
        !self.next.is_empty()
    }

    /// Pops the previous view, making the current one available to [`Self::next_view`].
    pub fn previous_view(&mut self) -> Option<MapView> {
        let target = self.previous.pop()?;
        if let Some(current) = self.current.replace(target) {
            self.next.push(current);
        }

        self.restoring = true;
        Some(target)
    }

    /// Pops the next view, making the current one available to [`Self::previous_view`].
    pub fn next_view(&mut self) -> Option<MapView> {
        let target = self.next.pop()?;
        if let Some(current) = self.current.replace(target) {
            self.previous.push(current);
        }

        self.restoring = true;
        Some(target)
    }

    fn record(&mut self, view: MapView) {
        if self.restoring {
            self.restoring = false;
            return;
        }

        if let Some(current) = self.current.replace(view) {
            self.previous.push(current);
            self.next.clear();
        }
    }
}

struct HistoryRecorder(SharedHistory);

impl MapEventHandler for HistoryRecorder {
    fn handle(&mut self, event: MapEvent, map: &Map) {
        if event == MapEvent::MoveEnd && map.center().is_some() {
            self.0.write().record(*map.view());
        }
    }
}

/// Control zooming the map to a preconfigured place.
///
/// With an extent configured the map is fitted to it; with a center and zoom the map is
/// centered there; with nothing configured the map zooms to its maximum extent.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ZoomToExtentControl {
    /// Extent to fit the map to.
    pub extent: Option<Rect>,
    /// Center to move the map to, honored together with `zoom`.
    pub center: Option<Point2d>,
    /// Zoom level to set, honored together with `center`.
    pub zoom: Option<u32>,
}

impl ZoomToExtentControl {
    /// Executes the control on the map.
    pub fn trigger(&self, map: &mut Map) {
        if let Some(extent) = self.extent {
            map.zoom_to_extent(extent);
        } else if let (Some(center), Some(zoom)) = (self.center, self.zoom) {
            map.set_center(center, Some(zoom));
        } else {
            map.zoom_to_max_extent();
        }
    }
}

/// The behavior behind a toolbar action.
pub enum ToolControl {
    /// Plain mode toggle with no behavior of its own; the host engine interprets it.
    Toggle,
    /// Zoom to a preconfigured extent or center.
    ZoomToExtent(ZoomToExtentControl),
    /// Box zoom, in or out.
    ZoomBox {
        /// Zoom out instead of in.
        out: bool,
    },
    /// A measurement tool.
    Measure(MeasureControl),
    /// Go back in the view history.
    HistoryPrevious(SharedHistory),
    /// Go forward in the view history.
    HistoryNext(SharedHistory),
    /// Draw features of the given kind onto the drawing layer.
    DrawFeature(DrawHandler),
    /// Clear the drawing layer.
    ClearFeatures(Arc<RwLock<VectorLayer>>),
}

/// A constructed toolbar entry.
pub struct ToolAction {
    /// The tool this action belongs to.
    pub kind: ToolKind,
    /// CSS class of the button icon.
    pub icon_class: String,
    /// Toggle group the button belongs to, if it is a mode toggle.
    pub toggle_group: Option<String>,
    /// Whether the button starts pressed.
    pub pressed: bool,
    /// Whether the button starts enabled.
    pub enabled: bool,
    /// Button tooltip.
    pub tooltip: Option<String>,
    /// The behavior behind the button.
    pub control: ToolControl,
}

impl ToolAction {
    /// Executes the immediate behavior of button-like actions on the map. Mode toggles
    /// and draw tools do nothing here; the host engine drives those.
    pub fn trigger(&mut self, map: &mut Map) {
        match &mut self.control {
            ToolControl::ZoomToExtent(control) => control.trigger(map),
            ToolControl::HistoryPrevious(history) => {
                if let Some(view) = history.write().previous_view() {
                    map.set_view(view);
                }
            }
            ToolControl::HistoryNext(history) => {
                if let Some(view) = history.write().next_view() {
                    map.set_view(view);
                }
            }
            ToolControl::ClearFeatures(layer) => layer.write().clear_features(),
            ToolControl::Toggle
            | ToolControl::ZoomBox { .. }
            | ToolControl::Measure(_)
            | ToolControl::DrawFeature(_) => {}
        }
    }
}

/// Configuration of [`ToolbarBuilder::build`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ToolbarConfig {
    /// Names of the tools to construct, in order. Unknown names are ignored.
    pub items: Vec<String>,
    /// Geometry kinds the `DrawFeature` tool expands into, one action each.
    pub draw_handlers: Vec<DrawHandler>,
    /// Extent configuration of the `ZoomToMaxExtent` tool.
    pub zoom_to_extent: Option<ZoomToExtentControl>,
}

impl Default for ToolbarConfig {
    fn default() -> Self {
        Self {
            items: [
                "ZoomToMaxExtent",
                "Navigation",
                "ZoomBox",
                "LengthMeasure",
                "AreaMeasure",
                "NavigationHistory",
            ]
            .map(String::from)
            .to_vec(),
            draw_handlers: vec![DrawHandler::Point, DrawHandler::Path, DrawHandler::Polygon],
            zoom_to_extent: None,
        }
    }
}

const NAVIGATION_GROUP: &str = "navigation";

/// Builds toolbar actions from a declarative list of tool names.
///
/// Construction is order-preserving: each recognized name contributes its actions at
/// its place in the list, unknown names are skipped.
pub struct ToolbarBuilder {
    draw_layer: Arc<RwLock<VectorLayer>>,
    measure_options: MeasureOptions,
}

impl ToolbarBuilder {
    /// Creates a builder. The drawing layer backs the draw and clear tools.
    pub fn new(draw_layer: Arc<RwLock<VectorLayer>>) -> Self {
        Self {
            draw_layer,
            measure_options: MeasureOptions::default(),
        }
    }

    /// Replaces the options of the measure tools.
    pub fn with_measure_options(mut self, options: MeasureOptions) -> Self {
        self.measure_options = options;
        self
    }

    /// Constructs the actions for the configured items. A navigation history handler is
    /// registered on the map when the `NavigationHistory` tool is present.
    pub fn build(&self, config: &ToolbarConfig, map: &mut Map) -> Vec<ToolAction> {
        let measure = Measure::new(self.measure_options.clone());
        let mut history: Option<SharedHistory> = None;
        let mut actions = Vec::new();

        for name in &config.items {
            let Some(kind) = ToolKind::parse(name) else {
                log::trace!("unknown toolbar item {name:?}, ignored");
                continue;
            };

            match kind {
                ToolKind::ZoomToMaxExtent => actions.push(ToolAction {
                    kind,
                    icon_class: "zoomfull".into(),
                    toggle_group: None,
                    pressed: false,
                    enabled: true,
                    tooltip: None,
                    control: ToolControl::ZoomToExtent(
                        config.zoom_to_extent.clone().unwrap_or_default(),
                    ),
                }),
                ToolKind::Navigation => actions.push(ToolAction {
                    kind,
                    icon_class: "pan".into(),
                    toggle_group: Some(NAVIGATION_GROUP.into()),
                    pressed: true,
                    enabled: true,
                    tooltip: None,
                    control: ToolControl::Toggle,
                }),
                ToolKind::ZoomBox => actions.push(toggle_action(
                    kind,
                    "zoomin",
                    ToolControl::ZoomBox { out: false },
                )),
                ToolKind::ZoomOut => actions.push(toggle_action(
                    kind,
                    "zoomout",
                    ToolControl::ZoomBox { out: true },
                )),
                ToolKind::LengthMeasure => actions.push(toggle_action(
                    kind,
                    "measureLength",
                    ToolControl::Measure(measure.create_length_control()),
                )),
                ToolKind::AreaMeasure => actions.push(toggle_action(
                    kind,
                    "measureArea",
                    ToolControl::Measure(measure.create_area_control()),
                )),
                ToolKind::NavigationHistory => {
                    let history = history
                        .get_or_insert_with(|| {
                            let shared = SharedHistory::default();
                            map.add_handler(HistoryRecorder(shared.clone()));
                            shared
                        })
                        .clone();

                    actions.push(ToolAction {
                        kind,
                        icon_class: "previous".into(),
                        toggle_group: None,
                        pressed: false,
                        enabled: false,
                        tooltip: Some("previous".into()),
                        control: ToolControl::HistoryPrevious(history.clone()),
                    });
                    actions.push(ToolAction {
                        kind,
                        icon_class: "next".into(),
                        toggle_group: None,
                        pressed: false,
                        enabled: false,
                        tooltip: Some("next".into()),
                        control: ToolControl::HistoryNext(history),
                    });
                }
                ToolKind::DrawFeature => {
                    for handler in &config.draw_handlers {
                        actions.push(toggle_action(
                            kind,
                            handler.icon_class(),
                            ToolControl::DrawFeature(*handler),
                        ));
                    }
                }
                ToolKind::ClearFeatures => actions.push(ToolAction {
                    kind,
                    icon_class: "clearfeatures".into(),
                    toggle_group: None,
                    pressed: false,
                    enabled: true,
                    tooltip: None,
                    control: ToolControl::ClearFeatures(self.draw_layer.clone()),
                }),
            }
        }

        actions
    }
}

fn toggle_action(kind: ToolKind, icon_class: &str, control: ToolControl) -> ToolAction {
    ToolAction {
        kind,
        icon_class: icon_class.into(),
        toggle_group: Some(NAVIGATION_GROUP.into()),
        pressed: false,
        enabled: true,
        tooltip: None,
        control,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::StyleMap;
    use portolan_types::Geom;

    fn draw_layer() -> Arc<RwLock<VectorLayer>> {
        Arc::new(RwLock::new(VectorLayer::new("drawings", StyleMap::drawing())))
    }

    fn config(items: &[&str]) -> ToolbarConfig {
        ToolbarConfig {
            items: items.iter().map(|v| v.to_string()).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn unknown_names_are_ignored_and_order_is_preserved() {
        let mut map = Map::default();
        let actions = ToolbarBuilder::new(draw_layer())
            .build(&config(&["ZoomBox", "Bogus", "Navigation"]), &mut map);

        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].kind, ToolKind::ZoomBox);
        assert_eq!(actions[1].kind, ToolKind::Navigation);
    }

    #[test]
    fn default_items_construct_seven_actions() {
        let mut map = Map::default();
        let actions = ToolbarBuilder::new(draw_layer()).build(&ToolbarConfig::default(), &mut map);

        // navigation history contributes two actions
        assert_eq!(actions.len(), 7);
        assert!(actions
            .iter()
            .filter(|action| action.kind == ToolKind::NavigationHistory)
            .count()
            == 2);
    }

    #[test]
    fn draw_feature_expands_per_handler() {
        let mut map = Map::default();
        let actions =
            ToolbarBuilder::new(draw_layer()).build(&config(&["DrawFeature"]), &mut map);

        let icons: Vec<_> = actions.iter().map(|a| a.icon_class.as_str()).collect();
        assert_eq!(icons, vec!["drawPoint", "drawPath", "drawPolygon"]);
    }

    #[test]
    fn clear_features_empties_the_drawing_layer() {
        let layer = draw_layer();
        layer
            .write()
            .add_feature(crate::feature::Feature::new(Geom::Point(Point2d::new(
                1.0, 2.0,
            ))));

        let mut map = Map::default();
        let mut actions =
            ToolbarBuilder::new(layer.clone()).build(&config(&["ClearFeatures"]), &mut map);

        actions[0].trigger(&mut map);
        assert!(layer.read().features().is_empty());
    }

    #[test]
    fn zoom_to_extent_defaults_to_max_extent() {
        let mut map = Map::default();
        map.set_size(portolan_types::cartesian::Size::new(512.0, 512.0));

        let control = ZoomToExtentControl::default();
        control.trigger(&mut map);
        assert_eq!(map.center(), Some(map.max_extent().center()));

        let control = ZoomToExtentControl {
            center: Some(Point2d::new(10.0, 20.0)),
            zoom: Some(9),
            ..Default::default()
        };
        control.trigger(&mut map);
        assert_eq!(map.center(), Some(Point2d::new(10.0, 20.0)));
        assert_eq!(map.zoom(), Some(9));
    }

    #[test]
    fn history_goes_back_and_forward() {
        let mut map = Map::default();
        let mut actions = ToolbarBuilder::new(draw_layer())
            .build(&config(&["NavigationHistory"]), &mut map);

        map.set_center(Point2d::new(0.0, 0.0), Some(5));
        map.set_center(Point2d::new(100.0, 100.0), Some(7));

        // [0] is previous, [1] is next
        actions[0].trigger(&mut map);
        assert_eq!(map.center(), Some(Point2d::new(0.0, 0.0)));
        assert_eq!(map.zoom(), Some(5));

        actions[1].trigger(&mut map);
        assert_eq!(map.center(), Some(Point2d::new(100.0, 100.0)));
        assert_eq!(map.zoom(), Some(7));
    }
}
