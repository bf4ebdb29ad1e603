//! Map state: the current view, the layer stack and state change events.

use portolan_types::cartesian::{Point2d, Rect, Size};

use crate::layer::{Layer, LayerCollection};

mod lods;
mod view;

pub use lods::{Lod, ZoomScheme, TOP_RESOLUTION};
pub use view::MapView;

/// Extent of the whole web mercator plane, the default maximum extent of a map.
pub const WORLD_EXTENT: Rect = Rect {
    x_min: -20037508.342789244,
    y_min: -20037508.342789244,
    x_max: 20037508.342789244,
    y_max: 20037508.342789244,
};

/// Events fired by the map when its state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    /// The view finished moving: center, zoom or viewport size changed.
    MoveEnd,
    /// A layer was added, removed, reordered or toggled.
    LayerChange,
    /// The base layer was replaced.
    BaseLayerChange,
}

/// Handler of map state change events.
///
/// Handlers are owned by the map and invoked in registration order after every state
/// change, with the map already in its new state.
pub trait MapEventHandler: Send + Sync {
    /// Handle the event.
    fn handle(&mut self, event: MapEvent, map: &Map);
}

/// The map: a set of layers and the view that should be rendered.
///
/// The map knows nothing about rendering or input; the host engine reads the view and
/// the layer stack, and coordinators mutate them through the operations below.
pub struct Map {
    view: MapView,
    layers: LayerCollection,
    zoom_scheme: ZoomScheme,
    max_extent: Rect,
    handlers: Vec<Box<dyn MapEventHandler>>,
}

impl Map {
    /// Creates a new map.
    pub fn new(
        view: MapView,
        layers: LayerCollection,
        zoom_scheme: ZoomScheme,
        max_extent: Option<Rect>,
    ) -> Self {
        Self {
            view,
            layers,
            zoom_scheme,
            max_extent: max_extent.unwrap_or(WORLD_EXTENT),
            handlers: Vec::new(),
        }
    }

    /// Current view of the map.
    pub fn view(&self) -> &MapView {
        &self.view
    }

    /// Center of the map, if established.
    pub fn center(&self) -> Option<Point2d> {
        self.view.center()
    }

    /// Resolution of the map in map units per pixel.
    pub fn resolution(&self) -> f64 {
        self.view.resolution()
    }

    /// Zoom level matching the current resolution. `None` until the map has a center.
    pub fn zoom(&self) -> Option<u32> {
        self.view.center()?;
        self.zoom_scheme
            .select_lod(self.view.resolution())
            .map(|lod| lod.z_index())
    }

    /// Zoom levels the map can be set to.
    pub fn zoom_scheme(&self) -> &ZoomScheme {
        &self.zoom_scheme
    }

    /// Maximum navigable extent of the map.
    pub fn max_extent(&self) -> Rect {
        self.max_extent
    }

    /// Moves the map center to the given point, optionally changing the zoom level.
    /// Unknown zoom levels leave the resolution unchanged.
    pub fn set_center(&mut self, center: Point2d, zoom: Option<u32>) {
        if let Some(resolution) = zoom.and_then(|z| self.zoom_scheme.lod_resolution(z)) {
            self.view = self.view.with_resolution(resolution);
        }

        self.view = self.view.with_center(center);
        self.fire(MapEvent::MoveEnd);
    }

    /// Replaces the whole view of the map with the given one.
    pub fn set_view(&mut self, view: MapView) {
        self.view = view;
        self.fire(MapEvent::MoveEnd);
    }

    /// Centers the map on the extent and zooms out just enough to show all of it.
    ///
    /// When the viewport size is not known yet the resolution is left unchanged and
    /// only the center moves.
    pub fn zoom_to_extent(&mut self, extent: Rect) {
        let size = self.view.size();
        if !size.is_zero() {
            let required = f64::max(
                extent.width() / size.width(),
                extent.height() / size.height(),
            );

            let resolution = match self.zoom_scheme.fit_lod(required) {
                Some(lod) => lod.resolution(),
                // extent is wider than the coarsest level, show as much as we can
                None => self
                    .zoom_scheme
                    .coarsest()
                    .map(|lod| lod.resolution())
                    .unwrap_or(required),
            };
            self.view = self.view.with_resolution(resolution);
        }

        self.view = self.view.with_center(extent.center());
        self.fire(MapEvent::MoveEnd);
    }

    /// Zooms the map out to its maximum extent.
    pub fn zoom_to_max_extent(&mut self) {
        self.zoom_to_extent(self.max_extent);
    }

    /// Sets the size of the viewport.
    pub fn set_size(&mut self, size: Size) {
        self.view = self.view.with_size(size);
        self.fire(MapEvent::MoveEnd);
    }

    /// The layer stack of the map.
    pub fn layers(&self) -> &LayerCollection {
        &self.layers
    }

    /// Adds a layer to the top of the stack (below the pinned layer, if any).
    pub fn add_layer(&mut self, layer: Layer) {
        self.layers.push(layer);
        self.fire(MapEvent::LayerChange);
    }

    /// Removes the layer with the given id.
    pub fn remove_layer(&mut self, id: &str) -> Option<Layer> {
        let removed = self.layers.remove(id);
        if removed.is_some() {
            self.fire(MapEvent::LayerChange);
        }

        removed
    }

    /// Shows or hides the layer with the given id. Returns `false` when no such layer
    /// exists.
    pub fn set_layer_visibility(&mut self, id: &str, visible: bool) -> bool {
        let Some(layer) = self.layers.get_mut(id) else {
            return false;
        };

        layer.set_visible(visible);
        self.fire(MapEvent::LayerChange);
        true
    }

    /// Makes the given base layer the visible one, hiding all other base layers.
    /// Returns `false` when the id does not name a base layer.
    pub fn set_base_layer(&mut self, id: &str) -> bool {
        if !self.layers.get(id).is_some_and(|layer| layer.is_base()) {
            return false;
        }

        let ids: Vec<String> = self
            .layers
            .iter()
            .filter(|layer| layer.is_base())
            .map(|layer| layer.id().to_string())
            .collect();
        for base_id in ids {
            let visible = base_id == id;
            if let Some(layer) = self.layers.get_mut(&base_id) {
                layer.set_visible(visible);
            }
        }

        self.fire(MapEvent::BaseLayerChange);
        true
    }

    /// Pins the layer with the given id to the top of the stack.
    pub fn pin_layer_to_top(&mut self, id: impl Into<String>) {
        self.layers.pin_to_top(id);
        self.fire(MapEvent::LayerChange);
    }

    /// Moves the layer with the given id to the given position in the stack.
    pub fn move_layer(&mut self, id: &str, index: usize) {
        self.layers.move_layer(id, index);
        self.fire(MapEvent::LayerChange);
    }

    /// Notifies handlers about a layer-related state change that happened outside the
    /// map, e.g. a layer tree checkbox toggle.
    pub fn notify_layers_changed(&mut self) {
        self.fire(MapEvent::LayerChange);
    }

    /// Registers a handler for map state change events.
    pub fn add_handler(&mut self, handler: impl MapEventHandler + 'static) {
        self.handlers.push(Box::new(handler));
    }

    fn fire(&mut self, event: MapEvent) {
        // Handlers are moved out for the dispatch so they can borrow the map. Handlers
        // registered during a dispatch would be dropped, which add_handler cannot do as
        // it needs `&mut Map` itself.
        let mut handlers = std::mem::take(&mut self.handlers);
        for handler in &mut handlers {
            handler.handle(event, self);
        }

        self.handlers = handlers;
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new(
            MapView::default(),
            LayerCollection::default(),
            ZoomScheme::web(18),
            None,
        )
    }
}
