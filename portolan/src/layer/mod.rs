//! Layers managed by the map.
//!
//! The map does not render anything itself, so a layer here is a description of what the
//! host engine should draw: either a remote WMS source or a store of vector features
//! with a style. Vector layers are shared behind a lock because coordinators (search,
//! highlight) mutate their features while the map owns their place in the stack.

mod style;
pub mod tree;

use std::sync::Arc;

use parking_lot::RwLock;

pub use style::{Color, Style, StyleMap};

use crate::feature::Feature;

/// A layer managed by the map.
pub struct Layer {
    id: String,
    title: String,
    visible: bool,
    is_base: bool,
    kind: LayerKind,
}

/// Source of a layer's content.
pub enum LayerKind {
    /// A layer rendered by a remote WMS server.
    Wms {
        /// Names of the WMS sublayers this layer requests. These contribute to the
        /// query tool's layer filter while the layer is visible.
        layers: Vec<String>,
    },
    /// A layer of vector features drawn by the host engine.
    Vector(Arc<RwLock<VectorLayer>>),
}

impl Layer {
    /// Creates a WMS layer description.
    pub fn wms(
        id: impl Into<String>,
        title: impl Into<String>,
        layers: impl IntoIterator<Item = String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            visible: true,
            is_base: false,
            kind: LayerKind::Wms {
                layers: layers.into_iter().collect(),
            },
        }
    }

    /// Creates a vector layer entry over a shared feature store.
    pub fn vector(id: impl Into<String>, store: Arc<RwLock<VectorLayer>>) -> Self {
        let title = store.read().name().to_string();
        Self {
            id: id.into(),
            title,
            visible: true,
            is_base: false,
            kind: LayerKind::Vector(store),
        }
    }

    /// Marks the layer as a base layer.
    pub fn with_base(mut self, is_base: bool) -> Self {
        self.is_base = is_base;
        self
    }

    /// Layer id, unique within the map.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Human readable title of the layer.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Whether the layer is currently drawn.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub(crate) fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Whether the layer is a base layer.
    pub fn is_base(&self) -> bool {
        self.is_base
    }

    /// Content of the layer.
    pub fn kind(&self) -> &LayerKind {
        &self.kind
    }
}

/// A named store of vector features with a style map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VectorLayer {
    name: String,
    features: Vec<Feature>,
    style_map: StyleMap,
}

impl VectorLayer {
    /// Creates an empty layer with the given name and styles.
    pub fn new(name: impl Into<String>, style_map: StyleMap) -> Self {
        Self {
            name: name.into(),
            features: Vec::new(),
            style_map,
        }
    }

    /// Name of the layer.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Features currently in the store.
    pub fn features(&self) -> &[Feature] {
        &self.features
    }

    /// Adds a feature to the store.
    pub fn add_feature(&mut self, feature: Feature) {
        self.features.push(feature);
    }

    /// Adds several features to the store.
    pub fn add_features(&mut self, features: impl IntoIterator<Item = Feature>) {
        self.features.extend(features);
    }

    /// Removes all features from the store.
    pub fn clear_features(&mut self) {
        self.features.clear();
    }

    /// Styles the features are drawn with.
    pub fn style_map(&self) -> &StyleMap {
        &self.style_map
    }
}

/// Ordered collection of the map's layers.
///
/// Layers are drawn in the order they are stored. One layer can be pinned to the top of
/// the stack; it keeps that place across pushes and reorders. The map uses this for the
/// drawing layer, which must always stay above base and overlay layers.
#[derive(Default)]
pub struct LayerCollection {
    layers: Vec<Layer>,
    top_id: Option<String>,
}

impl LayerCollection {
    /// Adds the layer to the end of the collection, below the pinned layer if any.
    pub fn push(&mut self, layer: Layer) {
        self.layers.push(layer);
        self.restore_top();
    }

    /// Inserts a layer at position `index`, shifting all layers after it up.
    ///
    /// # Panics
    ///
    /// Panics if `index > len`.
    pub fn insert(&mut self, index: usize, layer: Layer) {
        self.layers.insert(index, layer);
        self.restore_top();
    }

    /// Removes the layer with the given id and returns it.
    pub fn remove(&mut self, id: &str) -> Option<Layer> {
        let index = self.layers.iter().position(|layer| layer.id() == id)?;
        Some(self.layers.remove(index))
    }

    /// Number of layers in the collection.
    pub fn len(&self) -> usize {
        self.layers.len()
    }

    /// True if the collection contains no layers.
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer with the given id.
    pub fn get(&self, id: &str) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find(|layer| layer.id() == id)
    }

    /// Iterator over the layers in drawing order.
    pub fn iter(&self) -> impl Iterator<Item = &Layer> {
        self.layers.iter()
    }

    /// Pins the layer with the given id to the top of the stack. The pin survives
    /// subsequent pushes and reorders.
    pub fn pin_to_top(&mut self, id: impl Into<String>) {
        self.top_id = Some(id.into());
        self.restore_top();
    }

    /// Moves the layer with the given id to position `index`. The pinned layer, if any,
    /// is put back on top afterwards.
    pub fn move_layer(&mut self, id: &str, index: usize) {
        if let Some(layer) = self.remove(id) {
            let index = index.min(self.layers.len());
            self.layers.insert(index, layer);
            self.restore_top();
        }
    }

    /// Names of WMS sublayers of all currently visible layers, in drawing order.
    pub fn visible_wms_layers(&self) -> Vec<String> {
        let mut result = Vec::new();
        for layer in &self.layers {
            if !layer.is_visible() {
                continue;
            }

            if let LayerKind::Wms { layers } = layer.kind() {
                result.extend(layers.iter().cloned());
            }
        }

        result
    }

    fn restore_top(&mut self) {
        let Some(top_id) = self.top_id.clone() else {
            return;
        };

        let Some(index) = self.layers.iter().position(|layer| layer.id() == top_id) else {
            return;
        };

        if index + 1 != self.layers.len() {
            let layer = self.layers.remove(index);
            self.layers.push(layer);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wms(id: &str, sublayers: &[&str]) -> Layer {
        Layer::wms(id, id, sublayers.iter().map(|v| v.to_string()))
    }

    #[test]
    fn pinned_layer_stays_on_top() {
        let store = Arc::new(RwLock::new(VectorLayer::new("drawings", StyleMap::drawing())));

        let mut collection = LayerCollection::default();
        collection.push(wms("base", &["plan"]));
        collection.push(Layer::vector("drawings", store));
        collection.pin_to_top("drawings");

        collection.push(wms("overlay", &["poi"]));
        assert_eq!(collection.iter().last().map(|l| l.id().to_string()), Some("drawings".into()));

        collection.move_layer("overlay", 0);
        assert_eq!(collection.iter().last().map(|l| l.id().to_string()), Some("drawings".into()));
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn visible_wms_layers_skips_hidden() {
        let mut collection = LayerCollection::default();
        collection.push(wms("base", &["plan"]));
        collection.push(wms("pois", &["poi_shops", "poi_transport"]));

        assert_eq!(
            collection.visible_wms_layers(),
            vec!["plan", "poi_shops", "poi_transport"]
        );

        collection
            .get_mut("pois")
            .expect("layer exists")
            .set_visible(false);
        assert_eq!(collection.visible_wms_layers(), vec!["plan"]);
    }
}
