//! Map layer contracts.
//!
//! The explorer never renders anything. It only needs a handful of
//! capabilities from the map engine's layer objects, captured by the
//! [`MapLayer`] trait. [`Layer`] is an in-memory implementation suitable for
//! tests and for hosts that keep their layer state on the Rust side.
//!
//! # Example
//!
//! ```
//! use olexp::layer::{Layer, LayerKind, MapLayer};
//! use olexp::geometry::Extent;
//!
//! let osm = Layer::tile()
//!     .with_name("OSM")
//!     .with_extent(Extent::new(0.0, 0.0, 100.0, 100.0))
//!     .into_ref();
//!
//! assert_eq!(osm.kind(), LayerKind::Tile);
//! assert_eq!(osm.get("name").unwrap().as_str(), Some("OSM"));
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use olexp_core::{Properties, Value};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::collection::LayerCollection;
use crate::geometry::{Coordinate, Extent};

/// The closed set of layer kinds the explorer distinguishes.
///
/// The kind is reported by the layer itself and read once when an item is
/// created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    /// A layer containing an ordered collection of child layers.
    Group,
    Heatmap,
    Image,
    /// A positioned overlay (popup, marker); not a layer in the rendering stack.
    Overlay,
    Tile,
    Vector,
}

impl LayerKind {
    /// All kinds, in declaration order.
    pub const ALL: [LayerKind; 6] = [
        LayerKind::Group,
        LayerKind::Heatmap,
        LayerKind::Image,
        LayerKind::Overlay,
        LayerKind::Tile,
        LayerKind::Vector,
    ];

    /// Upper-case type label shown in details and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            LayerKind::Group => "GROUP",
            LayerKind::Heatmap => "HEATMAP",
            LayerKind::Image => "IMAGE",
            LayerKind::Overlay => "OVERLAY",
            LayerKind::Tile => "TILE",
            LayerKind::Vector => "VECTOR",
        }
    }

    pub fn is_overlay(&self) -> bool {
        matches!(self, LayerKind::Overlay)
    }

    pub fn is_group(&self) -> bool {
        matches!(self, LayerKind::Group)
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The DOM element (or equivalent) an overlay is anchored to.
///
/// Overlays have no visibility flag of their own, so toggling one shows or
/// hides its element directly.
pub trait OverlayElement: Send + Sync {
    fn is_displayed(&self) -> bool;
    fn set_displayed(&self, displayed: bool);
}

/// In-memory overlay element.
#[derive(Debug)]
pub struct Element {
    displayed: AtomicBool,
}

impl Element {
    pub fn new() -> Self {
        Self {
            displayed: AtomicBool::new(true),
        }
    }
}

impl Default for Element {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayElement for Element {
    fn is_displayed(&self) -> bool {
        self.displayed.load(Ordering::SeqCst)
    }

    fn set_displayed(&self, displayed: bool) {
        self.displayed.store(displayed, Ordering::SeqCst);
    }
}

/// Capabilities the explorer requires from a map layer or overlay.
///
/// Only `kind`, `get` and `set` are mandatory; everything else defaults to
/// "not available" so hosts implement what their layer type supports.
pub trait MapLayer: Send + Sync {
    /// The kind descriptor, fixed for the layer's lifetime.
    fn kind(&self) -> LayerKind;

    /// Reads a property from the layer's property store.
    fn get(&self, key: &str) -> Option<Value>;

    /// Writes a property to the layer's property store.
    fn set(&self, key: &str, value: Value);

    /// The layer's own extent, if it declares one.
    fn extent(&self) -> Option<Extent> {
        None
    }

    /// The extent of the layer's vector-like source, if any.
    fn source_extent(&self) -> Option<Extent> {
        None
    }

    /// Number of features in the layer's source, if it has one.
    fn feature_count(&self) -> Option<usize> {
        None
    }

    fn visible(&self) -> bool {
        true
    }

    fn set_visible(&self, _visible: bool) {}

    /// Child layers of a group layer.
    fn layers(&self) -> Option<Arc<LayerCollection>> {
        None
    }

    /// Anchor position of an overlay.
    fn position(&self) -> Option<Coordinate> {
        None
    }

    /// Element of an overlay.
    fn element(&self) -> Option<Arc<dyn OverlayElement>> {
        None
    }
}

/// Shared handle to an externally owned layer.
pub type LayerRef = Arc<dyn MapLayer>;

/// Identity comparison between two layer handles.
///
/// Only the data pointers are compared; vtable pointers are not stable
/// across codegen units.
pub fn layer_eq(a: &LayerRef, b: &LayerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

/// A single feature in a vector source, reduced to its bounding box.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    pub extent: Extent,
    pub properties: Properties,
}

impl Feature {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            properties: BTreeMap::new(),
        }
    }

    pub fn point(x: f64, y: f64) -> Self {
        Self::new(Extent::from_point(Coordinate::new(x, y)))
    }
}

/// Features backing a vector or heatmap layer.
#[derive(Debug, Default)]
pub struct VectorSource {
    features: RwLock<Vec<Feature>>,
}

impl VectorSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_features(features: Vec<Feature>) -> Self {
        Self {
            features: RwLock::new(features),
        }
    }

    pub fn add_feature(&self, feature: Feature) {
        self.features.write().push(feature);
    }

    pub fn clear(&self) {
        self.features.write().clear();
    }

    pub fn len(&self) -> usize {
        self.features.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.read().is_empty()
    }

    /// Union of all feature extents, or `None` when the source is empty.
    pub fn extent(&self) -> Option<Extent> {
        let features = self.features.read();
        if features.is_empty() {
            return None;
        }
        Some(
            features
                .iter()
                .fold(Extent::empty(), |acc, f| acc.union(&f.extent)),
        )
    }
}

/// An in-memory [`MapLayer`].
pub struct Layer {
    kind: LayerKind,
    properties: RwLock<Properties>,
    visible: AtomicBool,
    extent: RwLock<Option<Extent>>,
    source: Option<Arc<VectorSource>>,
    layers: Option<Arc<LayerCollection>>,
    position: RwLock<Option<Coordinate>>,
    element: Option<Arc<Element>>,
}

impl Layer {
    fn with_kind(kind: LayerKind) -> Self {
        Self {
            kind,
            properties: RwLock::new(BTreeMap::new()),
            visible: AtomicBool::new(true),
            extent: RwLock::new(None),
            source: None,
            layers: None,
            position: RwLock::new(None),
            element: None,
        }
    }

    pub fn tile() -> Self {
        Self::with_kind(LayerKind::Tile)
    }

    pub fn image() -> Self {
        Self::with_kind(LayerKind::Image)
    }

    /// A heatmap layer reading features from `source`.
    pub fn heatmap(source: Arc<VectorSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::with_kind(LayerKind::Heatmap)
        }
    }

    /// A vector layer reading features from `source`.
    pub fn vector(source: Arc<VectorSource>) -> Self {
        Self {
            source: Some(source),
            ..Self::with_kind(LayerKind::Vector)
        }
    }

    /// A group layer whose children are `layers`, bottom first.
    pub fn group(layers: Vec<LayerRef>) -> Self {
        Self::group_with(Arc::new(LayerCollection::from_layers(layers)))
    }

    /// A group layer over an existing collection.
    pub fn group_with(layers: Arc<LayerCollection>) -> Self {
        Self {
            layers: Some(layers),
            ..Self::with_kind(LayerKind::Group)
        }
    }

    /// An overlay anchored at `position`, or not yet positioned.
    pub fn overlay(position: Option<Coordinate>) -> Self {
        Self {
            position: RwLock::new(position),
            element: Some(Arc::new(Element::new())),
            ..Self::with_kind(LayerKind::Overlay)
        }
    }

    pub fn with_name(self, name: impl Into<String>) -> Self {
        self.with_property("name", Value::Text(name.into()))
    }

    pub fn with_property(self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.write().insert(key.to_string(), value.into());
        self
    }

    pub fn with_extent(self, extent: Extent) -> Self {
        *self.extent.write() = Some(extent);
        self
    }

    pub fn with_visible(self, visible: bool) -> Self {
        self.visible.store(visible, Ordering::SeqCst);
        self
    }

    /// Wraps the layer in a shared handle.
    pub fn into_ref(self) -> LayerRef {
        Arc::new(self)
    }

    pub fn set_extent(&self, extent: Option<Extent>) {
        *self.extent.write() = extent;
    }

    pub fn set_position(&self, position: Option<Coordinate>) {
        *self.position.write() = position;
    }

    pub fn source(&self) -> Option<&Arc<VectorSource>> {
        self.source.as_ref()
    }
}

impl MapLayer for Layer {
    fn kind(&self) -> LayerKind {
        self.kind
    }

    fn get(&self, key: &str) -> Option<Value> {
        self.properties.read().get(key).cloned()
    }

    fn set(&self, key: &str, value: Value) {
        self.properties.write().insert(key.to_string(), value);
    }

    fn extent(&self) -> Option<Extent> {
        *self.extent.read()
    }

    fn source_extent(&self) -> Option<Extent> {
        self.source.as_ref().and_then(|s| s.extent())
    }

    fn feature_count(&self) -> Option<usize> {
        self.source.as_ref().map(|s| s.len())
    }

    fn visible(&self) -> bool {
        self.visible.load(Ordering::SeqCst)
    }

    fn set_visible(&self, visible: bool) {
        if !self.kind.is_overlay() {
            self.visible.store(visible, Ordering::SeqCst);
        }
    }

    fn layers(&self) -> Option<Arc<LayerCollection>> {
        self.layers.clone()
    }

    fn position(&self) -> Option<Coordinate> {
        *self.position.read()
    }

    fn element(&self) -> Option<Arc<dyn OverlayElement>> {
        self.element
            .clone()
            .map(|e| e as Arc<dyn OverlayElement>)
    }
}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("kind", &self.kind)
            .field("properties", &*self.properties.read())
            .field("visible", &self.visible())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Layer: Send, Sync);
