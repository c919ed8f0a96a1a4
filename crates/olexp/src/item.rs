//! Explorer items.
//!
//! An [`Item`] wraps one tracked layer or overlay. It never owns the layer:
//! it derives display metadata once (kind, icon) and proxies property reads
//! and writes to the layer's own store.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use olexp_core::logging::targets;
use olexp_core::{Properties, Property, Value};

use crate::details::DetailRecord;
use crate::geometry::Extent;
use crate::layer::{LayerKind, LayerRef, MapLayer};
use crate::view::MapView;

/// Layer property holding an area measurement annotation.
pub const AREA_PROPERTY: &str = "olexp_area";
/// Layer property holding a length measurement annotation.
pub const LENGTH_PROPERTY: &str = "olexp_length";

const LAYER_PROPERTY_TYPES: &[&str] = &["opacity"];
const OVERLAY_PROPERTY_TYPES: &[&str] = &[];

/// One row of an item's details.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detail {
    pub name: String,
    pub value: String,
}

impl Detail {
    fn new(name: &str, value: impl ToString) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Turns details into grid rows numbered from 1.
pub fn detail_records(details: Vec<Detail>) -> Vec<DetailRecord> {
    details
        .into_iter()
        .enumerate()
        .map(|(i, d)| DetailRecord {
            recid: i + 1,
            property: d.name,
            value: d.value,
        })
        .collect()
}

/// A tracked layer or overlay.
pub struct Item {
    id: String,
    name: Property<String>,
    layer: LayerRef,
    kind: LayerKind,
    icon: String,
    /// Set only while the item's layer is being moved inside its collection.
    moving: AtomicBool,
}

impl Item {
    /// Creates an item; kind and icon are derived from the layer now and never change.
    pub fn new(id: impl Into<String>, name: impl Into<String>, layer: LayerRef, icon: impl Into<String>) -> Self {
        let kind = layer.kind();
        Self {
            id: id.into(),
            name: Property::new(name.into()),
            layer,
            kind,
            icon: icon.into(),
            moving: AtomicBool::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> String {
        self.name.get()
    }

    /// Renames the item; returns `true` if the name changed.
    pub fn set_name(&self, name: impl Into<String>) -> bool {
        self.name.set(name.into())
    }

    pub fn layer(&self) -> &LayerRef {
        &self.layer
    }

    pub fn kind(&self) -> LayerKind {
        self.kind
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn is_moving(&self) -> bool {
        self.moving.load(Ordering::SeqCst)
    }

    pub(crate) fn set_moving(&self, moving: bool) {
        self.moving.store(moving, Ordering::SeqCst);
    }

    /// Whether the layer is currently shown on the map.
    ///
    /// Overlays are shown when their element is displayed.
    pub fn is_shown(&self) -> bool {
        if self.kind.is_overlay() {
            self.layer
                .element()
                .map(|e| e.is_displayed())
                .unwrap_or(true)
        } else {
            self.layer.visible()
        }
    }

    /// Name, measurement, and kind-specific counts.
    pub fn details(&self) -> Vec<Detail> {
        let mut details = vec![Detail::new("Name", self.name())];

        if let Some(area) = self.layer.get(AREA_PROPERTY).filter(|v| !v.is_null()) {
            details.push(Detail::new("Area", area));
        } else if let Some(length) = self.layer.get(LENGTH_PROPERTY).filter(|v| !v.is_null()) {
            details.push(Detail::new("Length", length));
        }

        match self.kind {
            LayerKind::Group => {
                let count = self.layer.layers().map(|l| l.len()).unwrap_or(0);
                details.push(Detail::new("Layer Count", count));
            }
            LayerKind::Vector => {
                details.push(Detail::new("Feature Count", self.layer.feature_count().unwrap_or(0)));
            }
            _ => {}
        }

        details
    }

    /// Bounding box to zoom to, if the layer has one.
    pub fn extent(&self) -> Option<Extent> {
        layer_extent(&self.layer)
    }

    /// Names of the editable properties for this item's kind.
    pub fn property_types(&self) -> &'static [&'static str] {
        if self.kind.is_overlay() {
            OVERLAY_PROPERTY_TYPES
        } else {
            LAYER_PROPERTY_TYPES
        }
    }

    /// `name` plus every editable property, read from the layer.
    pub fn properties(&self) -> Properties {
        let mut props = Properties::new();
        props.insert("name".to_string(), Value::Text(self.name()));
        for key in self.property_types() {
            props.insert(key.to_string(), self.layer.get(key).unwrap_or_default());
        }
        props
    }

    /// Writes `name` and the editable properties present in `props`.
    ///
    /// Unknown keys are ignored. Returns `true` if the name changed.
    pub fn set_properties(&self, props: &Properties) -> bool {
        let mut renamed = false;
        if let Some(name) = props.get("name").and_then(Value::as_str) {
            renamed = self.set_name(name);
            self.layer.set("name", Value::Text(name.to_string()));
        }
        for key in self.property_types() {
            if let Some(value) = props.get(*key) {
                self.layer.set(key, value.clone());
            }
        }
        tracing::trace!(target: targets::ITEM, id = %self.id, renamed, "properties updated");
        renamed
    }

    /// Moves the view onto the item.
    ///
    /// Overlays are centered on their position; everything else is fitted to
    /// its extent. Returns `false` (and warns) when there is nothing to zoom to.
    pub fn zoom_to(&self, view: &dyn MapView) -> bool {
        if self.kind.is_overlay() {
            match self.layer.position() {
                Some(position) => {
                    view.center_on(position);
                    true
                }
                None => {
                    tracing::warn!(target: targets::ITEM, id = %self.id, name = %self.name(), "overlay position is undefined");
                    false
                }
            }
        } else {
            match self.extent() {
                Some(extent) => {
                    view.fit_extent(extent);
                    true
                }
                None => {
                    tracing::warn!(target: targets::ITEM, id = %self.id, name = %self.name(), "layer extent is undefined");
                    false
                }
            }
        }
    }
}

/// Extent of a layer as the explorer sees it.
///
/// Overlays have none; groups union their children; other layers use their
/// own extent and fall back to their source's.
pub fn layer_extent(layer: &LayerRef) -> Option<Extent> {
    match layer.kind() {
        LayerKind::Overlay => None,
        LayerKind::Group => {
            let children = layer.layers()?;
            children
                .to_vec()
                .iter()
                .filter_map(layer_extent)
                .reduce(|acc, e| acc.union(&e))
        }
        _ => layer.extent().or_else(|| layer.source_extent()),
    }
}

impl fmt::Debug for Item {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Item")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("kind", &self.kind)
            .field("moving", &self.is_moving())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Item: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::geometry::Coordinate;
    use crate::layer::{Feature, Layer, VectorSource};
    use crate::view::{ViewRecorder, ViewRequest};

    fn item(layer: LayerRef) -> Item {
        Item::new("layers-1", "Test", layer, "icon")
    }

    fn names(details: &[Detail]) -> Vec<&str> {
        details.iter().map(|d| d.name.as_str()).collect()
    }

    #[test]
    fn test_details_by_kind() {
        let tile = item(Layer::tile().into_ref());
        assert_eq!(names(&tile.details()), vec!["Name"]);

        let source = Arc::new(VectorSource::with_features(vec![Feature::point(0.0, 0.0)]));
        let vector = item(Layer::vector(source).into_ref());
        let details = vector.details();
        assert_eq!(names(&details), vec!["Name", "Feature Count"]);
        assert_eq!(details[1].value, "1");

        let group = item(Layer::group(vec![Layer::tile().into_ref(), Layer::image().into_ref()]).into_ref());
        let details = group.details();
        assert_eq!(names(&details), vec!["Name", "Layer Count"]);
        assert_eq!(details[1].value, "2");
    }

    #[test]
    fn test_measurement_area_wins_over_length() {
        let layer = Layer::vector(Arc::new(VectorSource::new()))
            .with_property(AREA_PROPERTY, "12.5 km²")
            .with_property(LENGTH_PROPERTY, "3 km")
            .into_ref();
        let details = item(layer).details();
        assert_eq!(names(&details), vec!["Name", "Area", "Feature Count"]);
        assert_eq!(details[1].value, "12.5 km²");

        let layer = Layer::vector(Arc::new(VectorSource::new()))
            .with_property(LENGTH_PROPERTY, "3 km")
            .into_ref();
        assert_eq!(names(&item(layer).details()), vec!["Name", "Length", "Feature Count"]);
    }

    #[test]
    fn test_detail_records_are_numbered_from_one() {
        let records = detail_records(item(Layer::tile().into_ref()).details());
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].recid, 1);
        assert_eq!(records[0].property, "Name");
        assert_eq!(records[0].value, "Test");
    }

    #[test]
    fn test_extent_falls_back_to_source() {
        let source = Arc::new(VectorSource::with_features(vec![
            Feature::point(1.0, 1.0),
            Feature::point(3.0, 5.0),
        ]));
        let vector = item(Layer::vector(source).into_ref());
        assert_eq!(vector.extent(), Some(Extent::new(1.0, 1.0, 3.0, 5.0)));

        let own = item(
            Layer::vector(Arc::new(VectorSource::new()))
                .with_extent(Extent::new(0.0, 0.0, 1.0, 1.0))
                .into_ref(),
        );
        assert_eq!(own.extent(), Some(Extent::new(0.0, 0.0, 1.0, 1.0)));
    }

    #[test]
    fn test_group_extent_unions_children_skipping_none() {
        let group = Layer::group(vec![
            Layer::tile().with_extent(Extent::new(0.0, 0.0, 1.0, 1.0)).into_ref(),
            Layer::image().into_ref(),
            Layer::tile().with_extent(Extent::new(5.0, -1.0, 6.0, 0.5)).into_ref(),
        ])
        .into_ref();
        assert_eq!(item(group).extent(), Some(Extent::new(0.0, -1.0, 6.0, 1.0)));

        let empty = Layer::group(vec![Layer::image().into_ref()]).into_ref();
        assert_eq!(item(empty).extent(), None);
    }

    #[test]
    fn test_properties_proxy_to_layer() {
        let layer = Layer::tile().with_property("opacity", 1.0).into_ref();
        let item = item(layer.clone());
        assert_eq!(item.property_types(), &["opacity"]);

        let props = item.properties();
        assert_eq!(props["name"], Value::from("Test"));
        assert_eq!(props["opacity"], Value::from(1.0));

        let mut update = Properties::new();
        update.insert("name".into(), Value::from("Renamed"));
        update.insert("opacity".into(), Value::from(0.25));
        update.insert("bogus".into(), Value::from(true));
        assert!(item.set_properties(&update));
        assert!(!item.set_properties(&update));

        assert_eq!(item.name(), "Renamed");
        assert_eq!(layer.get("opacity"), Some(Value::from(0.25)));
        assert_eq!(layer.get("name"), Some(Value::from("Renamed")));
        assert_eq!(layer.get("bogus"), None);
    }

    #[test]
    fn test_overlay_has_no_editable_properties() {
        let overlay = item(Layer::overlay(None).into_ref());
        assert!(overlay.property_types().is_empty());
        assert_eq!(overlay.properties().len(), 1);
        assert_eq!(overlay.extent(), None);
    }

    #[test]
    fn test_zoom_to() {
        let view = ViewRecorder::new();

        let overlay = item(Layer::overlay(Some(Coordinate::new(2.0, 3.0))).into_ref());
        assert!(overlay.zoom_to(&view));
        assert_eq!(view.last_request(), Some(ViewRequest::Center(Coordinate::new(2.0, 3.0))));

        let extent = Extent::new(0.0, 0.0, 10.0, 10.0);
        let tile = item(Layer::tile().with_extent(extent).into_ref());
        assert!(tile.zoom_to(&view));
        assert_eq!(view.last_request(), Some(ViewRequest::Fit(extent)));

        let nowhere = item(Layer::overlay(None).into_ref());
        assert!(!nowhere.zoom_to(&view));
        let no_extent = item(Layer::image().into_ref());
        assert!(!no_extent.zoom_to(&view));
        assert_eq!(view.last_request(), Some(ViewRequest::Fit(extent)));
    }

    #[test]
    fn test_kind_is_fixed_at_construction() {
        let item = item(Layer::heatmap(Arc::new(VectorSource::new())).into_ref());
        assert_eq!(item.kind(), LayerKind::Heatmap);
        assert!(!item.is_moving());
        item.set_moving(true);
        assert!(item.is_moving());
    }
}
