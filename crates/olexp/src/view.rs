//! Map view contract and the map bundle handed to the explorer.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::collection::LayerCollection;
use crate::geometry::{Coordinate, Extent};

/// Capabilities the explorer requires from the map view.
pub trait MapView: Send + Sync {
    /// Centers the view on `center` without changing the resolution.
    fn center_on(&self, center: Coordinate);

    /// Fits the view to `extent`.
    fn fit_extent(&self, extent: Extent);
}

/// A navigation request received by a [`ViewRecorder`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewRequest {
    Center(Coordinate),
    Fit(Extent),
}

/// A [`MapView`] that records the last request instead of animating.
#[derive(Default)]
pub struct ViewRecorder {
    last: RwLock<Option<ViewRequest>>,
}

impl ViewRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_request(&self) -> Option<ViewRequest> {
        *self.last.read()
    }
}

impl MapView for ViewRecorder {
    fn center_on(&self, center: Coordinate) {
        *self.last.write() = Some(ViewRequest::Center(center));
    }

    fn fit_extent(&self, extent: Extent) {
        *self.last.write() = Some(ViewRequest::Fit(extent));
    }
}

impl fmt::Debug for ViewRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewRecorder")
            .field("last", &self.last_request())
            .finish()
    }
}

/// The parts of a map the explorer observes.
#[derive(Clone)]
pub struct Map {
    pub layers: Arc<LayerCollection>,
    pub overlays: Arc<LayerCollection>,
    pub view: Arc<dyn MapView>,
}

impl Map {
    /// A map with empty layer and overlay collections.
    pub fn new(view: Arc<dyn MapView>) -> Self {
        Self {
            layers: Arc::new(LayerCollection::new()),
            overlays: Arc::new(LayerCollection::new()),
            view,
        }
    }
}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Map")
            .field("layers", &self.layers)
            .field("overlays", &self.overlays)
            .finish_non_exhaustive()
    }
}
