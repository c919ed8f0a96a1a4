//! The explorer API.
//!
//! [`Explorer`] owns the two root managers (layers and overlays) and routes
//! every id-addressed call to the one whose node id prefixes the item id.
//! It also owns selection: the outline holds the selected id, and the
//! explorer fills the details grid and publishes `select:item`.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use olexp::prelude::*;
//!
//! let outline = Arc::new(TreeOutline::new());
//! let details = Arc::new(DetailsTable::new());
//! let explorer = Explorer::new(outline.clone(), details.clone(), ExplorerSettings::default());
//!
//! let map = Map::new(Arc::new(ViewRecorder::new()));
//! explorer.attach(&map);
//!
//! map.layers.push(Layer::tile().with_name("OSM").into_ref());
//! assert!(explorer.select("layers-1"));
//! assert_eq!(details.value_of("Name").as_deref(), Some("OSM"));
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use olexp_core::logging::targets;
use olexp_core::{ConnectionId, Properties, Signal, Slot};
use parking_lot::{Mutex, RwLock};

use crate::details::DetailsGrid;
use crate::item::{Item, detail_records};
use crate::layer::LayerRef;
use crate::node_manager::{ExplorerEvent, ListenerId, ManagerContext, MoveDirection, NodeManager};
use crate::outline::{Outline, OutlineNode};
use crate::settings::ExplorerSettings;
use crate::view::{Map, MapView};

/// Which toolbar actions apply to an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ItemActions {
    pub move_up: bool,
    pub move_down: bool,
    pub remove: bool,
    /// The item has an extent or a position.
    pub zoom: bool,
    /// The item has editable properties beyond its name.
    pub edit: bool,
}

/// Layer explorer: two synchronized outline sections plus selection.
pub struct Explorer {
    context: ManagerContext,
    layers: NodeManager,
    overlays: NodeManager,
    view: RwLock<Option<Arc<dyn MapView>>>,
    /// Carries `select:item`.
    events: Signal<ExplorerEvent>,
    listeners: Mutex<HashMap<ListenerId, ConnectionId>>,
}

impl Explorer {
    pub fn new(outline: Arc<dyn Outline>, details: Arc<dyn DetailsGrid>, settings: ExplorerSettings) -> Self {
        Self::with_context(ManagerContext::new(outline, details, Arc::new(settings)))
    }

    /// Builds an explorer over prepared collaborators.
    ///
    /// The two root nodes are created in the outline unless they exist.
    pub fn with_context(context: ManagerContext) -> Self {
        let settings = context.settings.clone();
        let roots = [
            (&settings.layers_node_id, &settings.layers_node_text),
            (&settings.overlays_node_id, &settings.overlays_node_text),
        ];
        for (id, text) in roots {
            if context.outline.get(id).is_none() {
                let node = OutlineNode::new(id.as_str(), text.as_str(), settings.icons.group.as_str()).with_expanded(true);
                context.outline.add_root(node);
            }
        }

        Self {
            layers: NodeManager::new(settings.layers_node_id.clone(), context.clone()),
            overlays: NodeManager::new(settings.overlays_node_id.clone(), context.clone()),
            context,
            view: RwLock::new(None),
            events: Signal::new(),
            listeners: Mutex::new(HashMap::new()),
        }
    }

    /// Starts tracking the map's layers and overlays.
    pub fn attach(&self, map: &Map) {
        *self.view.write() = Some(map.view.clone());
        self.layers.set_layers(map.layers.clone());
        self.overlays.set_layers(map.overlays.clone());
        tracing::debug!(target: targets::MANAGER, "explorer attached to map");
    }

    /// Stops tracking and clears both sections.
    pub fn detach(&self) {
        self.layers.teardown();
        self.overlays.teardown();
        *self.view.write() = None;
    }

    pub fn layers(&self) -> &NodeManager {
        &self.layers
    }

    pub fn overlays(&self) -> &NodeManager {
        &self.overlays
    }

    pub fn settings(&self) -> &ExplorerSettings {
        &self.context.settings
    }

    /// The root manager responsible for `id`.
    pub fn manager_for(&self, id: &str) -> Option<&NodeManager> {
        if id.starts_with(self.layers.id()) {
            Some(&self.layers)
        } else if id.starts_with(self.overlays.id()) {
            Some(&self.overlays)
        } else {
            None
        }
    }

    pub fn get_by_id(&self, id: &str) -> Option<Arc<Item>> {
        self.manager_for(id)?.get_by_id(id, true)
    }

    pub fn get_by_layer(&self, layer: &LayerRef) -> Option<Arc<Item>> {
        self.layers
            .get_by_layer(layer, true)
            .or_else(|| self.overlays.get_by_layer(layer, true))
    }

    /// The item whose node is selected in the outline.
    pub fn selected(&self) -> Option<Arc<Item>> {
        let id = self.context.outline.selected()?;
        self.get_by_id(&id)
    }

    /// Selects `id`, shows its details and publishes `select:item`.
    pub fn select(&self, id: &str) -> bool {
        let Some(item) = self.get_by_id(id) else {
            return false;
        };
        if !self.context.outline.select(id) {
            return false;
        }
        self.show_details(Some(&item));
        tracing::trace!(target: targets::MANAGER, id, "item selected");
        self.events.emit(ExplorerEvent::ItemSelected(Some(item)));
        true
    }

    pub fn unselect(&self) {
        self.context.outline.unselect();
        self.context.details.clear();
        self.events.emit(ExplorerEvent::ItemSelected(None));
    }

    /// Re-reads the selected item's details into the grid.
    pub fn refresh_details(&self) {
        self.show_details(self.selected().as_ref());
    }

    fn show_details(&self, item: Option<&Arc<Item>>) {
        let details = &self.context.details;
        details.clear();
        if let Some(item) = item {
            details.add(detail_records(item.details()));
        }
    }

    pub fn properties(&self, id: &str) -> Option<Properties> {
        self.get_by_id(id).map(|item| item.properties())
    }

    pub fn property_types(&self, id: &str) -> Option<&'static [&'static str]> {
        self.get_by_id(id).map(|item| item.property_types())
    }

    /// Writes `props` to the item and mirrors its name into the outline.
    pub fn set_properties(&self, id: &str, props: &Properties) -> bool {
        let Some(item) = self.get_by_id(id) else {
            return false;
        };
        if item.set_properties(props) {
            self.context.outline.set_text(id, &item.name());
        }
        if self.context.outline.selected().as_deref() == Some(id) {
            self.show_details(Some(&item));
        }
        true
    }

    /// Removes the item's layer from its collection.
    ///
    /// Item and node go away in the reconciliation pass that follows, which
    /// also publishes `remove:item`.
    pub fn remove(&self, id: &str) -> bool {
        let Some(owner) = self.manager_for(id).and_then(|m| m.owner_of(id)) else {
            return false;
        };
        let (Some(item), Some(layers)) = (owner.get_by_id(id, false), owner.layers()) else {
            return false;
        };
        layers.remove(item.layer()).is_some()
    }

    pub fn zoom_to(&self, id: &str) -> bool {
        let Some(item) = self.get_by_id(id) else {
            return false;
        };
        let Some(view) = self.view.read().clone() else {
            tracing::warn!(target: targets::MANAGER, id, "no map view attached");
            return false;
        };
        item.zoom_to(view.as_ref())
    }

    pub fn move_up(&self, id: &str) -> bool {
        self.manager_for(id).is_some_and(|m| m.move_up(id))
    }

    pub fn move_down(&self, id: &str) -> bool {
        self.manager_for(id).is_some_and(|m| m.move_down(id))
    }

    /// Shows or hides the item and enables or disables its node to match.
    ///
    /// Overlays are toggled through their element. Returns the new state.
    pub fn toggle_node(&self, id: &str) -> Option<bool> {
        let item = self.get_by_id(id)?;
        let layer = item.layer();
        if item.kind().is_overlay() {
            let element = layer.element()?;
            element.set_displayed(!element.is_displayed());
        } else {
            layer.set_visible(!layer.visible());
        }

        let shown = item.is_shown();
        if shown {
            self.context.outline.enable(id);
        } else {
            self.context.outline.disable(id);
        }
        Some(shown)
    }

    /// Toolbar state for `id`; everything disabled for unknown ids.
    pub fn actions(&self, id: &str) -> ItemActions {
        let (Some(manager), Some(item)) = (self.manager_for(id), self.get_by_id(id)) else {
            return ItemActions::default();
        };
        let zoom = if item.kind().is_overlay() {
            item.layer().position().is_some()
        } else {
            item.extent().is_some()
        };
        ItemActions {
            move_up: manager.can_move(id, MoveDirection::Up),
            move_down: manager.can_move(id, MoveDirection::Down),
            remove: true,
            zoom,
            edit: !item.property_types().is_empty(),
        }
    }

    /// Registers `listener` for every explorer event at any depth.
    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ExplorerEvent) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        let slot: Slot<ExplorerEvent> = Arc::new(listener);
        self.layers.register(id, slot.clone());
        self.overlays.register(id, slot.clone());
        let connection = self.events.connect_slot(slot);
        self.listeners.lock().insert(id, connection);
        id
    }

    pub fn off(&self, id: ListenerId) -> bool {
        let own = self
            .listeners
            .lock()
            .remove(&id)
            .is_some_and(|connection| self.events.disconnect(connection));
        let layers = self.layers.off(id);
        let overlays = self.overlays.off(id);
        own || layers || overlays
    }
}

impl fmt::Debug for Explorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("layers", &self.layers)
            .field("overlays", &self.overlays)
            .field("listeners", &self.listeners.lock().len())
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Explorer: Send, Sync);
