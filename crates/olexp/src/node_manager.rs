//! Collection/outline synchronization.
//!
//! A [`NodeManager`] keeps one level of the sidebar outline in step with one
//! observable [`LayerCollection`]. It listens to the collection's
//! `length_changed` signal and runs a reconciliation pass on every
//! notification:
//!
//! 1. Forward pass: every non-hidden layer without an item gets one, and a
//!    node is prepended to the manager's outline node.
//! 2. Reverse pass: every item whose layer left the collection (and is not
//!    being moved) is removed together with its node.
//!
//! Group layers get a child manager over their own collection, so nested
//! groups reconcile independently.
//!
//! # Ordering
//!
//! Collection index 0 is the bottom of the rendering stack, while new nodes
//! are prepended to the outline. The outline (and [`NodeManager::items`])
//! therefore lists layers top of stack first: the reverse of collection
//! order. Moving an item up moves its layer one slot towards the end of the
//! collection and its node one slot towards the front of the outline.
//!
//! # Locking
//!
//! The manager's state lock is never held while signals are emitted, while
//! the outline is mutated, or while the collection is mutated. Collection
//! handlers run synchronously inside the mutating call, so a handler that
//! re-enters the manager must not find the lock taken.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use olexp_core::logging::targets;
use olexp_core::{ConnectionId, Signal, Slot};
use parking_lot::Mutex;

use crate::collection::LayerCollection;
use crate::debug::OutlineDebug;
use crate::details::DetailsGrid;
use crate::item::Item;
use crate::layer::{LayerRef, layer_eq};
use crate::outline::{Outline, OutlineNode};
use crate::settings::ExplorerSettings;

/// Decides whether a layer is kept out of the explorer.
pub type HiddenFilter = Arc<dyn Fn(&LayerRef) -> bool + Send + Sync>;

/// Collaborators shared by every manager of one explorer.
#[derive(Clone)]
pub struct ManagerContext {
    pub outline: Arc<dyn Outline>,
    pub details: Arc<dyn DetailsGrid>,
    pub settings: Arc<ExplorerSettings>,
    hidden: HiddenFilter,
}

impl ManagerContext {
    /// Creates a context whose hidden filter checks `settings.hidden_property`.
    pub fn new(outline: Arc<dyn Outline>, details: Arc<dyn DetailsGrid>, settings: Arc<ExplorerSettings>) -> Self {
        let property = settings.hidden_property.clone();
        let hidden: HiddenFilter = Arc::new(move |layer: &LayerRef| {
            layer.get(&property).is_some_and(|v| v.is_truthy())
        });
        Self {
            outline,
            details,
            settings,
            hidden,
        }
    }

    /// Replaces the hidden-layer predicate.
    pub fn with_hidden_filter<F>(mut self, filter: F) -> Self
    where
        F: Fn(&LayerRef) -> bool + Send + Sync + 'static,
    {
        self.hidden = Arc::new(filter);
        self
    }

    pub fn is_hidden(&self, layer: &LayerRef) -> bool {
        (self.hidden)(layer)
    }
}

impl fmt::Debug for ManagerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerContext")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

/// Events published by the explorer.
#[derive(Debug, Clone)]
pub enum ExplorerEvent {
    /// An item's layer left its collection; the item is gone.
    ItemRemoved(Arc<Item>),
    /// The selection changed through the explorer.
    ItemSelected(Option<Arc<Item>>),
}

impl ExplorerEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            ExplorerEvent::ItemRemoved(_) => "remove:item",
            ExplorerEvent::ItemSelected(_) => "select:item",
        }
    }

    pub fn item(&self) -> Option<&Arc<Item>> {
        match self {
            ExplorerEvent::ItemRemoved(item) => Some(item),
            ExplorerEvent::ItemSelected(item) => item.as_ref(),
        }
    }
}

static NEXT_LISTENER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle returned by `on`, used to unregister a listener with `off`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

impl ListenerId {
    pub(crate) fn next() -> Self {
        Self(NEXT_LISTENER_ID.fetch_add(1, Ordering::Relaxed))
    }
}

/// Direction of a reorder in outline terms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards the top of the outline and the end of the collection.
    Up,
    /// Towards the bottom of the outline and the start of the collection.
    Down,
}

struct Listener {
    id: ListenerId,
    slot: Slot<ExplorerEvent>,
    connection: ConnectionId,
}

#[derive(Default)]
struct State {
    layers: Option<Arc<LayerCollection>>,
    connection: Option<ConnectionId>,
    /// Outline order: top of stack first.
    items: Vec<Arc<Item>>,
    /// Child managers keyed by the id of their group item.
    managers: HashMap<String, NodeManager>,
    count: usize,
    listeners: Vec<Listener>,
}

struct Shared {
    id: String,
    context: ManagerContext,
    events: Signal<ExplorerEvent>,
    state: Mutex<State>,
}

impl Drop for Shared {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        if let (Some(layers), Some(connection)) = (state.layers.take(), state.connection.take()) {
            layers.length_changed().disconnect(connection);
        }
    }
}

/// Everything a move needs, validated before anything is mutated.
struct MovePlan {
    item: Arc<Item>,
    layers: Arc<LayerCollection>,
    index: usize,
    target: usize,
    parent: String,
    neighbor: String,
}

/// Synchronizes one outline node's children with one layer collection.
///
/// Cloning yields another handle to the same manager.
#[derive(Clone)]
pub struct NodeManager {
    shared: Arc<Shared>,
}

impl NodeManager {
    /// Creates a manager for outline node `id`, not yet observing a collection.
    pub fn new(id: impl Into<String>, context: ManagerContext) -> Self {
        Self {
            shared: Arc::new(Shared {
                id: id.into(),
                context,
                events: Signal::new(),
                state: Mutex::new(State::default()),
            }),
        }
    }

    /// Creates a manager and starts observing `layers`.
    pub fn with_layers(id: impl Into<String>, context: ManagerContext, layers: Arc<LayerCollection>) -> Self {
        let manager = Self::new(id, context);
        manager.set_layers(layers);
        manager
    }

    /// The outline node this manager fills.
    pub fn id(&self) -> &str {
        &self.shared.id
    }

    pub fn context(&self) -> &ManagerContext {
        &self.shared.context
    }

    /// The observed collection.
    pub fn layers(&self) -> Option<Arc<LayerCollection>> {
        self.shared.state.lock().layers.clone()
    }

    /// Tracked items in outline order.
    pub fn items(&self) -> Vec<Arc<Item>> {
        self.shared.state.lock().items.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.state.lock().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().items.is_empty()
    }

    /// The child manager of group item `id`.
    pub fn manager(&self, id: &str) -> Option<NodeManager> {
        self.shared.state.lock().managers.get(id).cloned()
    }

    /// Ids of the group items that own a child manager.
    pub fn manager_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.shared.state.lock().managers.keys().cloned().collect();
        ids.sort();
        ids
    }

    fn entries(&self) -> Vec<(Arc<Item>, Option<NodeManager>)> {
        let state = self.shared.state.lock();
        state
            .items
            .iter()
            .map(|item| (item.clone(), state.managers.get(item.id()).cloned()))
            .collect()
    }

    fn downgrade(&self) -> Weak<Shared> {
        Arc::downgrade(&self.shared)
    }

    /// Stops observing the current collection and drops every item.
    ///
    /// Removal goes through the normal path, so `remove:item` fires once per
    /// item at any depth.
    pub fn teardown(&self) {
        let detached = {
            let mut state = self.shared.state.lock();
            state.layers.take().zip(state.connection.take())
        };
        if let Some((layers, connection)) = detached {
            layers.length_changed().disconnect(connection);
        }
        for item in self.items() {
            self.remove_item(&item);
        }
    }

    /// Re-targets the manager to `layers` and tracks everything already in it.
    pub fn set_layers(&self, layers: Arc<LayerCollection>) {
        self.teardown();

        let weak = self.downgrade();
        let connection = layers.length_changed().connect(move |_| {
            if let Some(shared) = weak.upgrade() {
                NodeManager { shared }.reconcile();
            }
        });
        {
            let mut state = self.shared.state.lock();
            state.layers = Some(layers);
            state.connection = Some(connection);
        }
        tracing::debug!(target: targets::MANAGER, id = %self.id(), "observing collection");
        self.reconcile();
    }

    /// Runs one reconciliation pass against the observed collection.
    #[tracing::instrument(name = "olexp::reconcile", skip(self), fields(id = %self.id()), target = "olexp::manager", level = "trace")]
    pub fn reconcile(&self) {
        let Some(layers) = self.layers() else {
            return;
        };
        let context = &self.shared.context;

        for layer in layers.to_vec() {
            if context.is_hidden(&layer) || self.get_by_layer(&layer, false).is_some() {
                continue;
            }
            self.add_layer(layer);
        }

        let stale: Vec<Arc<Item>> = self
            .items()
            .into_iter()
            .rev()
            .filter(|item| !item.is_moving() && !layers.contains(item.layer()))
            .collect();
        for item in stale {
            self.remove_item(&item);
        }
        if tracing::enabled!(target: targets::MANAGER, tracing::Level::TRACE) {
            let tree = OutlineDebug::new().format_subtree(context.outline.as_ref(), self.id());
            tracing::trace!(target: targets::MANAGER, items = self.len(), tree = %tree, "reconciled");
        }
    }

    /// Tracks `layer` with a new item whose node goes first in the outline.
    pub fn add_layer(&self, layer: LayerRef) -> Arc<Item> {
        let context = &self.shared.context;
        let count = {
            let mut state = self.shared.state.lock();
            state.count += 1;
            state.count
        };
        let id = format!("{}-{}", self.id(), count);
        let name = layer
            .get("name")
            .filter(|v| !v.is_null())
            .map(|v| v.to_string())
            .unwrap_or_else(|| format!("{} {}", context.settings.default_item_name, count));
        let kind = layer.kind();
        let icon = context.settings.icon_for(kind).to_string();
        let item = Arc::new(Item::new(id.clone(), name.clone(), layer.clone(), icon.clone()));

        self.shared.state.lock().items.insert(0, item.clone());

        let outline = &context.outline;
        let node = OutlineNode::new(id.clone(), name, icon).with_disabled(!item.is_shown());
        let first = outline.children(self.id()).into_iter().next();
        if !outline.insert(self.id(), first.as_deref(), vec![node]) {
            tracing::warn!(target: targets::MANAGER, id = %id, parent = %self.id(), "outline node missing, item has no node");
        }
        tracing::debug!(target: targets::MANAGER, id = %id, kind = %kind, "item added");

        if kind.is_group() {
            let child = NodeManager::new(id.clone(), context.clone());
            {
                let mut state = self.shared.state.lock();
                // Replay every listener already registered here onto the new
                // child manager. Without this, a listener added with `on` before
                // the group appeared would never see events from its children.
                for listener in &state.listeners {
                    child.register(listener.id, listener.slot.clone());
                }
                state.managers.insert(id.clone(), child.clone());
            }
            if let Some(children) = layer.layers() {
                child.set_layers(children);
            }
            if context.settings.expand_groups {
                outline.expand(&id);
            }
        }

        item
    }

    /// Drops `item` with its node and child manager.
    ///
    /// Returns `false` if the item is not tracked here, which makes repeated
    /// removal from nested passes harmless.
    pub fn remove_item(&self, item: &Arc<Item>) -> bool {
        let child = {
            let mut state = self.shared.state.lock();
            let Some(pos) = state.items.iter().position(|i| Arc::ptr_eq(i, item)) else {
                return false;
            };
            state.items.remove(pos);
            state.managers.remove(item.id())
        };
        let context = &self.shared.context;

        self.shared.events.emit(ExplorerEvent::ItemRemoved(item.clone()));
        if context.outline.selected().as_deref() == Some(item.id()) {
            context.details.clear();
        }
        if let Some(child) = child {
            child.teardown();
        }
        context.outline.remove(item.id());
        tracing::debug!(target: targets::MANAGER, id = %item.id(), "item removed");
        true
    }

    /// Finds an item by id, descending into groups when `recursive`.
    pub fn get_by_id(&self, id: &str, recursive: bool) -> Option<Arc<Item>> {
        for (item, child) in self.entries() {
            if item.id() == id {
                return Some(item);
            }
            if recursive {
                if let Some(found) = child.and_then(|c| c.get_by_id(id, true)) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Finds the item tracking `layer` (by identity).
    pub fn get_by_layer(&self, layer: &LayerRef, recursive: bool) -> Option<Arc<Item>> {
        for (item, child) in self.entries() {
            if layer_eq(item.layer(), layer) {
                return Some(item);
            }
            if recursive {
                if let Some(found) = child.and_then(|c| c.get_by_layer(layer, true)) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// The manager, at any depth, whose own items include `id`.
    pub fn owner_of(&self, id: &str) -> Option<NodeManager> {
        let entries = self.entries();
        if entries.iter().any(|(item, _)| item.id() == id) {
            return Some(self.clone());
        }
        entries
            .into_iter()
            .filter_map(|(_, child)| child)
            .find_map(|child| child.owner_of(id))
    }

    /// The target slot is the collection index of the outline neighbor's
    /// layer, so hidden layers between the two never decouple the orders.
    fn plan_move(&self, id: &str, direction: MoveDirection) -> Option<MovePlan> {
        let item = self.get_by_id(id, false)?;
        let layers = self.layers()?;
        let index = layers.index_of(item.layer())?;

        let outline = &self.shared.context.outline;
        let parent = outline.parent_of(id)?;
        let siblings = outline.children(&parent);
        let pos = siblings.iter().position(|s| s == id)?;
        let neighbor = match direction {
            MoveDirection::Up => pos.checked_sub(1).and_then(|p| siblings.get(p)),
            MoveDirection::Down => siblings.get(pos + 1),
        }?
        .clone();
        if outline.parent_of(&neighbor).as_deref() != Some(parent.as_str()) {
            return None;
        }

        let neighbor_item = self.get_by_id(&neighbor, false)?;
        let target = layers.index_of(neighbor_item.layer())?;
        let in_order = match direction {
            MoveDirection::Up => target > index,
            MoveDirection::Down => target < index,
        };
        if !in_order {
            return None;
        }

        Some(MovePlan {
            item,
            layers,
            index,
            target,
            parent,
            neighbor,
        })
    }

    /// Whether `id` (at any depth) can move one slot in `direction`.
    pub fn can_move(&self, id: &str, direction: MoveDirection) -> bool {
        self.owner_of(id)
            .is_some_and(|owner| owner.plan_move(id, direction).is_some())
    }

    pub fn move_up(&self, id: &str) -> bool {
        self.move_item(id, MoveDirection::Up)
    }

    pub fn move_down(&self, id: &str) -> bool {
        self.move_item(id, MoveDirection::Down)
    }

    /// Swaps `id` with its neighbor in both the collection and the outline,
    /// then selects it. Rejected moves change nothing.
    pub fn move_item(&self, id: &str, direction: MoveDirection) -> bool {
        let Some(owner) = self.owner_of(id) else {
            return false;
        };
        let Some(plan) = owner.plan_move(id, direction) else {
            tracing::trace!(target: targets::MANAGER, id, ?direction, "move rejected");
            return false;
        };
        owner.apply_move(plan)
    }

    fn apply_move(&self, plan: MovePlan) -> bool {
        let MovePlan {
            item,
            layers,
            index,
            target,
            parent,
            neighbor,
        } = plan;

        // Removing the item first shifts an upper neighbor down one slot, so
        // inserting at its old index lands right above it; a lower neighbor
        // keeps its index and the item lands right below it.
        item.set_moving(true);
        let moved = layers
            .remove_at(index)
            .is_some_and(|layer| layers.insert_at(target, layer));
        item.set_moving(false);
        if !moved {
            self.reconcile();
            return false;
        }

        // Both moves become "insert the lower node before the upper one".
        let outline = &self.shared.context.outline;
        let (lower, upper) = if index < target {
            (item.id().to_string(), neighbor.clone())
        } else {
            (neighbor.clone(), item.id().to_string())
        };
        if let Some(node) = outline.get(&lower) {
            outline.remove(&lower);
            outline.insert(&parent, Some(&upper), vec![node]);
        }

        {
            let mut state = self.shared.state.lock();
            let a = state.items.iter().position(|i| i.id() == item.id());
            let b = state.items.iter().position(|i| i.id() == neighbor);
            if let (Some(a), Some(b)) = (a, b) {
                state.items.swap(a, b);
            }
        }

        outline.select(item.id());
        tracing::debug!(target: targets::MANAGER, id = %item.id(), from = index, to = target, "item moved");
        true
    }

    /// Registers `listener` on this manager and every child manager.
    pub fn on<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&ExplorerEvent) + Send + Sync + 'static,
    {
        let id = ListenerId::next();
        self.register(id, Arc::new(listener));
        id
    }

    /// Registers an existing slot under `id`, here and in every child manager.
    pub fn register(&self, id: ListenerId, slot: Slot<ExplorerEvent>) {
        let connection = self.shared.events.connect_slot(slot.clone());
        let children: Vec<NodeManager> = {
            let mut state = self.shared.state.lock();
            state.listeners.push(Listener {
                id,
                slot: slot.clone(),
                connection,
            });
            state.managers.values().cloned().collect()
        };
        for child in children {
            child.register(id, slot.clone());
        }
    }

    /// Unregisters listener `id` everywhere; returns `true` if it was found.
    pub fn off(&self, id: ListenerId) -> bool {
        let (removed, children) = {
            let mut state = self.shared.state.lock();
            let removed = state
                .listeners
                .iter()
                .position(|l| l.id == id)
                .map(|pos| state.listeners.remove(pos));
            (removed, state.managers.values().cloned().collect::<Vec<_>>())
        };
        let mut found = false;
        if let Some(listener) = removed {
            self.shared.events.disconnect(listener.connection);
            found = true;
        }
        for child in children {
            found |= child.off(id);
        }
        found
    }
}

impl fmt::Debug for NodeManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.lock();
        f.debug_struct("NodeManager")
            .field("id", &self.shared.id)
            .field("items", &state.items.len())
            .field("managers", &state.managers.len())
            .field("count", &state.count)
            .finish()
    }
}

static_assertions::assert_impl_all!(NodeManager: Send, Sync);
