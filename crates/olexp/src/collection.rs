//! Observable ordered layer collection.
//!
//! `LayerCollection` stands in for the map engine's layer/overlay
//! collections. Index 0 is the bottom of the rendering stack. Every
//! structural mutation fires [`LayerCollection::length_changed`] after the
//! internal lock has been released, so handlers can read the collection (or
//! even mutate it again) synchronously.

use std::fmt;

use olexp_core::Signal;
use parking_lot::RwLock;

use crate::layer::{LayerRef, layer_eq};

/// An ordered, observable list of layers.
pub struct LayerCollection {
    layers: RwLock<Vec<LayerRef>>,
    length_changed: Signal<usize>,
}

impl LayerCollection {
    /// Creates an empty collection.
    pub fn new() -> Self {
        Self::from_layers(Vec::new())
    }

    /// Creates a collection holding `layers`, bottom first.
    pub fn from_layers(layers: Vec<LayerRef>) -> Self {
        Self {
            layers: RwLock::new(layers),
            length_changed: Signal::new(),
        }
    }

    /// Signal emitted with the new length after every insertion or removal.
    pub fn length_changed(&self) -> &Signal<usize> {
        &self.length_changed
    }

    pub fn len(&self) -> usize {
        self.layers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.read().is_empty()
    }

    /// The layer at `index`, if any.
    pub fn item(&self, index: usize) -> Option<LayerRef> {
        self.layers.read().get(index).cloned()
    }

    /// A snapshot of the current contents.
    pub fn to_vec(&self) -> Vec<LayerRef> {
        self.layers.read().clone()
    }

    /// Position of `layer`, compared by identity.
    pub fn index_of(&self, layer: &LayerRef) -> Option<usize> {
        self.layers.read().iter().position(|l| layer_eq(l, layer))
    }

    pub fn contains(&self, layer: &LayerRef) -> bool {
        self.index_of(layer).is_some()
    }

    /// Appends a layer on top of the stack.
    pub fn push(&self, layer: LayerRef) {
        let len = {
            let mut layers = self.layers.write();
            layers.push(layer);
            layers.len()
        };
        self.length_changed.emit(len);
    }

    /// Inserts `layer` at `index`.
    ///
    /// Returns `false` without notifying if `index` is past the end.
    pub fn insert_at(&self, index: usize, layer: LayerRef) -> bool {
        let len = {
            let mut layers = self.layers.write();
            if index > layers.len() {
                return false;
            }
            layers.insert(index, layer);
            layers.len()
        };
        self.length_changed.emit(len);
        true
    }

    /// Removes and returns the layer at `index`.
    pub fn remove_at(&self, index: usize) -> Option<LayerRef> {
        let (removed, len) = {
            let mut layers = self.layers.write();
            if index >= layers.len() {
                return None;
            }
            let removed = layers.remove(index);
            (removed, layers.len())
        };
        self.length_changed.emit(len);
        Some(removed)
    }

    /// Removes `layer` (by identity) and returns it.
    pub fn remove(&self, layer: &LayerRef) -> Option<LayerRef> {
        let index = self.index_of(layer)?;
        self.remove_at(index)
    }

    /// Removes every layer, one notification per removal.
    pub fn clear(&self) {
        while !self.is_empty() {
            let last = self.len() - 1;
            self.remove_at(last);
        }
    }
}

impl Default for LayerCollection {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LayerCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayerCollection")
            .field("len", &self.len())
            .field("length_changed", &self.length_changed)
            .finish()
    }
}

static_assertions::assert_impl_all!(LayerCollection: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layer::Layer;
    use parking_lot::Mutex;
    use std::sync::Arc;

    fn recording(collection: &LayerCollection) -> Arc<Mutex<Vec<usize>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        collection.length_changed().connect(move |&len| {
            seen_clone.lock().push(len);
        });
        seen
    }

    #[test]
    fn test_mutations_notify_with_new_length() {
        let collection = LayerCollection::new();
        let seen = recording(&collection);

        let a = Layer::tile().into_ref();
        let b = Layer::tile().into_ref();
        collection.push(a.clone());
        assert!(collection.insert_at(0, b.clone()));
        assert!(layer_eq(&collection.item(0).unwrap(), &b));
        assert!(collection.remove(&a).is_some());

        assert_eq!(*seen.lock(), vec![1, 2, 1]);
    }

    #[test]
    fn test_rejected_mutations_do_not_notify() {
        let collection = LayerCollection::new();
        let seen = recording(&collection);

        assert!(!collection.insert_at(3, Layer::tile().into_ref()));
        assert!(collection.remove_at(0).is_none());
        assert!(collection.remove(&Layer::tile().into_ref()).is_none());

        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_handler_can_read_collection() {
        let collection = Arc::new(LayerCollection::new());
        let observed = Arc::new(Mutex::new(Vec::new()));

        let weak = Arc::downgrade(&collection);
        let observed_clone = observed.clone();
        collection.length_changed().connect(move |_| {
            if let Some(collection) = weak.upgrade() {
                observed_clone.lock().push(collection.to_vec().len());
            }
        });

        collection.push(Layer::tile().into_ref());
        collection.push(Layer::tile().into_ref());
        collection.clear();

        assert_eq!(*observed.lock(), vec![1, 2, 1, 0]);
    }
}
