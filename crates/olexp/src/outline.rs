//! Sidebar outline contract and in-memory tree implementation.
//!
//! The explorer drives a tree widget through the [`Outline`] trait: nodes
//! are addressed by string id and own an ordered list of children.
//! [`TreeOutline`] keeps the tree in memory and emits signals on change,
//! which is all a host needs to mirror it into a real widget.

use std::collections::HashMap;
use std::fmt;

use olexp_core::Signal;
use olexp_core::logging::targets;
use parking_lot::RwLock;

/// A sidebar node together with its subtree.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutlineNode {
    pub id: String,
    pub text: String,
    /// Icon class.
    pub img: String,
    /// Parent id; filled in by [`Outline::get`], ignored on insertion.
    pub parent: Option<String>,
    pub disabled: bool,
    pub expanded: bool,
    pub nodes: Vec<OutlineNode>,
}

impl OutlineNode {
    pub fn new(id: impl Into<String>, text: impl Into<String>, img: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            img: img.into(),
            ..Default::default()
        }
    }

    pub fn with_disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    pub fn with_expanded(mut self, expanded: bool) -> Self {
        self.expanded = expanded;
        self
    }

    pub fn with_children(mut self, nodes: Vec<OutlineNode>) -> Self {
        self.nodes = nodes;
        self
    }
}

/// Capabilities the explorer requires from the sidebar tree widget.
///
/// Mutators return `false` when the addressed node does not exist.
pub trait Outline: Send + Sync {
    /// The node `id` with its whole subtree.
    fn get(&self, id: &str) -> Option<OutlineNode>;

    /// Ids of the direct children of `parent`, in display order.
    fn children(&self, parent: &str) -> Vec<String>;

    /// Id of the parent of `id`; `None` for root nodes and unknown ids.
    fn parent_of(&self, id: &str) -> Option<String>;

    /// Position of `id` among the children of `parent`.
    fn index_of(&self, parent: &str, id: &str) -> Option<usize> {
        self.children(parent).iter().position(|child| child == id)
    }

    /// Appends a root-level node.
    fn add_root(&self, node: OutlineNode) -> bool;

    /// Appends `nodes` to the children of `parent`.
    fn add(&self, parent: &str, nodes: Vec<OutlineNode>) -> bool;

    /// Inserts `nodes` before sibling `before`, or appends when `before` is `None`.
    fn insert(&self, parent: &str, before: Option<&str>, nodes: Vec<OutlineNode>) -> bool;

    /// Removes `id` and its subtree.
    fn remove(&self, id: &str) -> bool;

    fn select(&self, id: &str) -> bool;

    fn unselect(&self);

    /// Id of the selected node.
    fn selected(&self) -> Option<String>;

    fn expand(&self, id: &str) -> bool;

    fn enable(&self, id: &str) -> bool;

    fn disable(&self, id: &str) -> bool;

    fn set_text(&self, id: &str, text: &str) -> bool;
}

struct NodeEntry {
    text: String,
    img: String,
    disabled: bool,
    expanded: bool,
    parent: Option<String>,
    children: Vec<String>,
}

#[derive(Default)]
struct OutlineStorage {
    nodes: HashMap<String, NodeEntry>,
    root_children: Vec<String>,
    selected: Option<String>,
}

impl OutlineStorage {
    fn children_of(&self, parent: Option<&str>) -> Option<&Vec<String>> {
        match parent {
            None => Some(&self.root_children),
            Some(id) => self.nodes.get(id).map(|n| &n.children),
        }
    }

    fn children_of_mut(&mut self, parent: Option<&str>) -> Option<&mut Vec<String>> {
        match parent {
            None => Some(&mut self.root_children),
            Some(id) => self.nodes.get_mut(id).map(|n| &mut n.children),
        }
    }

    /// Registers `node` and its descendants, returning the node's id.
    /// Nodes whose id already exists are skipped.
    fn register(&mut self, node: OutlineNode, parent: Option<&str>) -> Option<String> {
        if self.nodes.contains_key(&node.id) {
            tracing::warn!(target: targets::OUTLINE, id = %node.id, "duplicate outline node id ignored");
            return None;
        }
        let id = node.id.clone();
        let mut children = Vec::with_capacity(node.nodes.len());
        for child in node.nodes {
            if let Some(child_id) = self.register(child, Some(&id)) {
                children.push(child_id);
            }
        }
        self.nodes.insert(
            id.clone(),
            NodeEntry {
                text: node.text,
                img: node.img,
                disabled: node.disabled,
                expanded: node.expanded,
                parent: parent.map(str::to_string),
                children,
            },
        );
        Some(id)
    }

    fn remove_subtree(&mut self, id: &str) {
        if let Some(node) = self.nodes.remove(id) {
            if self.selected.as_deref() == Some(id) {
                self.selected = None;
            }
            for child in node.children {
                self.remove_subtree(&child);
            }
        }
    }

    fn snapshot(&self, id: &str) -> Option<OutlineNode> {
        let entry = self.nodes.get(id)?;
        Some(OutlineNode {
            id: id.to_string(),
            text: entry.text.clone(),
            img: entry.img.clone(),
            parent: entry.parent.clone(),
            disabled: entry.disabled,
            expanded: entry.expanded,
            nodes: entry
                .children
                .iter()
                .filter_map(|child| self.snapshot(child))
                .collect(),
        })
    }
}

/// An in-memory [`Outline`].
///
/// # Example
///
/// ```
/// use olexp::outline::{Outline, OutlineNode, TreeOutline};
///
/// let outline = TreeOutline::new();
/// outline.add_root(OutlineNode::new("layers", "Layers", "icon-folder"));
/// outline.add("layers", vec![OutlineNode::new("layers-1", "OSM", "icon-tile")]);
/// outline.insert("layers", Some("layers-1"), vec![OutlineNode::new("layers-2", "Stamen", "icon-tile")]);
///
/// assert_eq!(outline.children("layers"), vec!["layers-2", "layers-1"]);
/// ```
pub struct TreeOutline {
    storage: RwLock<OutlineStorage>,
    /// Emitted with the new selection whenever it changes.
    pub node_selected: Signal<Option<String>>,
    /// Emitted after any structural change.
    pub nodes_changed: Signal<()>,
}

impl TreeOutline {
    pub fn new() -> Self {
        Self {
            storage: RwLock::new(OutlineStorage::default()),
            node_selected: Signal::new(),
            nodes_changed: Signal::new(),
        }
    }

    /// Ids of the root-level nodes.
    pub fn roots(&self) -> Vec<String> {
        self.storage.read().root_children.clone()
    }

    /// Total number of nodes at any depth.
    pub fn node_count(&self) -> usize {
        self.storage.read().nodes.len()
    }

    /// Display texts of the children of `parent`, in order.
    pub fn texts(&self, parent: &str) -> Vec<String> {
        let storage = self.storage.read();
        storage
            .children_of(Some(parent))
            .map(|children| {
                children
                    .iter()
                    .filter_map(|c| storage.nodes.get(c).map(|n| n.text.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    fn insert_into(&self, parent: Option<&str>, before: Option<&str>, nodes: Vec<OutlineNode>) -> bool {
        {
            let mut storage = self.storage.write();
            let position = match storage.children_of(parent) {
                None => return false,
                Some(children) => match before {
                    None => children.len(),
                    Some(before) => match children.iter().position(|c| c == before) {
                        Some(pos) => pos,
                        None => return false,
                    },
                },
            };
            let ids: Vec<String> = nodes
                .into_iter()
                .filter_map(|node| storage.register(node, parent))
                .collect();
            if let Some(children) = storage.children_of_mut(parent) {
                children.splice(position..position, ids);
            }
        }
        self.nodes_changed.emit(());
        true
    }

    fn update<F>(&self, id: &str, f: F) -> bool
    where
        F: FnOnce(&mut NodeEntry),
    {
        let found = match self.storage.write().nodes.get_mut(id) {
            Some(entry) => {
                f(entry);
                true
            }
            None => false,
        };
        if found {
            self.nodes_changed.emit(());
        }
        found
    }
}

impl Default for TreeOutline {
    fn default() -> Self {
        Self::new()
    }
}

impl Outline for TreeOutline {
    fn get(&self, id: &str) -> Option<OutlineNode> {
        self.storage.read().snapshot(id)
    }

    fn children(&self, parent: &str) -> Vec<String> {
        self.storage
            .read()
            .children_of(Some(parent))
            .cloned()
            .unwrap_or_default()
    }

    fn parent_of(&self, id: &str) -> Option<String> {
        self.storage.read().nodes.get(id).and_then(|n| n.parent.clone())
    }

    fn add_root(&self, node: OutlineNode) -> bool {
        self.insert_into(None, None, vec![node])
    }

    fn add(&self, parent: &str, nodes: Vec<OutlineNode>) -> bool {
        self.insert_into(Some(parent), None, nodes)
    }

    fn insert(&self, parent: &str, before: Option<&str>, nodes: Vec<OutlineNode>) -> bool {
        self.insert_into(Some(parent), before, nodes)
    }

    fn remove(&self, id: &str) -> bool {
        let selection_cleared = {
            let mut storage = self.storage.write();
            let parent = match storage.nodes.get(id) {
                Some(entry) => entry.parent.clone(),
                None => return false,
            };
            if let Some(siblings) = storage.children_of_mut(parent.as_deref()) {
                siblings.retain(|c| c != id);
            }
            let had_selection = storage.selected.is_some();
            storage.remove_subtree(id);
            had_selection && storage.selected.is_none()
        };
        if selection_cleared {
            self.node_selected.emit(None);
        }
        self.nodes_changed.emit(());
        true
    }

    fn select(&self, id: &str) -> bool {
        {
            let mut storage = self.storage.write();
            if !storage.nodes.contains_key(id) {
                return false;
            }
            storage.selected = Some(id.to_string());
        }
        tracing::trace!(target: targets::OUTLINE, id, "node selected");
        self.node_selected.emit(Some(id.to_string()));
        true
    }

    fn unselect(&self) {
        let previous = self.storage.write().selected.take();
        if previous.is_some() {
            self.node_selected.emit(None);
        }
    }

    fn selected(&self) -> Option<String> {
        self.storage.read().selected.clone()
    }

    fn expand(&self, id: &str) -> bool {
        self.update(id, |entry| entry.expanded = true)
    }

    fn enable(&self, id: &str) -> bool {
        self.update(id, |entry| entry.disabled = false)
    }

    fn disable(&self, id: &str) -> bool {
        self.update(id, |entry| entry.disabled = true)
    }

    fn set_text(&self, id: &str, text: &str) -> bool {
        self.update(id, |entry| entry.text = text.to_string())
    }
}

impl fmt::Debug for TreeOutline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let storage = self.storage.read();
        f.debug_struct("TreeOutline")
            .field("roots", &storage.root_children)
            .field("node_count", &storage.nodes.len())
            .field("selected", &storage.selected)
            .finish()
    }
}

static_assertions::assert_impl_all!(TreeOutline: Send, Sync);

#[cfg(test)]
mod tests {
    use super::*;

    fn outline_with_root() -> TreeOutline {
        let outline = TreeOutline::new();
        assert!(outline.add_root(OutlineNode::new("layers", "Layers", "icon-folder")));
        outline
    }

    #[test]
    fn test_add_and_insert_order() {
        let outline = outline_with_root();
        outline.add("layers", vec![OutlineNode::new("a", "A", "")]);
        outline.add("layers", vec![OutlineNode::new("b", "B", "")]);
        outline.insert("layers", Some("a"), vec![OutlineNode::new("c", "C", "")]);

        assert_eq!(outline.children("layers"), vec!["c", "a", "b"]);
        assert_eq!(outline.index_of("layers", "a"), Some(1));
        assert_eq!(outline.parent_of("a").as_deref(), Some("layers"));
        assert_eq!(outline.parent_of("layers"), None);
    }

    #[test]
    fn test_insert_before_unknown_sibling_fails() {
        let outline = outline_with_root();
        assert!(!outline.insert("layers", Some("missing"), vec![OutlineNode::new("a", "A", "")]));
        assert!(!outline.add("missing", vec![OutlineNode::new("a", "A", "")]));
        assert!(outline.children("layers").is_empty());
        assert!(outline.get("a").is_none());
    }

    #[test]
    fn test_remove_subtree_and_reinsert_snapshot() {
        let outline = outline_with_root();
        let group = OutlineNode::new("g", "Group", "icon-folder")
            .with_expanded(true)
            .with_children(vec![
                OutlineNode::new("g-1", "One", ""),
                OutlineNode::new("g-2", "Two", "").with_disabled(true),
            ]);
        outline.add("layers", vec![group, OutlineNode::new("t", "Tile", "")]);
        assert_eq!(outline.node_count(), 5);

        let snapshot = outline.get("g").unwrap();
        assert_eq!(snapshot.nodes.len(), 2);
        assert!(snapshot.nodes[1].disabled);

        assert!(outline.remove("g"));
        assert_eq!(outline.node_count(), 2);
        assert!(outline.get("g-1").is_none());

        outline.add("layers", vec![snapshot]);
        assert_eq!(outline.children("layers"), vec!["t", "g"]);
        assert_eq!(outline.children("g"), vec!["g-1", "g-2"]);
        assert!(outline.get("g").unwrap().expanded);
        assert_eq!(outline.parent_of("g-2").as_deref(), Some("g"));
    }

    #[test]
    fn test_removing_selected_node_clears_selection() {
        let outline = outline_with_root();
        outline.add("layers", vec![OutlineNode::new("a", "A", "")]);
        assert!(outline.select("a"));
        assert_eq!(outline.selected().as_deref(), Some("a"));

        outline.remove("a");
        assert_eq!(outline.selected(), None);
        assert!(!outline.select("a"));
    }

    #[test]
    fn test_enable_disable_and_text() {
        let outline = outline_with_root();
        outline.add("layers", vec![OutlineNode::new("a", "A", "")]);

        assert!(outline.disable("a"));
        assert!(outline.get("a").unwrap().disabled);
        assert!(outline.enable("a"));
        assert!(!outline.get("a").unwrap().disabled);
        assert!(outline.set_text("a", "Renamed"));
        assert_eq!(outline.texts("layers"), vec!["Renamed"]);
        assert!(!outline.set_text("missing", "x"));
    }
}
