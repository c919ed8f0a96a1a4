//! olexp - a layer explorer core for map applications.
//!
//! The explorer keeps a sidebar outline in sync with a map's two observable
//! collections (layers and overlays), recursing into group layers, and
//! offers the operations a layer panel needs: selection with a details
//! grid, renaming and property edits, reordering, removal, visibility
//! toggling and zooming.
//!
//! The map engine and the widgets are collaborators described by traits
//! ([`layer::MapLayer`], [`outline::Outline`], [`details::DetailsGrid`],
//! [`view::MapView`]). In-memory implementations of each are provided.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use olexp::prelude::*;
//!
//! let outline = Arc::new(TreeOutline::new());
//! let explorer = Explorer::new(outline.clone(), Arc::new(DetailsTable::new()), ExplorerSettings::default());
//! let map = Map::new(Arc::new(ViewRecorder::new()));
//! explorer.attach(&map);
//!
//! map.layers.push(Layer::tile().with_name("OSM").into_ref());
//! map.layers.push(Layer::tile().with_name("Stamen").into_ref());
//!
//! // Newest layer first.
//! assert_eq!(outline.texts("layers"), vec!["Stamen", "OSM"]);
//! ```

pub mod collection;
pub mod debug;
pub mod details;
pub mod error;
pub mod explorer;
pub mod geometry;
pub mod item;
pub mod layer;
pub mod node_manager;
pub mod outline;
pub mod settings;
pub mod view;

pub use olexp_core::{Properties, Value};

pub use collection::LayerCollection;
pub use error::{Error, Result};
pub use explorer::{Explorer, ItemActions};
pub use item::{Detail, Item};
pub use layer::{LayerKind, LayerRef, MapLayer};
pub use node_manager::{ExplorerEvent, ListenerId, ManagerContext, MoveDirection, NodeManager};
pub use settings::ExplorerSettings;

/// Everything needed to wire an explorer to in-memory collaborators.
pub mod prelude {
    pub use crate::collection::LayerCollection;
    pub use crate::details::{DetailsGrid, DetailsTable};
    pub use crate::explorer::{Explorer, ItemActions};
    pub use crate::geometry::{Coordinate, Extent};
    pub use crate::layer::{Layer, LayerKind, LayerRef, MapLayer, VectorSource};
    pub use crate::node_manager::{ExplorerEvent, MoveDirection, NodeManager};
    pub use crate::outline::{Outline, OutlineNode, TreeOutline};
    pub use crate::settings::ExplorerSettings;
    pub use crate::view::{Map, MapView, ViewRecorder};
    pub use olexp_core::{Properties, Value};
}
