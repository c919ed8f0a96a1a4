//! Core systems for olexp.
//!
//! This crate provides the foundational pieces the layer explorer is built on:
//!
//! - **Signal/Slot System**: Type-safe, re-entrant change notification
//! - **Property System**: Reactive properties with change detection
//! - **Values**: The dynamic value type stored in layer property stores
//! - **Logging**: `tracing` targets per subsystem
//!
//! # Signal/Slot Example
//!
//! ```
//! use olexp_core::Signal;
//!
//! let item_removed = Signal::<String>::new();
//!
//! let conn_id = item_removed.connect(|id| {
//!     println!("removed {}", id);
//! });
//!
//! item_removed.emit("layers-1".to_string());
//! item_removed.disconnect(conn_id);
//! ```

pub mod logging;
pub mod property;
pub mod signal;
pub mod value;

pub use property::Property;
pub use signal::{ConnectionId, Signal, Slot};
pub use value::{Properties, Value};
