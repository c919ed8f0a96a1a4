//! Logging facilities for olexp.
//!
//! olexp uses the `tracing` crate for instrumentation. The library never
//! installs a subscriber; applications do:
//!
//! ```ignore
//! tracing_subscriber::fmt()
//!     .with_env_filter("olexp::manager=debug")
//!     .init();
//! ```

/// Target names for log filtering.
///
/// Use these with `tracing` directives to filter logs by subsystem.
pub mod targets {
    /// Signal/slot system target.
    pub const SIGNAL: &str = "olexp_core::signal";
    /// Node manager synchronization target.
    pub const MANAGER: &str = "olexp::manager";
    /// Item derivation and property proxying target.
    pub const ITEM: &str = "olexp::item";
    /// Sidebar outline target.
    pub const OUTLINE: &str = "olexp::outline";
    /// Settings loading target.
    pub const SETTINGS: &str = "olexp::settings";
}
