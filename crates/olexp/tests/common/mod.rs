//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Once};

use olexp::prelude::*;
use parking_lot::Mutex;

static TRACING: Once = Once::new();

/// Installs a test-writer subscriber once per test binary.
///
/// Filter with `RUST_LOG`, e.g. `RUST_LOG=olexp::manager=trace`.
pub fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

pub struct Harness {
    pub outline: Arc<TreeOutline>,
    pub details: Arc<DetailsTable>,
    pub view: Arc<ViewRecorder>,
    pub map: Map,
    pub explorer: Explorer,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_settings(ExplorerSettings::default())
    }

    pub fn with_settings(settings: ExplorerSettings) -> Self {
        init_tracing();
        let outline = Arc::new(TreeOutline::new());
        let details = Arc::new(DetailsTable::new());
        let view = Arc::new(ViewRecorder::new());
        let map = Map::new(view.clone());
        let explorer = Explorer::new(outline.clone(), details.clone(), settings);
        explorer.attach(&map);
        Self {
            outline,
            details,
            view,
            map,
            explorer,
        }
    }

    /// Records the wire name and item id of every explorer event.
    pub fn record_events(&self) -> Arc<Mutex<Vec<(String, Option<String>)>>> {
        let events = Arc::new(Mutex::new(Vec::new()));
        let events_clone = events.clone();
        self.explorer.on(move |event| {
            let id = event.item().map(|item| item.id().to_string());
            events_clone.lock().push((event.name().to_string(), id));
        });
        events
    }

    pub fn ids(&self, parent: &str) -> Vec<String> {
        self.outline.children(parent)
    }
}

pub fn tile(name: &str) -> LayerRef {
    Layer::tile().with_name(name).into_ref()
}

pub fn vector(name: &str) -> LayerRef {
    Layer::vector(Arc::new(VectorSource::new())).with_name(name).into_ref()
}
