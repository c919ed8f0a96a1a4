//! Details grid contract.
//!
//! The explorer shows the selected item's details as property/value rows.

use std::fmt;

use parking_lot::RwLock;

/// One row of the details grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetailRecord {
    /// 1-based row id.
    pub recid: usize,
    pub property: String,
    pub value: String,
}

/// Capabilities the explorer requires from the details grid widget.
pub trait DetailsGrid: Send + Sync {
    fn clear(&self);
    fn add(&self, records: Vec<DetailRecord>);
}

/// An in-memory [`DetailsGrid`].
#[derive(Default)]
pub struct DetailsTable {
    records: RwLock<Vec<DetailRecord>>,
}

impl DetailsTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<DetailRecord> {
        self.records.read().clone()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Value of the first row named `property`.
    pub fn value_of(&self, property: &str) -> Option<String> {
        self.records
            .read()
            .iter()
            .find(|r| r.property == property)
            .map(|r| r.value.clone())
    }
}

impl DetailsGrid for DetailsTable {
    fn clear(&self) {
        self.records.write().clear();
    }

    fn add(&self, records: Vec<DetailRecord>) {
        self.records.write().extend(records);
    }
}

impl fmt::Debug for DetailsTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetailsTable")
            .field("records", &*self.records.read())
            .finish()
    }
}
