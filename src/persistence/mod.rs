//! The persisted form of a database: the live store, the snapshot counter and
//! every snapshot. Undo history and the audit trail are not part of it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{snapshot::SnapshotRegistry, storage::Store, Result};

pub mod json;

/// Borrowed view used when writing, so saving never copies the store.
#[derive(Debug, Serialize)]
pub struct DocumentRef<'a> {
    pub store: &'a Store,
    pub snapshot_id: u64,
    pub snapshots: &'a BTreeMap<u64, Store>,
}

impl<'a> DocumentRef<'a> {
    pub fn new(store: &'a Store, registry: &'a SnapshotRegistry) -> Self {
        Self {
            store,
            snapshot_id: registry.last_id(),
            snapshots: registry.snapshots(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Document {
    pub store: Store,
    pub snapshot_id: u64,
    pub snapshots: BTreeMap<u64, Store>,
}

impl Document {
    /// Validates the document and splits it into live state.
    pub fn into_parts(self) -> Result<(Store, SnapshotRegistry)> {
        let registry = SnapshotRegistry::from_parts(self.snapshot_id, self.snapshots)?;
        Ok((self.store, registry))
    }
}
