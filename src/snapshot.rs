use std::collections::BTreeMap;

use crate::{storage::Store, Error, Result};

/// A frozen copy of the store as it was when the snapshot was taken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot<'a> {
    pub id: u64,
    pub store: &'a Store,
}

/// Snapshots keyed by id. Ids come from a counter that only ever grows,
/// so an id is never handed out twice.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotRegistry {
    last_id: u64,
    snapshots: BTreeMap<u64, Store>,
}

impl SnapshotRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds a registry from persisted parts, rejecting ids the counter has not reached.
    pub fn from_parts(last_id: u64, snapshots: BTreeMap<u64, Store>) -> Result<Self> {
        if let Some((&id, _)) = snapshots.last_key_value() {
            if id > last_id {
                return Err(Error::Inconsistent(format!(
                    "snapshot {} is newer than snapshot counter {}",
                    id, last_id
                )));
            }
        }
        Ok(Self { last_id, snapshots })
    }

    /// The id most recently assigned, or `0` if none has been.
    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub(crate) fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Stores an independent copy of `store` and returns its id.
    pub fn capture(&mut self, store: &Store) -> u64 {
        self.last_id += 1;
        self.snapshots.insert(self.last_id, store.clone());
        self.last_id
    }

    pub fn get(&self, id: u64) -> Option<&Store> {
        self.snapshots.get(&id)
    }

    /// Snapshots in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = Snapshot<'_>> {
        self.snapshots
            .iter()
            .map(|(&id, store)| Snapshot { id, store })
    }

    pub(crate) fn snapshots(&self) -> &BTreeMap<u64, Store> {
        &self.snapshots
    }
}
