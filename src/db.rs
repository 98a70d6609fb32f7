use std::path::Path;

use tracing::{debug, info, warn};

use crate::{
    audit::{AuditEntry, AuditTrail},
    clock::{Clock, SystemClock},
    history::{Action, ActionLog},
    persistence::{json::JsonFile, DocumentRef},
    snapshot::{Snapshot, SnapshotRegistry},
    storage::{Entry, Lookup, Store},
    Result,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded,
    /// The source was missing or empty; nothing changed.
    NoPriorState,
}

/// A key-value store with expiring keys, undo/redo, snapshots and an audit trail.
///
/// All state for one database lives here. Nothing is global, so independent
/// instances can coexist. Callers that share a database across threads must
/// guard the whole value with a single lock: undo/redo and snapshot/restore
/// are not safe to interleave with other mutations.
pub struct Database<C = SystemClock> {
    clock: C,
    store: Store,
    history: ActionLog,
    snapshots: SnapshotRegistry,
    audit: AuditTrail,
}

impl Database<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Database<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Database<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            store: Store::new(),
            history: ActionLog::new(),
            snapshots: SnapshotRegistry::new(),
            audit: AuditTrail::new(),
        }
    }

    fn log(&mut self, description: String) {
        let now = self.clock.now();
        self.audit.record(now, description);
    }

    /// Sets `key`, expiring after `ttl` seconds. A TTL of zero or less never expires.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>, ttl: i64) {
        let key = key.into();
        let entry = Entry::with_ttl(value, ttl, self.clock.now());
        let description = format!("SET key: {} value: {} ttl: {}", key, entry.value, ttl);

        let prior = self.store.insert(key.clone(), entry.clone());
        self.history.record(Action::Set {
            key: key.clone(),
            prior,
            entry,
        });

        info!(key = %key, ttl, "set");
        self.log(description);
    }

    pub fn get(&mut self, key: &str) -> Lookup {
        let lookup = self.store.get(key, self.clock.now());
        if lookup == Lookup::Expired {
            debug!(key, "evicted expired key on read");
        }
        lookup
    }

    /// Removes `key`. Returns `false` if it was not present.
    pub fn delete(&mut self, key: &str) -> bool {
        let Some(prior) = self.store.remove(key) else {
            return false;
        };
        self.history.record(Action::Delete {
            key: key.to_string(),
            prior,
        });

        info!(key, "delete");
        self.log(format!("DELETE key: {}", key));
        true
    }

    /// Returns `false` if there was nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(key) = self
            .history
            .undo(&mut self.store)
            .map(|action| action.key().to_string())
        else {
            return false;
        };

        info!(key = %key, "undo");
        self.log(format!("UNDO action on key: {}", key));
        true
    }

    /// Returns `false` if there was nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(key) = self
            .history
            .redo(&mut self.store)
            .map(|action| action.key().to_string())
        else {
            return false;
        };

        info!(key = %key, "redo");
        self.log(format!("REDO action on key: {}", key));
        true
    }

    fn sweep_expired(&mut self) {
        let removed = self.store.sweep_expired(self.clock.now());
        if removed > 0 {
            debug!(removed, "swept expired keys");
        }
    }

    /// Captures the live store, minus expired keys, and returns the new snapshot id.
    pub fn snapshot(&mut self) -> u64 {
        self.sweep_expired();
        let id = self.snapshots.capture(&self.store);

        info!(id, keys = self.store.len(), "snapshot");
        self.log(format!("SNAPSHOT created with ID: {}", id));
        id
    }

    /// Replaces the live store with snapshot `id` and clears undo/redo history.
    /// Returns `false` and changes nothing if the snapshot does not exist.
    pub fn restore(&mut self, id: u64) -> bool {
        let Some(snapshot) = self.snapshots.get(id) else {
            return false;
        };
        self.store = snapshot.clone();
        self.history.clear();

        info!(id, "restore");
        self.log(format!("RESTORE snapshot ID: {}", id));
        true
    }

    /// All snapshots in id order, exactly as captured.
    pub fn list_snapshots(&mut self) -> Vec<Snapshot<'_>> {
        self.sweep_expired();
        self.snapshots.iter().collect()
    }

    /// Live entries in key order, after purging expired ones.
    pub fn list_store(&mut self) -> Vec<(&str, &Entry)> {
        self.sweep_expired();
        self.store
            .iter()
            .map(|(key, entry)| (key.as_str(), entry))
            .collect()
    }

    pub fn save(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = JsonFile::new(path);
        file.save(&DocumentRef::new(&self.store, &self.snapshots))?;

        info!(path = ?path, "saved database");
        self.log(format!("SAVE to file: {}", path.display()));
        Ok(())
    }

    /// Replaces the store and snapshots with the document at `path` and clears
    /// undo/redo history. On any error the database is left untouched.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<LoadOutcome> {
        let path = path.as_ref();
        let Some(document) = JsonFile::new(path).load()? else {
            warn!(path = ?path, "no previous database found, starting fresh");
            return Ok(LoadOutcome::NoPriorState);
        };
        let (store, snapshots) = document.into_parts()?;

        self.store = store;
        self.snapshots = snapshots;
        self.history.clear();

        info!(
            path = ?path,
            keys = self.store.len(),
            snapshots = self.snapshots.len(),
            "loaded database"
        );
        self.log(format!("LOAD from file: {}", path.display()));
        Ok(LoadOutcome::Loaded)
    }

    pub fn audit_log(&self) -> &[AuditEntry] {
        self.audit.entries()
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn history(&self) -> &ActionLog {
        &self.history
    }

    pub fn snapshots(&self) -> &SnapshotRegistry {
        &self.snapshots
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::{clock::ManualClock, Error};

    fn value(v: &str) -> Lookup {
        Lookup::Value(v.to_string())
    }

    #[test]
    fn set_then_get() {
        let clock = ManualClock::new(1_000);
        let mut db = Database::with_clock(&clock);

        db.set("a", "1", 0);
        assert_eq!(db.get("a"), value("1"));
        assert_eq!(db.get("missing"), Lookup::NotFound);
    }

    #[test]
    fn non_positive_ttl_never_expires() {
        let clock = ManualClock::new(0);
        let mut db = Database::with_clock(&clock);

        db.set("zero", "v", 0);
        db.set("negative", "v", -10);
        clock.advance(10_000_000);

        assert_eq!(db.get("zero"), value("v"));
        assert_eq!(db.get("negative"), value("v"));
    }

    #[test]
    fn expires_once_then_not_found() {
        let clock = ManualClock::new(0);
        let mut db = Database::with_clock(&clock);
        db.set("x", "v", 5);

        clock.set(5);
        assert_eq!(db.get("x"), value("v"));
        clock.set(6);
        assert_eq!(db.get("x"), Lookup::Expired);
        clock.set(7);
        assert_eq!(db.get("x"), Lookup::NotFound);
        assert!(db.history().undo_depth() == 1, "reads must not touch history");
    }

    #[test]
    fn undo_restores_previous_value() {
        let clock = ManualClock::new(0);
        let mut db = Database::with_clock(&clock);

        db.set("a", "1", 0);
        db.set("a", "2", 0);
        assert!(db.undo());
        assert_eq!(db.get("a"), value("1"));

        assert!(db.undo());
        let before = db.store().clone();
        assert!(!db.delete("a"));
        assert_eq!(db.store(), &before);
        assert_eq!(db.get("a"), Lookup::NotFound);
    }

    #[test]
    fn undo_redo_inverse_law() {
        let clock = ManualClock::new(50);
        let mut db = Database::with_clock(&clock);
        db.set("a", "1", 30);
        db.set("b", "2", 0);

        type Mutation = fn(&mut Database<&ManualClock>);
        let mutations: [Mutation; 3] = [
            |db| db.set("a", "overwrite", 10),
            |db| db.set("c", "fresh", 0),
            |db| {
                db.delete("b");
            },
        ];

        for mutation in mutations {
            let before = db.store().clone();
            mutation(&mut db);
            let after = db.store().clone();

            assert!(db.undo());
            assert_eq!(db.store(), &before);
            assert!(db.redo());
            assert_eq!(db.store(), &after);
        }
    }

    #[test]
    fn new_mutation_invalidates_redo() {
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);
        db.set("a", "2", 0);
        assert!(db.undo());

        db.set("b", "3", 0);
        assert!(!db.redo());
        assert_eq!(db.get("a"), value("1"));
    }

    #[test]
    fn nothing_to_undo_or_redo() {
        let mut db = Database::with_clock(ManualClock::new(0));
        assert!(!db.undo());
        assert!(!db.redo());
        assert!(db.audit_log().is_empty());
    }

    #[test]
    fn undo_reinstates_expired_entry_as_it_was() {
        let clock = ManualClock::new(0);
        let mut db = Database::with_clock(&clock);
        db.set("k", "v", 5);
        assert!(db.delete("k"));

        clock.set(10);
        assert!(db.undo());
        assert_eq!(db.store().entry("k"), Some(&Entry::with_ttl("v", 5, 0)));
        assert_eq!(db.get("k"), Lookup::Expired);
    }

    #[test]
    fn snapshot_is_isolated_from_later_writes() {
        let clock = ManualClock::new(0);
        let mut db = Database::with_clock(&clock);
        db.set("k", "old", 0);

        let id = db.snapshot();
        db.set("k", "new", 0);

        let frozen = db.snapshots().get(id).unwrap();
        assert_eq!(frozen.entry("k"), Some(&Entry::persistent("old")));
    }

    #[test]
    fn snapshot_sweeps_expired_keys_first() {
        let clock = ManualClock::new(0);
        let mut db = Database::with_clock(&clock);
        db.set("short", "v", 1);
        db.set("long", "v", 0);

        clock.set(2);
        let id = db.snapshot();
        let frozen = db.snapshots().get(id).unwrap();
        assert!(frozen.entry("short").is_none());
        assert!(frozen.entry("long").is_some());
    }

    #[test]
    fn restore_replaces_store_and_clears_history() {
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);
        let id = db.snapshot();
        db.set("a", "2", 0);
        db.set("b", "3", 0);
        db.undo();

        for _ in 0..2 {
            assert!(db.restore(id));
            assert_eq!(db.get("a"), value("1"));
            assert_eq!(db.get("b"), Lookup::NotFound);
            assert_eq!((db.history().undo_depth(), db.history().redo_depth()), (0, 0));
            assert!(!db.undo());
        }
    }

    #[test]
    fn restore_unknown_snapshot_changes_nothing() {
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);
        let before = db.store().clone();

        assert!(!db.restore(42));
        assert_eq!(db.store(), &before);
        assert_eq!(db.history().undo_depth(), 1);
    }

    #[test]
    fn restored_store_is_independent_of_snapshot() {
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);
        let id = db.snapshot();

        db.restore(id);
        db.set("a", "changed", 0);
        assert_eq!(
            db.snapshots().get(id).unwrap().entry("a"),
            Some(&Entry::persistent("1"))
        );
    }

    #[test]
    fn ids_are_not_reused_after_restore() {
        let mut db = Database::with_clock(ManualClock::new(0));
        let first = db.snapshot();
        let second = db.snapshot();
        db.restore(first);

        assert_eq!(db.snapshot(), second + 1);
    }

    #[test]
    fn listing_sweeps_live_store_but_not_snapshots() {
        let clock = ManualClock::new(0);
        let mut db = Database::with_clock(&clock);
        db.set("temp", "v", 5);
        db.snapshot();

        clock.set(10);
        let snapshots = db.list_snapshots();
        assert_eq!(snapshots.len(), 1);
        assert!(snapshots[0].store.entry("temp").is_some());
        assert!(db.store().is_empty());

        db.set("perm", "p", 0);
        assert_eq!(db.list_store(), vec![("perm", &Entry::persistent("p"))]);
    }

    #[test]
    fn audit_records_each_mutation() {
        let clock = ManualClock::new(77);
        let mut db = Database::with_clock(&clock);
        db.set("a", "1", 0);
        db.delete("a");
        db.delete("a");
        db.undo();
        db.redo();
        let id = db.snapshot();
        db.restore(id);

        let descriptions: Vec<_> = db
            .audit_log()
            .iter()
            .map(|entry| entry.description.as_str())
            .collect();
        assert_eq!(
            descriptions,
            vec![
                "SET key: a value: 1 ttl: 0",
                "DELETE key: a",
                "UNDO action on key: a",
                "REDO action on key: a",
                "SNAPSHOT created with ID: 1",
                "RESTORE snapshot ID: 1",
            ]
        );
        assert!(db.audit_log().iter().all(|entry| entry.timestamp == 77));
    }

    #[test]
    fn save_and_load_round_trip() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("db.json");
        let clock = ManualClock::new(1_000);

        let mut db = Database::with_clock(&clock);
        db.set("a", "1", 60);
        db.set("b", "2", 0);
        db.snapshot();
        db.delete("a");
        db.snapshot();
        db.set("c", "", 0);
        db.save(&path)?;

        let mut restored = Database::with_clock(&clock);
        assert_eq!(restored.load(&path)?, LoadOutcome::Loaded);
        assert_eq!(restored.store(), db.store());
        assert_eq!(restored.snapshots(), db.snapshots());
        assert_eq!(restored.snapshot(), 3);
        Ok(())
    }

    #[test]
    fn empty_key_survives_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("db.json");
        let clock = ManualClock::new(0);

        let mut db = Database::with_clock(&clock);
        db.set("", "v", 0);
        db.snapshot();
        db.save(&path)?;

        let mut other = Database::with_clock(&clock);
        assert_eq!(other.load(&path)?, LoadOutcome::Loaded);
        assert_eq!(other.get(""), value("v"));
        assert_eq!(other.snapshots(), db.snapshots());
        Ok(())
    }

    #[test]
    fn load_clears_history() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("db.json");
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);
        db.save(&path)?;

        db.set("a", "2", 0);
        db.load(&path)?;
        assert_eq!((db.history().undo_depth(), db.history().redo_depth()), (0, 0));
        assert!(!db.undo());
        assert_eq!(db.get("a"), value("1"));
        Ok(())
    }

    #[test]
    fn load_of_missing_file_changes_nothing() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);

        let outcome = db.load(temp_dir.path().join("absent.json"))?;
        assert_eq!(outcome, LoadOutcome::NoPriorState);
        assert_eq!(db.get("a"), value("1"));
        assert_eq!(db.history().undo_depth(), 1);
        Ok(())
    }

    #[test]
    fn failed_load_leaves_state_untouched() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);
        db.snapshot();
        let store = db.store().clone();
        let snapshots = db.snapshots().clone();

        let malformed = temp_dir.path().join("bad.json");
        fs::write(&malformed, "{\"store\": {\"a\": {\"value\": 1}}")?;
        assert!(matches!(db.load(&malformed), Err(Error::Parse(_))));

        let inconsistent = temp_dir.path().join("inconsistent.json");
        fs::write(
            &inconsistent,
            r#"{"store":{},"snapshot_id":0,"snapshots":{"1":{}}}"#,
        )?;
        assert!(matches!(db.load(&inconsistent), Err(Error::Inconsistent(_))));

        assert_eq!(db.store(), &store);
        assert_eq!(db.snapshots(), &snapshots);
        assert_eq!(db.history().undo_depth(), 1);
        Ok(())
    }

    #[test]
    fn failed_save_leaves_state_untouched() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let mut db = Database::with_clock(ManualClock::new(0));
        db.set("a", "1", 0);
        let audit_len = db.audit_log().len();

        let result = db.save(temp_dir.path().join("no_such_dir").join("db.json"));
        assert!(matches!(result, Err(Error::Open { .. })));
        assert_eq!(db.get("a"), value("1"));
        assert_eq!(db.audit_log().len(), audit_len);
        Ok(())
    }
}
