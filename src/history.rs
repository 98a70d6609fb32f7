//! Single-level undo/redo over store mutations.
//!
//! Every recorded [`Action`] carries both the state it replaced and the state it
//! installed, so the same record can be moved between the undo and redo stacks
//! and replayed in either direction without consulting the store.

use crate::storage::{Entry, Store};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `prior` is `None` when the key did not exist before the set.
    Set {
        key: String,
        prior: Option<Entry>,
        entry: Entry,
    },
    Delete {
        key: String,
        prior: Entry,
    },
}

impl Action {
    pub fn key(&self) -> &str {
        match self {
            Action::Set { key, .. } | Action::Delete { key, .. } => key,
        }
    }

    /// Puts the store back the way it was before this action.
    fn revert(&self, store: &mut Store) {
        match self {
            Action::Set {
                key,
                prior: Some(prior),
                ..
            }
            | Action::Delete { key, prior } => {
                store.insert(key.clone(), prior.clone());
            }
            Action::Set {
                key, prior: None, ..
            } => {
                store.remove(key);
            }
        }
    }

    fn replay(&self, store: &mut Store) {
        match self {
            Action::Set { key, entry, .. } => {
                store.insert(key.clone(), entry.clone());
            }
            Action::Delete { key, .. } => {
                store.remove(key);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct ActionLog {
    undo: Vec<Action>,
    redo: Vec<Action>,
}

impl ActionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a fresh mutation. Any redo history is discarded.
    pub fn record(&mut self, action: Action) {
        self.undo.push(action);
        self.redo.clear();
    }

    /// Reverts the most recent action. Returns `None` if there is nothing to undo.
    pub fn undo(&mut self, store: &mut Store) -> Option<&Action> {
        let action = self.undo.pop()?;
        action.revert(store);
        self.redo.push(action);
        self.redo.last()
    }

    /// Replays the most recently undone action. Returns `None` if there is nothing to redo.
    pub fn redo(&mut self, store: &mut Store) -> Option<&Action> {
        let action = self.redo.pop()?;
        action.replay(store);
        self.undo.push(action);
        self.undo.last()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }
}
