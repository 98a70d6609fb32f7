use std::{io, path::PathBuf};

use thiserror::Error;

pub mod audit;
pub mod clock;
pub mod commands;
pub mod config;
pub mod db;
pub mod history;
pub mod persistence;
pub mod snapshot;
pub mod storage;

pub use clock::{Clock, ManualClock, SystemClock};
pub use db::{Database, LoadOutcome};
pub use storage::{Entry, Lookup, Store};

#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to open {path:?}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("Parse error: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("Inconsistent document: {0}")]
    Inconsistent(String),

    #[error("{0}")]
    Command(String),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
