use std::{fmt::Write, path::PathBuf};

use crate::{config::Config, Clock, Database, Error, LoadOutcome, Lookup, Result};

pub const HELP: &str = "Available commands:
 set <key> <value>
 setttl <key> <value> <ttl>
 get <key>
 del <key>
 undo
 redo
 snapshot
 restore <id>
 save <filename>
 load <filename>
 listSnapshots
 printStore
 audit
 exit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Set {
        key: String,
        value: String,
        /// `None` means the configured default.
        ttl: Option<i64>,
    },
    Get(String),
    Delete(String),
    Undo,
    Redo,
    Snapshot,
    Restore(u64),
    Save(PathBuf),
    Load(PathBuf),
    ListSnapshots,
    PrintStore,
    Audit,
    Help,
    Exit,
}

fn expect_args<'a>(args: &[&'a str], count: usize, usage: &str) -> Result<Vec<&'a str>> {
    if args.len() != count {
        return Err(Error::Command(format!("Usage: {}", usage)));
    }
    Ok(args.to_vec())
}

impl Command {
    /// Parses one line of input. A blank line yields `Ok(None)`.
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let mut words = line.split_whitespace();
        let Some(command) = words.next() else {
            return Ok(None);
        };
        let args: Vec<&str> = words.collect();

        let command = match command {
            "set" => {
                let args = expect_args(&args, 2, "set <key> <value>")?;
                Command::Set {
                    key: args[0].to_string(),
                    value: args[1].to_string(),
                    ttl: None,
                }
            }
            "setttl" => {
                let usage = "setttl <key> <value> <ttl>";
                let args = expect_args(&args, 3, usage)?;
                let ttl = args[2]
                    .parse::<i64>()
                    .map_err(|_| Error::Command(format!("Usage: {}", usage)))?;
                Command::Set {
                    key: args[0].to_string(),
                    value: args[1].to_string(),
                    ttl: Some(ttl),
                }
            }
            "get" => Command::Get(expect_args(&args, 1, "get <key>")?[0].to_string()),
            "del" => Command::Delete(expect_args(&args, 1, "del <key>")?[0].to_string()),
            "restore" => {
                let usage = "restore <id>";
                let id = expect_args(&args, 1, usage)?[0]
                    .parse::<u64>()
                    .map_err(|_| Error::Command(format!("Usage: {}", usage)))?;
                Command::Restore(id)
            }
            "save" => Command::Save(expect_args(&args, 1, "save <filename>")?[0].into()),
            "load" => Command::Load(expect_args(&args, 1, "load <filename>")?[0].into()),
            "undo" | "redo" | "snapshot" | "listSnapshots" | "printStore" | "audit" | "help"
            | "exit"
                if !args.is_empty() =>
            {
                return Err(Error::Command(format!("{} takes no arguments", command)));
            }
            "undo" => Command::Undo,
            "redo" => Command::Redo,
            "snapshot" => Command::Snapshot,
            "listSnapshots" => Command::ListSnapshots,
            "printStore" => Command::PrintStore,
            "audit" => Command::Audit,
            "help" => Command::Help,
            "exit" => Command::Exit,
            _ => return Err(Error::Command("Unknown command".into())),
        };

        Ok(Some(command))
    }

    /// Runs the command and renders its result for the terminal.
    pub fn execute<C: Clock>(&self, db: &mut Database<C>, config: &Config) -> String {
        match self {
            Command::Set { key, value, ttl } => {
                let ttl = ttl.unwrap_or(config.default_ttl);
                db.set(key.as_str(), value.as_str(), ttl);
                format!("Key '{}' set with TTL of {} seconds", key, ttl)
            }
            Command::Get(key) => match db.get(key) {
                Lookup::Value(value) => value,
                Lookup::Expired => "Key expired".into(),
                Lookup::NotFound => "Key not found".into(),
            },
            Command::Delete(key) => {
                if db.delete(key) {
                    format!("Key '{}' deleted.", key)
                } else {
                    "Key not found.".into()
                }
            }
            Command::Undo => match db.undo() {
                true => "Undo performed.".into(),
                false => "Nothing to undo.".into(),
            },
            Command::Redo => match db.redo() {
                true => "Redo performed.".into(),
                false => "Nothing to redo.".into(),
            },
            Command::Snapshot => format!("Snapshot created with ID: {}", db.snapshot()),
            Command::Restore(id) => {
                if db.restore(*id) {
                    format!("Snapshot {} restored successfully.", id)
                } else {
                    "Snapshot not found!".into()
                }
            }
            Command::Save(path) => match db.save(path) {
                Ok(()) => format!("Database saved to {}", path.display()),
                Err(e) => format!("Failed to save database: {}", e),
            },
            Command::Load(path) => match db.load(path) {
                Ok(LoadOutcome::Loaded) => format!("Database loaded from {}", path.display()),
                Ok(LoadOutcome::NoPriorState) => {
                    "No valid previous database found. Starting fresh.".into()
                }
                Err(e) => format!("Failed to load database: {}", e),
            },
            Command::ListSnapshots => {
                let mut out = String::from("Available Snapshots:");
                let snapshots = db.list_snapshots();
                if snapshots.is_empty() {
                    out.push_str("\n(no snapshots)");
                }
                for snapshot in snapshots {
                    let _ = write!(out, "\nSnapshot ID: {}", snapshot.id);
                    for (key, entry) in snapshot.store.iter() {
                        let _ = write!(out, "\n{}: {}", key, entry.value);
                    }
                }
                out
            }
            Command::PrintStore => {
                let mut out = String::from("Current Store:");
                let entries = db.list_store();
                if entries.is_empty() {
                    out.push_str("\n(empty)");
                }
                for (key, entry) in entries {
                    let _ = write!(out, "\n{}: {}", key, entry.value);
                }
                out
            }
            Command::Audit => {
                let mut out = String::from("Audit Log:");
                if db.audit_log().is_empty() {
                    out.push_str("\n(No actions logged yet)");
                }
                for entry in db.audit_log() {
                    let _ = write!(out, "\n{}", entry);
                }
                out
            }
            Command::Help => HELP.into(),
            Command::Exit => String::new(),
        }
    }
}
