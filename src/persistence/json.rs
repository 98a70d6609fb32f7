use std::{
    fs::{self, File},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use tracing::debug;

use super::{Document, DocumentRef};
use crate::{Error, Result};

/// A database document stored as pretty-printed JSON at a single path.
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<path>.tmp`, which never collides with the destination itself.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    /// Writes to a temporary sibling first and renames it into place, so the
    /// destination is either the old document or the complete new one.
    pub fn save(&self, document: &DocumentRef<'_>) -> Result<()> {
        let temp_path = self.temp_path();
        let file = File::create(&temp_path).map_err(|source| Error::Open {
            path: self.path.clone(),
            source,
        })?;
        let mut writer = BufWriter::new(file);

        if let Err(e) = write_document(&mut writer, document) {
            let _ = fs::remove_file(&temp_path);
            return Err(e);
        }
        drop(writer);

        fs::rename(&temp_path, &self.path)?;
        debug!("Wrote {:?}", self.path);
        Ok(())
    }

    /// Reads the document. A missing or empty file yields `Ok(None)`.
    pub fn load(&self) -> Result<Option<Document>> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(Error::Open {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if bytes.is_empty() {
            return Ok(None);
        }

        serde_json::from_slice(&bytes).map(Some).map_err(Error::Parse)
    }
}

fn write_document(writer: &mut BufWriter<File>, document: &DocumentRef<'_>) -> Result<()> {
    let mut serializer =
        serde_json::Serializer::with_formatter(&mut *writer, PrettyFormatter::with_indent(b"    "));
    document.serialize(&mut serializer).map_err(|e| {
        if e.is_io() {
            Error::Io(e.into())
        } else {
            Error::Serialize(e)
        }
    })?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    Ok(())
}
