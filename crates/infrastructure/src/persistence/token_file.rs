//! File-backed token storage.
//!
//! Stores the session entries in the platform-specific config directory:
//! - Linux: ~/.config/agenda/session.json
//! - macOS: ~/Library/Application Support/agenda/session.json
//! - Windows: %APPDATA%/agenda/session.json
//!
//! The document is versioned so a future layout change can be detected
//! instead of misread.
//!
//! Every call does blocking `std::fs` I/O on the calling thread, under the
//! adapter's lock. Each call reads or rewrites one small file.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use agenda_application::ports::{KeyValueStorage, StorageError};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::ser::{PrettyFormatter, Serializer};
use tracing::debug;

/// Current layout version of the session file.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct SessionDocument {
    schema_version: u32,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl Default for SessionDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

/// Durable [`KeyValueStorage`] backed by one JSON file.
///
/// Every call reads the file; writes replace it atomically through a
/// temporary sibling and a rename.
#[derive(Debug)]
pub struct FileTokenStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStorage {
    /// Creates a storage writing to `path`. The file is created on the
    /// first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Returns the platform default location of the session file.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("agenda").join("session.json"))
    }

    /// Returns the file this storage reads and writes.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<SessionDocument, StorageError> {
        let content = match fs::read(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SessionDocument::default()),
            Err(e) => return Err(e.into()),
        };

        let document: SessionDocument = serde_json::from_slice(&content)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;

        if document.schema_version != SCHEMA_VERSION {
            return Err(StorageError::SchemaMismatch {
                expected: SCHEMA_VERSION,
                found: document.schema_version,
            });
        }
        Ok(document)
    }

    fn save(&self, document: &SessionDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut buffer = Vec::new();
        let mut serializer =
            Serializer::with_formatter(&mut buffer, PrettyFormatter::with_indent(b"  "));
        document
            .serialize(&mut serializer)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        buffer.push(b'\n');

        let tmp = self.path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            restrict_permissions(&file)?;
            file.write_all(&buffer)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        debug!(
            path = %self.path.display(),
            entries = document.entries.len(),
            "session file written"
        );
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(file: &fs::File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_file: &fs::File) -> io::Result<()> {
    Ok(())
}

impl KeyValueStorage for FileTokenStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.lock.lock();
        Ok(self.load()?.entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut document = self.load()?;
        document.entries.insert(key.to_string(), value.to_string());
        self.save(&document)
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.lock.lock();
        let mut document = self.load()?;
        if document.entries.remove(key).is_some() {
            self.save(&document)?;
        }
        Ok(())
    }
}
