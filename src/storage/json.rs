//! JSON file storage.
//!
//! Layout: one JSON object keyed by table name. Each table is an object keyed
//! by decimal-string document ids; each id maps to the document's fields.
//!
//! ```text
//! {"_default": {"1": {"name": "Ann"}, "2": {"name": "Bob"}}}
//! ```
//!
//! Every write replaces the whole file content.

use std::fs::{self, File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use super::errors::{StorageError, StorageResult};
use super::{DatabaseSnapshot, Storage};

/// Options for opening a `JsonStorage`.
#[derive(Debug, Clone, Default)]
pub struct JsonStorageOptions {
    /// Create missing parent directories
    pub create_dirs: bool,
    /// Open without write access; writes fail with `ReadOnly`
    pub read_only: bool,
    /// Pretty-print with this many spaces per level
    pub indent: Option<usize>,
}

/// Storage backed by a single JSON file.
#[derive(Debug)]
pub struct JsonStorage {
    path: PathBuf,
    /// `None` once closed
    file: Option<File>,
    options: JsonStorageOptions,
}

impl JsonStorage {
    /// Open (creating if needed) a JSON file for reading and writing.
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with(path, JsonStorageOptions::default())
    }

    /// Open with explicit options.
    ///
    /// Read-only storages never create the file; it must exist.
    pub fn open_with(path: impl AsRef<Path>, options: JsonStorageOptions) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = if options.read_only {
            File::open(&path).map_err(|e| StorageError::io(&path, e))?
        } else {
            if options.create_dirs {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    fs::create_dir_all(parent).map_err(|e| StorageError::io(parent, e))?;
                }
            }
            OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(&path)
                .map_err(|e| StorageError::io(&path, e))?
        };

        Ok(Self {
            path,
            file: Some(file),
            options,
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn encode(&self, data: &DatabaseSnapshot) -> StorageResult<Vec<u8>> {
        let encoded = match self.options.indent {
            None => serde_json::to_vec(data),
            Some(width) => {
                let indent = vec![b' '; width];
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
                let mut buffer = Vec::new();
                let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
                data.serialize(&mut serializer).map(|_| buffer)
            }
        };
        encoded.map_err(|e| StorageError::Encode(e.to_string()))
    }
}

impl Storage for JsonStorage {
    fn read(&mut self) -> StorageResult<Option<DatabaseSnapshot>> {
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;

        let mut content = String::new();
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.read_to_string(&mut content))
            .map_err(|e| StorageError::io(&self.path, e))?;

        // A freshly created file holds no data yet
        if content.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| StorageError::Corrupt {
                path: self.path.clone(),
                reason: e.to_string(),
            })
    }

    fn write(&mut self, data: &DatabaseSnapshot) -> StorageResult<()> {
        if self.options.read_only {
            return Err(StorageError::ReadOnly);
        }
        if self.file.is_none() {
            return Err(StorageError::Closed);
        }
        let bytes = self.encode(data)?;

        let path = &self.path;
        let file = self.file.as_mut().ok_or(StorageError::Closed)?;
        file.seek(SeekFrom::Start(0))
            .and_then(|_| file.write_all(&bytes))
            .and_then(|_| file.set_len(bytes.len() as u64))
            .and_then(|_| file.flush())
            .map_err(|e| StorageError::io(path, e))
    }

    fn close(&mut self) -> StorageResult<()> {
        self.file.take();
        Ok(())
    }
}
