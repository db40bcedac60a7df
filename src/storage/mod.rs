//! Storage subsystem for jotdb
//!
//! A storage persists the complete database state and nothing else: it reads
//! the whole snapshot and overwrites the whole snapshot. Tables do all
//! read-modify-write work on top of it.
//!
//! # Contract
//!
//! - `read` returns `None` when no data has been written yet
//! - `write` fully replaces the persisted state
//! - `close` releases resources; the default is a no-op
//!
//! Nothing here coordinates concurrent writers. Two handles on the same
//! backing file can lose each other's updates.

mod errors;
mod json;
mod memory;

use std::collections::BTreeMap;

use crate::document::{DocId, Fields};

pub use errors::{StorageError, StorageResult};
pub use json::{JsonStorage, JsonStorageOptions};
pub use memory::MemoryStorage;

/// Persisted state of one table: document id → fields.
///
/// Serialized with decimal-string keys.
pub type TableSnapshot = BTreeMap<DocId, Fields>;

/// Persisted state of a database: table name → table snapshot.
pub type DatabaseSnapshot = BTreeMap<String, TableSnapshot>;

/// Pluggable persistence backend.
pub trait Storage {
    /// Read the full database state; `None` when empty.
    fn read(&mut self) -> StorageResult<Option<DatabaseSnapshot>>;

    /// Replace the full database state.
    fn write(&mut self, data: &DatabaseSnapshot) -> StorageResult<()>;

    /// Release resources held by the storage.
    fn close(&mut self) -> StorageResult<()> {
        Ok(())
    }
}

impl<S: Storage + ?Sized> Storage for Box<S> {
    fn read(&mut self) -> StorageResult<Option<DatabaseSnapshot>> {
        (**self).read()
    }

    fn write(&mut self, data: &DatabaseSnapshot) -> StorageResult<()> {
        (**self).write(data)
    }

    fn close(&mut self) -> StorageResult<()> {
        (**self).close()
    }
}
