//! In-memory storage.

use super::errors::StorageResult;
use super::{DatabaseSnapshot, Storage};

/// Keeps the last written snapshot in memory.
///
/// Read and write counters are exposed so callers can observe how often the
/// backend is actually touched.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    memory: Option<DatabaseSnapshot>,
    reads: u64,
    writes: u64,
}

impl MemoryStorage {
    /// Create an empty storage
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `read` calls served
    pub fn read_count(&self) -> u64 {
        self.reads
    }

    /// Number of `write` calls received
    pub fn write_count(&self) -> u64 {
        self.writes
    }

    /// Last written snapshot, without counting a read
    pub fn peek(&self) -> Option<&DatabaseSnapshot> {
        self.memory.as_ref()
    }
}

impl Storage for MemoryStorage {
    fn read(&mut self) -> StorageResult<Option<DatabaseSnapshot>> {
        self.reads += 1;
        Ok(self.memory.clone())
    }

    fn write(&mut self, data: &DatabaseSnapshot) -> StorageResult<()> {
        self.writes += 1;
        self.memory = Some(data.clone());
        Ok(())
    }

    fn close(&mut self) -> StorageResult<()> {
        self.memory = None;
        Ok(())
    }
}
