//! Write-buffering storage decorator.
//!
//! Reads are served from an in-memory buffer once one exists. An empty
//! backend (`None`) is not buffered, so it is asked again on the next read
//! until data is written or appears. Writes replace
//! the buffer and are only passed to the wrapped storage every
//! `write_cache_size` writes, on `flush`, or on `close`.
//!
//! Other handles reading the same underlying storage do not see buffered
//! writes until a flush happens.

use crate::observability::{log_event_with_fields, Event};
use crate::storage::{DatabaseSnapshot, Storage, StorageResult};

/// Default number of writes buffered before a flush.
pub const DEFAULT_WRITE_CACHE_SIZE: usize = 1000;

/// Storage decorator buffering writes in memory.
#[derive(Debug)]
pub struct CachingMiddleware<S: Storage> {
    storage: S,
    /// Latest known database state
    cache: Option<DatabaseSnapshot>,
    /// Writes accepted since the last flush
    pending_writes: usize,
    write_cache_size: usize,
}

impl<S: Storage> CachingMiddleware<S> {
    /// Wrap `storage` with the default flush threshold.
    pub fn new(storage: S) -> Self {
        Self::with_write_cache_size(storage, DEFAULT_WRITE_CACHE_SIZE)
    }

    /// Wrap `storage`, flushing every `write_cache_size` writes (minimum 1).
    pub fn with_write_cache_size(storage: S, write_cache_size: usize) -> Self {
        Self {
            storage,
            cache: None,
            pending_writes: 0,
            write_cache_size: write_cache_size.max(1),
        }
    }

    /// Flush threshold
    pub fn write_cache_size(&self) -> usize {
        self.write_cache_size
    }

    /// Writes buffered since the last flush
    pub fn pending_writes(&self) -> usize {
        self.pending_writes
    }

    /// Write the buffered state to the wrapped storage.
    ///
    /// Does nothing when no write is pending.
    pub fn flush(&mut self) -> StorageResult<()> {
        if self.pending_writes == 0 {
            return Ok(());
        }
        if let Some(data) = &self.cache {
            self.storage.write(data)?;
        }
        log_event_with_fields(
            Event::CacheFlush,
            &[("pending_writes", &self.pending_writes.to_string())],
        );
        self.pending_writes = 0;
        Ok(())
    }

    /// The wrapped storage
    pub fn inner(&self) -> &S {
        &self.storage
    }

    /// The wrapped storage, mutably. Bypasses the buffer.
    pub fn inner_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    /// Flush pending writes and unwrap the storage.
    pub fn into_inner(mut self) -> StorageResult<S> {
        self.flush()?;
        Ok(self.storage)
    }
}

impl<S: Storage> Storage for CachingMiddleware<S> {
    /// Serve the buffer, reading through while the backend has returned no
    /// data yet.
    fn read(&mut self) -> StorageResult<Option<DatabaseSnapshot>> {
        if self.cache.is_none() {
            self.cache = self.storage.read()?;
        }
        Ok(self.cache.clone())
    }

    fn write(&mut self, data: &DatabaseSnapshot) -> StorageResult<()> {
        self.cache = Some(data.clone());
        self.pending_writes += 1;

        if self.pending_writes >= self.write_cache_size {
            self.flush()?;
        }
        Ok(())
    }

    fn close(&mut self) -> StorageResult<()> {
        self.flush()?;
        self.storage.close()?;
        log_event_with_fields(Event::StorageClose, &[("middleware", "caching")]);
        Ok(())
    }
}
