//! Observable events for jotdb
//!
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    /// Database configuration loaded
    ConfigLoaded,

    // Table writes
    /// Documents inserted
    TableInsert,
    /// Documents updated
    TableUpdate,
    /// Documents removed
    TableRemove,
    /// Table emptied
    TableTruncate,
    /// Table dropped from the database
    TableDropped,

    // Query cache
    /// Search answered from the query cache
    QueryCacheHit,
    /// Search answered by a full scan
    QueryCacheMiss,

    // Storage
    /// Buffered snapshot written to the wrapped storage
    CacheFlush,
    /// Storage closed
    StorageClose,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::TableInsert => "TABLE_INSERT",
            Event::TableUpdate => "TABLE_UPDATE",
            Event::TableRemove => "TABLE_REMOVE",
            Event::TableTruncate => "TABLE_TRUNCATE",
            Event::TableDropped => "TABLE_DROPPED",
            Event::QueryCacheHit => "QUERY_CACHE_HIT",
            Event::QueryCacheMiss => "QUERY_CACHE_MISS",
            Event::CacheFlush => "CACHE_FLUSH",
            Event::StorageClose => "STORAGE_CLOSE",
        }
    }

    /// Severity at which this event is logged
    pub fn severity(&self) -> Severity {
        match self {
            Event::TableInsert
            | Event::TableUpdate
            | Event::TableRemove
            | Event::QueryCacheHit
            | Event::QueryCacheMiss => Severity::Trace,
            Event::ConfigLoaded
            | Event::TableTruncate
            | Event::TableDropped
            | Event::CacheFlush
            | Event::StorageClose => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_names_are_screaming_snake() {
        for event in [
            Event::ConfigLoaded,
            Event::TableInsert,
            Event::QueryCacheMiss,
            Event::CacheFlush,
        ] {
            let name = event.as_str();
            assert!(name.chars().all(|c| c.is_ascii_uppercase() || c == '_'));
        }
    }

    #[test]
    fn test_per_operation_events_are_trace() {
        assert_eq!(Event::TableInsert.severity(), Severity::Trace);
        assert_eq!(Event::QueryCacheHit.severity(), Severity::Trace);
        assert_eq!(Event::CacheFlush.severity(), Severity::Info);
    }
}
