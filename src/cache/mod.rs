//! Query result cache for jotdb
//!
//! A strict LRU map backed by the `lru` crate. Tables key it by the
//! structural key of a query and store the matching documents.

mod lru_cache;

pub use lru_cache::{CacheStats, LruCache};
