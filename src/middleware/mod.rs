//! Storage middlewares for jotdb
//!
//! A middleware wraps a storage and is itself a storage, so it can stand in
//! anywhere a plain storage is expected. Access to the wrapped storage is
//! explicit through `inner` / `inner_mut` / `into_inner`.

mod caching;

pub use caching::{CachingMiddleware, DEFAULT_WRITE_CACHE_SIZE};
