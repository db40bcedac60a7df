//! jotdb - A small embeddable document store
//!
//! Documents are JSON objects grouped into named tables. The whole database
//! lives in one storage snapshot; every table mutation is a read-modify-write
//! cycle against it.
//!
//! - `query`: predicate builder with structural cache keys
//! - `table`: document CRUD and the per-table query cache
//! - `storage`: the storage contract, JSON file and in-memory backends
//! - `middleware`: write-buffering storage decorator
//! - `database`: table registry and configuration

pub mod cache;
pub mod cli;
pub mod database;
pub mod document;
pub mod middleware;
pub mod observability;
pub mod query;
pub mod storage;
pub mod table;

pub use database::{open_json, Database, DatabaseConfig};
pub use document::{DocId, Document, Fields};
pub use query::{field, Query, QueryInstance, QueryLike};
pub use storage::{JsonStorage, MemoryStorage, Storage};
pub use table::{Table, Update};
