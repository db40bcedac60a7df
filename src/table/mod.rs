//! Table subsystem for jotdb
//!
//! A table is a named slice of the database snapshot. It owns no data: every
//! read goes to the shared storage and every mutation is a full
//! read-modify-write cycle.
//!
//! # Usage
//!
//! ```ignore
//! use std::{cell::RefCell, rc::Rc};
//! use jotdb::query::field;
//! use jotdb::storage::MemoryStorage;
//! use jotdb::table::{operations::increment, Table};
//!
//! let mut users = Table::new(Rc::new(RefCell::new(MemoryStorage::new())), "users");
//! let id = users.insert(fields)?;
//! users.update(increment("logins"), Some(&field("name").eq("Ann")?), None)?;
//! ```

mod errors;
pub mod operations;
#[allow(clippy::module_inception)]
mod table;

pub use errors::{TableError, TableResult};
pub use operations::Update;
pub use table::{Table, DEFAULT_QUERY_CACHE_SIZE};
