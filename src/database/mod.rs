//! Database subsystem for jotdb
//!
//! Owns the storage, hands out table handles and carries the configuration.

mod config;
#[allow(clippy::module_inception)]
mod database;

pub use config::{ConfigError, ConfigResult, DatabaseConfig};
pub use database::{open_json, Database};
