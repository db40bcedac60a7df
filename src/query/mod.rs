//! Query engine for jotdb
//!
//! Builds composable predicates over documents.
//!
//! # Evaluation
//!
//! 1. Walk the path (field lookups and named transforms)
//! 2. Apply the terminal test to the resolved value
//! 3. Any failed step resolves to "no match"; evaluation never errors
//!
//! # Keys
//!
//! Every instance carries an optional structural key (`Frozen`). Identical
//! constructions produce equal keys and AND/OR keys are order-independent.
//! Only keyed instances are eligible for a table's query cache.
//!
//! Usage errors (empty path, bad regex) surface when the query is built.

mod builder;
mod compare;
mod errors;
mod freeze;
mod instance;

pub use builder::{field, Condition, PathStep, Query, RegexFlags};
pub use errors::{QueryError, QueryResult};
pub use freeze::{freeze, Frozen};
pub use instance::{QueryInstance, QueryLike};
