//! CLI module for jotdb
//!
//! One-shot commands against a JSON database file:
//! - insert / all / get: write and read documents
//! - search / count: single-field conditions
//! - remove / truncate: delete documents
//! - tables / drop-table: manage tables

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Comparison, FilterArgs};
pub use commands::{build_query, execute, run_command};
pub use errors::{CliError, CliResult};
pub use io::{parse_value, write_json};

/// Parse the process arguments and run the selected command
pub fn run() -> CliResult<()> {
    run_command(Cli::parse_args())
}
