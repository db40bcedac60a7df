//! JSON I/O handling for CLI
//!
//! - Input: JSON values passed as arguments
//! - Output: one JSON value per command on stdout

use std::io::{self, Write};

use serde_json::Value;

use super::errors::CliResult;

/// Parse an argument as JSON; anything that is not valid JSON is taken as a
/// plain string.
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Write a JSON value to stdout
pub fn write_json(value: &Value) -> CliResult<()> {
    let mut stdout = io::stdout().lock();
    serde_json::to_writer(&mut stdout, value)?;
    writeln!(stdout)?;
    stdout.flush()?;

    Ok(())
}
