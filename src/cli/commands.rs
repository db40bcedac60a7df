//! CLI command implementations
//!
//! Each invocation opens the database, runs one command against one table,
//! closes the storage (flushing any buffered writes) and prints the result.

use serde_json::{json, Value};

use crate::database::{open_json, Database, DatabaseConfig};
use crate::document::{fields_from_value, Document};
use crate::query::{field, Query, QueryInstance};
use crate::storage::Storage;
use crate::table::Table;

use super::args::{Cli, Command, Comparison, FilterArgs};
use super::errors::{CliError, CliResult};
use super::io::{parse_value, write_json};

/// Run a parsed command line and print its output
pub fn run_command(cli: Cli) -> CliResult<()> {
    let config = match &cli.config {
        Some(path) => DatabaseConfig::load(path)?,
        None => DatabaseConfig::default(),
    };
    config.apply_log_level()?;

    let mut db = open_json(&cli.db, &config)?;
    let output = execute(&mut db, cli.table.as_deref(), cli.command);
    let closed = db.close();

    let output = output?;
    closed?;
    write_json(&output)
}

/// Run one command against an open database
pub fn execute<S: Storage>(
    db: &mut Database<S>,
    table: Option<&str>,
    command: Command,
) -> CliResult<Value> {
    match command {
        Command::Insert { document } => {
            let fields = fields_from_value(serde_json::from_str(&document)?).ok_or_else(|| {
                CliError::InvalidDocument("document must be a JSON object".to_string())
            })?;
            let id = select_table(db, table).insert(fields)?;
            Ok(json!({ "id": id }))
        }
        Command::All => {
            let docs = select_table(db, table).all()?;
            Ok(documents_json(&docs))
        }
        Command::Get { id } => {
            let doc = select_table(db, table).get_by_id(id)?;
            Ok(doc.map_or(Value::Null, |doc| doc.to_value_with_id()))
        }
        Command::Search(filter) => {
            let query = build_query(&filter)?;
            let docs = select_table(db, table).search(&query)?;
            Ok(documents_json(&docs))
        }
        Command::Count(filter) => {
            let query = build_query(&filter)?;
            let count = select_table(db, table).count(&query)?;
            Ok(json!({ "count": count }))
        }
        Command::Remove { ids } => {
            let removed = select_table(db, table).remove(None, Some(ids.as_slice()))?;
            Ok(json!({ "removed": removed }))
        }
        Command::Truncate => {
            select_table(db, table).truncate()?;
            Ok(json!({ "truncated": true }))
        }
        Command::Tables => Ok(json!(db.tables()?)),
        Command::DropTable { name } => {
            let dropped = db.drop_table(&name)?;
            Ok(json!({ "dropped": dropped }))
        }
    }
}

fn select_table<'a, S: Storage>(db: &'a mut Database<S>, name: Option<&str>) -> &'a mut Table<S> {
    match name {
        Some(name) => db.table(name),
        None => db.default_table(),
    }
}

fn documents_json(docs: &[Document]) -> Value {
    Value::Array(docs.iter().map(Document::to_value_with_id).collect())
}

/// Build a query from a dotted path and a single comparison
pub fn build_query(filter: &FilterArgs) -> CliResult<QueryInstance> {
    let mut steps = filter.field.split('.');
    let mut query: Query = field(steps.next().unwrap_or_default());
    for step in steps {
        query = query.field(step);
    }

    let Comparison {
        eq,
        ne,
        lt,
        le,
        gt,
        ge,
        matches,
        exists,
    } = &filter.comparison;

    let instance = if let Some(raw) = eq {
        query.eq(parse_value(raw))?
    } else if let Some(raw) = ne {
        query.ne(parse_value(raw))?
    } else if let Some(raw) = lt {
        query.lt(parse_value(raw))?
    } else if let Some(raw) = le {
        query.le(parse_value(raw))?
    } else if let Some(raw) = gt {
        query.gt(parse_value(raw))?
    } else if let Some(raw) = ge {
        query.ge(parse_value(raw))?
    } else if let Some(pattern) = matches {
        query.matches(pattern)?
    } else if *exists {
        query.exists()?
    } else {
        return Err(CliError::Usage("a comparison is required".to_string()));
    };
    Ok(instance)
}
