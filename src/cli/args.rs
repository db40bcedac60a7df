//! CLI argument definitions using clap
//!
//! Commands:
//! - jotdb insert '<json object>'
//! - jotdb all
//! - jotdb get <id>
//! - jotdb search --field <a.b> --eq <json>
//! - jotdb count --field <a.b> --gt <json>
//! - jotdb remove <id>...
//! - jotdb truncate
//! - jotdb tables
//! - jotdb drop-table <name>

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::document::DocId;

/// jotdb - A small embeddable document store
#[derive(Parser, Debug)]
#[command(name = "jotdb")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the database file
    #[arg(long, default_value = "./jotdb.json")]
    pub db: PathBuf,

    /// Table to operate on (default: the configured default table)
    #[arg(long)]
    pub table: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert a JSON object and print its id
    Insert {
        /// Document as a JSON object
        document: String,
    },

    /// Print every document
    All,

    /// Print the document with the given id
    Get {
        /// Document id
        id: DocId,
    },

    /// Print documents matching a condition
    Search(FilterArgs),

    /// Count documents matching a condition
    Count(FilterArgs),

    /// Remove documents by id
    Remove {
        /// Document ids
        #[arg(required = true)]
        ids: Vec<DocId>,
    },

    /// Remove every document in the table
    Truncate,

    /// List tables present in the database
    Tables,

    /// Drop a table and its documents
    DropTable {
        /// Table name
        name: String,
    },
}

/// A single-field condition
#[derive(Args, Debug, Clone)]
pub struct FilterArgs {
    /// Dotted field path, e.g. `address.city`
    #[arg(long)]
    pub field: String,

    #[command(flatten)]
    pub comparison: Comparison,
}

/// Comparison to apply to the field. Values are parsed as JSON, falling back
/// to a plain string.
#[derive(Args, Debug, Clone, Default)]
#[group(required = true, multiple = false)]
pub struct Comparison {
    #[arg(long)]
    pub eq: Option<String>,
    #[arg(long)]
    pub ne: Option<String>,
    #[arg(long)]
    pub lt: Option<String>,
    #[arg(long)]
    pub le: Option<String>,
    #[arg(long)]
    pub gt: Option<String>,
    #[arg(long)]
    pub ge: Option<String>,
    /// Full-match regular expression
    #[arg(long)]
    pub matches: Option<String>,
    /// Field is present
    #[arg(long)]
    pub exists: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from([
            "jotdb", "--db", "x.json", "search", "--field", "a.b", "--eq", "3",
        ])
        .unwrap();

        match cli.command {
            Command::Search(filter) => {
                assert_eq!(filter.field, "a.b");
                assert_eq!(filter.comparison.eq.as_deref(), Some("3"));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_search_requires_comparison() {
        assert!(Cli::try_parse_from(["jotdb", "search", "--field", "a"]).is_err());
    }

    #[test]
    fn test_remove_requires_ids() {
        assert!(Cli::try_parse_from(["jotdb", "remove"]).is_err());
        let cli = Cli::try_parse_from(["jotdb", "--table", "t", "remove", "1", "2"]).unwrap();
        assert_eq!(cli.table.as_deref(), Some("t"));
        assert!(matches!(cli.command, Command::Remove { ref ids } if ids == &vec![1, 2]));
    }
}
