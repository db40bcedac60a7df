//! Database: a registry of tables over one storage.

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::rc::Rc;

use crate::middleware::CachingMiddleware;
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{DatabaseSnapshot, JsonStorage, JsonStorageOptions, Storage, StorageResult};
use crate::table::Table;

use super::config::DatabaseConfig;

/// A set of named tables sharing one storage.
///
/// Table handles are created on first access and reused afterwards, so the
/// query cache and id counter of a table live as long as the database.
pub struct Database<S: Storage> {
    storage: Rc<RefCell<S>>,
    config: DatabaseConfig,
    tables: HashMap<String, Table<S>>,
}

impl<S: Storage> Database<S> {
    /// Open a database with default configuration
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, DatabaseConfig::default())
    }

    /// Open a database with explicit configuration
    pub fn with_config(storage: S, config: DatabaseConfig) -> Self {
        Self {
            storage: Rc::new(RefCell::new(storage)),
            config,
            tables: HashMap::new(),
        }
    }

    /// Active configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Shared storage handle
    pub fn storage(&self) -> &Rc<RefCell<S>> {
        &self.storage
    }

    /// Handle for table `name`, created on first access.
    pub fn table(&mut self, name: &str) -> &mut Table<S> {
        let storage = &self.storage;
        let cache_size = self.config.query_cache_size;
        self.tables
            .entry(name.to_string())
            .or_insert_with(|| Table::with_cache_size(Rc::clone(storage), name, cache_size))
    }

    /// Handle for the configured default table
    pub fn default_table(&mut self) -> &mut Table<S> {
        let name = self.config.default_table.clone();
        self.table(&name)
    }

    /// Names of all tables present in storage
    pub fn tables(&self) -> StorageResult<BTreeSet<String>> {
        let data = self.storage.borrow_mut().read()?;
        Ok(data
            .map(|tables| tables.into_keys().collect())
            .unwrap_or_default())
    }

    /// Remove table `name` and its documents.
    ///
    /// Returns false when the table did not exist in storage.
    pub fn drop_table(&mut self, name: &str) -> StorageResult<bool> {
        self.tables.remove(name);

        let mut storage = self.storage.borrow_mut();
        let Some(mut data) = storage.read()? else {
            return Ok(false);
        };
        if data.remove(name).is_none() {
            return Ok(false);
        }
        storage.write(&data)?;

        log_event_with_fields(Event::TableDropped, &[("table", name)]);
        Ok(true)
    }

    /// Remove every table.
    pub fn drop_tables(&mut self) -> StorageResult<()> {
        self.storage.borrow_mut().write(&DatabaseSnapshot::new())?;
        self.tables.clear();

        log_event_with_fields(Event::TableDropped, &[("table", "*")]);
        Ok(())
    }

    /// Close the underlying storage
    pub fn close(&mut self) -> StorageResult<()> {
        self.storage.borrow_mut().close()?;
        log_event_with_fields(Event::StorageClose, &[]);
        Ok(())
    }
}

/// Open a JSON-file database as configured.
///
/// With `buffered_writes` the file storage is wrapped in a
/// `CachingMiddleware`; call `close` to flush it.
pub fn open_json(
    path: impl AsRef<Path>,
    config: &DatabaseConfig,
) -> StorageResult<Database<Box<dyn Storage>>> {
    let options = JsonStorageOptions {
        create_dirs: config.create_dirs,
        read_only: false,
        indent: config.indent,
    };
    let storage = JsonStorage::open_with(path, options)?;

    let storage: Box<dyn Storage> = if config.buffered_writes {
        Box::new(CachingMiddleware::with_write_cache_size(
            storage,
            config.write_cache_size,
        ))
    } else {
        Box::new(storage)
    };

    Ok(Database::with_config(storage, config.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fields_from_value;
    use crate::storage::MemoryStorage;
    use serde_json::json;

    #[test]
    fn test_table_handles_are_reused() {
        let mut db = Database::new(MemoryStorage::new());
        let cond = crate::query::field("a").eq(1).unwrap();

        db.table("t")
            .insert(fields_from_value(json!({"a": 1})).unwrap())
            .unwrap();
        db.table("t").search(&cond).unwrap();

        assert_eq!(db.table("t").query_cache().len(), 1);
    }

    #[test]
    fn test_tables_lists_storage() {
        let mut db = Database::new(MemoryStorage::new());
        assert!(db.tables().unwrap().is_empty());

        db.default_table()
            .insert(fields_from_value(json!({})).unwrap())
            .unwrap();
        db.table("users")
            .insert(fields_from_value(json!({})).unwrap())
            .unwrap();

        let names: Vec<String> = db.tables().unwrap().into_iter().collect();
        assert_eq!(names, vec!["_default".to_string(), "users".to_string()]);
    }

    #[test]
    fn test_drop_table() {
        let mut db = Database::new(MemoryStorage::new());
        db.table("a")
            .insert(fields_from_value(json!({"x": 1})).unwrap())
            .unwrap();
        db.table("b")
            .insert(fields_from_value(json!({"x": 2})).unwrap())
            .unwrap();

        assert!(db.drop_table("a").unwrap());
        assert!(!db.drop_table("a").unwrap());
        assert_eq!(db.tables().unwrap().len(), 1);
        assert!(db.table("a").is_empty().unwrap());
    }

    #[test]
    fn test_drop_tables() {
        let mut db = Database::new(MemoryStorage::new());
        db.table("a")
            .insert(fields_from_value(json!({})).unwrap())
            .unwrap();

        db.drop_tables().unwrap();
        assert!(db.tables().unwrap().is_empty());
        assert_eq!(
            db.table("a")
                .insert(fields_from_value(json!({})).unwrap())
                .unwrap(),
            1
        );
    }

    #[test]
    fn test_custom_default_table() {
        let config = DatabaseConfig {
            default_table: "main".to_string(),
            ..DatabaseConfig::default()
        };
        let mut db = Database::with_config(MemoryStorage::new(), config);
        assert_eq!(db.default_table().name(), "main");
    }
}
