//! JSON Storage Layout Tests
//!
//! Tests for:
//! - On-disk layout: table name -> decimal-string id -> fields
//! - Existing files in that layout are readable
//! - Empty files read as "no data"; malformed files are reported
//! - File options (indent, create_dirs, read_only)
//! - Database-level helpers over a JSON file

use std::fs;

use jotdb::database::{open_json, DatabaseConfig};
use jotdb::storage::{JsonStorage, JsonStorageOptions, Storage, StorageError};
use jotdb::table::TableError;
use jotdb::Fields;
use serde_json::{json, Value};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn doc(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("not an object: {}", other),
    }
}

fn read_json(path: &std::path::Path) -> Value {
    serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

// =============================================================================
// Layout
// =============================================================================

/// Inserts land under the table name, keyed by string ids.
#[test]
fn test_written_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");

    let mut db = open_json(&path, &DatabaseConfig::default()).unwrap();
    db.default_table().insert(doc(json!({"name": "Ann"}))).unwrap();
    db.table("pets").insert(doc(json!({"kind": "cat"}))).unwrap();
    db.close().unwrap();

    assert_eq!(
        read_json(&path),
        json!({
            "_default": {"1": {"name": "Ann"}},
            "pets": {"1": {"kind": "cat"}}
        })
    );
}

/// A file written elsewhere in the same layout is readable, ids included.
#[test]
fn test_reads_existing_layout() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");
    fs::write(
        &path,
        r#"{"_default": {"3": {"a": 1}, "10": {"a": 2}}, "other": {}}"#,
    )
    .unwrap();

    let mut db = open_json(&path, &DatabaseConfig::default()).unwrap();
    let table = db.default_table();
    let ids: Vec<u64> = table.all().unwrap().iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![3, 10]);
    assert_eq!(table.insert(doc(json!({"a": 3}))).unwrap(), 11);

    let names: Vec<String> = db.tables().unwrap().into_iter().collect();
    assert_eq!(names, vec!["_default".to_string(), "other".to_string()]);
}

/// A newly created file holds no data.
#[test]
fn test_empty_file_reads_as_none() {
    let temp_dir = TempDir::new().unwrap();
    let mut storage = JsonStorage::open(temp_dir.path().join("db.json")).unwrap();
    assert!(storage.read().unwrap().is_none());
}

/// Malformed content surfaces through table operations unchanged.
#[test]
fn test_malformed_file_is_reported() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");
    fs::write(&path, "{\"_default\": ").unwrap();

    let mut db = open_json(&path, &DatabaseConfig::default()).unwrap();
    let err = db.default_table().all().unwrap_err();
    assert!(matches!(
        err,
        TableError::Storage(StorageError::Corrupt { .. })
    ));
}

// =============================================================================
// Options
// =============================================================================

/// The indent option pretty-prints the file.
#[test]
fn test_indent_option() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");
    let config = DatabaseConfig {
        indent: Some(2),
        ..DatabaseConfig::default()
    };

    let mut db = open_json(&path, &config).unwrap();
    db.default_table().insert(doc(json!({"a": 1}))).unwrap();
    db.close().unwrap();

    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("\n  \"_default\""));
    assert_eq!(read_json(&path), json!({"_default": {"1": {"a": 1}}}));
}

/// Missing parent directories are created on request.
#[test]
fn test_create_dirs_option() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("nested/deeper/db.json");

    let options = JsonStorageOptions {
        create_dirs: true,
        ..JsonStorageOptions::default()
    };
    JsonStorage::open_with(&path, options).unwrap();
    assert!(path.exists());
}

/// Read-only storages refuse writes.
#[test]
fn test_read_only_rejects_writes() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");
    fs::write(&path, r#"{"t": {"1": {"a": 1}}}"#).unwrap();

    let options = JsonStorageOptions {
        read_only: true,
        ..JsonStorageOptions::default()
    };
    let mut storage = JsonStorage::open_with(&path, options).unwrap();
    let data = storage.read().unwrap().unwrap();

    assert!(matches!(storage.write(&data), Err(StorageError::ReadOnly)));
}

/// Buffered databases persist on close.
#[test]
fn test_buffered_database_persists_on_close() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");
    let config = DatabaseConfig {
        buffered_writes: true,
        ..DatabaseConfig::default()
    };

    let mut db = open_json(&path, &config).unwrap();
    db.default_table().insert(doc(json!({"a": 1}))).unwrap();
    assert_eq!(fs::read_to_string(&path).unwrap(), "");

    db.close().unwrap();
    assert_eq!(read_json(&path), json!({"_default": {"1": {"a": 1}}}));
}

/// Dropping a table removes it from the file.
#[test]
fn test_drop_table_persists() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("db.json");

    let mut db = open_json(&path, &DatabaseConfig::default()).unwrap();
    db.table("a").insert(doc(json!({}))).unwrap();
    db.table("b").insert(doc(json!({}))).unwrap();
    assert!(db.drop_table("a").unwrap());

    assert_eq!(read_json(&path), json!({"b": {"1": {}}}));
}
