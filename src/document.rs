//! Documents and document identifiers.
//!
//! A document is a raw field mapping paired with its table-scoped id. The id
//! is attached on read and is never stored inside the persisted fields.

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Table-scoped document identifier. The first id issued is 1.
pub type DocId = u64;

/// The raw field mapping of a document.
pub type Fields = Map<String, Value>;

/// A stored document together with its id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document id
    pub id: DocId,
    /// Document fields
    pub fields: Fields,
}

impl Document {
    /// Create a document with an explicit id
    pub fn new(id: DocId, fields: Fields) -> Self {
        Self { id, fields }
    }

    /// Consume the document, returning its fields
    pub fn into_fields(self) -> Fields {
        self.fields
    }

    /// Fields plus the id under `_id`, for display
    pub fn to_value_with_id(&self) -> Value {
        let mut object = self.fields.clone();
        object.insert("_id".to_string(), Value::from(self.id));
        Value::Object(object)
    }
}

impl Deref for Document {
    type Target = Fields;

    fn deref(&self) -> &Fields {
        &self.fields
    }
}

/// Build `Fields` from a JSON value.
///
/// Returns `None` unless the value is an object.
pub fn fields_from_value(value: Value) -> Option<Fields> {
    match value {
        Value::Object(map) => Some(map),
        _ => None,
    }
}
