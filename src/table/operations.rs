//! Update operations.
//!
//! An `Update` either merges a field mapping into each matched document or
//! runs a transform on the live field mapping. The helpers below build common
//! transforms:
//!
//! ```ignore
//! table.update(increment("visits"), Some(&field("name").eq("Ann")?), None)?;
//! table.update(delete("legacy"), None, None)?;
//! ```
//!
//! Arithmetic helpers leave missing and non-numeric fields untouched.

use std::fmt;
use std::sync::Arc;

use serde_json::{Number, Value};

use crate::document::Fields;

type UpdateFn = dyn Fn(&mut Fields) + Send + Sync;

/// A mutation applied to every matched document.
#[derive(Clone)]
pub enum Update {
    /// Merge these fields, overwriting existing keys
    Fields(Fields),
    /// Mutate the live field mapping in place
    Transform(Arc<UpdateFn>),
}

impl Update {
    /// Wrap a transform function
    pub fn transform<F>(func: F) -> Self
    where
        F: Fn(&mut Fields) + Send + Sync + 'static,
    {
        Update::Transform(Arc::new(func))
    }

    pub(crate) fn apply(&self, fields: &mut Fields) {
        match self {
            Update::Fields(changes) => {
                for (key, value) in changes {
                    fields.insert(key.clone(), value.clone());
                }
            }
            Update::Transform(func) => func(fields),
        }
    }
}

impl From<Fields> for Update {
    fn from(fields: Fields) -> Self {
        Update::Fields(fields)
    }
}

impl fmt::Debug for Update {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Fields(fields) => f.debug_tuple("Fields").field(fields).finish(),
            Update::Transform(_) => write!(f, "Transform(..)"),
        }
    }
}

#[derive(Clone, Copy)]
enum Arith {
    Add,
    Sub,
}

fn arith(current: &Number, delta: &Number, op: Arith) -> Option<Value> {
    if let (Some(a), Some(b)) = (current.as_i64(), delta.as_i64()) {
        let result = match op {
            Arith::Add => a.checked_add(b),
            Arith::Sub => a.checked_sub(b),
        };
        if let Some(n) = result {
            return Some(Value::from(n));
        }
    }
    let (a, b) = (current.as_f64()?, delta.as_f64()?);
    let result = match op {
        Arith::Add => a + b,
        Arith::Sub => a - b,
    };
    Number::from_f64(result).map(Value::Number)
}

fn numeric_update(field: String, delta: Number, op: Arith) -> Update {
    Update::transform(move |fields| {
        let next = match fields.get(&field) {
            Some(Value::Number(current)) => arith(current, &delta, op),
            _ => None,
        };
        if let Some(next) = next {
            fields.insert(field.clone(), next);
        }
    })
}

/// Remove `field` from the document
pub fn delete(field: impl Into<String>) -> Update {
    let field = field.into();
    Update::transform(move |fields| {
        fields.remove(&field);
    })
}

/// Add `n` to a numeric `field`
pub fn add(field: impl Into<String>, n: impl Into<Number>) -> Update {
    numeric_update(field.into(), n.into(), Arith::Add)
}

/// Subtract `n` from a numeric `field`
pub fn subtract(field: impl Into<String>, n: impl Into<Number>) -> Update {
    numeric_update(field.into(), n.into(), Arith::Sub)
}

/// Set `field` to `value`, creating it if missing
pub fn set(field: impl Into<String>, value: impl Into<Value>) -> Update {
    let field = field.into();
    let value = value.into();
    Update::transform(move |fields| {
        fields.insert(field.clone(), value.clone());
    })
}

/// Increment a numeric `field` by 1
pub fn increment(field: impl Into<String>) -> Update {
    add(field, 1)
}

/// Decrement a numeric `field` by 1
pub fn decrement(field: impl Into<String>) -> Update {
    subtract(field, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::fields_from_value;
    use serde_json::json;

    fn apply(update: Update, value: Value) -> Value {
        let mut fields = fields_from_value(value).unwrap();
        update.apply(&mut fields);
        Value::Object(fields)
    }

    #[test]
    fn test_merge_fields() {
        let changes = fields_from_value(json!({"b": 3, "c": 4})).unwrap();
        assert_eq!(
            apply(Update::from(changes), json!({"a": 1, "b": 2})),
            json!({"a": 1, "b": 3, "c": 4})
        );
    }

    #[test]
    fn test_delete() {
        assert_eq!(apply(delete("a"), json!({"a": 1, "b": 2})), json!({"b": 2}));
        assert_eq!(apply(delete("z"), json!({"a": 1})), json!({"a": 1}));
    }

    #[test]
    fn test_arithmetic() {
        assert_eq!(apply(add("n", 5), json!({"n": 1})), json!({"n": 6}));
        assert_eq!(apply(subtract("n", 2), json!({"n": 1})), json!({"n": -1}));
        assert_eq!(apply(increment("n"), json!({"n": 1.5})), json!({"n": 2.5}));
        assert_eq!(apply(decrement("n"), json!({"n": 0})), json!({"n": -1}));
    }

    #[test]
    fn test_arithmetic_skips_missing_and_non_numeric() {
        assert_eq!(apply(increment("n"), json!({})), json!({}));
        assert_eq!(apply(increment("n"), json!({"n": "7"})), json!({"n": "7"}));
    }

    #[test]
    fn test_set_creates_field() {
        assert_eq!(apply(set("x", "y"), json!({})), json!({"x": "y"}));
        assert_eq!(apply(set("x", json!([1])), json!({"x": 0})), json!({"x": [1]}));
    }
}
