//! Evaluable predicates and their combinators.

use std::borrow::Cow;
use std::fmt;
use std::ops::{BitAnd, BitOr, Not};
use std::sync::Arc;

use serde_json::Value;

use super::freeze::Frozen;
use crate::document::Fields;

/// Anything a table can filter with.
///
/// `structural_key` returns `None` for predicates that must never be used as
/// query cache keys.
pub trait QueryLike {
    /// Whether the document matches. Never panics on unexpected shapes.
    fn evaluate(&self, document: &Fields) -> bool;

    /// Stable key describing the predicate's structure.
    fn structural_key(&self) -> Option<Frozen>;

    /// Whether results for this predicate may be cached.
    fn is_cacheable(&self) -> bool {
        self.structural_key().is_some()
    }
}

/// What a predicate is evaluated against: a stored document, or a nested
/// value (array items under `any`/`all`).
#[derive(Debug, Clone, Copy)]
pub(crate) enum Subject<'a> {
    Document(&'a Fields),
    Value(&'a Value),
}

impl<'a> Subject<'a> {
    pub(crate) fn field(self, name: &str) -> Option<&'a Value> {
        match self {
            Subject::Document(fields) => fields.get(name),
            Subject::Value(value) => value.as_object()?.get(name),
        }
    }

    pub(crate) fn to_value(self) -> Cow<'a, Value> {
        match self {
            Subject::Document(fields) => Cow::Owned(Value::Object(fields.clone())),
            Subject::Value(value) => Cow::Borrowed(value),
        }
    }
}

type TestFn = dyn for<'a> Fn(Subject<'a>) -> bool + Send + Sync;

/// A compiled predicate plus its optional structural key.
///
/// Instances combine with `&`, `|` and `!`. A combination is cacheable only
/// when every operand is.
#[derive(Clone)]
pub struct QueryInstance {
    test: Arc<TestFn>,
    key: Option<Frozen>,
}

impl QueryInstance {
    /// Build a predicate from a plain function over documents.
    ///
    /// Pass `None` as the key to mark the predicate non-cacheable. When a key
    /// is given the caller guarantees the function is deterministic.
    pub fn new<F>(test: F, key: Option<Frozen>) -> Self
    where
        F: Fn(&Fields) -> bool + Send + Sync + 'static,
    {
        Self::from_subject_fn(
            move |subject| match subject {
                Subject::Document(fields) => test(fields),
                Subject::Value(Value::Object(fields)) => test(fields),
                Subject::Value(_) => false,
            },
            key,
        )
    }

    pub(crate) fn from_subject_fn<F>(test: F, key: Option<Frozen>) -> Self
    where
        F: for<'a> Fn(Subject<'a>) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
            key,
        }
    }

    /// Evaluate against a document.
    pub fn call(&self, document: &Fields) -> bool {
        (self.test)(Subject::Document(document))
    }

    /// Evaluate against an arbitrary JSON value.
    pub fn call_value(&self, value: &Value) -> bool {
        (self.test)(Subject::Value(value))
    }

    pub(crate) fn call_subject(&self, subject: Subject<'_>) -> bool {
        (self.test)(subject)
    }

    /// The structural key, if cacheable.
    pub fn key(&self) -> Option<&Frozen> {
        self.key.as_ref()
    }

    /// Logical AND. Key: `("and", {a, b})`.
    pub fn and(self, other: QueryInstance) -> QueryInstance {
        let key = Self::combined_key("and", &self.key, &other.key);
        let (lhs, rhs) = (self.test, other.test);
        Self::from_subject_fn(move |subject| lhs(subject) && rhs(subject), key)
    }

    /// Logical OR. Key: `("or", {a, b})`.
    pub fn or(self, other: QueryInstance) -> QueryInstance {
        let key = Self::combined_key("or", &self.key, &other.key);
        let (lhs, rhs) = (self.test, other.test);
        Self::from_subject_fn(move |subject| lhs(subject) || rhs(subject), key)
    }

    /// Logical NOT. Key: `("not", a)`.
    pub fn negate(self) -> QueryInstance {
        let key = self
            .key
            .map(|inner| Frozen::seq([Frozen::str("not"), inner]));
        let inner = self.test;
        Self::from_subject_fn(move |subject| !inner(subject), key)
    }

    fn combined_key(op: &str, lhs: &Option<Frozen>, rhs: &Option<Frozen>) -> Option<Frozen> {
        match (lhs, rhs) {
            (Some(a), Some(b)) => Some(Frozen::seq([
                Frozen::str(op),
                Frozen::set([a.clone(), b.clone()]),
            ])),
            _ => None,
        }
    }
}

impl QueryLike for QueryInstance {
    fn evaluate(&self, document: &Fields) -> bool {
        self.call(document)
    }

    fn structural_key(&self) -> Option<Frozen> {
        self.key.clone()
    }
}

impl BitAnd for QueryInstance {
    type Output = QueryInstance;

    fn bitand(self, rhs: QueryInstance) -> QueryInstance {
        self.and(rhs)
    }
}

impl BitOr for QueryInstance {
    type Output = QueryInstance;

    fn bitor(self, rhs: QueryInstance) -> QueryInstance {
        self.or(rhs)
    }
}

impl Not for QueryInstance {
    type Output = QueryInstance;

    fn not(self) -> QueryInstance {
        self.negate()
    }
}

impl fmt::Debug for QueryInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(f, "QueryImpl{}", key),
            None => write!(f, "QueryImpl(<uncacheable>)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Fields {
        crate::document::fields_from_value(value).unwrap()
    }

    fn keyed(name: &str, expected: i64) -> QueryInstance {
        let field = name.to_string();
        QueryInstance::new(
            move |fields| fields.get(&field) == Some(&json!(expected)),
            Some(Frozen::seq([Frozen::str(name), Frozen::Int(expected)])),
        )
    }

    #[test]
    fn test_and_or_not_evaluate() {
        let d = doc(json!({"a": 1, "b": 2}));
        assert!((keyed("a", 1) & keyed("b", 2)).call(&d));
        assert!(!(keyed("a", 1) & keyed("b", 3)).call(&d));
        assert!((keyed("a", 9) | keyed("b", 2)).call(&d));
        assert!(!(!keyed("a", 1)).call(&d));
    }

    #[test]
    fn test_and_or_keys_are_commutative() {
        let ab = keyed("a", 1) & keyed("b", 2);
        let ba = keyed("b", 2) & keyed("a", 1);
        assert_eq!(ab.structural_key(), ba.structural_key());

        let ab = keyed("a", 1) | keyed("b", 2);
        let ba = keyed("b", 2) | keyed("a", 1);
        assert_eq!(ab.structural_key(), ba.structural_key());

        let and = keyed("a", 1) & keyed("b", 2);
        let or = keyed("a", 1) | keyed("b", 2);
        assert_ne!(and.structural_key(), or.structural_key());
    }

    #[test]
    fn test_uncacheable_operand_poisons_combination() {
        let opaque = QueryInstance::new(|_| true, None);
        assert!(!opaque.is_cacheable());
        assert!(!(keyed("a", 1) & opaque.clone()).is_cacheable());
        assert!(!(opaque.clone() | keyed("a", 1)).is_cacheable());
        assert!(!(!opaque).is_cacheable());
        assert!((!keyed("a", 1)).is_cacheable());
    }

    #[test]
    fn test_document_fn_rejects_non_object_values() {
        let q = QueryInstance::new(|_| true, None);
        assert!(q.call_value(&json!({"x": 1})));
        assert!(!q.call_value(&json!(5)));
    }
}
