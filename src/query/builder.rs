//! Query builder.
//!
//! A `Query` accumulates a path of steps (field lookups and named transforms)
//! and ends in a terminal operation that yields a `QueryInstance`.
//!
//! ```ignore
//! use jotdb::query::{field, Query};
//!
//! let user = Query::new();
//! let adults = user.field("age").ge(18)?;
//! let named = field("name").matches(r"[A-Z]\w+")?;
//! let both = adults & named;
//! ```

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};
use serde_json::Value;

use super::compare::{compare_values, contains_value, values_equal};
use super::errors::{QueryError, QueryResult};
use super::freeze::{freeze, Frozen};
use super::instance::{QueryInstance, Subject};

type TransformFn = dyn Fn(&Value) -> Option<Value> + Send + Sync;

/// One step of a query path.
#[derive(Clone)]
pub enum PathStep {
    /// Look up a field of an object
    Field(String),
    /// Apply a named transform; `None` from the transform means no match
    Transform {
        name: String,
        func: Arc<TransformFn>,
    },
}

impl PathStep {
    fn key(&self) -> Frozen {
        match self {
            PathStep::Field(name) => Frozen::Str(name.clone()),
            PathStep::Transform { name, .. } => Frozen::Callable(name.clone()),
        }
    }
}

impl fmt::Debug for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field(name) => write!(f, "Field({:?})", name),
            PathStep::Transform { name, .. } => write!(f, "Transform({:?})", name),
        }
    }
}

/// Regex options for `matches_with` / `search_with`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RegexFlags {
    pub case_insensitive: bool,
    pub multi_line: bool,
    pub dot_matches_new_line: bool,
}

impl RegexFlags {
    /// Case-insensitive matching only
    pub fn ignore_case() -> Self {
        Self {
            case_insensitive: true,
            ..Self::default()
        }
    }

    fn bits(&self) -> i64 {
        (self.case_insensitive as i64)
            | ((self.multi_line as i64) << 1)
            | ((self.dot_matches_new_line as i64) << 2)
    }
}

/// Operand of `any` / `all`.
#[derive(Debug, Clone)]
pub enum Condition {
    /// Items are tested with a nested query
    Query(QueryInstance),
    /// Items are compared against a list of values
    Items(Vec<Value>),
}

impl Condition {
    fn key(&self) -> Option<Frozen> {
        match self {
            Condition::Query(query) => query.key().cloned(),
            Condition::Items(items) => Some(Frozen::Seq(items.iter().map(freeze).collect())),
        }
    }
}

impl From<QueryInstance> for Condition {
    fn from(query: QueryInstance) -> Self {
        Condition::Query(query)
    }
}

impl From<Vec<Value>> for Condition {
    fn from(items: Vec<Value>) -> Self {
        Condition::Items(items)
    }
}

/// Path builder. Every call returns a new builder; the receiver is unchanged.
#[derive(Clone, Default)]
pub struct Query {
    path: Vec<PathStep>,
}

/// Shorthand for `Query::new().field(name)`.
pub fn field(name: impl Into<String>) -> Query {
    Query::new().field(name)
}

impl Query {
    /// An empty query. Only `noop` may be called on it directly.
    pub fn new() -> Self {
        Self::default()
    }

    /// Extend the path with a field lookup
    pub fn field(&self, name: impl Into<String>) -> Query {
        self.extended(PathStep::Field(name.into()))
    }

    /// Extend the path with a named transform.
    ///
    /// `name` identifies the transform in cache keys: two transforms sharing
    /// a name must behave identically.
    pub fn map<F>(&self, name: impl Into<String>, func: F) -> Query
    where
        F: Fn(&Value) -> Option<Value> + Send + Sync + 'static,
    {
        self.extended(PathStep::Transform {
            name: name.into(),
            func: Arc::new(func),
        })
    }

    fn extended(&self, step: PathStep) -> Query {
        let mut path = self.path.clone();
        path.push(step);
        Query { path }
    }

    /// The accumulated path
    pub fn path(&self) -> &[PathStep] {
        &self.path
    }

    /// Structural key of the path alone: `("path", (steps...))`
    pub fn path_key(&self) -> Frozen {
        Frozen::seq([Frozen::str("path"), self.steps_key()])
    }

    fn steps_key(&self) -> Frozen {
        Frozen::Seq(self.path.iter().map(PathStep::key).collect())
    }

    fn op_key(&self, op: &str, operands: impl IntoIterator<Item = Frozen>) -> Frozen {
        let mut parts = vec![Frozen::str(op), self.steps_key()];
        parts.extend(operands);
        Frozen::Seq(parts)
    }

    /// Wrap a terminal test with path resolution.
    fn generate_test<T>(&self, op: &'static str, test: T, key: Option<Frozen>) -> QueryResult<QueryInstance>
    where
        T: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        if self.path.is_empty() {
            return Err(QueryError::EmptyPath(op));
        }
        let path = self.path.clone();
        Ok(QueryInstance::from_subject_fn(
            move |subject| match resolve(&path, subject) {
                Some(value) => test(value.as_ref()),
                None => false,
            },
            key,
        ))
    }

    /// value == rhs
    pub fn eq(&self, rhs: impl Into<Value>) -> QueryResult<QueryInstance> {
        let rhs = rhs.into();
        let key = self.op_key("==", [freeze(&rhs)]);
        self.generate_test("==", move |value| values_equal(value, &rhs), Some(key))
    }

    /// value != rhs
    pub fn ne(&self, rhs: impl Into<Value>) -> QueryResult<QueryInstance> {
        let rhs = rhs.into();
        let key = self.op_key("!=", [freeze(&rhs)]);
        self.generate_test("!=", move |value| !values_equal(value, &rhs), Some(key))
    }

    /// value < rhs
    pub fn lt(&self, rhs: impl Into<Value>) -> QueryResult<QueryInstance> {
        self.ordering("<", rhs.into(), |o| o.is_lt())
    }

    /// value <= rhs
    pub fn le(&self, rhs: impl Into<Value>) -> QueryResult<QueryInstance> {
        self.ordering("<=", rhs.into(), |o| o.is_le())
    }

    /// value > rhs
    pub fn gt(&self, rhs: impl Into<Value>) -> QueryResult<QueryInstance> {
        self.ordering(">", rhs.into(), |o| o.is_gt())
    }

    /// value >= rhs
    pub fn ge(&self, rhs: impl Into<Value>) -> QueryResult<QueryInstance> {
        self.ordering(">=", rhs.into(), |o| o.is_ge())
    }

    fn ordering(
        &self,
        op: &'static str,
        rhs: Value,
        accept: fn(std::cmp::Ordering) -> bool,
    ) -> QueryResult<QueryInstance> {
        let key = self.op_key(op, [freeze(&rhs)]);
        self.generate_test(
            op,
            move |value| compare_values(value, &rhs).map(accept).unwrap_or(false),
            Some(key),
        )
    }

    /// The path resolves
    pub fn exists(&self) -> QueryResult<QueryInstance> {
        let key = self.op_key("exists", std::iter::empty());
        self.generate_test("exists", |_| true, Some(key))
    }

    /// The whole string value matches `pattern`
    pub fn matches(&self, pattern: &str) -> QueryResult<QueryInstance> {
        self.matches_with(pattern, RegexFlags::default())
    }

    /// `matches` with regex flags
    pub fn matches_with(&self, pattern: &str, flags: RegexFlags) -> QueryResult<QueryInstance> {
        let regex = compile(&format!(r"\A(?:{})\z", pattern), pattern, flags)?;
        self.regex_test("matches", pattern, flags, regex)
    }

    /// Some substring of the string value matches `pattern`
    pub fn search(&self, pattern: &str) -> QueryResult<QueryInstance> {
        self.search_with(pattern, RegexFlags::default())
    }

    /// `search` with regex flags
    pub fn search_with(&self, pattern: &str, flags: RegexFlags) -> QueryResult<QueryInstance> {
        let regex = compile(pattern, pattern, flags)?;
        self.regex_test("search", pattern, flags, regex)
    }

    fn regex_test(
        &self,
        op: &'static str,
        pattern: &str,
        flags: RegexFlags,
        regex: Regex,
    ) -> QueryResult<QueryInstance> {
        let key = self.op_key(op, [Frozen::str(pattern), Frozen::Int(flags.bits())]);
        self.generate_test(
            op,
            move |value| value.as_str().map(|s| regex.is_match(s)).unwrap_or(false),
            Some(key),
        )
    }

    /// Run a user function against the value.
    ///
    /// `name` and `args` form the cache key; the function must be
    /// deterministic for a given name and arguments.
    pub fn test<F>(&self, name: impl Into<String>, func: F, args: Vec<Value>) -> QueryResult<QueryInstance>
    where
        F: Fn(&Value, &[Value]) -> bool + Send + Sync + 'static,
    {
        let key = self.op_key(
            "test",
            [
                Frozen::Callable(name.into()),
                Frozen::Seq(args.iter().map(freeze).collect()),
            ],
        );
        self.generate_test("test", move |value| func(value, &args), Some(key))
    }

    /// The value is an array and at least one item satisfies `cond`
    /// (nested query) or is one of `cond` (item list).
    pub fn any(&self, cond: impl Into<Condition>) -> QueryResult<QueryInstance> {
        let cond = cond.into();
        let key = cond.key().map(|operand| self.op_key("any", [operand]));
        self.generate_test(
            "any",
            move |value| {
                let Some(items) = value.as_array() else {
                    return false;
                };
                match &cond {
                    Condition::Query(query) => items
                        .iter()
                        .any(|item| query.call_subject(Subject::Value(item))),
                    Condition::Items(wanted) => items.iter().any(|item| contains_value(wanted, item)),
                }
            },
            key,
        )
    }

    /// The value is an array and every item satisfies `cond` (nested query),
    /// or it contains every element of `cond` (item list).
    pub fn all(&self, cond: impl Into<Condition>) -> QueryResult<QueryInstance> {
        let cond = cond.into();
        let key = cond.key().map(|operand| self.op_key("all", [operand]));
        self.generate_test(
            "all",
            move |value| {
                let Some(items) = value.as_array() else {
                    return false;
                };
                match &cond {
                    Condition::Query(query) => items
                        .iter()
                        .all(|item| query.call_subject(Subject::Value(item))),
                    Condition::Items(required) => {
                        required.iter().all(|needed| contains_value(items, needed))
                    }
                }
            },
            key,
        )
    }

    /// The value equals one of `items`
    pub fn one_of(&self, items: Vec<Value>) -> QueryResult<QueryInstance> {
        let key = self.op_key("one_of", [Frozen::Seq(items.iter().map(freeze).collect())]);
        self.generate_test("one_of", move |value| contains_value(&items, value), Some(key))
    }

    /// Always true. The only terminal allowed on an empty path.
    pub fn noop(&self) -> QueryInstance {
        QueryInstance::from_subject_fn(|_| true, Some(Frozen::seq([Frozen::str("noop")])))
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query").field("path", &self.path).finish()
    }
}

fn compile(source: &str, pattern: &str, flags: RegexFlags) -> QueryResult<Regex> {
    RegexBuilder::new(source)
        .case_insensitive(flags.case_insensitive)
        .multi_line(flags.multi_line)
        .dot_matches_new_line(flags.dot_matches_new_line)
        .build()
        .map_err(|e| QueryError::InvalidRegex {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })
}

/// Walk `path` from `subject`. Any failed step yields `None`.
fn resolve<'a>(path: &[PathStep], subject: Subject<'a>) -> Option<Cow<'a, Value>> {
    let (first, rest) = path.split_first()?;
    let mut current = match first {
        PathStep::Field(name) => Cow::Borrowed(subject.field(name)?),
        PathStep::Transform { func, .. } => Cow::Owned(func(&*subject.to_value())?),
    };
    for step in rest {
        current = match (step, current) {
            (PathStep::Field(name), Cow::Borrowed(value)) => Cow::Borrowed(value.as_object()?.get(name)?),
            (PathStep::Field(name), Cow::Owned(Value::Object(mut map))) => Cow::Owned(map.remove(name)?),
            (PathStep::Field(_), Cow::Owned(_)) => return None,
            (PathStep::Transform { func, .. }, value) => Cow::Owned(func(&*value)?),
        };
    }
    Some(current)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{fields_from_value, Fields};
    use serde_json::json;

    fn doc(value: Value) -> Fields {
        fields_from_value(value).unwrap()
    }

    #[test]
    fn test_empty_path_is_usage_error() {
        let q = Query::new();
        assert_eq!(q.eq(1).unwrap_err(), QueryError::EmptyPath("=="));
        assert!(q.exists().is_err());
        assert!(q.any(vec![json!(1)]).is_err());
        assert!(q.noop().call(&doc(json!({}))));
    }

    #[test]
    fn test_comparisons() {
        let d = doc(json!({"age": 30, "name": "Ann"}));
        let age = field("age");
        assert!(age.eq(30).unwrap().call(&d));
        assert!(age.eq(30.0).unwrap().call(&d));
        assert!(age.ne(31).unwrap().call(&d));
        assert!(age.lt(31).unwrap().call(&d));
        assert!(age.le(30).unwrap().call(&d));
        assert!(!age.gt(30).unwrap().call(&d));
        assert!(age.ge(30).unwrap().call(&d));
        assert!(field("name").lt("Bob").unwrap().call(&d));
        assert!(!field("name").lt(5).unwrap().call(&d));
    }

    #[test]
    fn test_navigation_failure_is_no_match() {
        let d = doc(json!({"a": 5, "b": [1, 2], "c": {"d": null}}));
        assert!(!field("missing").eq(1).unwrap().call(&d));
        assert!(!field("a").field("x").eq(1).unwrap().call(&d));
        assert!(!field("b").field("0").exists().unwrap().call(&d));
        assert!(field("c").field("d").exists().unwrap().call(&d));
        assert!(!field("a").matches("5").unwrap().call(&d));
        assert!(!field("a").any(vec![json!(5)]).unwrap().call(&d));
    }

    #[test]
    fn test_ne_on_missing_field_is_no_match() {
        let d = doc(json!({}));
        assert!(!field("a").ne(1).unwrap().call(&d));
    }

    #[test]
    fn test_regex_matches_whole_string_search_substring() {
        let d = doc(json!({"name": "John Doe"}));
        assert!(!field("name").matches("John").unwrap().call(&d));
        assert!(field("name").matches(r"John \w+").unwrap().call(&d));
        assert!(field("name").search("Doe").unwrap().call(&d));
        assert!(field("name")
            .matches_with("john doe", RegexFlags::ignore_case())
            .unwrap()
            .call(&d));
        assert!(matches!(
            field("name").search("("),
            Err(QueryError::InvalidRegex { .. })
        ));
    }

    #[test]
    fn test_any_all_one_of() {
        let d = doc(json!({
            "tags": ["a", "b"],
            "items": [{"n": 1}, {"n": 2}],
            "kind": "x"
        }));
        assert!(field("tags").any(vec![json!("b"), json!("z")]).unwrap().call(&d));
        assert!(!field("tags").any(vec![json!("z")]).unwrap().call(&d));
        assert!(field("tags").all(vec![json!("a")]).unwrap().call(&d));
        assert!(!field("tags").all(vec![json!("a"), json!("z")]).unwrap().call(&d));

        let n_is_1 = field("n").eq(1).unwrap();
        let n_pos = field("n").gt(0).unwrap();
        assert!(field("items").any(n_is_1.clone()).unwrap().call(&d));
        assert!(!field("items").all(n_is_1).unwrap().call(&d));
        assert!(field("items").all(n_pos).unwrap().call(&d));

        assert!(field("kind").one_of(vec![json!("x"), json!("y")]).unwrap().call(&d));
        assert!(!field("kind").one_of(vec![json!("y")]).unwrap().call(&d));
    }

    #[test]
    fn test_map_and_test_steps() {
        let d = doc(json!({"name": "ann", "scores": [3, 4]}));
        let upper = field("name").map("upper", |v| v.as_str().map(|s| Value::from(s.to_uppercase())));
        assert!(upper.eq("ANN").unwrap().call(&d));

        let len = field("scores").map("len", |v| v.as_array().map(|a| Value::from(a.len())));
        assert!(len.eq(2).unwrap().call(&d));

        let failing = field("name").map("fail", |_| None);
        assert!(!failing.exists().unwrap().call(&d));

        let between = field("scores").test(
            "sum_between",
            |v, args| {
                let sum: i64 = v.as_array().map(|a| a.iter().filter_map(Value::as_i64).sum()).unwrap_or(0);
                sum >= args[0].as_i64().unwrap_or(0) && sum <= args[1].as_i64().unwrap_or(0)
            },
            vec![json!(5), json!(10)],
        );
        assert!(between.unwrap().call(&d));
    }

    #[test]
    fn test_transform_then_field() {
        let d = doc(json!({"raw": "{\"inner\": 3}"}));
        let parsed = field("raw")
            .map("parse", |v| v.as_str().and_then(|s| serde_json::from_str(s).ok()))
            .field("inner");
        assert!(parsed.eq(3).unwrap().call(&d));
    }

    #[test]
    fn test_identical_construction_keys_equal() {
        let a = field("a").field("b").eq(json!({"x": [1, 2], "y": 1})).unwrap();
        let b = Query::new().field("a").field("b").eq(json!({"y": 1, "x": [1, 2]})).unwrap();
        assert_eq!(a.key(), b.key());

        let c = field("a").field("b").eq(json!({"x": [2, 1], "y": 1})).unwrap();
        assert_ne!(a.key(), c.key());

        assert_ne!(field("a").lt(1).unwrap().key(), field("a").le(1).unwrap().key());
        assert_ne!(
            field("a").map("f", |v| Some(v.clone())).exists().unwrap().key(),
            field("a").field("f").exists().unwrap().key()
        );
    }

    #[test]
    fn test_any_with_uncacheable_condition_is_uncacheable() {
        let opaque = QueryInstance::new(|_| true, None);
        assert!(field("items").any(opaque).unwrap().key().is_none());
        assert!(field("items").any(vec![json!(1)]).unwrap().key().is_some());
    }

    #[test]
    fn test_builder_is_reusable() {
        let user = Query::new();
        let name = user.field("name");
        let age = user.field("age");
        assert_eq!(user.path().len(), 0);
        assert_eq!(name.path().len(), 1);
        assert_ne!(name.path_key(), age.path_key());
    }
}
