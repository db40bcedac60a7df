//! Hashable, order-stable key material for queries.
//!
//! JSON objects and arrays are not hashable. `freeze` turns any value into a
//! `Frozen` tree: objects become key-sorted entry lists, arrays become
//! fixed-order sequences. `Frozen::set` builds an unordered collection
//! (sorted and deduplicated) so that `A & B` and `B & A` produce the same key.
//!
//! Numbers with an integral value freeze to the same atom whether they were
//! written as integers or floats.

use std::fmt;

use serde_json::Value;

/// Immutable, hashable representation of query structure and operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Frozen {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    /// IEEE-754 bit pattern
    Float(u64),
    Str(String),
    /// A named transform or test function
    Callable(String),
    Seq(Vec<Frozen>),
    /// Entries sorted by key
    Map(Vec<(String, Frozen)>),
    /// Sorted, deduplicated members
    Set(Vec<Frozen>),
}

impl Frozen {
    /// String atom
    pub fn str(value: impl Into<String>) -> Self {
        Frozen::Str(value.into())
    }

    /// Fixed-order sequence
    pub fn seq(items: impl IntoIterator<Item = Frozen>) -> Self {
        Frozen::Seq(items.into_iter().collect())
    }

    /// Unordered collection; member order does not affect equality or hash
    pub fn set(items: impl IntoIterator<Item = Frozen>) -> Self {
        let mut members: Vec<Frozen> = items.into_iter().collect();
        members.sort();
        members.dedup();
        Frozen::Set(members)
    }
}

/// Integral floats share the integer atom so that keys agree with numeric
/// equality (`1.0 == 1`).
fn freeze_float(f: f64) -> Frozen {
    const I64_END: f64 = 9_223_372_036_854_775_808.0;
    const U64_END: f64 = 18_446_744_073_709_551_616.0;

    if f.is_finite() && f.fract() == 0.0 {
        if (-I64_END..I64_END).contains(&f) {
            return Frozen::Int(f as i64);
        }
        if (0.0..U64_END).contains(&f) {
            return Frozen::UInt(f as u64);
        }
    }
    Frozen::Float(f.to_bits())
}

/// Freeze a JSON value into hashable key material.
pub fn freeze(value: &Value) -> Frozen {
    match value {
        Value::Null => Frozen::Null,
        Value::Bool(b) => Frozen::Bool(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Frozen::Int(i)
            } else if let Some(u) = n.as_u64() {
                Frozen::UInt(u)
            } else {
                freeze_float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        Value::String(s) => Frozen::Str(s.clone()),
        Value::Array(items) => Frozen::Seq(items.iter().map(freeze).collect()),
        Value::Object(map) => {
            let mut entries: Vec<(String, Frozen)> =
                map.iter().map(|(k, v)| (k.clone(), freeze(v))).collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Frozen::Map(entries)
        }
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Frozen]) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

impl fmt::Display for Frozen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frozen::Null => write!(f, "null"),
            Frozen::Bool(b) => write!(f, "{}", b),
            Frozen::Int(i) => write!(f, "{}", i),
            Frozen::UInt(u) => write!(f, "{}", u),
            Frozen::Float(bits) => write!(f, "{}", f64::from_bits(*bits)),
            Frozen::Str(s) => write!(f, "{:?}", s),
            Frozen::Callable(name) => write!(f, "<fn {}>", name),
            Frozen::Seq(items) => {
                write!(f, "(")?;
                write_joined(f, items)?;
                write!(f, ")")
            }
            Frozen::Set(items) => {
                write!(f, "{{")?;
                write_joined(f, items)?;
                write!(f, "}}")
            }
            Frozen::Map(entries) => {
                write!(f, "{{")?;
                for (i, (k, v)) in entries.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{:?}: {}", k, v)?;
                }
                write!(f, "}}")
            }
        }
    }
}
