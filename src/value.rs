//! Scalar field values and the tag/field maps carried by every point.

use std::collections::HashMap;

/// A single field value.
///
/// Time-series fields are untyped at the wire level but always one of a
/// small set of scalar kinds; we keep that closed set explicit rather than
/// reaching for a JSON-like `Value` with nested containers, since nothing
/// downstream in this substrate needs more than scalars.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum Value {
    Float(f64),
    Int(i64),
    Uint(u64),
    Bool(bool),
    Str(String),
}

impl Value {
    /// Best-effort conversion to `f64`, used by lambdas and trackers that
    /// need a numeric comparison regardless of the field's concrete kind.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(v) => Some(*v),
            Value::Int(v) => Some(*v as f64),
            Value::Uint(v) => Some(*v as f64),
            Value::Bool(v) => Some(if *v { 1.0 } else { 0.0 }),
            Value::Str(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

/// Field values keyed by field name, shared-immutable once a message has
/// been emitted onto an edge (see the crate-level copy-on-write rule).
pub type Fields = HashMap<String, Value>;

/// Tag values keyed by tag name, same copy-on-write rule as `Fields`.
pub type Tags = HashMap<String, String>;
