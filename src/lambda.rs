//! The opaque "lambda evaluator" capability a few transform nodes take a
//! user-supplied instance of (state-tracking, eventually `where`/`eval`
//! nodes outside this crate's scope).

use crate::error::{Error, Result};
use crate::value::{Fields, Tags, Value};

/// Something that can be evaluated against a point's fields and tags to
/// yield a boolean verdict.
///
/// Errors are expected to be recoverable by the caller: a node evaluating a
/// `Predicate` increments its eval-error counter, logs, and drops the
/// offending point rather than propagating (spec.md §7, `error.rs`'s
/// `EvalError` doc comment).
pub trait Predicate: Send + Sync {
    fn eval(&self, fields: &Fields, tags: &Tags) -> Result<bool>;
}

impl<T> Predicate for T
where
    T: Fn(&Fields, &Tags) -> Result<bool> + Send + Sync,
{
    fn eval(&self, fields: &Fields, tags: &Tags) -> Result<bool> {
        self(fields, tags)
    }
}

/// A trivial, concrete `Predicate`: is a named numeric field greater than a
/// threshold. Exists mainly so tests don't each need their own closure
/// type; real deployments are expected to bring a richer expression
/// evaluator (outside this crate's scope, see SPEC_FULL.md Non-goals).
pub struct FieldThreshold {
    pub field: String,
    pub threshold: f64,
}

impl Predicate for FieldThreshold {
    fn eval(&self, fields: &Fields, _tags: &Tags) -> Result<bool> {
        let value = fields
            .get(self.field.as_str())
            .and_then(Value::as_f64)
            .ok_or_else(|| Error::EvalError(format!("field {:?} missing or non-numeric", self.field)))?;
        Ok(value > self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_threshold_evaluates_numeric_field() {
        let predicate = FieldThreshold { field: "value".into(), threshold: 10.0 };
        let mut fields = Fields::new();
        fields.insert("value".into(), Value::Float(12.0));
        assert!(predicate.eval(&fields, &Tags::new()).unwrap());
    }

    #[test]
    fn field_threshold_errors_on_missing_field() {
        let predicate = FieldThreshold { field: "value".into(), threshold: 10.0 };
        assert!(predicate.eval(&Fields::new(), &Tags::new()).is_err());
    }
}
