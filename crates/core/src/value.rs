// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The sample value variant: numeric, boolean, or string.
//!
//! Kept as a tagged union rather than a dynamic cast so callers match
//! exhaustively instead of probing with `as`/`downcast`.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Numeric(f64),
    Bool(bool),
    String(String),
}

impl Value {
    /// True for the variant that always bypasses the deadband filter.
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Numeric view of this value, for scaling and deadband comparisons.
    /// Booleans are 0.0/1.0; strings have no numeric representation.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Numeric(v) => Some(*v),
            Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Value::String(_) => None,
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Numeric(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_string_bypasses_deadband() {
        assert!(!Value::Numeric(1.0).is_string());
        assert!(!Value::Bool(true).is_string());
        assert!(Value::String("x".into()).is_string());
    }

    #[test]
    fn bool_has_numeric_view() {
        assert_eq!(Value::Bool(true).as_f64(), Some(1.0));
        assert_eq!(Value::Bool(false).as_f64(), Some(0.0));
        assert_eq!(Value::String("x".into()).as_f64(), None);
    }
}
