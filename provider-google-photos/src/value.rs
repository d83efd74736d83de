//! Loosely-structured value
//!
//! The album payload is a nested array whose slots hold strings, numbers,
//! arrays or null at positions that are only known by convention. `LooseValue`
//! keeps that shape and offers accessors that return `None` instead of
//! panicking when a slot holds something unexpected.

use serde_json::Value;

#[derive(Debug, Clone, PartialEq)]
pub enum LooseValue {
    String(String),
    Number(f64),
    Array(Vec<LooseValue>),
    /// JSON null. Objects and booleans carry no positional meaning in the
    /// payload and are folded in here as well.
    Null,
}

impl LooseValue {
    /// Parse a JSON text into a loose value.
    pub fn parse(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Value>(text).map(Self::from)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LooseValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            LooseValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[LooseValue]> {
        match self {
            LooseValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Element at `index` when this is an array long enough to have one.
    pub fn get(&self, index: usize) -> Option<&LooseValue> {
        self.as_array().and_then(|items| items.get(index))
    }

    /// Non-empty string content
    pub fn as_non_empty_str(&self) -> Option<&str> {
        self.as_str().filter(|s| !s.is_empty())
    }

    /// Epoch-millisecond reading of a number (truncated) or of an integer string.
    pub fn as_epoch_millis(&self) -> Option<i64> {
        match self {
            LooseValue::Number(n) if n.is_finite() => Some(*n as i64),
            LooseValue::String(s) => s.parse::<i64>().ok(),
            _ => None,
        }
    }

    /// Non-negative dimension reading; anything else is zero.
    pub fn as_dimension(&self) -> u32 {
        match self {
            LooseValue::Number(n) if n.is_finite() && *n > 0.0 => {
                n.min(u32::MAX as f64) as u32
            }
            _ => 0,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, LooseValue::Null)
    }
}

impl From<Value> for LooseValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => LooseValue::String(s),
            Value::Number(n) => n.as_f64().map(LooseValue::Number).unwrap_or(LooseValue::Null),
            Value::Array(items) => {
                LooseValue::Array(items.into_iter().map(LooseValue::from).collect())
            }
            Value::Null | Value::Bool(_) | Value::Object(_) => LooseValue::Null,
        }
    }
}
