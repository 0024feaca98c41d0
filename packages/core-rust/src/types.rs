use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime values a template is rendered against, keyed by placeholder name.
pub type RenderContext = BTreeMap<String, Value>;

/// Dynamic value tree flowing through templates, contexts and backend calls.
///
/// Argument templates, render contexts, rendered arguments and backend results
/// all use this one type. Serializes through `serde_json::Value` so module
/// declarations can be written as plain JSON; `Bytes` serializes as an array
/// of numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "serde_json::Value", into = "serde_json::Value")]
pub enum Value {
    /// JSON null.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// JSON integer (signed 64-bit).
    Int(i64),
    /// JSON integer above `i64::MAX`.
    UInt(u64),
    /// JSON floating-point (64-bit IEEE 754).
    Float(f64),
    /// JSON string (UTF-8).
    String(String),
    /// Binary data (not directly representable in JSON).
    Bytes(Vec<u8>),
    /// JSON array (ordered sequence of values).
    Array(Vec<Value>),
    /// JSON object. Uses `BTreeMap` for deterministic key order.
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Returns the string slice if this value is a `String`.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the map if this value is a `Map`.
    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Returns the integer if this value is an `Int`.
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Builds a `Map` value from string-keyed pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::UInt(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(entries) => Value::Map(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<Value> for serde_json::Value {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(b),
            Value::Int(i) => serde_json::Value::from(i),
            Value::UInt(u) => serde_json::Value::from(u),
            // Non-finite floats have no JSON form and collapse to null.
            Value::Float(f) => serde_json::Number::from_f64(f)
                .map_or(serde_json::Value::Null, serde_json::Value::Number),
            Value::String(s) => serde_json::Value::String(s),
            Value::Bytes(bytes) => {
                serde_json::Value::Array(bytes.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Array(items) => {
                serde_json::Value::Array(items.into_iter().map(serde_json::Value::from).collect())
            }
            Value::Map(entries) => serde_json::Value::Object(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, serde_json::Value::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::Value::from(self.clone());
        write!(f, "{json}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_object_becomes_sorted_map() {
        let json = serde_json::json!({"b": 1, "a": "x", "c": [true, null]});
        let value = Value::from(json);
        assert_eq!(
            value,
            Value::map([
                ("a", Value::from("x")),
                ("b", Value::Int(1)),
                ("c", Value::Array(vec![Value::Bool(true), Value::Null])),
            ])
        );
    }

    #[test]
    fn floats_stay_floats() {
        let value = Value::from(serde_json::json!(1.5));
        assert_eq!(value, Value::Float(1.5));
    }

    #[test]
    fn integers_above_i64_keep_full_precision() {
        let value: Value = serde_json::from_str("18446744073709551615").unwrap();
        assert_eq!(value, Value::UInt(u64::MAX));
        assert_eq!(value.to_string(), "18446744073709551615");

        let small: Value = serde_json::from_str("9223372036854775807").unwrap();
        assert_eq!(small, Value::Int(i64::MAX));
    }

    #[test]
    fn bytes_serialize_as_number_array() {
        let json = serde_json::to_value(Value::Bytes(vec![1, 2])).unwrap();
        assert_eq!(json, serde_json::json!([1, 2]));
    }

    #[test]
    fn nan_serializes_as_null() {
        let json = serde_json::Value::from(Value::Float(f64::NAN));
        assert!(json.is_null());
    }

    #[test]
    fn deserializes_from_json_text() {
        let value: Value = serde_json::from_str(r#"{"title": "$title:string"}"#).unwrap();
        assert_eq!(
            value.as_map().and_then(|m| m.get("title")).and_then(Value::as_str),
            Some("$title:string")
        );
    }

    #[test]
    fn display_is_compact_json() {
        let value = Value::map([("a", Value::Int(1))]);
        assert_eq!(value.to_string(), r#"{"a":1}"#);
    }
}
