//! Core data types for mirrored values

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// A value as stored in the state namespace.
///
/// Equality is exact: `Text("5")` and `Number(5.0)` are different values.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum StateValue {
    Null,
    Boolean(bool),
    Number(f64),
    Text(String),
    Array(Vec<StateValue>),
}

impl StateValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StateValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            StateValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, StateValue::Null)
    }
}

impl From<&Value> for StateValue {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => StateValue::Null,
            Value::Bool(b) => StateValue::Boolean(*b),
            Value::Number(n) => n.as_f64().map_or(StateValue::Null, StateValue::Number),
            Value::String(s) => StateValue::Text(s.clone()),
            Value::Array(items) => StateValue::Array(items.iter().map(StateValue::from).collect()),
            // nested objects are kept as their compact JSON text
            Value::Object(_) => StateValue::Text(value.to_string()),
        }
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        StateValue::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        StateValue::Text(value)
    }
}

impl From<f64> for StateValue {
    fn from(value: f64) -> Self {
        StateValue::Number(value)
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateValue::Null => f.write_str("null"),
            StateValue::Boolean(b) => write!(f, "{}", b),
            StateValue::Number(n) => write!(f, "{}", n),
            StateValue::Text(s) => f.write_str(s),
            StateValue::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

/// Natural primitive kind of a value, recorded in the entry metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Array,
    Object,
    Null,
}

impl ValueKind {
    pub fn of_json(value: &Value) -> Self {
        match value {
            Value::Null => ValueKind::Null,
            Value::Bool(_) => ValueKind::Boolean,
            Value::Number(_) => ValueKind::Number,
            Value::String(_) => ValueKind::String,
            Value::Array(_) => ValueKind::Array,
            Value::Object(_) => ValueKind::Object,
        }
    }
}

/// Semantic role of an entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "value")]
    Value,
    #[serde(rename = "value.datetime")]
    DateTime,
}

/// Metadata attached to an entry when it is first created
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntryMeta {
    /// Display name
    pub name: String,
    pub role: Role,
    #[serde(rename = "type")]
    pub kind: ValueKind,
    pub read: bool,
    pub write: bool,
}

impl EntryMeta {
    /// Read-only plain value entry
    pub fn value(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            role: Role::Value,
            kind,
            read: true,
            write: false,
        }
    }

    /// Read-only datetime entry, always stored as text
    pub fn datetime(name: impl Into<String>) -> Self {
        Self {
            role: Role::DateTime,
            ..Self::value(name, ValueKind::String)
        }
    }
}

/// A normalized value ready to be mirrored
#[derive(Debug, Clone, PartialEq)]
pub struct EntryUpdate {
    pub path: String,
    pub meta: EntryMeta,
    pub value: StateValue,
}

impl EntryUpdate {
    pub fn new(path: impl Into<String>, meta: EntryMeta, value: StateValue) -> Self {
        Self {
            path: path.into(),
            meta,
            value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_state_value_from_json() {
        assert_eq!(StateValue::from(&json!(21.5)), StateValue::Number(21.5));
        assert_eq!(StateValue::from(&json!("N7075")), StateValue::Text("N7075".into()));
        assert_eq!(StateValue::from(&json!(null)), StateValue::Null);
        assert_eq!(
            StateValue::from(&json!([1, 2])),
            StateValue::Array(vec![StateValue::Number(1.0), StateValue::Number(2.0)])
        );
        assert_eq!(
            StateValue::from(&json!({"a": 1})),
            StateValue::Text(r#"{"a":1}"#.into())
        );
    }

    #[test]
    fn test_no_cross_kind_equality() {
        assert_ne!(StateValue::Text("5".into()), StateValue::Number(5.0));
    }

    #[test]
    fn test_kind_of_json() {
        assert_eq!(ValueKind::of_json(&json!(1)), ValueKind::Number);
        assert_eq!(ValueKind::of_json(&json!("x")), ValueKind::String);
        assert_eq!(ValueKind::of_json(&json!(true)), ValueKind::Boolean);
        assert_eq!(ValueKind::of_json(&json!([])), ValueKind::Array);
        assert_eq!(ValueKind::of_json(&json!({})), ValueKind::Object);
        assert_eq!(ValueKind::of_json(&json!(null)), ValueKind::Null);
        assert_eq!(serde_json::to_value(ValueKind::Null).unwrap(), "null");
    }

    #[test]
    fn test_meta_serde() {
        let meta = EntryMeta::datetime("Datum und Uhrzeit (Lokal)");
        let json = serde_json::to_value(&meta).unwrap();
        assert_eq!(json["role"], "value.datetime");
        assert_eq!(json["type"], "string");
        assert_eq!(json["read"], true);
        assert_eq!(json["write"], false);
    }

    #[test]
    fn test_state_value_serde_roundtrip() {
        let value = StateValue::Array(vec![StateValue::Text("a".into()), StateValue::Null]);
        let text = serde_json::to_string(&value).unwrap();
        assert_eq!(text, r#"["a",null]"#);
        let back: StateValue = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }
}
