// src/codec/value.rs

//! Dynamically shaped manifest values
//!
//! Manifest fields may hold a scalar, a list or a nested mapping depending on
//! the package. `Value` is the closed set of shapes the codec understands.

use serde_json::Value as JsonValue;

/// A parsed structured-text value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    /// Numeric literal, kept as written so `1.10` is never rewritten
    Number(String),
    String(String),
    List(Vec<Value>),
    Map(Mapping),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&Mapping> {
        match self {
            Value::Map(map) => Some(map),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Text of a scalar value; `None` for null and collections
    pub fn scalar_text(&self) -> Option<String> {
        match self {
            Value::Bool(b) => Some(b.to_string()),
            Value::Number(n) => Some(n.clone()),
            Value::String(s) => Some(s.clone()),
            Value::Null | Value::List(_) | Value::Map(_) => None,
        }
    }

    /// Whether the value carries any content
    ///
    /// Null, empty strings and empty collections are considered empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Value::Null => true,
            Value::String(s) => s.is_empty(),
            Value::List(items) => items.is_empty(),
            Value::Map(map) => map.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }

    /// Convert to a JSON value, preserving mapping order
    pub fn to_json(&self) -> JsonValue {
        match self {
            Value::Null => JsonValue::Null,
            Value::Bool(b) => JsonValue::Bool(*b),
            Value::Number(n) => n
                .parse::<serde_json::Number>()
                .map(JsonValue::Number)
                .unwrap_or_else(|_| JsonValue::String(n.clone())),
            Value::String(s) => JsonValue::String(s.clone()),
            Value::List(items) => JsonValue::Array(items.iter().map(Value::to_json).collect()),
            Value::Map(map) => JsonValue::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
        }
    }

    /// Convert from a JSON value, preserving object order
    pub fn from_json(json: &JsonValue) -> Self {
        match json {
            JsonValue::Null => Value::Null,
            JsonValue::Bool(b) => Value::Bool(*b),
            JsonValue::Number(n) => Value::Number(n.to_string()),
            JsonValue::String(s) => Value::String(s.clone()),
            JsonValue::Array(items) => Value::List(items.iter().map(Value::from_json).collect()),
            JsonValue::Object(obj) => Value::Map(
                obj.iter()
                    .map(|(k, v)| (k.clone(), Value::from_json(v)))
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

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Map(map)
    }
}

/// An insertion-ordered string-keyed mapping
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mapping {
    entries: Vec<(String, Value)>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Insert a value, replacing an existing key in place
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Text of a scalar entry, if present and scalar
    pub fn get_text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(Value::scalar_text)
    }
}

impl FromIterator<(String, Value)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut map = Mapping::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_replaces_in_place() {
        let mut map = Mapping::new();
        map.insert("a", Value::from("1"));
        map.insert("b", Value::from("2"));
        map.insert("a", Value::from("3"));

        let keys: Vec<&str> = map.keys().collect();
        assert_eq!(keys, vec!["a", "b"]);
        assert_eq!(map.get_text("a"), Some("3".to_string()));
    }

    #[test]
    fn test_json_conversion_preserves_order() {
        let mut inner = Mapping::new();
        inner.insert("zeta", Value::Bool(true));
        inner.insert("alpha", Value::Number("1.10".to_string()));
        let mut map = Mapping::new();
        map.insert("VAR", Value::Map(inner));

        let json = Value::Map(map.clone()).to_json();
        assert_eq!(
            serde_json::to_string(&json).unwrap(),
            r#"{"VAR":{"zeta":true,"alpha":1.10}}"#
        );
        assert_eq!(Value::from_json(&json), Value::Map(map));
    }

    #[test]
    fn test_scalar_text() {
        assert_eq!(Value::Bool(false).scalar_text(), Some("false".to_string()));
        assert_eq!(Value::Number("2".to_string()).scalar_text(), Some("2".to_string()));
        assert_eq!(Value::Null.scalar_text(), None);
        assert_eq!(Value::List(vec![]).scalar_text(), None);
    }

    #[test]
    fn test_is_empty() {
        assert!(Value::Null.is_empty());
        assert!(Value::from("").is_empty());
        assert!(Value::Map(Mapping::new()).is_empty());
        assert!(!Value::Bool(false).is_empty());
        assert!(!Value::List(vec![Value::Null]).is_empty());
    }
}
