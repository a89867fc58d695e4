//! Structured key/value payload attached to a log event
//!
//! The payload renders as compact JSON in the record's data field. Keys are kept
//! in sorted order so identical payloads always render identically.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Value type for structured payload fields
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    Map(StructuredData),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::String(s) => write!(f, "{}", s),
            FieldValue::Int(i) => write!(f, "{}", i),
            FieldValue::Float(fl) => write!(f, "{}", fl),
            FieldValue::Bool(b) => write!(f, "{}", b),
            FieldValue::Map(m) => write!(f, "{}", m),
            FieldValue::Null => write!(f, "null"),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::String(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::String(s.to_string())
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Int(i)
    }
}

impl From<i32> for FieldValue {
    fn from(i: i32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<u32> for FieldValue {
    fn from(i: u32) -> Self {
        FieldValue::Int(i as i64)
    }
}

impl From<f64> for FieldValue {
    fn from(f: f64) -> Self {
        FieldValue::Float(f)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

impl From<StructuredData> for FieldValue {
    fn from(map: StructuredData) -> Self {
        FieldValue::Map(map)
    }
}

impl<T: Into<FieldValue>> From<Option<T>> for FieldValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(FieldValue::Null, Into::into)
    }
}

/// Ordered map of payload fields
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StructuredData {
    fields: BTreeMap<String, FieldValue>,
}

impl StructuredData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style)
    pub fn with_field<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Add a field (mutable version)
    pub fn insert<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: Into<FieldValue>,
    {
        self.fields.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Append the compact JSON form to `out`
    pub fn write_json(&self, out: &mut Vec<u8>) -> serde_json::Result<()> {
        serde_json::to_writer(out, self)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for StructuredData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(json) => f.write_str(&json),
            Err(_) => f.write_str("{}"),
        }
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for StructuredData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_json() {
        let data = StructuredData::new()
            .with_field("user_id", 12345_i64)
            .with_field("name", "alice")
            .with_field("admin", false);

        assert_eq!(
            data.to_json().unwrap(),
            r#"{"admin":false,"name":"alice","user_id":12345}"#
        );
    }

    #[test]
    fn test_nested_map() {
        let inner = StructuredData::new().with_field("M", "value");
        let data = StructuredData::new().with_field("N", inner);

        assert_eq!(data.to_json().unwrap(), r#"{"N":{"M":"value"}}"#);
    }

    #[test]
    fn test_null_and_float() {
        let data = StructuredData::new()
            .with_field("ratio", 0.5)
            .with_field("missing", None::<&str>);

        assert_eq!(data.to_json().unwrap(), r#"{"missing":null,"ratio":0.5}"#);
    }

    #[test]
    fn test_from_iterator() {
        let data: StructuredData = [("a", 1_i64), ("b", 2_i64)].into_iter().collect();
        assert_eq!(data.len(), 2);
        assert_eq!(data.get("b"), Some(&FieldValue::Int(2)));
    }

    #[test]
    fn test_write_json_appends() {
        let mut out = b"prefix:".to_vec();
        StructuredData::new()
            .with_field("k", "v")
            .write_json(&mut out)
            .unwrap();
        assert_eq!(out, br#"prefix:{"k":"v"}"#);
    }

    #[test]
    fn test_deserialize_nested() {
        let data: StructuredData =
            serde_json::from_str(r#"{"span":{"kind":"server"},"n":3}"#).unwrap();
        assert_eq!(data.get("n"), Some(&FieldValue::Int(3)));
        assert!(matches!(data.get("span"), Some(FieldValue::Map(_))));
    }
}
