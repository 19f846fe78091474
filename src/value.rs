//! Core value types and row marshaling.

use std::collections::HashMap;

use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};

/// Core value types for SQLite operations
///
/// Serializes untagged, so records come out as the flat JSON objects they
/// were loaded from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    Boolean(bool),
}

impl Value {
    /// Encode as a SQL literal fragment: text double-quoted (embedded
    /// quotes are the caller's responsibility), numerics bare. Every other
    /// kind yields no fragment and is dropped from the statement.
    pub fn literal(&self) -> Option<String> {
        match self {
            Value::Text(text) => Some(format!("\"{text}\"")),
            Value::Integer(value) => Some(value.to_string()),
            Value::Real(value) => Some(value.to_string()),
            Value::Null | Value::Blob(_) | Value::Boolean(_) => None,
        }
    }

    /// Unquoted rendering, used for `id=` fragments.
    pub(crate) fn bare(&self) -> String {
        match self {
            Value::Null => String::new(),
            Value::Integer(value) => value.to_string(),
            Value::Real(value) => value.to_string(),
            Value::Text(text) => text.clone(),
            Value::Blob(bytes) => String::from_utf8_lossy(bytes).into_owned(),
            Value::Boolean(value) => u8::from(*value).to_string(),
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            Value::Integer(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Integer(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Integer(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Real(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<Vec<u8>> for Value {
    fn from(value: Vec<u8>) -> Self {
        Value::Blob(value)
    }
}

impl From<ValueRef<'_>> for Value {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(r) => Value::Real(r),
            ValueRef::Text(text) => Value::Text(String::from_utf8_lossy(text).into_owned()),
            ValueRef::Blob(bytes) => Value::Blob(bytes.to_vec()),
        }
    }
}

/// A single result row keyed by column name.
pub type Record = HashMap<String, Value>;

/// Column/value pairs for INSERT and UPDATE descriptors.
///
/// Keys become column names verbatim and keep their insertion order in the
/// generated statement.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Data {
    entries: Vec<(String, Value)>,
}

impl Data {
    /// Create an empty Data object
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a named value
    pub fn with_value(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.entries.push((name.to_string(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(name, value)| (name.as_str(), value))
    }
}
