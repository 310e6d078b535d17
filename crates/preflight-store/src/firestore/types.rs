//! Firestore REST API types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Firestore document value types.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Value {
    NullValue(()),
    BooleanValue(bool),
    IntegerValue(String), // Firestore sends integers as strings
    DoubleValue(f64),
    TimestampValue(String),
    StringValue(String),
    ArrayValue(ArrayValue),
    MapValue(MapValue),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrayValue {
    pub values: Option<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapValue {
    pub fields: Option<HashMap<String, Value>>,
}

/// Firestore document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Full resource name
    pub name: Option<String>,
    /// Document fields
    pub fields: Option<HashMap<String, Value>>,
    /// Create time
    pub create_time: Option<String>,
    /// Update time, used as the optimistic concurrency token
    pub update_time: Option<String>,
}

impl Document {
    /// Create a new document with the given fields.
    pub fn new(fields: HashMap<String, Value>) -> Self {
        Self {
            name: None,
            fields: Some(fields),
            create_time: None,
            update_time: None,
        }
    }
}

/// Convert a Rust value to Firestore Value.
pub trait ToFirestoreValue {
    fn to_firestore_value(&self) -> Value;
}

/// Convert Firestore Value to Rust type.
pub trait FromFirestoreValue: Sized {
    fn from_firestore_value(value: &Value) -> Option<Self>;
}

impl ToFirestoreValue for String {
    fn to_firestore_value(&self) -> Value {
        Value::StringValue(self.clone())
    }
}

impl ToFirestoreValue for f64 {
    fn to_firestore_value(&self) -> Value {
        Value::DoubleValue(*self)
    }
}

impl ToFirestoreValue for bool {
    fn to_firestore_value(&self) -> Value {
        Value::BooleanValue(*self)
    }
}

/// JSON trees map onto Firestore maps and arrays; integers that fit `i64`
/// become `integerValue`, other numbers `doubleValue`.
impl ToFirestoreValue for serde_json::Value {
    fn to_firestore_value(&self) -> Value {
        match self {
            serde_json::Value::Null => Value::NullValue(()),
            serde_json::Value::Bool(b) => b.to_firestore_value(),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::IntegerValue(i.to_string()),
                None => n.as_f64().unwrap_or_default().to_firestore_value(),
            },
            serde_json::Value::String(s) => s.to_firestore_value(),
            serde_json::Value::Array(items) => Value::ArrayValue(ArrayValue {
                values: Some(items.iter().map(|v| v.to_firestore_value()).collect()),
            }),
            serde_json::Value::Object(map) => Value::MapValue(MapValue {
                fields: Some(
                    map.iter()
                        .map(|(k, v)| (k.clone(), v.to_firestore_value()))
                        .collect(),
                ),
            }),
        }
    }
}

impl FromFirestoreValue for serde_json::Value {
    fn from_firestore_value(value: &Value) -> Option<Self> {
        Some(match value {
            Value::NullValue(()) => serde_json::Value::Null,
            Value::BooleanValue(b) => serde_json::Value::Bool(*b),
            Value::IntegerValue(s) => serde_json::Value::from(s.parse::<i64>().ok()?),
            Value::DoubleValue(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::TimestampValue(s) | Value::StringValue(s) => serde_json::Value::String(s.clone()),
            Value::ArrayValue(array) => serde_json::Value::Array(
                array
                    .values
                    .iter()
                    .flatten()
                    .map(serde_json::Value::from_firestore_value)
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::MapValue(map) => serde_json::Value::Object(fields_to_json(map.fields.as_ref())?),
        })
    }
}

/// Document fields to a JSON object.
pub fn fields_to_json(fields: Option<&HashMap<String, Value>>) -> Option<serde_json::Map<String, serde_json::Value>> {
    fields
        .into_iter()
        .flatten()
        .map(|(k, v)| serde_json::Value::from_firestore_value(v).map(|v| (k.clone(), v)))
        .collect()
}
