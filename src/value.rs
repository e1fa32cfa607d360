//! Typed parameter values produced by validation.

use serde::Serialize;
use serde_json::{Map, Number, Value};
use std::collections::BTreeMap;

/// A validated parameter value.
///
/// `Null` marks a parameter that was present but empty (for example `;color` in a
/// matrix path segment), as opposed to an absent parameter which has no entry at all.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Null,
    String(String),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Array(Vec<ParameterValue>),
    Object(BTreeMap<String, ParameterValue>),
}

impl ParameterValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ParameterValue::Null)
    }

    /// Null or an empty string.
    pub fn is_empty(&self) -> bool {
        match self {
            ParameterValue::Null => true,
            ParameterValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParameterValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParameterValue::Integer(i) => Some(i64::from(*i)),
            ParameterValue::Long(l) => Some(*l),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParameterValue::Float(f) => Some(f64::from(*f)),
            ParameterValue::Double(d) => Some(*d),
            ParameterValue::Integer(i) => Some(f64::from(*i)),
            // i64 -> f64 may round above 2^53
            ParameterValue::Long(l) => Some(*l as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParameterValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[ParameterValue]> {
        match self {
            ParameterValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&BTreeMap<String, ParameterValue>> {
        match self {
            ParameterValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Object field lookup; `None` for non-objects and missing fields.
    pub fn get(&self, key: &str) -> Option<&ParameterValue> {
        self.as_object().and_then(|m| m.get(key))
    }

    /// Merge `other` into `self`. Two objects merge key by key (recursively);
    /// any other combination replaces `self`.
    pub fn merge(&mut self, other: ParameterValue) {
        match (self, other) {
            (ParameterValue::Object(mine), ParameterValue::Object(theirs)) => {
                for (k, v) in theirs {
                    match mine.get_mut(&k) {
                        Some(existing) => existing.merge(v),
                        None => {
                            mine.insert(k, v);
                        }
                    }
                }
            }
            (slot, other) => *slot = other,
        }
    }

    /// Lossless conversion from JSON, used for schema defaults and JSON bodies.
    /// Integral numbers become `Integer` when they fit in 32 bits, else `Long`.
    pub fn from_json(value: &Value) -> ParameterValue {
        match value {
            Value::Null => ParameterValue::Null,
            Value::Bool(b) => ParameterValue::Boolean(*b),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    match i32::try_from(i) {
                        Ok(small) => ParameterValue::Integer(small),
                        Err(_) => ParameterValue::Long(i),
                    }
                } else {
                    ParameterValue::Double(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            Value::String(s) => ParameterValue::String(s.clone()),
            Value::Array(items) => {
                ParameterValue::Array(items.iter().map(ParameterValue::from_json).collect())
            }
            Value::Object(map) => ParameterValue::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), ParameterValue::from_json(v)))
                    .collect(),
            ),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            ParameterValue::Null => Value::Null,
            ParameterValue::String(s) => Value::String(s.clone()),
            ParameterValue::Integer(i) => Value::from(*i),
            ParameterValue::Long(l) => Value::from(*l),
            ParameterValue::Float(f) => {
                Number::from_f64(f64::from(*f)).map_or(Value::Null, Value::Number)
            }
            ParameterValue::Double(d) => Number::from_f64(*d).map_or(Value::Null, Value::Number),
            ParameterValue::Boolean(b) => Value::Bool(*b),
            ParameterValue::Array(items) => {
                Value::Array(items.iter().map(ParameterValue::to_json).collect())
            }
            ParameterValue::Object(map) => {
                let mut out = Map::with_capacity(map.len());
                for (k, v) in map {
                    out.insert(k.clone(), v.to_json());
                }
                Value::Object(out)
            }
        }
    }
}

impl From<&str> for ParameterValue {
    fn from(s: &str) -> Self {
        ParameterValue::String(s.to_string())
    }
}

impl From<String> for ParameterValue {
    fn from(s: String) -> Self {
        ParameterValue::String(s)
    }
}
