//! Layer 2: BPO attributes
//!
//! A string-keyed map of scalar or structured values. Keys are held in a
//! `BTreeMap`, so iteration order never depends on insertion order.

use std::collections::BTreeMap;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Number, Value};

use super::error::EncodingError;

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<AttrValue>),
    Map(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Convert a JSON value, rejecting numbers that fit neither `i64` nor a
    /// finite `f64`.
    pub fn from_json(key: &str, value: Value) -> Result<Self, EncodingError> {
        Ok(match value {
            Value::Null => AttrValue::Null,
            Value::Bool(b) => AttrValue::Bool(b),
            Value::Number(n) => number_value(key, &n)?,
            Value::String(s) => AttrValue::Text(s),
            Value::Array(items) => AttrValue::List(
                items
                    .into_iter()
                    .enumerate()
                    .map(|(idx, item)| AttrValue::from_json(&format!("{key}[{idx}]"), item))
                    .collect::<Result<_, _>>()?,
            ),
            Value::Object(map) => AttrValue::Map(
                map.into_iter()
                    .map(|(k, v)| {
                        let path = format!("{key}.{k}");
                        AttrValue::from_json(&path, v).map(|v| (k, v))
                    })
                    .collect::<Result<_, _>>()?,
            ),
        })
    }

    /// Scalar rendering used when deriving a stable identity from an attribute.
    pub fn as_identity_str(&self) -> Option<String> {
        match self {
            AttrValue::Text(s) => Some(s.clone()),
            AttrValue::Int(i) => Some(i.to_string()),
            _ => None,
        }
    }

    pub(crate) fn ensure_finite(&self, key: &str) -> Result<(), EncodingError> {
        match self {
            AttrValue::Float(f) if !f.is_finite() => {
                Err(EncodingError::attribute(key, format!("non-finite float {f}")))
            }
            AttrValue::List(items) => items
                .iter()
                .enumerate()
                .try_for_each(|(idx, item)| item.ensure_finite(&format!("{key}[{idx}]"))),
            AttrValue::Map(map) => map
                .iter()
                .try_for_each(|(k, v)| v.ensure_finite(&format!("{key}.{k}"))),
            _ => Ok(()),
        }
    }
}

fn number_value(key: &str, n: &Number) -> Result<AttrValue, EncodingError> {
    if let Some(i) = n.as_i64() {
        return Ok(AttrValue::Int(i));
    }
    if n.is_u64() {
        return Err(EncodingError::attribute(
            key,
            format!("integer {n} exceeds the signed 64-bit range"),
        ));
    }
    match n.as_f64() {
        Some(f) if f.is_finite() => Ok(AttrValue::Float(f)),
        _ => Err(EncodingError::attribute(
            key,
            format!("number {n} is not representable"),
        )),
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttrValue::Null => serializer.serialize_unit(),
            AttrValue::Bool(b) => serializer.serialize_bool(*b),
            AttrValue::Int(i) => serializer.serialize_i64(*i),
            AttrValue::Float(f) => serializer.serialize_f64(*f),
            AttrValue::Text(s) => serializer.serialize_str(s),
            AttrValue::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            AttrValue::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        AttrValue::from_json("$", value).map_err(serde::de::Error::custom)
    }
}

impl From<&str> for AttrValue {
    fn from(s: &str) -> Self {
        AttrValue::Text(s.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(s: String) -> Self {
        AttrValue::Text(s)
    }
}

impl From<i64> for AttrValue {
    fn from(i: i64) -> Self {
        AttrValue::Int(i)
    }
}

impl From<i32> for AttrValue {
    fn from(i: i32) -> Self {
        AttrValue::Int(i64::from(i))
    }
}

impl From<f64> for AttrValue {
    fn from(f: f64) -> Self {
        AttrValue::Float(f)
    }
}

impl From<bool> for AttrValue {
    fn from(b: bool) -> Self {
        AttrValue::Bool(b)
    }
}

/// Attribute map of a BPO.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Attributes(BTreeMap<String, AttrValue>);

impl Attributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<AttrValue>) -> Option<AttrValue> {
        self.0.insert(key.into(), value.into())
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Convert a JSON object.
    pub fn from_json(value: Value) -> Result<Self, EncodingError> {
        match value {
            Value::Object(map) => map
                .into_iter()
                .map(|(k, v)| AttrValue::from_json(&k, v).map(|v| (k, v)))
                .collect::<Result<BTreeMap<_, _>, _>>()
                .map(Attributes),
            other => Err(EncodingError::attribute(
                "$",
                format!("attributes must be a JSON object (got {})", json_kind(&other)),
            )),
        }
    }

    pub fn validate(&self) -> Result<(), EncodingError> {
        self.0.iter().try_for_each(|(k, v)| v.ensure_finite(k))
    }
}

impl FromIterator<(String, AttrValue)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, AttrValue)>>(iter: I) -> Self {
        Attributes(iter.into_iter().collect())
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
