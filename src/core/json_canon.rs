//! Canonical JSON encoder for content hashing.

use serde_json::{Map, Value};

use super::error::EncodingError;

/// Serialize a JSON value to canonical bytes.
///
/// Canonical rules:
/// - object keys sorted by UTF-8 byte order, recursively
/// - array order preserved
/// - no insignificant whitespace
/// - reject NaN/Infinity floats
pub fn to_canon_json_bytes(value: Value) -> Result<Vec<u8>, EncodingError> {
    let canon = canon_value(value);
    Ok(serde_json::to_vec(&canon)?)
}

/// Finite `f64` as a JSON number, with `-0.0` folded into `0.0`.
pub fn canon_f64(key: &str, value: f64) -> Result<Value, EncodingError> {
    let value = if value == 0.0 { 0.0 } else { value };
    serde_json::Number::from_f64(value)
        .map(Value::Number)
        .ok_or_else(|| EncodingError::attribute(key, format!("non-finite float {value}")))
}

fn canon_value(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            let mut canon = Map::new();
            for (key, value) in entries {
                canon.insert(key, canon_value(value));
            }
            Value::Object(canon)
        }
        Value::Array(values) => Value::Array(values.into_iter().map(canon_value).collect()),
        other => other,
    }
}
