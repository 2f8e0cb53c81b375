//! Conversion between JSON documents and CEL values

use super::Value;
use crate::Result;
use cel_interpreter::objects::{Key, Map};
use ohno::app_err;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Convert a JSON document into a CEL value
#[must_use]
pub fn json_to_cel(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Int(i)
            } else if let Some(u) = n.as_u64() {
                Value::UInt(u)
            } else {
                Value::Float(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        JsonValue::String(s) => Value::String(Arc::new(s.clone())),
        JsonValue::Array(items) => Value::List(Arc::new(items.iter().map(json_to_cel).collect())),
        JsonValue::Object(fields) => {
            let map: HashMap<String, Value> = fields.iter().map(|(k, v)| (k.clone(), json_to_cel(v))).collect();
            Value::Map(Map::from(map))
        }
    }
}

/// Convert a CEL value into JSON for the report
///
/// # Errors
///
/// Returns an error for values JSON cannot represent, such as functions or non-finite floats
pub fn cel_to_json(value: &Value) -> Result<JsonValue> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(b) => JsonValue::Bool(*b),
        Value::Int(i) => JsonValue::from(*i),
        Value::UInt(u) => JsonValue::from(*u),
        Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| app_err!("cannot represent non-finite number {f} in the report"))?,
        Value::String(s) => JsonValue::String(s.to_string()),
        Value::Bytes(b) => JsonValue::String(String::from_utf8_lossy(b).into_owned()),
        Value::List(items) => JsonValue::Array(items.iter().map(cel_to_json).collect::<Result<_>>()?),
        Value::Map(map) => {
            let mut fields = serde_json::Map::new();
            for (key, item) in map.map.iter() {
                let _ = fields.insert(key_to_string(key), cel_to_json(item)?);
            }
            JsonValue::Object(fields)
        }
        Value::Timestamp(ts) => JsonValue::String(ts.to_rfc3339()),
        Value::Duration(d) => JsonValue::String(format_duration(d)),
        other => return Err(app_err!("cannot represent CEL value {other:?} in the report")),
    })
}

fn key_to_string(key: &Key) -> String {
    match key {
        Key::Int(i) => i.to_string(),
        Key::Uint(u) => u.to_string(),
        Key::Bool(b) => b.to_string(),
        Key::String(s) => s.to_string(),
    }
}

/// Format a duration the way CEL prints one, e.g. `90s` or `1.5s`.
fn format_duration(d: &chrono::Duration) -> String {
    let sign = if *d < chrono::Duration::zero() { "-" } else { "" };
    let abs = d.abs();
    let secs = abs.num_seconds();
    let nanos = abs.subsec_nanos();

    if nanos == 0 {
        format!("{sign}{secs}s")
    } else {
        let fraction = format!("{nanos:09}");
        format!("{sign}{secs}.{}s", fraction.trim_end_matches('0'))
    }
}
