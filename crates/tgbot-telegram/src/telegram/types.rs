//! Bot API envelope and parameter conversion.

use serde::Deserialize;
use serde_json::{Map, Value};

/// Untyped outbound parameters: field name to JSON value.
pub type Params = Map<String, Value>;

/// Every Bot API response body has this shape.
#[derive(Debug, Deserialize)]
pub(crate) struct TgResponse {
    #[serde(default)]
    pub ok: bool,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub error_code: Option<i64>,
}

/// Render a JSON value the way it travels as a form field.
///
/// Strings go as-is, scalars as their JSON text, objects and arrays (e.g.
/// `reply_markup`) as serialized JSON. `null` means "leave the field out".
pub(crate) fn form_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(_) | Value::Object(_) => Some(value.to_string()),
    }
}
