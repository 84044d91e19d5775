//! Checked field extraction from loosely-typed upstream JSON.

use serde_json::{Map, Number, Value};

use crate::error::FetchError;

pub(crate) type Object = Map<String, Value>;

pub(crate) fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

pub(crate) fn string_field(object: &Object, key: &str) -> Result<String, FetchError> {
    match object.get(key) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(FetchError::decode(format!(
            "field `{}` should be a string, got {}",
            key,
            type_name(other)
        ))),
        None => Err(FetchError::decode(format!("missing field `{}`", key))),
    }
}

pub(crate) fn number_field(object: &Object, key: &str) -> Result<Number, FetchError> {
    match object.get(key) {
        Some(Value::Number(n)) => Ok(n.clone()),
        Some(other) => Err(FetchError::decode(format!(
            "field `{}` should be a number, got {}",
            key,
            type_name(other)
        ))),
        None => Err(FetchError::decode(format!("missing field `{}`", key))),
    }
}
