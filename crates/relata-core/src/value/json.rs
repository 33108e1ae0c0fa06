use crate::value::Value;
use serde_json::{Number, Value as JsonValue};
use thiserror::Error as ThisError;

///
/// JsonValueError
///
/// JSON shapes that have no `Value` representation.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum JsonValueError {
    #[error("json objects are not field values")]
    Object,

    #[error("json number {0} is not representable")]
    Number(String),
}

impl Value {
    /// Convert a JSON scalar or array into a field value.
    ///
    /// Integers prefer `Int`, falling back to `Uint` above `i64::MAX`.
    pub fn from_json(json: &JsonValue) -> Result<Self, JsonValueError> {
        match json {
            JsonValue::Null => Ok(Self::Null),
            JsonValue::Bool(b) => Ok(Self::Bool(*b)),
            JsonValue::Number(n) => from_json_number(n),
            JsonValue::String(s) => Ok(Self::Text(s.clone())),
            JsonValue::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::List),
            JsonValue::Object(_) => Err(JsonValueError::Object),
        }
    }

    /// Render this value as JSON.
    ///
    /// Non-finite floats render as `null`.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        match self {
            Self::Null => JsonValue::Null,
            Self::Bool(b) => JsonValue::Bool(*b),
            Self::Int(i) => JsonValue::from(*i),
            Self::Uint(u) => JsonValue::from(*u),
            Self::Float64(f) => Number::from_f64(*f).map_or(JsonValue::Null, JsonValue::Number),
            Self::Text(s) => JsonValue::String(s.clone()),
            Self::List(items) => JsonValue::Array(items.iter().map(Self::to_json).collect()),
        }
    }
}

fn from_json_number(n: &Number) -> Result<Value, JsonValueError> {
    if let Some(i) = n.as_i64() {
        return Ok(Value::Int(i));
    }
    if let Some(u) = n.as_u64() {
        return Ok(Value::Uint(u));
    }

    n.as_f64()
        .map(Value::Float64)
        .ok_or_else(|| JsonValueError::Number(n.to_string()))
}

impl TryFrom<&JsonValue> for Value {
    type Error = JsonValueError;

    fn try_from(json: &JsonValue) -> Result<Self, Self::Error> {
        Self::from_json(json)
    }
}
