use crate::{model::FieldKind, value::Value};
use derive_more::Display;
use serde::Serialize;
use thiserror::Error as ThisError;

///
/// Key
///
/// Primary-key value. A totally ordered subset of `Value` so tables and
/// join tables can be keyed and compared without float or null cases.
///

#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Uint(u64),
    Text(String),
}

///
/// KeyError
///
/// Errors returned when a value cannot act as a key of a given field kind.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum KeyError {
    #[error("field kind {kind} cannot hold a primary key")]
    UnkeyableKind { kind: FieldKind },

    #[error("value {value} is not a valid {kind} key")]
    Mismatch { kind: FieldKind, value: String },
}

impl Key {
    /// Coerce a value into a key of the given primary-key field kind.
    ///
    /// JSON integers arrive as `Int`, so non-negative `Int` values are accepted
    /// for `Uint` keys and `Uint` values inside `i64` range for `Int` keys.
    pub fn coerce(kind: FieldKind, value: &Value) -> Result<Self, KeyError> {
        let key = match (kind, value) {
            (FieldKind::Int, Value::Int(i)) => Some(Self::Int(*i)),
            (FieldKind::Int, Value::Uint(u)) => i64::try_from(*u).ok().map(Self::Int),
            (FieldKind::Uint, Value::Uint(u)) => Some(Self::Uint(*u)),
            (FieldKind::Uint, Value::Int(i)) => u64::try_from(*i).ok().map(Self::Uint),
            (FieldKind::Text, Value::Text(s)) => Some(Self::Text(s.clone())),
            (FieldKind::Int | FieldKind::Uint | FieldKind::Text, _) => None,
            (FieldKind::Bool | FieldKind::Float64, _) => {
                return Err(KeyError::UnkeyableKind { kind });
            }
        };

        key.ok_or_else(|| KeyError::Mismatch {
            kind,
            value: value.to_string(),
        })
    }

    /// Convert back into a field value.
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Int(i) => Value::Int(*i),
            Self::Uint(u) => Value::Uint(*u),
            Self::Text(s) => Value::Text(s.clone()),
        }
    }
}

impl From<i32> for Key {
    fn from(value: i32) -> Self {
        Self::Int(value.into())
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<u32> for Key {
    fn from(value: u32) -> Self {
        Self::Uint(value.into())
    }
}

impl From<u64> for Key {
    fn from(value: u64) -> Self {
        Self::Uint(value)
    }
}

impl From<&str> for Key {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for Key {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        key.to_value()
    }
}

///
/// TESTS
///
