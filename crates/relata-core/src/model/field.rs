use crate::value::Value;
use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// FieldKind
///
/// Scalar type surface for declared fields.
/// Aligned with `Value` variants; relationship fields are modeled separately.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum FieldKind {
    Bool,
    Float64,
    Int,
    Text,
    Uint,
}

impl FieldKind {
    /// Whether values of this kind can act as primary or unique keys.
    #[must_use]
    pub const fn is_keyable(self) -> bool {
        matches!(self, Self::Int | Self::Text | Self::Uint)
    }

    /// Whether `$gt`/`$gte`/`$lt`/`$lte` apply to this kind.
    #[must_use]
    pub const fn is_orderable(self) -> bool {
        matches!(self, Self::Float64 | Self::Int | Self::Text | Self::Uint)
    }

    /// Coerce a value into this kind's canonical variant.
    ///
    /// Returns `None` when the value does not fit. `Null` never fits here;
    /// nullability is a property of the field, not the kind.
    #[must_use]
    #[expect(clippy::cast_precision_loss)]
    pub fn coerce(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Bool, Value::Bool(b)) => Some(Value::Bool(*b)),
            (Self::Float64, Value::Float64(f)) => Some(Value::Float64(*f)),
            (Self::Float64, Value::Int(i)) => Some(Value::Float64(*i as f64)),
            (Self::Float64, Value::Uint(u)) => Some(Value::Float64(*u as f64)),
            (Self::Int, Value::Int(i)) => Some(Value::Int(*i)),
            (Self::Int, Value::Uint(u)) => i64::try_from(*u).ok().map(Value::Int),
            (Self::Text, Value::Text(s)) => Some(Value::Text(s.clone())),
            (Self::Uint, Value::Uint(u)) => Some(Value::Uint(*u)),
            (Self::Uint, Value::Int(i)) => u64::try_from(*i).ok().map(Value::Uint),
            _ => None,
        }
    }

    /// Whether a filter literal is comparable with values of this kind.
    #[must_use]
    pub const fn accepts_literal(self, value: &Value) -> bool {
        match (self, value) {
            (Self::Bool, Value::Bool(_)) | (Self::Text, Value::Text(_)) => true,
            (Self::Float64 | Self::Int | Self::Uint, v) => v.is_numeric(),
            _ => false,
        }
    }
}

///
/// FieldModel
/// Runtime field metadata used by the store and by filter validation.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct FieldModel {
    /// Field name as used in rows and filters.
    pub name: String,
    pub kind: FieldKind,
    /// Enforced through a per-table unique index.
    pub unique: bool,
    /// Nullable fields may be omitted from inserted rows.
    pub nullable: bool,
}

impl FieldModel {
    #[must_use]
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            unique: false,
            nullable: false,
        }
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }
}

///
/// TESTS
///
