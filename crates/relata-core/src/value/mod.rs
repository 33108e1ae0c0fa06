mod compare;
mod json;

#[cfg(test)]
mod tests;

use serde::Serialize;
use std::cmp::Ordering;

// re-exports
pub use compare::strict_order_cmp;
pub use json::JsonValueError;

///
/// Value
/// can be used in WHERE clauses and row documents
///
/// Null → the field is absent or explicitly null (SQL NULL).
///

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float64(f64),
    Text(String),
    /// Ordered list of values.
    /// Used for many-cardinality transport (`tags: [1, 3]`, `$in` operands).
    List(Vec<Self>),
}

impl Value {
    pub fn from_list<T: Into<Self>>(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Uint(_) | Self::Float64(_))
    }

    #[must_use]
    pub const fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::List(_))
    }

    /// Short, stable label used in diagnostics.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Uint(_) => "uint",
            Self::Float64(_) => "float64",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    ///
    /// CONVERSION
    ///

    #[must_use]
    pub const fn as_text(&self) -> Option<&str> {
        if let Self::Text(s) = self {
            Some(s.as_str())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_list(&self) -> Option<&[Self]> {
        if let Self::List(xs) = self {
            Some(xs.as_slice())
        } else {
            None
        }
    }

    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        if let Self::Bool(b) = self {
            Some(*b)
        } else {
            None
        }
    }

    fn as_i128(&self) -> Option<i128> {
        match self {
            Self::Int(i) => Some(i128::from(*i)),
            Self::Uint(u) => Some(i128::from(*u)),
            _ => None,
        }
    }

    /// Cross-type numeric comparison; returns None if non-numeric or NaN.
    ///
    /// Integers are compared against floats exactly, without rounding the
    /// integer through `f64`.
    #[must_use]
    pub fn cmp_numeric(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Self::Float64(a), Self::Float64(b)) => a.partial_cmp(b),
            (Self::Float64(f), _) => cmp_int_float(other.as_i128()?, *f).map(Ordering::reverse),
            (_, Self::Float64(f)) => cmp_int_float(self.as_i128()?, *f),
            _ => Some(self.as_i128()?.cmp(&other.as_i128()?)),
        }
    }

    /// Semantic equality used by filter evaluation.
    ///
    /// Numbers compare across `Int`/`Uint`/`Float64`; lists compare
    /// element-wise; everything else requires the same variant.
    /// Returns `None` when the two values are not comparable.
    #[must_use]
    pub fn semantic_eq(&self, other: &Self) -> Option<bool> {
        match (self, other) {
            (Self::Null, Self::Null) => Some(true),
            (Self::Null, _) | (_, Self::Null) => Some(false),
            (Self::List(a), Self::List(b)) => {
                if a.len() != b.len() {
                    return Some(false);
                }
                for (left, right) in a.iter().zip(b) {
                    if !left.semantic_eq(right)? {
                        return Some(false);
                    }
                }
                Some(true)
            }
            _ => self.semantic_cmp(other).map(Ordering::is_eq),
        }
    }

    /// Semantic ordering used by `$gt`/`$gte`/`$lt`/`$lte`.
    ///
    /// Only scalar, non-null values of compatible families are ordered.
    #[must_use]
    pub fn semantic_cmp(&self, other: &Self) -> Option<Ordering> {
        if self.is_numeric() && other.is_numeric() {
            return self.cmp_numeric(other);
        }

        strict_order_cmp(self, other)
    }

    /// Membership test used by `$in` / `$nin`.
    ///
    /// Returns `None` if `haystack` is not a list.
    #[must_use]
    pub fn in_list(&self, haystack: &Self) -> Option<bool> {
        let items = haystack.as_list()?;

        Some(
            items
                .iter()
                .any(|item| self.semantic_eq(item).unwrap_or(false)),
        )
    }
}

// Exact ordering of an integer against a float.
// The float's integral part is saturated into i128, which is wider than any
// Int or Uint, so out-of-range floats still order correctly.
#[expect(clippy::cast_possible_truncation)]
fn cmp_int_float(int: i128, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }

    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        ord => Some(ord),
    }
}

#[macro_export]
macro_rules! impl_from_for {
    ( $( $type:ty => $variant:ident ),* $(,)? ) => {
        $(
            impl From<$type> for Value {
                fn from(v: $type) -> Self {
                    Self::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for! {
    bool   => Bool,
    i8     => Int,
    i16    => Int,
    i32    => Int,
    i64    => Int,
    &str   => Text,
    String => Text,
    u8     => Uint,
    u16    => Uint,
    u32    => Uint,
    u64    => Uint,
    f32    => Float64,
    f64    => Float64,
}

impl From<Vec<Self>> for Value {
    fn from(vec: Vec<Self>) -> Self {
        Self::List(vec)
    }
}

impl<T: Into<Self>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Uint(u) => write!(f, "{u}"),
            Self::Float64(x) => write!(f, "{x}"),
            Self::Text(s) => write!(f, "{s:?}"),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
        }
    }
}
