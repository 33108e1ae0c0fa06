use crate::value::Value;
use std::ops::{BitAnd, BitOr};

///
/// Filter AST
///
/// Pure, schema-agnostic representation of query filters.
/// This layer contains no type validation or execution semantics.
/// All interpretation occurs in later passes:
///
/// - normalization
/// - validation (schema-aware)
/// - evaluation
///

///
/// CompareOp
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u8)]
pub enum CompareOp {
    Eq = 0x01,
    Ne = 0x02,
    Lt = 0x03,
    Lte = 0x04,
    Gt = 0x05,
    Gte = 0x06,
    In = 0x07,
    NotIn = 0x08,
}

impl CompareOp {
    #[must_use]
    pub const fn tag(self) -> u8 {
        self as u8
    }

    /// Document operator spelling.
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::In => "$in",
            Self::NotIn => "$nin",
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        let op = match symbol {
            "$eq" => Self::Eq,
            "$ne" => Self::Ne,
            "$lt" => Self::Lt,
            "$lte" => Self::Lte,
            "$gt" => Self::Gt,
            "$gte" => Self::Gte,
            "$in" => Self::In,
            "$nin" => Self::NotIn,
            _ => return None,
        };

        Some(op)
    }

    #[must_use]
    pub const fn is_ordering(self) -> bool {
        matches!(self, Self::Lt | Self::Lte | Self::Gt | Self::Gte)
    }

    #[must_use]
    pub const fn is_membership(self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

///
/// ComparePredicate
///

#[derive(Clone, Debug, PartialEq)]
pub struct ComparePredicate {
    pub field: String,
    pub op: CompareOp,
    pub value: Value,
}

impl ComparePredicate {
    #[must_use]
    pub fn new(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            op,
            value: value.into(),
        }
    }
}

///
/// Quantifier
/// Collection operator applied to a relationship's related records.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum Quantifier {
    /// Every related record matches; true over an empty sequence.
    Every,
    /// No related record matches; true over an empty sequence.
    None,
    /// At least one related record matches; false over an empty sequence.
    Some,
}

impl Quantifier {
    #[must_use]
    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Every => "$every",
            Self::None => "$none",
            Self::Some => "$some",
        }
    }

    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "$every" => Some(Self::Every),
            "$none" => Some(Self::None),
            "$some" => Some(Self::Some),
            _ => None,
        }
    }
}

///
/// QuantifiedPredicate
///

#[derive(Clone, Debug, PartialEq)]
pub struct QuantifiedPredicate {
    pub relation: String,
    pub quantifier: Quantifier,
    pub filter: Box<Filter>,
}

///
/// Filter
///

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Filter {
    #[default]
    True,
    False,
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Compare(ComparePredicate),
    Quantified(QuantifiedPredicate),
}

impl Filter {
    #[must_use]
    pub const fn and(filters: Vec<Self>) -> Self {
        Self::And(filters)
    }

    #[must_use]
    pub const fn or(filters: Vec<Self>) -> Self {
        Self::Or(filters)
    }

    #[expect(clippy::should_implement_trait)]
    #[must_use]
    pub fn not(filter: Self) -> Self {
        Self::Not(Box::new(filter))
    }

    #[must_use]
    pub fn compare(field: impl Into<String>, op: CompareOp, value: impl Into<Value>) -> Self {
        Self::Compare(ComparePredicate::new(field, op, value))
    }

    #[must_use]
    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Eq, value)
    }

    #[must_use]
    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Ne, value)
    }

    #[must_use]
    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lt, value)
    }

    #[must_use]
    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Lte, value)
    }

    #[must_use]
    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gt, value)
    }

    #[must_use]
    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::compare(field, CompareOp::Gte, value)
    }

    #[must_use]
    pub fn in_<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        Self::compare(field, CompareOp::In, Value::List(values))
    }

    #[must_use]
    pub fn not_in<V: Into<Value>>(
        field: impl Into<String>,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect::<Vec<_>>();
        Self::compare(field, CompareOp::NotIn, Value::List(values))
    }

    #[must_use]
    pub fn quantified(relation: impl Into<String>, quantifier: Quantifier, filter: Self) -> Self {
        Self::Quantified(QuantifiedPredicate {
            relation: relation.into(),
            quantifier,
            filter: Box::new(filter),
        })
    }

    /// At least one related record matches `filter`.
    #[must_use]
    pub fn some(relation: impl Into<String>, filter: Self) -> Self {
        Self::quantified(relation, Quantifier::Some, filter)
    }

    /// No related record matches `filter`.
    #[must_use]
    pub fn none(relation: impl Into<String>, filter: Self) -> Self {
        Self::quantified(relation, Quantifier::None, filter)
    }

    /// Every related record matches `filter`.
    #[must_use]
    pub fn every(relation: impl Into<String>, filter: Self) -> Self {
        Self::quantified(relation, Quantifier::Every, filter)
    }

    #[must_use]
    pub const fn is_true(&self) -> bool {
        matches!(self, Self::True)
    }
}

impl BitAnd for Filter {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        Self::And(vec![self, rhs])
    }
}

impl BitAnd for &Filter {
    type Output = Filter;

    fn bitand(self, rhs: Self) -> Self::Output {
        Filter::And(vec![self.clone(), rhs.clone()])
    }
}

impl BitOr for Filter {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        Self::Or(vec![self, rhs])
    }
}

impl BitOr for &Filter {
    type Output = Filter;

    fn bitor(self, rhs: Self) -> Self::Output {
        Filter::Or(vec![self.clone(), rhs.clone()])
    }
}
