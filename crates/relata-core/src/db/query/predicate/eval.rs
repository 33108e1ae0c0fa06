use crate::{
    db::{
        query::predicate::ast::{
            CompareOp, ComparePredicate, Filter, QuantifiedPredicate, Quantifier,
        },
        relation::{RelationContext, resolve_relation},
        store::Record,
    },
    error::InternalError,
    model::EntityModel,
    value::Value,
};
use std::cmp::Ordering;

///
/// FieldPresence
///
/// Result of attempting to read a field from a row during filter
/// evaluation. This distinguishes between a missing field and a
/// present field whose value may be `Null`.
///

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum FieldPresence {
    /// Field exists and has a value (including `Value::Null`).
    Present(Value),
    /// Field is not present on the row.
    Missing,
}

///
/// Row
///
/// Abstraction over a row-like value that can expose fields by name.
/// This decouples comparison leaves from concrete record storage.
///

pub(crate) trait Row {
    fn field(&self, name: &str) -> FieldPresence;
}

///
/// Evaluate a filter against a single record.
///
/// Comparison leaves are pure; collection operators resolve the related
/// sequence through the relationship index and short-circuit.
/// CONTRACT: filters must be validated against `model` before evaluation.
///
pub(crate) fn eval(
    ctx: &RelationContext<'_>,
    model: &EntityModel,
    record: &Record,
    filter: &Filter,
) -> Result<bool, InternalError> {
    match filter {
        Filter::True => Ok(true),
        Filter::False => Ok(false),

        Filter::And(children) => {
            for child in children {
                if !eval(ctx, model, record, child)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Filter::Or(children) => {
            for child in children {
                if eval(ctx, model, record, child)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Filter::Not(inner) => Ok(!eval(ctx, model, record, inner)?),

        Filter::Compare(cmp) => Ok(eval_compare(record, cmp)),
        Filter::Quantified(q) => eval_quantified(ctx, model, record, q),
    }
}

///
/// Evaluate a single comparison leaf against a row.
///
/// A missing field reads as `Null`. `Null` only satisfies `$eq null`,
/// `$ne <non-null>` and membership lists that contain `null`.
///
pub(crate) fn eval_compare<R: Row + ?Sized>(row: &R, cmp: &ComparePredicate) -> bool {
    let ComparePredicate { field, op, value } = cmp;

    let actual = match row.field(field) {
        FieldPresence::Present(actual) => actual,
        FieldPresence::Missing => Value::Null,
    };

    // NOTE: comparison helpers return None when a comparison is invalid; eval treats that as false.
    match op {
        CompareOp::Eq => actual.semantic_eq(value) == Some(true),
        CompareOp::Ne => actual.semantic_eq(value) == Some(false),

        CompareOp::Lt => compare_order(&actual, value).is_some_and(Ordering::is_lt),
        CompareOp::Lte => compare_order(&actual, value).is_some_and(Ordering::is_le),
        CompareOp::Gt => compare_order(&actual, value).is_some_and(Ordering::is_gt),
        CompareOp::Gte => compare_order(&actual, value).is_some_and(Ordering::is_ge),

        CompareOp::In => actual.in_list(value).unwrap_or(false),
        CompareOp::NotIn => actual.in_list(value) == Some(false),
    }
}

fn compare_order(actual: &Value, literal: &Value) -> Option<Ordering> {
    if actual.is_null() || literal.is_null() {
        return None;
    }

    actual.semantic_cmp(literal)
}

fn eval_quantified(
    ctx: &RelationContext<'_>,
    model: &EntityModel,
    record: &Record,
    q: &QuantifiedPredicate,
) -> Result<bool, InternalError> {
    let relation = resolve_relation(model, &q.relation)?;
    let target = ctx.schema.try_entity(&relation.target)?;
    let related = ctx.related_records(model, relation, record)?;

    match q.quantifier {
        Quantifier::Some => {
            for child in related {
                if eval(ctx, target, child, &q.filter)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        Quantifier::None => {
            for child in related {
                if eval(ctx, target, child, &q.filter)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        Quantifier::Every => {
            for child in related {
                if !eval(ctx, target, child, &q.filter)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}
