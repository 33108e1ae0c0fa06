use crate::db::query::predicate::ast::{Filter, QuantifiedPredicate};

///
/// Normalize a filter into a canonical form.
///
/// Normalization guarantees:
/// - Logical equivalence is preserved
/// - Nested AND / OR nodes are flattened
/// - Neutral elements are removed (True / False)
/// - Double negation is eliminated
///
/// Child order is kept so evaluation short-circuits in the written order.
///
#[must_use]
pub(crate) fn normalize(filter: &Filter) -> Filter {
    match filter {
        Filter::True => Filter::True,
        Filter::False => Filter::False,

        Filter::And(children) => normalize_and(children),
        Filter::Or(children) => normalize_or(children),
        Filter::Not(inner) => normalize_not(inner),

        Filter::Compare(cmp) => Filter::Compare(cmp.clone()),
        Filter::Quantified(q) => Filter::Quantified(QuantifiedPredicate {
            relation: q.relation.clone(),
            quantifier: q.quantifier,
            filter: Box::new(normalize(&q.filter)),
        }),
    }
}

fn normalize_and(children: &[Filter]) -> Filter {
    let mut out = Vec::with_capacity(children.len());

    for child in children {
        match normalize(child) {
            Filter::True => {}
            Filter::False => return Filter::False,
            Filter::And(grand) => out.extend(grand),
            other => out.push(other),
        }
    }

    collapse(out, Filter::True, Filter::And)
}

fn normalize_or(children: &[Filter]) -> Filter {
    let mut out = Vec::with_capacity(children.len());

    for child in children {
        match normalize(child) {
            Filter::False => {}
            Filter::True => return Filter::True,
            Filter::Or(grand) => out.extend(grand),
            other => out.push(other),
        }
    }

    collapse(out, Filter::False, Filter::Or)
}

fn normalize_not(inner: &Filter) -> Filter {
    match normalize(inner) {
        Filter::True => Filter::False,
        Filter::False => Filter::True,
        Filter::Not(grand) => *grand,
        other => Filter::Not(Box::new(other)),
    }
}

fn collapse(mut children: Vec<Filter>, empty: Filter, wrap: fn(Vec<Filter>) -> Filter) -> Filter {
    match children.len() {
        0 => empty,
        1 => children.pop().unwrap_or(empty),
        _ => wrap(children),
    }
}

///
/// TESTS
///
