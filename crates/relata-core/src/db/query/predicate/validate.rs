use crate::{
    db::{
        query::{
            QueryError,
            predicate::ast::{CompareOp, ComparePredicate, Filter, QuantifiedPredicate},
        },
        relation::RelationError,
    },
    model::{EntityModel, FieldKind, RelationModel},
    schema::Schema,
    value::Value,
};

/// Validate a filter against the model it will be evaluated on.
///
/// Quantified sub-filters are validated against the relationship's target
/// model, so every reference is checked before any row is read.
pub(crate) fn validate(
    schema: &Schema,
    model: &EntityModel,
    filter: &Filter,
) -> Result<(), QueryError> {
    match filter {
        Filter::True | Filter::False => Ok(()),
        Filter::And(children) | Filter::Or(children) => {
            for child in children {
                validate(schema, model, child)?;
            }
            Ok(())
        }
        Filter::Not(inner) => validate(schema, model, inner),
        Filter::Compare(cmp) => validate_compare(schema, model, cmp),
        Filter::Quantified(q) => validate_quantified(schema, model, q),
    }
}

fn validate_compare(
    schema: &Schema,
    model: &EntityModel,
    cmp: &ComparePredicate,
) -> Result<(), QueryError> {
    let kind = comparable_kind(schema, model, cmp)?;

    if cmp.op.is_ordering() && !kind.is_orderable() {
        return Err(QueryError::InvalidOperator {
            field: cmp.field.clone(),
            operator: cmp.op.symbol(),
            reason: "field kind has no ordering",
        });
    }

    if cmp.op.is_membership() {
        let Value::List(items) = &cmp.value else {
            return Err(invalid_literal(cmp, &cmp.value));
        };
        if let Some(item) = items
            .iter()
            .find(|item| !item.is_null() && !kind.accepts_literal(item))
        {
            return Err(invalid_literal(cmp, item));
        }
        return Ok(());
    }

    let null_allowed = matches!(cmp.op, CompareOp::Eq | CompareOp::Ne);
    let accepted = if cmp.value.is_null() {
        null_allowed
    } else {
        kind.accepts_literal(&cmp.value)
    };
    if accepted {
        Ok(())
    } else {
        Err(invalid_literal(cmp, &cmp.value))
    }
}

// Kind compared by a leaf: the scalar kind, or the target key kind of a
// many-to-one relation whose stored foreign key is compared.
fn comparable_kind(
    schema: &Schema,
    model: &EntityModel,
    cmp: &ComparePredicate,
) -> Result<FieldKind, QueryError> {
    if let Some(field) = model.field(&cmp.field) {
        return Ok(field.kind);
    }

    match model.relation(&cmp.field) {
        Some(relation) if relation.is_foreign_key() => {
            Ok(target_model(schema, relation)?.primary_key_kind())
        }
        Some(_) => Err(QueryError::InvalidOperator {
            field: cmp.field.clone(),
            operator: cmp.op.symbol(),
            reason: "to-many relations need a collection operator",
        }),
        None => Err(QueryError::UnknownField {
            kind: model.name.clone(),
            field: cmp.field.clone(),
        }),
    }
}

fn validate_quantified(
    schema: &Schema,
    model: &EntityModel,
    q: &QuantifiedPredicate,
) -> Result<(), QueryError> {
    let Some(relation) = model.relation(&q.relation) else {
        if model.field(&q.relation).is_some() {
            return Err(QueryError::InvalidOperator {
                field: q.relation.clone(),
                operator: q.quantifier.symbol(),
                reason: "collection operators apply to relationships only",
            });
        }
        return Err(RelationError::UnknownRelationship {
            kind: model.name.clone(),
            field: q.relation.clone(),
        }
        .into());
    };

    let target = target_model(schema, relation)?;
    validate(schema, target, &q.filter)
}

fn target_model<'s>(
    schema: &'s Schema,
    relation: &RelationModel,
) -> Result<&'s EntityModel, QueryError> {
    schema
        .entity(&relation.target)
        .ok_or_else(|| QueryError::UnknownKind {
            kind: relation.target.clone(),
        })
}

fn invalid_literal(cmp: &ComparePredicate, value: &Value) -> QueryError {
    QueryError::InvalidLiteral {
        field: cmp.field.clone(),
        operator: cmp.op.symbol(),
        found: value.label(),
    }
}
