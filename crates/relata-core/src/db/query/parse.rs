//! Filter documents.
//!
//! Parses JSON filter documents in the mapper's object syntax:
//!
//! - `{}` matches everything
//! - `{"title": "Book 1"}` is field equality; an array value is `$in`
//! - `{"id": {"$gte": 2, "$lt": 5}}` applies operators to one field
//! - `{"$and": [..]}`, `{"$or": [..]}`, `{"$not": {..}}` combine filters
//! - `{"tags": {"$some": {..}}}` (also `$none`, `$every`) quantifies a relationship
//! - `{"author": {"name": ".."}}` is an implicit `$some` through the relationship
//!
//! Several keys in one object form an implicit `$and`.

use crate::{
    db::query::{
        QueryError,
        predicate::{CompareOp, Filter, Quantifier},
    },
    value::Value,
};
use serde_json::{Map, Value as JsonValue};

/// Parse a JSON filter document.
pub fn parse_filter(doc: &JsonValue) -> Result<Filter, QueryError> {
    let JsonValue::Object(map) = doc else {
        return Err(invalid(format!("filter must be an object, found {}", json_label(doc))));
    };

    parse_object(map)
}

/// Parse a filter document from JSON text.
pub fn parse_filter_str(text: &str) -> Result<Filter, QueryError> {
    let doc: JsonValue =
        serde_json::from_str(text).map_err(|err| invalid(format!("malformed JSON: {err}")))?;

    parse_filter(&doc)
}

fn parse_object(map: &Map<String, JsonValue>) -> Result<Filter, QueryError> {
    let mut clauses = map
        .iter()
        .map(|(key, value)| parse_entry(key, value))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(match clauses.len() {
        0 => Filter::True,
        1 => clauses.remove(0),
        _ => Filter::And(clauses),
    })
}

fn parse_entry(key: &str, value: &JsonValue) -> Result<Filter, QueryError> {
    match key {
        "$and" => Ok(Filter::And(parse_list(key, value)?)),
        "$or" => Ok(Filter::Or(parse_list(key, value)?)),
        "$not" => Ok(Filter::not(parse_filter(value)?)),
        _ if key.starts_with('$') => Err(QueryError::UnknownOperator {
            operator: key.to_string(),
        }),
        field => parse_field(field, value),
    }
}

fn parse_list(operator: &str, value: &JsonValue) -> Result<Vec<Filter>, QueryError> {
    let JsonValue::Array(items) = value else {
        return Err(invalid(format!(
            "{operator} expects an array, found {}",
            json_label(value)
        )));
    };

    items.iter().map(parse_filter).collect()
}

fn parse_field(field: &str, value: &JsonValue) -> Result<Filter, QueryError> {
    match value {
        JsonValue::Object(map) => {
            let operators = map.keys().filter(|key| key.starts_with('$')).count();

            if operators == 0 && !map.is_empty() {
                // nested document: implicit $some through the relationship
                return Ok(Filter::some(field, parse_object(map)?));
            }
            if operators != map.len() {
                return Err(invalid(format!(
                    "field '{field}' mixes operators with nested fields"
                )));
            }

            let mut clauses = map
                .iter()
                .map(|(op, operand)| parse_field_operator(field, op, operand))
                .collect::<Result<Vec<_>, _>>()?;

            Ok(match clauses.len() {
                0 => Filter::True,
                1 => clauses.remove(0),
                _ => Filter::And(clauses),
            })
        }
        JsonValue::Array(_) => Ok(Filter::compare(field, CompareOp::In, literal(field, value)?)),
        _ => Ok(Filter::eq(field, literal(field, value)?)),
    }
}

fn parse_field_operator(field: &str, op: &str, operand: &JsonValue) -> Result<Filter, QueryError> {
    if let Some(quantifier) = Quantifier::from_symbol(op) {
        return Ok(Filter::quantified(field, quantifier, parse_filter(operand)?));
    }

    if op == "$not" {
        return Ok(Filter::not(parse_field(field, operand)?));
    }

    let Some(compare) = CompareOp::from_symbol(op) else {
        return Err(QueryError::UnknownOperator {
            operator: op.to_string(),
        });
    };

    let value = literal(field, operand)?;
    if compare.is_membership() && !matches!(value, Value::List(_)) {
        return Err(invalid(format!("{op} on '{field}' expects an array")));
    }

    Ok(Filter::compare(field, compare, value))
}

fn literal(field: &str, value: &JsonValue) -> Result<Value, QueryError> {
    Value::from_json(value).map_err(|err| invalid(format!("invalid literal for '{field}': {err}")))
}

fn invalid(reason: String) -> QueryError {
    QueryError::InvalidFilter { reason }
}

const fn json_label(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "bool",
        JsonValue::Number(_) => "number",
        JsonValue::String(_) => "string",
        JsonValue::Array(_) => "array",
        JsonValue::Object(_) => "object",
    }
}

///
/// TESTS
///
