//! Query evaluation: filter AST, filter documents, validation, evaluation
//! and populate.
//!
//! A find runs in fixed phases. The filter is validated and normalized and
//! the populate plan is resolved before any row is read; the target table is
//! then scanned in insertion order, offset/limit are applied to the matches,
//! and only the surviving rows are materialized.

mod parse;
pub(crate) mod populate;
pub mod predicate;

#[cfg(test)]
mod tests;

use crate::{
    db::{
        relation::{RelationContext, RelationError},
        response::Response,
    },
    error::{ErrorClass, InternalError},
    obs::sink::{self, MetricsEvent},
};
use thiserror::Error as ThisError;

// re-exports
pub use parse::{parse_filter, parse_filter_str};
pub use predicate::{CompareOp, ComparePredicate, Filter, QuantifiedPredicate, Quantifier};

use populate::PopulatePlan;

///
/// QueryError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum QueryError {
    #[error("entity kind '{kind}' is not declared")]
    UnknownKind { kind: String },

    #[error("kind '{kind}' has no field '{field}'")]
    UnknownField { kind: String, field: String },

    #[error("unknown filter operator '{operator}'")]
    UnknownOperator { operator: String },

    #[error("operator {operator} cannot be applied to '{field}': {reason}")]
    InvalidOperator {
        field: String,
        operator: &'static str,
        reason: &'static str,
    },

    #[error("operator {operator} on '{field}' cannot compare against a {found} literal")]
    InvalidLiteral {
        field: String,
        operator: &'static str,
        found: &'static str,
    },

    #[error("invalid filter: {reason}")]
    InvalidFilter { reason: String },

    #[error("populate path '{path}' has depth {depth}, limit is {max}")]
    PopulateTooDeep {
        path: String,
        depth: usize,
        max: usize,
    },

    #[error("{0}")]
    Relation(#[from] RelationError),
}

impl QueryError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownKind { .. } => ErrorClass::NotFound,
            Self::UnknownOperator { .. } => ErrorClass::Unsupported,
            Self::UnknownField { .. }
            | Self::InvalidOperator { .. }
            | Self::InvalidLiteral { .. }
            | Self::InvalidFilter { .. }
            | Self::PopulateTooDeep { .. } => ErrorClass::Invalid,
            Self::Relation(err) => err.class(),
        }
    }
}

///
/// FindOptions
///
/// Filter, populate paths and paging for one find.
/// Defaults match everything, populate nothing and return every row.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub filter: Filter,
    pub populate: Vec<String>,
    pub limit: Option<usize>,
    pub offset: usize,
}

impl FindOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Add populate paths; dotted paths populate nested relationships.
    #[must_use]
    pub fn populate<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.populate.extend(paths.into_iter().map(Into::into));
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub const fn offset(mut self, offset: usize) -> Self {
        self.offset = offset;
        self
    }
}

///
/// FindStats
/// Row counts of one find, for logging.
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct FindStats {
    pub(crate) scanned: u64,
    pub(crate) matched: u64,
    pub(crate) populated_links: u64,
}

/// Execute a find against `kind`.
pub(crate) fn find(
    ctx: &RelationContext<'_>,
    kind: &str,
    options: &FindOptions,
    max_populate_depth: usize,
) -> Result<(Response, FindStats), InternalError> {
    let model = ctx
        .schema
        .entity(kind)
        .ok_or_else(|| QueryError::UnknownKind {
            kind: kind.to_string(),
        })?;

    // phase 1: everything that can fail on references fails here
    predicate::validate(ctx.schema, model, &options.filter)?;
    let filter = predicate::normalize(&options.filter);
    let plan = PopulatePlan::build(ctx.schema, model, &options.populate, max_populate_depth)?;

    // phase 2: scan + evaluate
    let mut stats = FindStats::default();
    let mut matched = Vec::new();
    for record in ctx.store.scan(kind)? {
        stats.scanned += 1;
        if predicate::eval(ctx, model, record, &filter)? {
            matched.push(record);
        }
    }
    stats.matched = u64::try_from(matched.len()).unwrap_or(u64::MAX);
    tracing::trace!(kind, scanned = stats.scanned, matched = stats.matched, "scan complete");

    sink::record(MetricsEvent::RowsScanned {
        entity: kind,
        rows_scanned: stats.scanned,
    });

    // phase 3: page + materialize
    let page = matched
        .into_iter()
        .skip(options.offset)
        .take(options.limit.unwrap_or(usize::MAX));

    let mut entities = Vec::new();
    for record in page {
        let (entity, links) = plan.materialize(ctx, model, record)?;
        stats.populated_links = stats.populated_links.saturating_add(links);
        entities.push(entity);
    }

    if !plan.is_empty() {
        sink::record(MetricsEvent::Populated {
            entity: kind,
            links: stats.populated_links,
        });
    }

    Ok((Response(entities), stats))
}
