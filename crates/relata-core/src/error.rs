use crate::{
    config::ConfigError,
    db::{query::QueryError, relation::RelationError, response::ResponseError, store::StoreError},
    schema::SchemaError,
};
use std::fmt;
use thiserror::Error as ThisError;

///
/// InternalError
///
/// Structured runtime error with a stable internal classification.
/// Not a stable API; intended for internal use and may change without notice.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct InternalError {
    pub class: ErrorClass,
    pub origin: ErrorOrigin,
    pub message: String,

    /// Optional structured error detail.
    /// The variant (if present) must correspond to `origin`.
    pub detail: Option<ErrorDetail>,
}

impl InternalError {
    /// Construct an InternalError without structured detail.
    pub fn new(class: ErrorClass, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            class,
            origin,
            message: message.into(),
            detail: None,
        }
    }

    // Attach structured detail; message is taken from the detail's Display.
    fn with_detail(class: ErrorClass, origin: ErrorOrigin, detail: ErrorDetail) -> Self {
        Self {
            class,
            origin,
            message: detail.to_string(),
            detail: Some(detail),
        }
    }

    /// Construct a store-origin invariant violation.
    pub(crate) fn store_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Store,
            message.into(),
        )
    }

    /// Construct a relation-origin invariant violation.
    pub(crate) fn relation_invariant(message: impl Into<String>) -> Self {
        Self::new(
            ErrorClass::InvariantViolation,
            ErrorOrigin::Relation,
            message.into(),
        )
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.class, ErrorClass::NotFound)
    }

    #[must_use]
    pub const fn store_error(&self) -> Option<&StoreError> {
        match &self.detail {
            Some(ErrorDetail::Store(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub const fn query_error(&self) -> Option<&QueryError> {
        match &self.detail {
            Some(ErrorDetail::Query(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub const fn schema_error(&self) -> Option<&SchemaError> {
        match &self.detail {
            Some(ErrorDetail::Schema(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub const fn relation_error(&self) -> Option<&RelationError> {
        match &self.detail {
            Some(ErrorDetail::Relation(err)) => Some(err),
            _ => None,
        }
    }

    #[must_use]
    pub fn display_with_class(&self) -> String {
        format!("{}:{}: {}", self.origin, self.class, self.message)
    }
}

///
/// ErrorDetail
///
/// Structured, origin-specific error detail carried by [`InternalError`].
///

#[derive(Debug, ThisError)]
pub enum ErrorDetail {
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Query(QueryError),
    #[error("{0}")]
    Relation(RelationError),
    #[error("{0}")]
    Response(ResponseError),
    #[error("{0}")]
    Schema(SchemaError),
    #[error("{0}")]
    Store(StoreError),
}

impl From<ConfigError> for InternalError {
    fn from(err: ConfigError) -> Self {
        Self::with_detail(ErrorClass::Invalid, ErrorOrigin::Config, ErrorDetail::Config(err))
    }
}

impl From<QueryError> for InternalError {
    fn from(err: QueryError) -> Self {
        // Relation failures surfaced through a query keep their own origin.
        if let QueryError::Relation(inner) = err {
            return inner.into();
        }

        Self::with_detail(err.class(), ErrorOrigin::Query, ErrorDetail::Query(err))
    }
}

impl From<RelationError> for InternalError {
    fn from(err: RelationError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Relation,
            ErrorDetail::Relation(err),
        )
    }
}

impl From<ResponseError> for InternalError {
    fn from(err: ResponseError) -> Self {
        Self::with_detail(
            err.class(),
            ErrorOrigin::Response,
            ErrorDetail::Response(err),
        )
    }
}

impl From<SchemaError> for InternalError {
    fn from(err: SchemaError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Schema, ErrorDetail::Schema(err))
    }
}

impl From<StoreError> for InternalError {
    fn from(err: StoreError) -> Self {
        Self::with_detail(err.class(), ErrorOrigin::Store, ErrorDetail::Store(err))
    }
}

///
/// ErrorClass
/// Internal error taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorClass {
    Conflict,
    Invalid,
    InvariantViolation,
    NotFound,
    Unsupported,
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Conflict => "conflict",
            Self::Invalid => "invalid",
            Self::InvariantViolation => "invariant_violation",
            Self::NotFound => "not_found",
            Self::Unsupported => "unsupported",
        };
        write!(f, "{label}")
    }
}

///
/// ErrorOrigin
/// Internal origin taxonomy for runtime classification.
/// Not a stable API; may change without notice.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ErrorOrigin {
    Config,
    Query,
    Relation,
    Response,
    Schema,
    Store,
}

impl fmt::Display for ErrorOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Config => "config",
            Self::Query => "query",
            Self::Relation => "relation",
            Self::Response => "response",
            Self::Schema => "schema",
            Self::Store => "store",
        };
        write!(f, "{label}")
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_detail_keeps_class_and_origin() {
        let err: InternalError = StoreError::DuplicateKind {
            kind: "Book".to_string(),
        }
        .into();

        assert_eq!(err.origin, ErrorOrigin::Store);
        assert_eq!(err.class, ErrorClass::Conflict);
        assert!(matches!(
            err.store_error(),
            Some(StoreError::DuplicateKind { kind }) if kind == "Book"
        ));
        assert_eq!(
            err.display_with_class(),
            "store:conflict: table 'Book' already registered"
        );
    }

    #[test]
    fn query_relation_failures_keep_relation_origin() {
        let err: InternalError = QueryError::Relation(RelationError::UnknownRelationship {
            kind: "Book".to_string(),
            field: "genres".to_string(),
        })
        .into();

        assert_eq!(err.origin, ErrorOrigin::Relation);
        assert!(err.relation_error().is_some());
        assert!(err.query_error().is_none());
    }
}
