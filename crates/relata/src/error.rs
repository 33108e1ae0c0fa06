use derive_more::Display;
use relata_core::{
    config::ConfigError,
    db::{
        ResponseError, query::QueryError, relation::RelationError, store::StoreError,
    },
    error::{ErrorClass, ErrorDetail, ErrorOrigin as CoreErrorOrigin, InternalError},
    schema::SchemaError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(
            self.kind,
            ErrorKind::Store(StoreErrorKind::NotFound)
                | ErrorKind::Query(QueryErrorKind::NotFound | QueryErrorKind::UnknownKind)
        )
    }
}

impl From<InternalError> for Error {
    fn from(err: InternalError) -> Self {
        let kind = match &err.detail {
            Some(ErrorDetail::Config(_)) => ErrorKind::Config,
            Some(ErrorDetail::Query(inner)) => ErrorKind::Query(inner.into()),
            Some(ErrorDetail::Relation(inner)) => relation_kind(inner),
            Some(ErrorDetail::Response(inner)) => ErrorKind::Query(inner.into()),
            Some(ErrorDetail::Schema(inner)) => ErrorKind::Schema(inner.into()),
            Some(ErrorDetail::Store(inner)) => ErrorKind::Store(inner.into()),
            None => ErrorKind::Internal,
        };

        // invariant violations are never caller-remediable
        let kind = if err.class == ErrorClass::InvariantViolation {
            ErrorKind::Internal
        } else {
            kind
        };

        Self::new(kind, err.origin.into(), err.message)
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

impl From<SchemaError> for Error {
    fn from(err: SchemaError) -> Self {
        InternalError::from(err).into()
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        InternalError::from(err).into()
    }
}

impl From<ResponseError> for Error {
    fn from(err: ResponseError) -> Self {
        InternalError::from(err).into()
    }
}

fn relation_kind(err: &RelationError) -> ErrorKind {
    match err {
        RelationError::UnknownRelationship { .. } => {
            ErrorKind::Query(QueryErrorKind::UnknownRelationship)
        }
        RelationError::DuplicateJoinTable { .. } => ErrorKind::Schema(SchemaErrorKind::Conflict),
        RelationError::UnknownJoinTable { .. } => ErrorKind::Internal,
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    Config,
    Query(QueryErrorKind),
    Schema(SchemaErrorKind),
    Store(StoreErrorKind),

    /// The caller cannot remediate this.
    Internal,
}

///
/// SchemaErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum SchemaErrorKind {
    /// A kind or join table is declared more than once.
    Conflict,

    /// The declarations do not form a valid schema.
    Invalid,

    /// A kind name is not declared.
    UnknownKind,
}

impl From<&SchemaError> for SchemaErrorKind {
    fn from(err: &SchemaError) -> Self {
        match err {
            SchemaError::DuplicateKind { .. } | SchemaError::DuplicateJoinTable { .. } => {
                Self::Conflict
            }
            SchemaError::UnknownKind { .. } => Self::UnknownKind,
            _ => Self::Invalid,
        }
    }
}

///
/// StoreErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum StoreErrorKind {
    /// A table for the kind already exists.
    DuplicateKind,

    /// A row's primary key is already present (in the table or the batch).
    DuplicatePrimaryKey,

    /// A unique field value is already taken.
    UniqueViolation,

    /// No record with the requested key.
    NotFound,

    /// No table is registered for the kind.
    UnknownTable,

    /// A row names a field the kind does not declare.
    UnknownField,

    /// A row is malformed: wrong types, missing fields, bad relation values.
    InvalidRow,

    /// A relationship value references a record that does not exist.
    RelationTargetMissing,
}

impl From<&StoreError> for StoreErrorKind {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::DuplicateKind { .. } => Self::DuplicateKind,
            StoreError::DuplicatePrimaryKey { .. } => Self::DuplicatePrimaryKey,
            StoreError::UniqueViolation { .. } => Self::UniqueViolation,
            StoreError::NotFound { .. } => Self::NotFound,
            StoreError::UnknownTable { .. } => Self::UnknownTable,
            StoreError::UnknownField { .. } => Self::UnknownField,
            StoreError::RelationTargetMissing { .. } => Self::RelationTargetMissing,
            StoreError::TypeMismatch { .. }
            | StoreError::MissingField { .. }
            | StoreError::DerivedRelationWrite { .. }
            | StoreError::InvalidDocument { .. } => Self::InvalidRow,
        }
    }
}

///
/// QueryErrorKind
///

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum QueryErrorKind {
    /// Query shape is invalid (bad operators, literals, populate paths).
    Invalid,

    /// The query names an operator that does not exist.
    Unsupported,

    /// A filter references a field not declared on the kind.
    UnknownField,

    /// A quantifier, populate path or `related_of` names an undeclared relationship.
    UnknownRelationship,

    /// The queried kind is not declared.
    UnknownKind,

    /// Valid query, but no rows matched.
    NotFound,

    /// Query expected one row but matched many.
    NotUnique,
}

impl From<&QueryError> for QueryErrorKind {
    fn from(err: &QueryError) -> Self {
        match err {
            QueryError::UnknownKind { .. } => Self::UnknownKind,
            QueryError::UnknownField { .. } => Self::UnknownField,
            QueryError::UnknownOperator { .. } => Self::Unsupported,
            QueryError::Relation(RelationError::UnknownRelationship { .. }) => {
                Self::UnknownRelationship
            }
            QueryError::InvalidOperator { .. }
            | QueryError::InvalidLiteral { .. }
            | QueryError::InvalidFilter { .. }
            | QueryError::PopulateTooDeep { .. }
            | QueryError::Relation(_) => Self::Invalid,
        }
    }
}

impl From<&ResponseError> for QueryErrorKind {
    fn from(err: &ResponseError) -> Self {
        match err {
            ResponseError::NotFound { .. } => Self::NotFound,
            ResponseError::NotUnique { .. } => Self::NotUnique,
        }
    }
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Config,
    Query,
    Relation,
    Response,
    Schema,
    Store,
}

impl From<CoreErrorOrigin> for ErrorOrigin {
    fn from(origin: CoreErrorOrigin) -> Self {
        match origin {
            CoreErrorOrigin::Config => Self::Config,
            CoreErrorOrigin::Query => Self::Query,
            CoreErrorOrigin::Relation => Self::Relation,
            CoreErrorOrigin::Response => Self::Response,
            CoreErrorOrigin::Schema => Self::Schema,
            CoreErrorOrigin::Store => Self::Store,
        }
    }
}

///
/// TESTS
///
