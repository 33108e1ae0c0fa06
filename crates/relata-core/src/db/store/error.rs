use crate::{error::ErrorClass, key::Key, model::FieldKind};
use thiserror::Error as ThisError;

///
/// StoreError
///
/// Entity store failures. A failed batch never leaves partial rows behind,
/// so every variant describes the first offending row or field.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    #[error("table '{kind}' already registered")]
    DuplicateKind { kind: String },

    #[error("no table registered for kind '{kind}'")]
    UnknownTable { kind: String },

    #[error("{kind} with key {key} not found")]
    NotFound { kind: String, key: Key },

    #[error("duplicate primary key {key} for kind '{kind}'")]
    DuplicatePrimaryKey { kind: String, key: Key },

    #[error("unique constraint '{kind}.{field}' violated by {value}")]
    UniqueViolation {
        kind: String,
        field: String,
        value: String,
    },

    #[error("kind '{kind}' has no field '{field}'")]
    UnknownField { kind: String, field: String },

    #[error("field '{kind}.{field}' expects {expected}, found {found}")]
    TypeMismatch {
        kind: String,
        field: String,
        expected: FieldKind,
        found: &'static str,
    },

    #[error("field '{kind}.{field}' is required")]
    MissingField { kind: String, field: String },

    #[error("relation '{kind}.{field}' references missing {target} {key}")]
    RelationTargetMissing {
        kind: String,
        field: String,
        target: String,
        key: Key,
    },

    #[error("relation '{kind}.{field}' is derived from its owning side and cannot be written")]
    DerivedRelationWrite { kind: String, field: String },

    #[error("invalid row document for kind '{kind}': {reason}")]
    InvalidDocument { kind: String, reason: String },
}

impl StoreError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateKind { .. }
            | Self::DuplicatePrimaryKey { .. }
            | Self::UniqueViolation { .. } => ErrorClass::Conflict,
            Self::UnknownTable { .. } | Self::NotFound { .. } => ErrorClass::NotFound,
            Self::UnknownField { .. }
            | Self::TypeMismatch { .. }
            | Self::MissingField { .. }
            | Self::RelationTargetMissing { .. }
            | Self::DerivedRelationWrite { .. }
            | Self::InvalidDocument { .. } => ErrorClass::Invalid,
        }
    }
}
