//! Schema declaration and two-pass resolution.
//!
//! Pass one registers every kind name; pass two resolves relationship
//! targets, assigns storing/derived roles and derives join tables. Kinds may
//! therefore reference each other in any declaration order.

mod build;
mod decl;


use crate::{
    error::ErrorClass,
    model::{EntityModel, FieldKind, JoinTableModel},
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

// re-exports
pub use build::SchemaBuilder;
pub use decl::{EntityDecl, RelationDecl};

///
/// SchemaError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum SchemaError {
    #[error("entity kind '{kind}' declared more than once")]
    DuplicateKind { kind: String },

    #[error("entity kind '{kind}' is not declared")]
    UnknownKind { kind: String },

    #[error("entity kind '{kind}' declares '{field}' more than once")]
    DuplicateField { kind: String, field: String },

    #[error("entity kind '{kind}' has no primary key")]
    MissingPrimaryKey { kind: String },

    #[error("primary key '{kind}.{field}' has unsupported kind {field_kind}")]
    InvalidPrimaryKeyType {
        kind: String,
        field: String,
        field_kind: FieldKind,
    },

    #[error("unique field '{kind}.{field}' has unsupported kind {field_kind}")]
    UniqueUnsupported {
        kind: String,
        field: String,
        field_kind: FieldKind,
    },

    #[error("relation '{kind}.{field}' targets undeclared kind '{target}'")]
    UnknownTarget {
        kind: String,
        field: String,
        target: String,
    },

    #[error("one-to-many relation '{kind}.{field}' must name its owning field with mapped_by")]
    MappedByMissing { kind: String, field: String },

    #[error("relation '{kind}.{field}' is mapped by '{target}.{mapped_by}', which is not declared")]
    MappedByUnknown {
        kind: String,
        field: String,
        target: String,
        mapped_by: String,
    },

    #[error("relation '{kind}.{field}' is mapped by '{mapped_by}': {reason}")]
    MappedByMismatch {
        kind: String,
        field: String,
        mapped_by: String,
        reason: &'static str,
    },

    #[error("relation '{kind}.{field}' is inversed by '{inversed_by}': {reason}")]
    InversedByMismatch {
        kind: String,
        field: String,
        inversed_by: String,
        reason: &'static str,
    },

    #[error(
        "many-to-many '{kind}.{field}' and '{target}.{other}' must have exactly one owning side"
    )]
    AmbiguousOwnership {
        kind: String,
        field: String,
        target: String,
        other: String,
    },

    #[error("join table '{name}' derived from more than one relation")]
    DuplicateJoinTable { name: String },
}

impl SchemaError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::DuplicateKind { .. } | Self::DuplicateJoinTable { .. } => ErrorClass::Conflict,
            Self::UnknownKind { .. } => ErrorClass::NotFound,
            _ => ErrorClass::Invalid,
        }
    }
}

///
/// Schema
///
/// Resolved, immutable set of entity models and join tables.
/// Entities keep declaration order.
///

#[derive(Clone, Debug, Default)]
pub struct Schema {
    entities: Vec<EntityModel>,
    positions: BTreeMap<String, usize>,
    join_tables: Vec<JoinTableModel>,
}

impl Schema {
    pub(crate) fn from_parts(entities: Vec<EntityModel>, join_tables: Vec<JoinTableModel>) -> Self {
        let positions = entities
            .iter()
            .enumerate()
            .map(|(idx, model)| (model.name.clone(), idx))
            .collect();

        Self {
            entities,
            positions,
            join_tables,
        }
    }

    #[must_use]
    pub fn entity(&self, kind: &str) -> Option<&EntityModel> {
        self.positions.get(kind).map(|idx| &self.entities[*idx])
    }

    pub fn try_entity(&self, kind: &str) -> Result<&EntityModel, SchemaError> {
        self.entity(kind).ok_or_else(|| SchemaError::UnknownKind {
            kind: kind.to_string(),
        })
    }

    /// Iterate entity models in declaration order.
    pub fn entities(&self) -> impl Iterator<Item = &EntityModel> {
        self.entities.iter()
    }

    pub fn join_tables(&self) -> impl Iterator<Item = &JoinTableModel> {
        self.join_tables.iter()
    }

    #[must_use]
    pub fn join_table(&self, name: &str) -> Option<&JoinTableModel> {
        self.join_tables.iter().find(|table| table.name == name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
