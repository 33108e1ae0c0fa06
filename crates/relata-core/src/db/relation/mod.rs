//! Relationship index: join tables plus on-demand traversal of every
//! relationship role.
//!
//! Many-to-one edges are the foreign keys stored on source records; their
//! one-to-many mirror is computed by scanning the source table. Many-to-many
//! edges live in join tables owned by exactly one side.

mod join_table;

#[cfg(test)]
mod tests;

use crate::{
    db::store::{EntityStore, Record},
    error::{ErrorClass, InternalError},
    key::Key,
    model::{EntityModel, JoinTableModel, RelationModel, RelationRole},
    obs::sink::{self, MetricsEvent},
    schema::Schema,
};
use std::collections::BTreeMap;
use thiserror::Error as ThisError;

// re-exports
pub use join_table::JoinTable;

///
/// RelationError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum RelationError {
    #[error("kind '{kind}' has no relationship '{field}'")]
    UnknownRelationship { kind: String, field: String },

    #[error("join table '{name}' already registered")]
    DuplicateJoinTable { name: String },

    #[error("join table '{name}' is not registered")]
    UnknownJoinTable { name: String },
}

impl RelationError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::UnknownRelationship { .. } => ErrorClass::Invalid,
            Self::DuplicateJoinTable { .. } => ErrorClass::Conflict,
            Self::UnknownJoinTable { .. } => ErrorClass::InvariantViolation,
        }
    }
}

///
/// RelationIndex
/// Owns every join table, keyed by join table name.
///

#[derive(Debug, Default)]
pub struct RelationIndex {
    join_tables: BTreeMap<String, JoinTable>,
}

impl RelationIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_join_table(&mut self, model: &JoinTableModel) -> Result<(), RelationError> {
        if self.join_tables.contains_key(&model.name) {
            return Err(RelationError::DuplicateJoinTable {
                name: model.name.clone(),
            });
        }

        self.join_tables
            .insert(model.name.clone(), JoinTable::new(model.name.clone()));
        tracing::trace!(join_table = %model.name, "join table created");

        Ok(())
    }

    pub fn join_table(&self, name: &str) -> Result<&JoinTable, RelationError> {
        self.join_tables
            .get(name)
            .ok_or_else(|| RelationError::UnknownJoinTable {
                name: name.to_string(),
            })
    }

    /// Register one owning-side pair. Duplicate pairs are ignored.
    pub(crate) fn link(
        &mut self,
        name: &str,
        left: Key,
        right: Key,
    ) -> Result<bool, RelationError> {
        let table = self
            .join_tables
            .get_mut(name)
            .ok_or_else(|| RelationError::UnknownJoinTable {
                name: name.to_string(),
            })?;

        Ok(table.insert(left, right))
    }

    pub fn join_tables(&self) -> impl Iterator<Item = &JoinTable> {
        self.join_tables.values()
    }
}

///
/// RelationContext
///
/// Read-only view over schema, store and index used to traverse
/// relationships. Borrowed for the duration of one call.
///

#[derive(Clone, Copy)]
pub struct RelationContext<'a> {
    pub(crate) schema: &'a Schema,
    pub(crate) store: &'a EntityStore,
    pub(crate) index: &'a RelationIndex,
}

impl<'a> RelationContext<'a> {
    pub(crate) const fn new(
        schema: &'a Schema,
        store: &'a EntityStore,
        index: &'a RelationIndex,
    ) -> Self {
        Self {
            schema,
            store,
            index,
        }
    }

    /// Records related to `kind(key)` through `field`, in relationship order.
    pub fn related_of(
        &self,
        kind: &str,
        key: &Key,
        field: &str,
    ) -> Result<Vec<&'a Record>, InternalError> {
        let model = self.schema.try_entity(kind)?;
        let relation = resolve_relation(model, field)?;
        let record = self.store.get(kind, key)?;

        self.related_records(model, relation, record)
    }

    /// Records related to an already-resolved source record.
    pub(crate) fn related_records(
        &self,
        model: &EntityModel,
        relation: &RelationModel,
        record: &Record,
    ) -> Result<Vec<&'a Record>, InternalError> {
        let keys = self.related_keys(model, relation, record)?;
        sink::record(MetricsEvent::RelationLookup {
            entity: &model.name,
            lookups: 1,
        });

        keys.iter()
            .map(|key| {
                self.store.table(&relation.target)?.get(key).ok_or_else(|| {
                    InternalError::relation_invariant(format!(
                        "relation '{}.{}' points at missing {} {key}",
                        model.name, relation.name, relation.target
                    ))
                })
            })
            .collect()
    }

    // Resolve the ordered related keys according to the relationship role.
    fn related_keys(
        &self,
        model: &EntityModel,
        relation: &RelationModel,
        record: &Record,
    ) -> Result<Vec<Key>, InternalError> {
        match &relation.role {
            RelationRole::ForeignKey => {
                let target = self.schema.try_entity(&relation.target)?;
                let key = record
                    .get(&relation.name)
                    .filter(|value| !value.is_null())
                    .map(|value| Key::coerce(target.primary_key_kind(), value))
                    .transpose()
                    .map_err(|err| {
                        InternalError::relation_invariant(format!(
                            "foreign key '{}.{}' is not a valid key: {err}",
                            model.name, relation.name
                        ))
                    })?;

                Ok(key.into_iter().collect())
            }

            RelationRole::Owning { join_table } => Ok(self
                .index
                .join_table(join_table)?
                .rights_of(record.key())
                .cloned()
                .collect()),

            RelationRole::Derived { owner_field } => {
                let owner_model = self.schema.try_entity(&relation.target)?;
                let owner = owner_model.relation(owner_field).ok_or_else(|| {
                    InternalError::relation_invariant(format!(
                        "relation '{}.{}' is mapped by missing '{}.{owner_field}'",
                        model.name, relation.name, relation.target
                    ))
                })?;

                match &owner.role {
                    RelationRole::ForeignKey => {
                        let pk_kind = model.primary_key_kind();
                        let rows = self.store.scan(&relation.target)?;

                        Ok(rows
                            .filter(|row| {
                                row.get(owner_field)
                                    .and_then(|value| Key::coerce(pk_kind, value).ok())
                                    .is_some_and(|fk| &fk == record.key())
                            })
                            .map(|row| row.key().clone())
                            .collect())
                    }
                    RelationRole::Owning { join_table } => Ok(self
                        .index
                        .join_table(join_table)?
                        .lefts_of(record.key())
                        .cloned()
                        .collect()),
                    RelationRole::Derived { .. } => Err(InternalError::relation_invariant(
                        format!(
                            "relation '{}.{}' is mapped by another derived side",
                            model.name, relation.name
                        ),
                    )),
                }
            }
        }
    }
}

/// Look up a relationship field on a model.
pub(crate) fn resolve_relation<'m>(
    model: &'m EntityModel,
    field: &str,
) -> Result<&'m RelationModel, RelationError> {
    model
        .relation(field)
        .ok_or_else(|| RelationError::UnknownRelationship {
            kind: model.name.clone(),
            field: field.to_string(),
        })
}
