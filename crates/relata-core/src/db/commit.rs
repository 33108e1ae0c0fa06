//! Bulk insert commit protocol.
//!
//! A batch is first prepared against a read-only view of the store: every
//! row is validated and turned into a record plus the join-table pairs it
//! carries. Only a fully prepared batch is applied, so a failing row leaves
//! the store and the relationship index untouched.

use crate::{
    db::{
        relation::RelationIndex,
        store::{EntityStore, Record, RowDocument, StoreError},
    },
    error::InternalError,
    key::Key,
    model::{EntityModel, FieldModel, RelationModel, RelationRole},
    obs::sink::{self, MetricsEvent},
    schema::Schema,
    value::Value,
};
use std::collections::{BTreeMap, HashSet};

///
/// PreparedRow
///

#[derive(Debug)]
pub(crate) struct PreparedRow {
    record: Record,
    unique_values: Vec<(String, Key)>,
    links: Vec<PreparedLink>,
}

///
/// PreparedLink
/// One owning-side pair destined for a join table.
///

#[derive(Debug)]
pub(crate) struct PreparedLink {
    join_table: String,
    left: Key,
    right: Key,
}

///
/// InsertBatch
/// A validated batch ready to be applied.
///

#[derive(Debug)]
pub(crate) struct InsertBatch {
    kind: String,
    rows: Vec<PreparedRow>,
}

impl InsertBatch {
    pub(crate) const fn len(&self) -> usize {
        self.rows.len()
    }
}

///
/// CommitSummary
///

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub(crate) struct CommitSummary {
    pub(crate) rows: usize,
    pub(crate) edges: usize,
}

// Batch-wide bookkeeping shared by every row of one prepare call.
struct BatchState<'a> {
    schema: &'a Schema,
    store: &'a EntityStore,
    model: &'a EntityModel,
    batch_keys: HashSet<Key>,
    seen_keys: HashSet<Key>,
    seen_unique: BTreeMap<String, HashSet<Key>>,
}

/// Validate a batch of row documents for `model`.
pub(crate) fn prepare(
    schema: &Schema,
    store: &EntityStore,
    model: &EntityModel,
    rows: Vec<RowDocument>,
) -> Result<InsertBatch, StoreError> {
    // unknown kinds fail before any row is read
    store.table(&model.name)?;

    let pk_kind = model.primary_key_kind();
    let batch_keys = rows
        .iter()
        .filter_map(|row| row.get(&model.primary_key))
        .filter_map(|value| Key::coerce(pk_kind, value).ok())
        .collect();

    let mut state = BatchState {
        schema,
        store,
        model,
        batch_keys,
        seen_keys: HashSet::new(),
        seen_unique: BTreeMap::new(),
    };

    let prepared = rows
        .into_iter()
        .map(|row| state.prepare_row(row))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InsertBatch {
        kind: model.name.clone(),
        rows: prepared,
    })
}

/// Apply a prepared batch. Only invariant violations can fail here.
pub(crate) fn apply(
    store: &mut EntityStore,
    index: &mut RelationIndex,
    batch: InsertBatch,
) -> Result<CommitSummary, InternalError> {
    let mut summary = CommitSummary::default();
    let table = store.table_mut(&batch.kind)?;

    let mut links = Vec::new();
    for row in batch.rows {
        let key = row.record.key().clone();
        if !table.push(row.record, &row.unique_values) {
            return Err(InternalError::store_invariant(format!(
                "prepared {} {key} collided during apply",
                batch.kind
            )));
        }
        links.extend(row.links);
        summary.rows += 1;
    }

    for link in links {
        if index.link(&link.join_table, link.left, link.right)? {
            summary.edges += 1;
        }
    }

    sink::record(MetricsEvent::EdgesWritten {
        entity: &batch.kind,
        edges: u64::try_from(summary.edges).unwrap_or(u64::MAX),
    });

    Ok(summary)
}

impl BatchState<'_> {
    fn prepare_row(&mut self, row: RowDocument) -> Result<PreparedRow, StoreError> {
        let model = self.model;

        let mut fields = BTreeMap::new();
        let mut relations = Vec::new();
        for (name, value) in row {
            if let Some(field) = model.field(&name) {
                if let Some(value) = self.scalar_value(field, &value)? {
                    fields.insert(name, value);
                }
            } else if let Some(relation) = model.relation(&name) {
                relations.push((relation, value));
            } else {
                return Err(StoreError::UnknownField {
                    kind: model.name.clone(),
                    field: name,
                });
            }
        }

        if let Some(field) = model
            .fields
            .iter()
            .find(|field| !field.nullable && !fields.contains_key(&field.name))
        {
            return Err(StoreError::MissingField {
                kind: model.name.clone(),
                field: field.name.clone(),
            });
        }

        let key = self.primary_key(&fields)?;
        let unique_values = self.unique_values(&fields)?;

        let mut links = Vec::new();
        for (relation, value) in relations {
            self.relation_value(relation, &key, value, &mut fields, &mut links)?;
        }

        Ok(PreparedRow {
            record: Record::new(key, fields),
            unique_values,
            links,
        })
    }

    // Coerce one scalar field. `None` means nothing is stored.
    fn scalar_value(&self, field: &FieldModel, value: &Value) -> Result<Option<Value>, StoreError> {
        if value.is_null() {
            return if field.nullable {
                Ok(Some(Value::Null))
            } else {
                Err(StoreError::MissingField {
                    kind: self.model.name.clone(),
                    field: field.name.clone(),
                })
            };
        }

        field
            .kind
            .coerce(value)
            .map(Some)
            .ok_or_else(|| StoreError::TypeMismatch {
                kind: self.model.name.clone(),
                field: field.name.clone(),
                expected: field.kind,
                found: value.label(),
            })
    }

    fn primary_key(&mut self, fields: &BTreeMap<String, Value>) -> Result<Key, StoreError> {
        let model = self.model;
        let pk_kind = model.primary_key_kind();
        let value = fields
            .get(&model.primary_key)
            .ok_or_else(|| StoreError::MissingField {
                kind: model.name.clone(),
                field: model.primary_key.clone(),
            })?;

        let key = Key::coerce(pk_kind, value).map_err(|_| StoreError::TypeMismatch {
            kind: model.name.clone(),
            field: model.primary_key.clone(),
            expected: pk_kind,
            found: value.label(),
        })?;

        let in_table = self.store.table(&model.name)?.contains(&key);
        if in_table || !self.seen_keys.insert(key.clone()) {
            return Err(StoreError::DuplicatePrimaryKey {
                kind: model.name.clone(),
                key,
            });
        }

        Ok(key)
    }

    fn unique_values(
        &mut self,
        fields: &BTreeMap<String, Value>,
    ) -> Result<Vec<(String, Key)>, StoreError> {
        let model = self.model;
        let table = self.store.table(&model.name)?;

        let mut values = Vec::new();
        for field in model.unique_fields() {
            // nulls never collide
            let Some(value) = fields.get(&field.name).filter(|value| !value.is_null()) else {
                continue;
            };
            let Ok(key) = Key::coerce(field.kind, value) else {
                continue;
            };

            let taken = table.unique_owner(&field.name, &key).is_some();
            let seen = self.seen_unique.entry(field.name.clone()).or_default();
            if taken || !seen.insert(key.clone()) {
                sink::record(MetricsEvent::UniqueViolation {
                    entity: &model.name,
                });
                return Err(StoreError::UniqueViolation {
                    kind: model.name.clone(),
                    field: field.name.clone(),
                    value: value.to_string(),
                });
            }
            values.push((field.name.clone(), key));
        }

        Ok(values)
    }

    fn relation_value(
        &self,
        relation: &RelationModel,
        key: &Key,
        value: Value,
        fields: &mut BTreeMap<String, Value>,
        links: &mut Vec<PreparedLink>,
    ) -> Result<(), StoreError> {
        let model = self.model;
        if value.is_null() {
            return Ok(());
        }

        match &relation.role {
            RelationRole::Derived { .. } => Err(StoreError::DerivedRelationWrite {
                kind: model.name.clone(),
                field: relation.name.clone(),
            }),

            RelationRole::ForeignKey => {
                let target = self.target_key(relation, &value)?;
                fields.insert(relation.name.clone(), target.to_value());
                Ok(())
            }

            RelationRole::Owning { join_table } => {
                let Value::List(items) = value else {
                    return Err(StoreError::InvalidDocument {
                        kind: model.name.clone(),
                        reason: format!(
                            "relation '{}' expects a list of {} keys, found {}",
                            relation.name,
                            relation.target,
                            value.label()
                        ),
                    });
                };

                for item in &items {
                    let target = self.target_key(relation, item)?;
                    links.push(PreparedLink {
                        join_table: join_table.clone(),
                        left: key.clone(),
                        right: target,
                    });
                }
                Ok(())
            }
        }
    }

    // Coerce a relationship value into an existing target key.
    fn target_key(&self, relation: &RelationModel, value: &Value) -> Result<Key, StoreError> {
        let model = self.model;
        let target = self
            .schema
            .entity(&relation.target)
            .ok_or_else(|| StoreError::UnknownTable {
                kind: relation.target.clone(),
            })?;
        let pk_kind = target.primary_key_kind();

        let key = Key::coerce(pk_kind, value).map_err(|_| StoreError::TypeMismatch {
            kind: model.name.clone(),
            field: relation.name.clone(),
            expected: pk_kind,
            found: value.label(),
        })?;

        // rows of the same batch may reference each other
        let in_batch = relation.target == model.name && self.batch_keys.contains(&key);
        if in_batch || self.store.table(&relation.target)?.contains(&key) {
            Ok(key)
        } else {
            Err(StoreError::RelationTargetMissing {
                kind: model.name.clone(),
                field: relation.name.clone(),
                target: relation.target.clone(),
                key,
            })
        }
    }
}
