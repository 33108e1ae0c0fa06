//! Entity store: one insertion-ordered table per entity kind.

mod error;
mod record;
mod table;

#[cfg(test)]
mod tests;

use crate::{key::Key, model::EntityModel};
use std::collections::BTreeMap;

// re-exports
pub use error::StoreError;
pub use record::{Record, RowDocument};
pub use table::Table;

///
/// EntityStore
///
/// Registry of tables keyed by entity kind name.
/// The store exclusively owns every record.
///

#[derive(Debug, Default)]
pub struct EntityStore {
    tables: BTreeMap<String, Table>,
}

impl EntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty table for `model`.
    pub fn create_table(&mut self, model: &EntityModel) -> Result<(), StoreError> {
        if self.tables.contains_key(&model.name) {
            return Err(StoreError::DuplicateKind {
                kind: model.name.clone(),
            });
        }

        self.tables.insert(model.name.clone(), Table::new(model));
        tracing::trace!(kind = %model.name, "table created");

        Ok(())
    }

    #[must_use]
    pub fn has_table(&self, kind: &str) -> bool {
        self.tables.contains_key(kind)
    }

    pub fn table(&self, kind: &str) -> Result<&Table, StoreError> {
        self.tables.get(kind).ok_or_else(|| StoreError::UnknownTable {
            kind: kind.to_string(),
        })
    }

    pub(crate) fn table_mut(&mut self, kind: &str) -> Result<&mut Table, StoreError> {
        self.tables
            .get_mut(kind)
            .ok_or_else(|| StoreError::UnknownTable {
                kind: kind.to_string(),
            })
    }

    /// Fetch one record by primary key.
    pub fn get(&self, kind: &str, key: &Key) -> Result<&Record, StoreError> {
        self.table(kind)?
            .get(key)
            .ok_or_else(|| StoreError::NotFound {
                kind: kind.to_string(),
                key: key.clone(),
            })
    }

    /// Iterate the records of `kind` in insertion order.
    pub fn scan(&self, kind: &str) -> Result<impl ExactSizeIterator<Item = &Record>, StoreError> {
        Ok(self.table(kind)?.scan())
    }

    pub fn tables(&self) -> impl Iterator<Item = &Table> {
        self.tables.values()
    }
}
