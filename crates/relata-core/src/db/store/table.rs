use crate::{db::store::Record, key::Key, model::EntityModel};
use std::collections::{BTreeMap, HashMap};

///
/// Table
///
/// Insertion-ordered record storage for one entity kind, with a primary-key
/// position map and one index per unique field.
///

#[derive(Debug)]
pub struct Table {
    kind: String,
    records: Vec<Record>,
    positions: HashMap<Key, usize>,
    unique: BTreeMap<String, BTreeMap<Key, Key>>,
}

impl Table {
    pub(crate) fn new(model: &EntityModel) -> Self {
        let unique = model
            .unique_fields()
            .map(|field| (field.name.clone(), BTreeMap::new()))
            .collect();

        Self {
            kind: model.name.clone(),
            records: Vec::new(),
            positions: HashMap::new(),
            unique,
        }
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn contains(&self, key: &Key) -> bool {
        self.positions.contains_key(key)
    }

    #[must_use]
    pub fn get(&self, key: &Key) -> Option<&Record> {
        self.positions.get(key).map(|idx| &self.records[*idx])
    }

    /// Iterate records in insertion order.
    pub fn scan(&self) -> impl ExactSizeIterator<Item = &Record> {
        self.records.iter()
    }

    /// Primary key of the row currently holding `value` in a unique field.
    #[must_use]
    pub fn unique_owner(&self, field: &str, value: &Key) -> Option<&Key> {
        self.unique.get(field).and_then(|index| index.get(value))
    }

    // Append a record that has already passed batch validation.
    // Returns false (and stores nothing) if the key is already present.
    pub(crate) fn push(&mut self, record: Record, unique_values: &[(String, Key)]) -> bool {
        if self.positions.contains_key(record.key()) {
            return false;
        }

        for (field, value) in unique_values {
            if let Some(index) = self.unique.get_mut(field) {
                index.insert(value.clone(), record.key().clone());
            }
        }
        self.positions.insert(record.key().clone(), self.records.len());
        self.records.push(record);

        true
    }
}
