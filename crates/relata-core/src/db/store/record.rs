use crate::{
    db::query::predicate::{FieldPresence, Row},
    key::Key,
    value::Value,
};
use std::collections::BTreeMap;

///
/// RowDocument
/// Field-name → value map accepted by bulk insert.
///

pub type RowDocument = BTreeMap<String, Value>;

///
/// Record
///
/// One stored entity instance. Holds scalar fields and the foreign-key
/// values of many-to-one relations; many-to-many links live in join tables.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    key: Key,
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub(crate) const fn new(key: Key, fields: BTreeMap<String, Value>) -> Self {
        Self { key, fields }
    }

    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.key
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl Row for Record {
    fn field(&self, name: &str) -> FieldPresence {
        match self.fields.get(name) {
            Some(value) => FieldPresence::Present(value.clone()),
            None => FieldPresence::Missing,
        }
    }
}
