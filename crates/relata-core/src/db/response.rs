use crate::{
    db::store::Record,
    error::ErrorClass,
    key::Key,
    model::EntityModel,
    value::Value,
};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error as ThisError;

///
/// ResponseError
/// Errors related to interpreting a materialized response.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum ResponseError {
    #[error("expected exactly one row, found 0 (entity {entity})")]
    NotFound { entity: String },

    #[error("expected exactly one row, found {count} (entity {entity})")]
    NotUnique { entity: String, count: u32 },
}

impl ResponseError {
    pub(crate) const fn class(&self) -> ErrorClass {
        match self {
            Self::NotFound { .. } => ErrorClass::NotFound,
            Self::NotUnique { .. } => ErrorClass::Conflict,
        }
    }
}

///
/// Entity
///
/// Read-only view of one record, with any populated relationships attached.
/// Built fresh for every query; the store is never modified.
///

#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
    kind: String,
    key: Key,
    fields: Vec<(String, Value)>,
    relations: Vec<PopulatedRelation>,
}

///
/// PopulatedRelation
///

#[derive(Clone, Debug, PartialEq)]
pub struct PopulatedRelation {
    pub name: String,
    pub to_many: bool,
    pub entities: Vec<Entity>,
}

impl Entity {
    /// Snapshot a record's stored values in declaration order.
    pub(crate) fn from_record(model: &EntityModel, record: &Record) -> Self {
        let scalars = model.fields.iter().map(|field| field.name.as_str());
        let foreign_keys = model
            .relations
            .iter()
            .filter(|relation| relation.is_foreign_key())
            .map(|relation| relation.name.as_str());

        let fields = scalars
            .chain(foreign_keys)
            .filter_map(|name| record.get(name).map(|value| (name.to_string(), value.clone())))
            .collect();

        Self {
            kind: model.name.clone(),
            key: record.key().clone(),
            fields,
            relations: Vec::new(),
        }
    }

    pub(crate) fn attach(&mut self, relation: PopulatedRelation) {
        self.relations.push(relation);
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    #[must_use]
    pub const fn key(&self) -> &Key {
        &self.key
    }

    /// Stored value of a scalar field or a foreign key.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Populated related entities, or `None` if `field` was not populated.
    #[must_use]
    pub fn related(&self, field: &str) -> Option<&[Self]> {
        self.relations
            .iter()
            .find(|relation| relation.name == field)
            .map(|relation| relation.entities.as_slice())
    }

    #[must_use]
    pub fn is_populated(&self, field: &str) -> bool {
        self.related(field).is_some()
    }

    /// Render as a JSON object. Populated to-one relations render as an
    /// object (or null), to-many relations as an array.
    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        for (name, value) in &self.fields {
            map.insert(name.clone(), value.to_json());
        }

        for relation in &self.relations {
            let rendered = if relation.to_many {
                JsonValue::Array(relation.entities.iter().map(Self::to_json).collect())
            } else {
                relation
                    .entities
                    .first()
                    .map_or(JsonValue::Null, Self::to_json)
            };
            map.insert(relation.name.clone(), rendered);
        }

        JsonValue::Object(map)
    }
}

///
/// Response
/// Materialized query result: entities in insertion order of the queried table.
///

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Response(pub Vec<Entity>);

impl Response {
    //
    // Cardinality
    //

    #[must_use]
    /// Number of rows in the response, saturating at `u32::MAX`.
    pub fn count(&self) -> u32 {
        u32::try_from(self.0.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    /// True when no rows were returned.
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    //
    // Exact cardinality helpers
    //

    /// Require exactly one row.
    pub fn require_one(self, entity: &str) -> Result<Entity, ResponseError> {
        let count = self.count();

        match self.0.into_iter().next() {
            Some(row) if count == 1 => Ok(row),
            None => Err(ResponseError::NotFound {
                entity: entity.to_string(),
            }),
            Some(_) => Err(ResponseError::NotUnique {
                entity: entity.to_string(),
                count,
            }),
        }
    }

    /// Require at least one row.
    pub fn require_some(self, entity: &str) -> Result<Self, ResponseError> {
        if self.is_empty() {
            Err(ResponseError::NotFound {
                entity: entity.to_string(),
            })
        } else {
            Ok(self)
        }
    }

    /// Require at most one row.
    pub fn try_entity(self, entity: &str) -> Result<Option<Entity>, ResponseError> {
        let count = self.count();
        if count > 1 {
            return Err(ResponseError::NotUnique {
                entity: entity.to_string(),
                count,
            });
        }

        Ok(self.0.into_iter().next())
    }

    //
    // Keys
    //

    #[must_use]
    /// Collect all keys in order.
    pub fn keys(&self) -> Vec<Key> {
        self.0.iter().map(|entity| entity.key().clone()).collect()
    }

    #[must_use]
    pub fn contains_key(&self, key: &Key) -> bool {
        self.0.iter().any(|entity| entity.key() == key)
    }

    //
    // Entities
    //

    #[must_use]
    /// Consume the response and return the first entity, if any.
    pub fn entity(self) -> Option<Entity> {
        self.0.into_iter().next()
    }

    #[must_use]
    /// Consume the response and collect all entities.
    pub fn entities(self) -> Vec<Entity> {
        self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entity> {
        self.0.iter()
    }

    #[must_use]
    pub fn to_json(&self) -> JsonValue {
        JsonValue::Array(self.0.iter().map(Entity::to_json).collect())
    }
}

impl IntoIterator for Response {
    type Item = Entity;
    type IntoIter = std::vec::IntoIter<Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Response {
    type Item = &'a Entity;
    type IntoIter = std::slice::Iter<'a, Entity>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

///
/// TESTS
///
