use crate::model::{
    field::{FieldKind, FieldModel},
    relation::RelationModel,
};

///
/// EntityModel
/// Resolved runtime model for one entity kind.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityModel {
    /// Stable kind name used for tables and routing.
    pub name: String,
    /// Primary key field (points at an entry in `fields`).
    pub primary_key: String,
    /// Ordered scalar field list (declaration order).
    pub fields: Vec<FieldModel>,
    /// Ordered relationship field list (declaration order).
    pub relations: Vec<RelationModel>,
}

impl EntityModel {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&FieldModel> {
        self.fields.iter().find(|field| field.name == name)
    }

    #[must_use]
    pub fn relation(&self, name: &str) -> Option<&RelationModel> {
        self.relations.iter().find(|relation| relation.name == name)
    }

    #[must_use]
    pub fn has_member(&self, name: &str) -> bool {
        self.field(name).is_some() || self.relation(name).is_some()
    }

    /// Kind of the primary key field.
    ///
    /// Schema building guarantees the primary key exists and is keyable,
    /// so this falls back to `Int` only for hand-built models.
    #[must_use]
    pub fn primary_key_kind(&self) -> FieldKind {
        self.field(&self.primary_key)
            .map_or(FieldKind::Int, |field| field.kind)
    }

    /// Scalar fields carrying a unique constraint (primary key excluded).
    pub fn unique_fields(&self) -> impl Iterator<Item = &FieldModel> {
        self.fields
            .iter()
            .filter(|field| field.unique && field.name != self.primary_key)
    }
}
