use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Cardinality
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
#[remain::sorted]
pub enum Cardinality {
    ManyToMany,
    ManyToOne,
    OneToMany,
}

impl Cardinality {
    #[must_use]
    pub const fn is_to_many(self) -> bool {
        matches!(self, Self::ManyToMany | Self::OneToMany)
    }
}

///
/// RelationRole
///
/// Which side of a relationship physically stores the link.
/// Exactly one side of every pair stores; the other is derived on demand.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RelationRole {
    /// Many-to-one: the source row stores the target key.
    ForeignKey,

    /// Owning many-to-many side: pairs live in `join_table`
    /// with this kind in the left column.
    Owning { join_table: String },

    /// Non-storing side. `owner_field` is the storing relation on the target
    /// kind (a foreign key or an owning many-to-many).
    Derived { owner_field: String },
}

///
/// RelationModel
/// Resolved relationship field.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationModel {
    pub name: String,
    /// Target entity kind name.
    pub target: String,
    pub cardinality: Cardinality,
    pub role: RelationRole,
    /// Relation on the target kind that traverses the same link backwards.
    pub inverse: Option<String>,
}

impl RelationModel {
    #[must_use]
    pub const fn is_foreign_key(&self) -> bool {
        matches!(self.role, RelationRole::ForeignKey)
    }

    #[must_use]
    pub const fn is_derived(&self) -> bool {
        matches!(self.role, RelationRole::Derived { .. })
    }

    /// Relationship values may only be written through storing sides.
    #[must_use]
    pub const fn is_writable(&self) -> bool {
        !self.is_derived()
    }
}

///
/// JoinTableModel
///
/// Pair table backing one owning many-to-many relation.
/// Left column keys belong to `owner_kind`, right column keys to `target_kind`.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct JoinTableModel {
    pub name: String,
    pub owner_kind: String,
    pub owner_field: String,
    pub target_kind: String,
}
