use crate::model::{Cardinality, FieldKind, FieldModel};

///
/// RelationDecl
///
/// Unresolved relationship declaration. Targets are referenced by kind name
/// and only resolved once every kind is registered.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RelationDecl {
    pub(crate) name: String,
    pub(crate) target: String,
    pub(crate) cardinality: Cardinality,
    pub(crate) mapped_by: Option<String>,
    pub(crate) inversed_by: Option<String>,
}

impl RelationDecl {
    fn new(name: impl Into<String>, target: impl Into<String>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            cardinality,
            mapped_by: None,
            inversed_by: None,
        }
    }

    #[must_use]
    pub fn one_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, Cardinality::OneToMany)
    }

    #[must_use]
    pub fn many_to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, Cardinality::ManyToOne)
    }

    #[must_use]
    pub fn many_to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self::new(name, target, Cardinality::ManyToMany)
    }

    /// Name the storing relation on the target kind; makes this side derived.
    #[must_use]
    pub fn mapped_by(mut self, field: impl Into<String>) -> Self {
        self.mapped_by = Some(field.into());
        self
    }

    /// Name the derived relation on the target kind that mirrors this side.
    #[must_use]
    pub fn inversed_by(mut self, field: impl Into<String>) -> Self {
        self.inversed_by = Some(field.into());
        self
    }
}

///
/// EntityDecl
///
/// Builder-style declaration of one entity kind.
///

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EntityDecl {
    pub(crate) name: String,
    pub(crate) primary_key: Option<String>,
    pub(crate) fields: Vec<FieldModel>,
    pub(crate) relations: Vec<RelationDecl>,
}

impl EntityDecl {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: None,
            fields: Vec::new(),
            relations: Vec::new(),
        }
    }

    /// Declare the primary key field.
    #[must_use]
    pub fn primary(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        let name = name.into();
        self.primary_key = Some(name.clone());
        self.fields.push(FieldModel::new(name, kind));
        self
    }

    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldModel::new(name, kind));
        self
    }

    #[must_use]
    pub fn unique(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.member(FieldModel::new(name, kind).unique())
    }

    #[must_use]
    pub fn nullable(self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.member(FieldModel::new(name, kind).nullable())
    }

    /// Declare a field with explicit flags, e.g. a nullable unique column.
    #[must_use]
    pub fn member(mut self, field: FieldModel) -> Self {
        self.fields.push(field);
        self
    }

    #[must_use]
    pub fn relation(mut self, relation: RelationDecl) -> Self {
        self.relations.push(relation);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}
