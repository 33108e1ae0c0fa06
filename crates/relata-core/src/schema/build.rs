use crate::{
    model::{Cardinality, EntityModel, JoinTableModel, RelationModel, RelationRole},
    schema::{
        Schema, SchemaError,
        decl::{EntityDecl, RelationDecl},
    },
};
use convert_case::{Case, Casing};
use std::collections::{BTreeMap, BTreeSet};

///
/// SchemaBuilder
///
/// Collects entity declarations and resolves them in two passes.
///

#[derive(Clone, Debug, Default)]
pub struct SchemaBuilder {
    decls: Vec<EntityDecl>,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn entity(mut self, decl: EntityDecl) -> Self {
        self.decls.push(decl);
        self
    }

    pub fn register(&mut self, decl: EntityDecl) {
        self.decls.push(decl);
    }

    /// Resolve every declaration into an immutable [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        // Pass 1: register kind names.
        let mut by_name = BTreeMap::new();
        for decl in &self.decls {
            if by_name.insert(decl.name.as_str(), decl).is_some() {
                return Err(SchemaError::DuplicateKind {
                    kind: decl.name.clone(),
                });
            }
        }

        // Pass 2: resolve fields and relationship targets.
        let mut entities = Vec::with_capacity(self.decls.len());
        let mut join_tables = Vec::new();
        let mut join_names = BTreeSet::new();

        for decl in &self.decls {
            validate_members(decl)?;

            let mut relations = Vec::with_capacity(decl.relations.len());
            for relation in &decl.relations {
                let resolved = resolve_relation(&by_name, decl, relation)?;

                if let RelationRole::Owning { join_table } = &resolved.role {
                    if !join_names.insert(join_table.clone()) {
                        return Err(SchemaError::DuplicateJoinTable {
                            name: join_table.clone(),
                        });
                    }
                    join_tables.push(JoinTableModel {
                        name: join_table.clone(),
                        owner_kind: decl.name.clone(),
                        owner_field: relation.name.clone(),
                        target_kind: relation.target.clone(),
                    });
                }
                relations.push(resolved);
            }

            entities.push(EntityModel {
                name: decl.name.clone(),
                primary_key: decl.primary_key.clone().unwrap_or_default(),
                fields: decl.fields.clone(),
                relations,
            });
        }

        tracing::debug!(
            kinds = entities.len(),
            join_tables = join_tables.len(),
            "schema resolved"
        );

        Ok(Schema::from_parts(entities, join_tables))
    }
}

// Validate scalar members, primary key and unique constraints of one declaration.
fn validate_members(decl: &EntityDecl) -> Result<(), SchemaError> {
    let mut seen = BTreeSet::new();
    let names = decl
        .fields
        .iter()
        .map(|field| field.name.as_str())
        .chain(decl.relations.iter().map(|relation| relation.name.as_str()));
    for name in names {
        if !seen.insert(name) {
            return Err(SchemaError::DuplicateField {
                kind: decl.name.clone(),
                field: name.to_string(),
            });
        }
    }

    let Some(pk_name) = &decl.primary_key else {
        return Err(SchemaError::MissingPrimaryKey {
            kind: decl.name.clone(),
        });
    };
    let pk = decl
        .fields
        .iter()
        .find(|field| &field.name == pk_name)
        .ok_or_else(|| SchemaError::MissingPrimaryKey {
            kind: decl.name.clone(),
        })?;
    if !pk.kind.is_keyable() {
        return Err(SchemaError::InvalidPrimaryKeyType {
            kind: decl.name.clone(),
            field: pk.name.clone(),
            field_kind: pk.kind,
        });
    }

    if let Some(field) = decl
        .fields
        .iter()
        .find(|field| field.unique && !field.kind.is_keyable())
    {
        return Err(SchemaError::UniqueUnsupported {
            kind: decl.name.clone(),
            field: field.name.clone(),
            field_kind: field.kind,
        });
    }

    Ok(())
}

// Resolve one relationship declaration against its target kind.
fn resolve_relation(
    by_name: &BTreeMap<&str, &EntityDecl>,
    source: &EntityDecl,
    relation: &RelationDecl,
) -> Result<RelationModel, SchemaError> {
    let target = by_name
        .get(relation.target.as_str())
        .ok_or_else(|| SchemaError::UnknownTarget {
            kind: source.name.clone(),
            field: relation.name.clone(),
            target: relation.target.clone(),
        })?;

    let (role, inverse) = match relation.cardinality {
        Cardinality::ManyToOne => resolve_many_to_one(source, target, relation)?,
        Cardinality::OneToMany => resolve_one_to_many(source, target, relation)?,
        Cardinality::ManyToMany => match &relation.mapped_by {
            Some(mapped_by) => resolve_derived_many_to_many(source, target, relation, mapped_by)?,
            None => resolve_owning_many_to_many(source, target, relation)?,
        },
    };

    Ok(RelationModel {
        name: relation.name.clone(),
        target: relation.target.clone(),
        cardinality: relation.cardinality,
        role,
        inverse,
    })
}

type Resolved = (RelationRole, Option<String>);

fn resolve_many_to_one(
    source: &EntityDecl,
    target: &EntityDecl,
    relation: &RelationDecl,
) -> Result<Resolved, SchemaError> {
    if let Some(mapped_by) = &relation.mapped_by {
        return Err(SchemaError::MappedByMismatch {
            kind: source.name.clone(),
            field: relation.name.clone(),
            mapped_by: mapped_by.clone(),
            reason: "many-to-one relations always store the foreign key",
        });
    }

    let inverse = if let Some(inversed_by) = &relation.inversed_by {
        let back = find_relation(target, inversed_by).ok_or_else(|| {
            inversed_mismatch(source, relation, inversed_by, "not declared on the target")
        })?;
        let points_back = back.cardinality == Cardinality::OneToMany
            && back.target == source.name
            && back.mapped_by.as_deref() == Some(relation.name.as_str());
        if !points_back {
            return Err(inversed_mismatch(
                source,
                relation,
                inversed_by,
                "must be a one-to-many mapped by this field",
            ));
        }
        Some(inversed_by.clone())
    } else {
        find_mirror(target, source, relation, Cardinality::OneToMany)
    };

    Ok((RelationRole::ForeignKey, inverse))
}

fn resolve_one_to_many(
    source: &EntityDecl,
    target: &EntityDecl,
    relation: &RelationDecl,
) -> Result<Resolved, SchemaError> {
    let Some(mapped_by) = &relation.mapped_by else {
        return Err(SchemaError::MappedByMissing {
            kind: source.name.clone(),
            field: relation.name.clone(),
        });
    };
    if let Some(inversed_by) = &relation.inversed_by {
        return Err(inversed_mismatch(
            source,
            relation,
            inversed_by,
            "derived sides cannot declare inversed_by",
        ));
    }

    let owner = find_relation(target, mapped_by).ok_or_else(|| SchemaError::MappedByUnknown {
        kind: source.name.clone(),
        field: relation.name.clone(),
        target: target.name.clone(),
        mapped_by: mapped_by.clone(),
    })?;
    if owner.cardinality != Cardinality::ManyToOne || owner.target != source.name {
        return Err(SchemaError::MappedByMismatch {
            kind: source.name.clone(),
            field: relation.name.clone(),
            mapped_by: mapped_by.clone(),
            reason: "must be a many-to-one pointing back at this kind",
        });
    }

    Ok((
        RelationRole::Derived {
            owner_field: mapped_by.clone(),
        },
        Some(mapped_by.clone()),
    ))
}

fn resolve_derived_many_to_many(
    source: &EntityDecl,
    target: &EntityDecl,
    relation: &RelationDecl,
    mapped_by: &str,
) -> Result<Resolved, SchemaError> {
    if let Some(inversed_by) = &relation.inversed_by {
        return Err(inversed_mismatch(
            source,
            relation,
            inversed_by,
            "derived sides cannot declare inversed_by",
        ));
    }

    let owner = find_relation(target, mapped_by).ok_or_else(|| SchemaError::MappedByUnknown {
        kind: source.name.clone(),
        field: relation.name.clone(),
        target: target.name.clone(),
        mapped_by: mapped_by.to_string(),
    })?;
    if owner.cardinality != Cardinality::ManyToMany || owner.target != source.name {
        return Err(SchemaError::MappedByMismatch {
            kind: source.name.clone(),
            field: relation.name.clone(),
            mapped_by: mapped_by.to_string(),
            reason: "must be a many-to-many pointing back at this kind",
        });
    }
    if owner.mapped_by.is_some() {
        return Err(SchemaError::AmbiguousOwnership {
            kind: source.name.clone(),
            field: relation.name.clone(),
            target: target.name.clone(),
            other: owner.name.clone(),
        });
    }

    Ok((
        RelationRole::Derived {
            owner_field: mapped_by.to_string(),
        },
        Some(mapped_by.to_string()),
    ))
}

fn resolve_owning_many_to_many(
    source: &EntityDecl,
    target: &EntityDecl,
    relation: &RelationDecl,
) -> Result<Resolved, SchemaError> {
    let inverse = if let Some(inversed_by) = &relation.inversed_by {
        let back = find_relation(target, inversed_by).ok_or_else(|| {
            inversed_mismatch(source, relation, inversed_by, "not declared on the target")
        })?;
        if back.cardinality != Cardinality::ManyToMany || back.target != source.name {
            return Err(inversed_mismatch(
                source,
                relation,
                inversed_by,
                "must be a many-to-many pointing back at this kind",
            ));
        }
        match back.mapped_by.as_deref() {
            None => {
                return Err(SchemaError::AmbiguousOwnership {
                    kind: source.name.clone(),
                    field: relation.name.clone(),
                    target: target.name.clone(),
                    other: back.name.clone(),
                });
            }
            Some(mapped_by) if mapped_by != relation.name => {
                return Err(inversed_mismatch(
                    source,
                    relation,
                    inversed_by,
                    "must be mapped by this field",
                ));
            }
            Some(_) => {}
        }
        Some(inversed_by.clone())
    } else {
        find_mirror(target, source, relation, Cardinality::ManyToMany)
    };

    let join_table = format!(
        "{}_{}",
        source.name.to_case(Case::Snake),
        relation.name.to_case(Case::Snake)
    );

    Ok((RelationRole::Owning { join_table }, inverse))
}

fn find_relation<'a>(decl: &'a EntityDecl, name: &str) -> Option<&'a RelationDecl> {
    decl.relations.iter().find(|relation| relation.name == name)
}

// Locate an undeclared inverse: a derived relation on the target mapped by this field.
fn find_mirror(
    target: &EntityDecl,
    source: &EntityDecl,
    relation: &RelationDecl,
    cardinality: Cardinality,
) -> Option<String> {
    target
        .relations
        .iter()
        .find(|candidate| {
            candidate.cardinality == cardinality
                && candidate.target == source.name
                && candidate.mapped_by.as_deref() == Some(relation.name.as_str())
        })
        .map(|candidate| candidate.name.clone())
}

fn inversed_mismatch(
    source: &EntityDecl,
    relation: &RelationDecl,
    inversed_by: &str,
    reason: &'static str,
) -> SchemaError {
    SchemaError::InversedByMismatch {
        kind: source.name.clone(),
        field: relation.name.clone(),
        inversed_by: inversed_by.to_string(),
        reason,
    }
}
