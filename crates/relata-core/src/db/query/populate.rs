use crate::{
    db::{
        query::QueryError,
        relation::{RelationContext, RelationError},
        response::{Entity, PopulatedRelation},
        store::Record,
    },
    error::InternalError,
    model::EntityModel,
    schema::Schema,
};

///
/// PopulatePlan
///
/// Validated tree of relationship paths to attach to every result.
/// `"books.tags"` and `"books"` share one `books` node; request order is kept.
///

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub(crate) struct PopulatePlan {
    children: Vec<(String, Self)>,
}

impl PopulatePlan {
    /// Build and validate a plan for `model` from dotted paths.
    pub(crate) fn build<S: AsRef<str>>(
        schema: &Schema,
        model: &EntityModel,
        paths: &[S],
        max_depth: usize,
    ) -> Result<Self, QueryError> {
        let mut plan = Self::default();

        for path in paths {
            let path = path.as_ref();
            let segments: Vec<&str> = path.split('.').collect();
            if segments.iter().any(|segment| segment.is_empty()) {
                return Err(QueryError::InvalidFilter {
                    reason: format!("populate path '{path}' has an empty segment"),
                });
            }
            if segments.len() > max_depth {
                return Err(QueryError::PopulateTooDeep {
                    path: path.to_string(),
                    depth: segments.len(),
                    max: max_depth,
                });
            }

            plan.insert(schema, model, &segments)?;
        }

        Ok(plan)
    }

    fn insert(
        &mut self,
        schema: &Schema,
        model: &EntityModel,
        segments: &[&str],
    ) -> Result<(), QueryError> {
        let Some((head, rest)) = segments.split_first() else {
            return Ok(());
        };

        let relation = model
            .relation(head)
            .ok_or_else(|| RelationError::UnknownRelationship {
                kind: model.name.clone(),
                field: (*head).to_string(),
            })?;
        let target = schema
            .entity(&relation.target)
            .ok_or_else(|| QueryError::UnknownKind {
                kind: relation.target.clone(),
            })?;

        let idx = match self.children.iter().position(|(name, _)| name == head) {
            Some(idx) => idx,
            None => {
                self.children.push(((*head).to_string(), Self::default()));
                self.children.len() - 1
            }
        };

        self.children[idx].1.insert(schema, target, rest)
    }

    #[must_use]
    pub(crate) const fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Materialize `record` with every planned relationship attached.
    /// Returns the entity and the number of links followed.
    pub(crate) fn materialize(
        &self,
        ctx: &RelationContext<'_>,
        model: &EntityModel,
        record: &Record,
    ) -> Result<(Entity, u64), InternalError> {
        let mut entity = Entity::from_record(model, record);
        let mut links = 0u64;

        for (name, child) in &self.children {
            let relation = model.relation(name).ok_or_else(|| {
                InternalError::relation_invariant(format!(
                    "populate plan names missing relation '{}.{name}'",
                    model.name
                ))
            })?;
            let target = ctx.schema.try_entity(&relation.target)?;

            let related = ctx.related_records(model, relation, record)?;
            let mut entities = Vec::with_capacity(related.len());
            for related_record in related {
                let (nested, nested_links) = child.materialize(ctx, target, related_record)?;
                links = links.saturating_add(1).saturating_add(nested_links);
                entities.push(nested);
            }

            entity.attach(PopulatedRelation {
                name: name.clone(),
                to_many: relation.cardinality.is_to_many(),
                entities,
            });
        }

        Ok((entity, links))
    }
}

///
/// TESTS
///
