use crate::{
    config::{ConfigError, DbConfig},
    db::{
        commit,
        query::{self, Filter, FindOptions},
        relation::{RelationContext, RelationIndex, resolve_relation},
        response::{Entity, Response},
        store::{EntityStore, RowDocument, StoreError},
    },
    error::InternalError,
    key::Key,
    model::EntityModel,
    obs::sink::{ExecKind, MetricsSink, NoopMetricsSink, Span, with_metrics_sink},
    schema::Schema,
    value::Value,
};
use serde_json::Value as JsonValue;
use std::{
    cell::{Ref, RefCell, RefMut},
    rc::Rc,
};

///
/// DbState
/// Mutable half of the database: records and join tables.
///

#[derive(Debug, Default)]
pub(crate) struct DbState {
    pub(crate) store: EntityStore,
    pub(crate) index: RelationIndex,
}

///
/// Db
///
/// Shared handle over one schema and its in-memory state.
/// Clones and sessions share the same state; the handle is single-threaded.
///

#[derive(Clone, Debug)]
pub struct Db {
    schema: Rc<Schema>,
    config: Rc<DbConfig>,
    state: Rc<RefCell<DbState>>,
}

impl Db {
    /// In-memory database with the default configuration.
    #[must_use]
    pub fn new(schema: Schema) -> Self {
        Self {
            schema: Rc::new(schema),
            config: Rc::new(DbConfig::default()),
            state: Rc::new(RefCell::new(DbState::default())),
        }
    }

    pub fn with_config(schema: Schema, config: DbConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            schema: Rc::new(schema),
            config: Rc::new(config),
            state: Rc::new(RefCell::new(DbState::default())),
        })
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Open a session with the configured debug and metrics policy.
    #[must_use]
    pub fn session(&self) -> DbSession {
        DbSession::new(self.clone())
    }

    fn read(&self) -> Result<Ref<'_, DbState>, InternalError> {
        self.state
            .try_borrow()
            .map_err(|_| InternalError::store_invariant("database state is mutably borrowed"))
    }

    fn write(&self) -> Result<RefMut<'_, DbState>, InternalError> {
        self.state
            .try_borrow_mut()
            .map_err(|_| InternalError::store_invariant("database state is already borrowed"))
    }
}

///
/// DbSession
///
/// Session-scoped database handle with policy (debug, metrics) and
/// operation routing. Forks share the same `Db`.
///

#[derive(Clone)]
pub struct DbSession {
    db: Db,
    debug: bool,
    metrics: Option<Rc<dyn MetricsSink>>,
}

impl DbSession {
    #[must_use]
    pub fn new(db: Db) -> Self {
        let debug = db.config.debug;
        let metrics: Option<Rc<dyn MetricsSink>> = if db.config.metrics {
            None
        } else {
            Some(Rc::new(NoopMetricsSink))
        };

        Self { db, debug, metrics }
    }

    #[must_use]
    pub const fn debug(mut self) -> Self {
        self.debug = true;
        self
    }

    #[must_use]
    pub fn metrics_sink(mut self, sink: Rc<dyn MetricsSink>) -> Self {
        self.metrics = Some(sink);
        self
    }

    /// A fresh session over the same database, keeping this session's policy.
    #[must_use]
    pub fn fork(&self) -> Self {
        self.clone()
    }

    #[must_use]
    pub const fn db(&self) -> &Db {
        &self.db
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        self.db.schema()
    }

    fn with_metrics<T>(&self, f: impl FnOnce() -> T) -> T {
        if let Some(sink) = &self.metrics {
            with_metrics_sink(Rc::clone(sink), f)
        } else {
            f()
        }
    }

    fn model(&self, kind: &str) -> Result<&EntityModel, InternalError> {
        self.db.schema.entity(kind).ok_or_else(|| {
            StoreError::UnknownTable {
                kind: kind.to_string(),
            }
            .into()
        })
    }

    //
    // Schema
    //

    /// Create every table and join table of the schema.
    ///
    /// Fails without creating anything if any table already exists.
    pub fn create_schema(&self) -> Result<(), InternalError> {
        let mut state = self.db.write()?;
        let schema = &*self.db.schema;

        if let Some(model) = schema
            .entities()
            .find(|model| state.store.has_table(&model.name))
        {
            return Err(StoreError::DuplicateKind {
                kind: model.name.clone(),
            }
            .into());
        }

        for model in schema.entities() {
            state.store.create_table(model)?;
        }
        for join in schema.join_tables() {
            state.index.create_join_table(join)?;
        }

        if self.debug {
            tracing::debug!(
                kinds = schema.len(),
                join_tables = schema.join_tables().count(),
                "schema created"
            );
        }

        Ok(())
    }

    /// Create the table for one kind, plus the join tables it owns.
    pub fn create_table(&self, kind: &str) -> Result<(), InternalError> {
        let model = self.model(kind)?;
        let mut state = self.db.write()?;

        state.store.create_table(model)?;
        for join in self
            .db
            .schema
            .join_tables()
            .filter(|join| join.owner_kind == model.name)
        {
            state.index.create_join_table(join)?;
        }

        if self.debug {
            tracing::debug!(kind, "table created");
        }

        Ok(())
    }

    //
    // Writes
    //

    /// Validate and insert a batch atomically. Returns the number of rows.
    pub fn insert_many(
        &self,
        kind: &str,
        rows: impl IntoIterator<Item = RowDocument>,
    ) -> Result<usize, InternalError> {
        let rows: Vec<RowDocument> = rows.into_iter().collect();

        self.with_metrics(|| {
            let mut span = Span::new(ExecKind::Insert, kind);
            let model = self.model(kind)?;
            let mut state = self.db.write()?;

            let batch = commit::prepare(&self.db.schema, &state.store, model, rows)?;
            let prepared = batch.len();

            let DbState { store, index } = &mut *state;
            let summary = commit::apply(store, index, batch)?;
            span.set_rows(u64::try_from(summary.rows).unwrap_or(u64::MAX));

            if self.debug {
                tracing::debug!(
                    kind,
                    rows = prepared,
                    edges = summary.edges,
                    "batch inserted"
                );
            }

            Ok(summary.rows)
        })
    }

    /// Insert a JSON array of row objects.
    pub fn insert_many_json(&self, kind: &str, rows: &JsonValue) -> Result<usize, InternalError> {
        let invalid = |reason: String| -> InternalError {
            StoreError::InvalidDocument {
                kind: kind.to_string(),
                reason,
            }
            .into()
        };

        let JsonValue::Array(items) = rows else {
            return Err(invalid("expected an array of row objects".to_string()));
        };

        let mut docs = Vec::with_capacity(items.len());
        for item in items {
            let JsonValue::Object(map) = item else {
                return Err(invalid("every row must be an object".to_string()));
            };

            let mut doc = RowDocument::new();
            for (name, value) in map {
                let value = Value::from_json(value)
                    .map_err(|err| invalid(format!("field '{name}': {err}")))?;
                doc.insert(name.clone(), value);
            }
            docs.push(doc);
        }

        self.insert_many(kind, docs)
    }

    //
    // Reads
    //

    /// Fetch one entity by primary key.
    pub fn get(&self, kind: &str, key: impl Into<Key>) -> Result<Entity, InternalError> {
        let key = key.into();

        self.with_metrics(|| {
            let mut span = Span::new(ExecKind::Get, kind);
            let model = self.model(kind)?;
            let state = self.db.read()?;

            let lookup = canonical_key(model, &key).unwrap_or(key);
            let record = state.store.get(kind, &lookup)?;
            span.set_rows(1);

            if self.debug {
                tracing::debug!(kind, key = %lookup, "get");
            }

            Ok(Entity::from_record(model, record))
        })
    }

    /// Related entities of `kind(key)` through `field`, in relationship order.
    pub fn related_of(
        &self,
        kind: &str,
        key: impl Into<Key>,
        field: &str,
    ) -> Result<Response, InternalError> {
        let key = key.into();

        self.with_metrics(|| {
            let mut span = Span::new(ExecKind::Related, kind);
            let model = self.model(kind)?;
            let state = self.db.read()?;
            let ctx = RelationContext::new(&self.db.schema, &state.store, &state.index);

            let lookup = canonical_key(model, &key).unwrap_or(key);
            let records = ctx.related_of(kind, &lookup, field)?;
            let relation = resolve_relation(model, field)?;
            let target = self.db.schema.try_entity(&relation.target)?;

            let entities: Vec<Entity> = records
                .into_iter()
                .map(|record| Entity::from_record(target, record))
                .collect();
            span.set_rows(u64::try_from(entities.len()).unwrap_or(u64::MAX));

            if self.debug {
                tracing::debug!(kind, key = %lookup, field, rows = entities.len(), "related_of");
            }

            Ok(Response(entities))
        })
    }

    /// Filter, page and populate entities of `kind`.
    pub fn find(&self, kind: &str, options: &FindOptions) -> Result<Response, InternalError> {
        self.with_metrics(|| {
            let mut span = Span::new(ExecKind::Find, kind);
            let state = self.db.read()?;
            let ctx = RelationContext::new(&self.db.schema, &state.store, &state.index);

            let (response, stats) =
                query::find(&ctx, kind, options, self.db.config.max_populate_depth)?;
            span.set_rows(u64::from(response.count()));

            if self.debug {
                tracing::debug!(
                    kind,
                    filter = ?options.filter,
                    populate = ?options.populate,
                    scanned = stats.scanned,
                    matched = stats.matched,
                    returned = response.count(),
                    populated_links = stats.populated_links,
                    "find"
                );
            }

            Ok(response)
        })
    }

    /// Every entity of `kind`, in insertion order.
    pub fn find_all(&self, kind: &str) -> Result<Response, InternalError> {
        self.find(kind, &FindOptions::new())
    }

    /// Require exactly one entity of `kind` matching `filter`.
    pub fn find_one(&self, kind: &str, filter: Filter) -> Result<Entity, InternalError> {
        let response = self.find(kind, &FindOptions::new().filter(filter))?;

        Ok(response.require_one(kind)?)
    }

    /// Entity by primary key with populate paths, or `None` if absent.
    pub fn find_by_key<S: AsRef<str>>(
        &self,
        kind: &str,
        key: impl Into<Key>,
        populate: &[S],
    ) -> Result<Option<Entity>, InternalError> {
        let model = self.model(kind)?;
        let key = key.into();
        let lookup = canonical_key(model, &key).unwrap_or(key);

        let options = FindOptions::new()
            .filter(Filter::eq(model.primary_key.clone(), lookup.to_value()))
            .populate(populate.iter().map(|path| path.as_ref().to_string()));

        Ok(self.find(kind, &options)?.try_entity(kind)?)
    }

    /// Number of entities of `kind` matching `filter`.
    pub fn count(&self, kind: &str, filter: Filter) -> Result<u32, InternalError> {
        Ok(self.find(kind, &FindOptions::new().filter(filter))?.count())
    }
}

// Re-key a caller-supplied key into the primary-key kind of `model`.
fn canonical_key(model: &EntityModel, key: &Key) -> Option<Key> {
    Key::coerce(model.primary_key_kind(), &key.to_value()).ok()
}

///
/// TESTS
///
