use crate::error::Error;
use relata_core::{
    self as core,
    db::{
        Entity, Response,
        query::{Filter, FindOptions, parse_filter},
        store::RowDocument,
    },
    key::Key,
    obs::MetricsSink,
};
use serde_json::Value as JsonValue;
use std::rc::Rc;

///
/// EntityManager
/// Public facade session: routes calls to the core session and converts
/// core errors into `relata::Error`.
///

#[derive(Clone)]
pub struct EntityManager {
    inner: core::db::DbSession,
}

impl EntityManager {
    #[must_use]
    pub const fn new(inner: core::db::DbSession) -> Self {
        Self { inner }
    }

    /// Enable `tracing` debug events for every operation of this manager.
    #[must_use]
    pub fn debug(mut self) -> Self {
        self.inner = self.inner.debug();
        self
    }

    /// Override the metrics sink for operations executed through this manager.
    #[must_use]
    pub fn metrics_sink(mut self, sink: Rc<dyn MetricsSink>) -> Self {
        self.inner = self.inner.metrics_sink(sink);
        self
    }

    /// Another manager over the same database.
    #[must_use]
    pub fn fork(&self) -> Self {
        Self::new(self.inner.fork())
    }

    #[must_use]
    pub const fn session(&self) -> &core::db::DbSession {
        &self.inner
    }

    //
    // Writes
    //

    /// Insert a batch of row documents atomically.
    pub fn insert_many(
        &self,
        kind: &str,
        rows: impl IntoIterator<Item = RowDocument>,
    ) -> Result<usize, Error> {
        Ok(self.inner.insert_many(kind, rows)?)
    }

    /// Insert a JSON array of row objects atomically.
    pub fn insert_many_json(&self, kind: &str, rows: &JsonValue) -> Result<usize, Error> {
        Ok(self.inner.insert_many_json(kind, rows)?)
    }

    //
    // Reads
    //

    pub fn get(&self, kind: &str, key: impl Into<Key>) -> Result<Entity, Error> {
        Ok(self.inner.get(kind, key)?)
    }

    pub fn related_of(
        &self,
        kind: &str,
        key: impl Into<Key>,
        field: &str,
    ) -> Result<Response, Error> {
        Ok(self.inner.related_of(kind, key, field)?)
    }

    /// Start a fluent find over `kind`.
    #[must_use]
    pub fn find<'a>(&'a self, kind: &'a str) -> FindQuery<'a> {
        FindQuery {
            em: self,
            kind,
            options: FindOptions::new(),
        }
    }

    /// Run a find with prepared options.
    pub fn find_with(&self, kind: &str, options: &FindOptions) -> Result<Response, Error> {
        Ok(self.inner.find(kind, options)?)
    }

    pub fn find_by_key<S: AsRef<str>>(
        &self,
        kind: &str,
        key: impl Into<Key>,
        populate: &[S],
    ) -> Result<Option<Entity>, Error> {
        Ok(self.inner.find_by_key(kind, key, populate)?)
    }
}

///
/// FindQuery
/// Session-bound fluent find; nothing runs until a terminal method is called.
///

pub struct FindQuery<'a> {
    em: &'a EntityManager,
    kind: &'a str,
    options: FindOptions,
}

impl FindQuery<'_> {
    /// AND `filter` into the current filter.
    #[must_use]
    pub fn filter(mut self, filter: Filter) -> Self {
        self.options.filter = if self.options.filter.is_true() {
            filter
        } else {
            self.options.filter & filter
        };
        self
    }

    /// AND a JSON filter document into the current filter.
    pub fn filter_json(self, doc: &JsonValue) -> Result<Self, Error> {
        let filter = parse_filter(doc)?;

        Ok(self.filter(filter))
    }

    #[must_use]
    pub fn populate<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = self.options.populate(paths);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.options = self.options.limit(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.options = self.options.offset(offset);
        self
    }

    //
    // Terminals
    //

    pub fn all(self) -> Result<Response, Error> {
        self.em.find_with(self.kind, &self.options)
    }

    /// Exactly one matching entity.
    pub fn one(self) -> Result<Entity, Error> {
        let kind = self.kind;

        Ok(self.all()?.require_one(kind)?)
    }

    /// At most one matching entity.
    pub fn try_one(self) -> Result<Option<Entity>, Error> {
        let kind = self.kind;

        Ok(self.all()?.try_entity(kind)?)
    }

    pub fn count(self) -> Result<u32, Error> {
        Ok(self.all()?.count())
    }

    pub fn exists(self) -> Result<bool, Error> {
        Ok(!self.limit(1).all()?.is_empty())
    }
}
