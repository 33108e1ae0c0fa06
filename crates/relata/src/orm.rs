use crate::{em::EntityManager, error::Error};
use relata_core::{
    config::DbConfig,
    db::Db,
    schema::{Schema, SchemaBuilder},
};
use std::path::Path;

///
/// Orm
///
/// Entry point: resolves a schema against a configuration and hands out
/// entity managers. Every manager shares the same in-memory database.
///

pub struct Orm {
    db: Db,
}

impl Orm {
    /// Resolve `schema` and open an empty database for it.
    pub fn init(config: DbConfig, schema: SchemaBuilder) -> Result<Self, Error> {
        let schema = schema.build()?;
        let kinds = schema.len();
        let db = Db::with_config(schema, config)?;

        if db.config().debug {
            tracing::debug!(name = %db.config().name, kinds, "orm initialized");
        }

        Ok(Self { db })
    }

    /// Like [`Orm::init`], reading the configuration from a TOML file.
    pub fn init_from_file(path: impl AsRef<Path>, schema: SchemaBuilder) -> Result<Self, Error> {
        Self::init(DbConfig::load(path)?, schema)
    }

    /// Create every table and join table declared by the schema.
    pub fn create_schema(&self) -> Result<(), Error> {
        Ok(self.db.session().create_schema()?)
    }

    /// A fresh entity manager forked from the database.
    #[must_use]
    pub fn em(&self) -> EntityManager {
        EntityManager::new(self.db.session())
    }

    #[must_use]
    pub fn schema(&self) -> &Schema {
        self.db.schema()
    }

    #[must_use]
    pub fn config(&self) -> &DbConfig {
        self.db.config()
    }

    /// Release the database. Managers still holding it keep it alive.
    pub fn close(self) {
        if self.db.config().debug {
            tracing::debug!(name = %self.db.config().name, "orm closed");
        }
    }
}
