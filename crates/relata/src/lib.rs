//! ## Crate layout
//! - `core`: runtime values, schema models, the entity store, the
//!   relationship index, filter evaluation, and observability.
//! - `em`: the entity manager and its fluent find.
//! - `error`: the public error type.
//! - `orm`: schema resolution and database lifecycle.
//!
//! The `prelude` module carries the vocabulary needed to declare a schema,
//! insert rows and run queries.

pub use relata_core as core;

pub mod em;
pub mod error;
pub mod orm;

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use error::Error;
pub use orm::Orm;

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        core::{
            config::DbConfig,
            db::{Entity, Response, query::parse_filter, store::RowDocument},
            prelude::*,
            schema::RelationDecl,
        },
        em::{EntityManager, FindQuery},
        error::{Error, ErrorKind, QueryErrorKind, StoreErrorKind},
        orm::Orm,
    };
}
