//! Core runtime for Relata: values, schema models, the entity store, the
//! relationship index, filter evaluation, and observability.
#![warn(unreachable_pub)]

// public exports are one module level down
pub mod config;
pub mod db;
pub mod error;
pub mod key;
pub mod model;
pub mod obs;
pub mod schema;
pub mod value;

// test
#[cfg(test)]
pub(crate) mod test_fixtures;

///
/// CONSTANTS
///

/// Maximum nesting depth accepted for dotted populate paths.
///
/// Populate walks one relationship hop per path segment; deeper paths are
/// rejected before evaluation unless the configuration raises the limit.
pub const DEFAULT_MAX_POPULATE_DEPTH: usize = 4;

///
/// Prelude
///
/// Prelude contains only domain vocabulary.
/// No errors, stores, or helpers are re-exported here.
///

pub mod prelude {
    pub use crate::{
        db::query::{Filter, FindOptions},
        key::Key,
        model::{Cardinality, FieldKind},
        schema::{EntityDecl, SchemaBuilder},
        value::Value,
    };
}
