//! Database runtime: the entity store, the relationship index, query
//! evaluation and the session that routes operations between them.

pub(crate) mod commit;
pub mod query;
pub mod relation;
pub mod response;
pub mod session;
pub mod store;

// re-exports
pub use relation::RelationContext;
pub use response::{Entity, PopulatedRelation, Response, ResponseError};
pub use session::{Db, DbSession};
