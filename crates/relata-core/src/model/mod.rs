//! Resolved runtime models produced by schema building.
//!
//! Models are immutable once built; the store, the relationship index and
//! the query evaluator only ever read them.

pub mod entity;
pub mod field;
pub mod relation;

// re-exports
pub use entity::EntityModel;
pub use field::{FieldKind, FieldModel};
pub use relation::{Cardinality, JoinTableModel, RelationModel, RelationRole};
