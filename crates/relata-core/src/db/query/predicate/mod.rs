mod ast;
mod eval;
mod normalize;
mod validate;


pub use ast::{CompareOp, ComparePredicate, Filter, QuantifiedPredicate, Quantifier};

pub(crate) use eval::{FieldPresence, Row, eval};
pub(crate) use normalize::normalize;
pub(crate) use validate::validate;
