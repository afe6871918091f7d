//! Translate predicates, assignments and orderings, and compose them into statements.

pub mod assignment;
pub mod builder;
pub mod filtering;
pub mod sorting;

pub use assignment::{translate_assignments, Assignments};
pub use builder::QueryBuilder;
pub use filtering::{translate_expression, translate_predicate};
