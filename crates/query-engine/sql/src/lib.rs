//! SQL AST, dialect policy and rendering of parameterized SQL strings.

pub mod sql;
