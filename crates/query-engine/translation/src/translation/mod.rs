//! Translate expression trees and entity descriptors into parameterized SQL.

pub mod error;
pub mod evaluate;
pub mod expression;
pub mod options;
pub mod query;
pub mod statements;
pub mod values;
