//! SQL types, helpers and rendering.

pub mod ast;
pub mod convert;
pub mod dialect;
pub mod helpers;
pub mod identifier;
pub mod keywords;
pub mod string;
pub mod value;

pub use dialect::Dialect;
pub use value::Value;
