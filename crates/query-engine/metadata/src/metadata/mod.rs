//! Metadata information regarding the tables entities are mapped to.

pub mod cache;
pub mod database;

// re-export without modules
pub use cache::*;
pub use database::*;
