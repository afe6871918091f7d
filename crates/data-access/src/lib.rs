//! Typed data access over SQLite and MySQL.
//!
//! Entities describe their table once; predicates and assignments are written as
//! [`Expr`] trees and translated into parameterized SQL for the database's dialect.

pub mod database;
pub mod entity;
pub mod error;
pub mod mapping;
pub mod state;

pub use database::{Database, ReturnIdentity, SaveOutcome, TableCreation};
pub use entity::Entity;
pub use error::Error;
pub use state::{create_database, create_database_with_type_handlers, InitializationError};

pub use query_engine_metadata::metadata::{ColumnInfo, EntityDescriptor, IndexInfo, ScalarType};
pub use query_engine_sql::sql::string::Params;
pub use query_engine_sql::sql::{Dialect, Value};
pub use query_engine_translation::translation::expression::{captured, col, lit, Expr};
pub use query_engine_translation::translation::query::{Assignments, QueryBuilder};
