//! Statement execution against SQLite and MySQL databases.
//!
//! Statements arrive as rendered [`query_engine_sql::sql::string::SQL`] values with named
//! parameters. They are rewritten to positional placeholders, bound, and run on a pooled
//! connection.

pub mod connection;
pub mod error;
pub mod metrics;
pub mod mysql;
pub mod placeholders;
pub mod query;
pub mod sqlite;
pub mod type_handlers;

pub use connection::{Connection, Row};
pub use error::Error;
pub use type_handlers::{TypeHandler, TypeHandlers};
