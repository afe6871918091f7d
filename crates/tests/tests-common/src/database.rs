//! Databases for test cases.

use std::sync::Arc;

use query_engine_execution::metrics::Metrics;
use query_engine_execution::sqlite::SqliteConnection;
use query_engine_execution::TypeHandlers;
use sqlexpr::{Database, Entity};

/// A fresh in-memory SQLite database, and the metrics of its connection.
///
/// The pool holds a single connection, since every connection to `sqlite::memory:` opens a
/// database of its own.
pub async fn in_memory_database() -> anyhow::Result<(Database, Metrics)> {
    let _ = env_logger::builder().is_test(true).try_init();

    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await?;
    let mut registry = prometheus::Registry::new();
    let metrics = Metrics::initialize(&mut registry)?;
    let connection = SqliteConnection::new(pool, TypeHandlers::default(), metrics.clone());

    Ok((
        Database::new(Arc::new(connection), Default::default()),
        metrics,
    ))
}

/// Create the entity's table, failing if that did not happen.
pub async fn create_table<T: Entity>(database: &Database) -> anyhow::Result<()> {
    match database.create_table_if_not_exists::<T>().await? {
        sqlexpr::TableCreation::Created => Ok(()),
        sqlexpr::TableCreation::AlreadyExisted => {
            anyhow::bail!("table of {} existed already", std::any::type_name::<T>())
        }
    }
}
