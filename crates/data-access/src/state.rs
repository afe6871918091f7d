//! Open a database from a runtime configuration.
//!
//! This is done once on startup; the resulting [`Database`] is cloned wherever it is needed.

use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info_span, Instrument};

use query_engine_execution::metrics::Metrics;
use query_engine_execution::mysql::MySqlConnection;
use query_engine_execution::sqlite::SqliteConnection;
use query_engine_execution::{Connection, TypeHandlers};
use query_engine_sql::sql::Dialect;
use sqlexpr_configuration::values::PoolSettings;
use sqlexpr_configuration::Configuration;

use crate::database::Database;

/// Create a connection pool and wrap it inside a [`Database`], with the default type handlers.
pub async fn create_database(
    configuration: &Configuration,
    metrics_registry: &mut prometheus::Registry,
) -> Result<Database, InitializationError> {
    create_database_with_type_handlers(configuration, TypeHandlers::default(), metrics_registry)
        .await
}

/// Create a connection pool and wrap it inside a [`Database`].
pub async fn create_database_with_type_handlers(
    configuration: &Configuration,
    type_handlers: TypeHandlers,
    metrics_registry: &mut prometheus::Registry,
) -> Result<Database, InitializationError> {
    let metrics = async {
        let metrics_inner =
            Metrics::initialize(metrics_registry).map_err(InitializationError::MetricsError)?;
        Ok(metrics_inner)
    }
    .instrument(info_span!("Setup metrics"))
    .await?;

    let connection: Arc<dyn Connection> = match configuration.dialect {
        Dialect::Embedded => {
            let pool = create_sqlite_pool(&configuration.connection_uri, &configuration.pool_settings)
                .instrument(info_span!("Create connection pool", dialect = "embedded"))
                .await
                .map_err(InitializationError::UnableToCreatePool)?;
            Arc::new(SqliteConnection::new(pool, type_handlers, metrics))
        }
        Dialect::ClientServer => {
            let pool = create_mysql_pool(&configuration.connection_uri, &configuration.pool_settings)
                .instrument(info_span!("Create connection pool", dialect = "client-server"))
                .await
                .map_err(InitializationError::UnableToCreatePool)?;
            Arc::new(MySqlConnection::new(pool, type_handlers, metrics))
        }
    };

    Ok(Database::new(connection, configuration.translation_options()))
}

async fn create_sqlite_pool(
    connection_uri: &str,
    pool_settings: &PoolSettings,
) -> Result<sqlx::SqlitePool, sqlx::Error> {
    let connect_options =
        sqlx::sqlite::SqliteConnectOptions::from_str(connection_uri)?.create_if_missing(true);

    sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .acquire_timeout(pool_settings.acquire_timeout())
        .idle_timeout(pool_settings.idle_timeout())
        .max_lifetime(pool_settings.max_lifetime())
        .connect_with(connect_options)
        .await
}

async fn create_mysql_pool(
    connection_uri: &str,
    pool_settings: &PoolSettings,
) -> Result<sqlx::MySqlPool, sqlx::Error> {
    let connect_options = sqlx::mysql::MySqlConnectOptions::from_str(connection_uri)?;

    sqlx::mysql::MySqlPoolOptions::new()
        .max_connections(pool_settings.max_connections)
        .acquire_timeout(pool_settings.acquire_timeout())
        .idle_timeout(pool_settings.idle_timeout())
        .max_lifetime(pool_settings.max_lifetime())
        .connect_with(connect_options)
        .await
}

/// State initialization error.
#[derive(Debug, Error)]
pub enum InitializationError {
    #[error("unable to initialize connection pool: {0}")]
    UnableToCreatePool(sqlx::Error),
    #[error("error initializing metrics: {0}")]
    MetricsError(prometheus::Error),
}
