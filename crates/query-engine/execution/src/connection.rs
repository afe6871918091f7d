//! The capability a data-access layer needs from a database connection.

use async_trait::async_trait;
use indexmap::IndexMap;

use query_engine_sql::sql::string::{DDL, SQL};
use query_engine_sql::sql::{Dialect, Value};

use crate::error::Error;
use crate::type_handlers::TypeHandlers;

/// One result row, by column name in select order.
pub type Row = IndexMap<String, Value>;

/// A pooled connection to one database.
///
/// Statements may hold several `;`-separated statements. They run in order on a single
/// connection taken from the pool, so connection-scoped state such as the last inserted id
/// is visible to later statements of the same script.
#[async_trait]
pub trait Connection: Send + Sync {
    fn dialect(&self) -> Dialect;

    fn type_handlers(&self) -> &TypeHandlers;

    /// Run a script, returning the total number of rows affected.
    async fn execute(&self, statement: &SQL) -> Result<u64, Error>;

    /// Run a script, returning the first column of the first row of its last statement.
    async fn execute_scalar(&self, statement: &SQL) -> Result<Option<Value>, Error>;

    /// Run a script, returning the rows of its last statement.
    async fn query(&self, statement: &SQL) -> Result<Vec<Row>, Error>;

    async fn execute_ddl(&self, ddl: &DDL) -> Result<u64, Error> {
        self.execute(&ddl.0).await
    }
}
