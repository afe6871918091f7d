//! Execution against an embedded SQLite database.

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments, SqlitePool, SqliteRow};
use sqlx::{Column, Row as _, TypeInfo, ValueRef};
use tracing::{info_span, Instrument};

use query_engine_sql::sql::string::SQL;
use query_engine_sql::sql::{Dialect, Value};

use crate::connection::{Connection, Row};
use crate::error::Error;
use crate::metrics::Metrics;
use crate::placeholders::PositionalStatement;
use crate::query;
use crate::type_handlers::TypeHandlers;

/// A [`Connection`] over a SQLite pool.
#[derive(Debug, Clone)]
pub struct SqliteConnection {
    pool: SqlitePool,
    type_handlers: TypeHandlers,
    metrics: Metrics,
}

impl SqliteConnection {
    pub fn new(pool: SqlitePool, type_handlers: TypeHandlers, metrics: Metrics) -> Self {
        SqliteConnection {
            pool,
            type_handlers,
            metrics,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn dialect(&self) -> Dialect {
        Dialect::Embedded
    }

    fn type_handlers(&self) -> &TypeHandlers {
        &self.type_handlers
    }

    async fn execute(&self, statement: &SQL) -> Result<u64, Error> {
        let statements = query::prepare(statement, &self.type_handlers)?;
        let result = execute_all(&self.pool, &statements)
            .instrument(info_span!("Execute statement"))
            .await;
        self.metrics.update_pool_metrics(&self.pool);
        query::record(&self.metrics, result, |_| 0)
    }

    async fn execute_scalar(&self, statement: &SQL) -> Result<Option<Value>, Error> {
        let statements = query::prepare(statement, &self.type_handlers)?;
        let result = fetch_last(&self.pool, &statements)
            .instrument(info_span!("Execute scalar"))
            .await
            .and_then(|rows| match rows.first() {
                Some(row) if !row.is_empty() => Ok(Some(decode_column(row, 0)?)),
                _ => Ok(None),
            });
        self.metrics.update_pool_metrics(&self.pool);
        query::record(&self.metrics, result, |scalar| usize::from(scalar.is_some()))
    }

    async fn query(&self, statement: &SQL) -> Result<Vec<Row>, Error> {
        let statements = query::prepare(statement, &self.type_handlers)?;
        let result = fetch_last(&self.pool, &statements)
            .instrument(info_span!("Run query"))
            .await
            .and_then(|rows| rows.iter().map(decode_row).collect());
        self.metrics.update_pool_metrics(&self.pool);
        query::record(&self.metrics, result, Vec::len)
    }
}

async fn execute_all(pool: &SqlitePool, statements: &[PositionalStatement]) -> Result<u64, Error> {
    let mut connection = pool.acquire().await?;
    run_all(&mut connection, statements).await
}

/// Run every statement but the last, then fetch the rows of the last one.
async fn fetch_last(
    pool: &SqlitePool,
    statements: &[PositionalStatement],
) -> Result<Vec<SqliteRow>, Error> {
    let Some((last, leading)) = statements.split_last() else {
        return Ok(vec![]);
    };
    let mut connection = pool.acquire().await?;
    run_all(&mut connection, leading).await?;
    Ok(bind_all(last)?.fetch_all(&mut *connection).await?)
}

async fn run_all(
    connection: &mut sqlx::SqliteConnection,
    statements: &[PositionalStatement],
) -> Result<u64, Error> {
    let mut rows_affected = 0;
    for statement in statements {
        rows_affected += bind_all(statement)?
            .execute(&mut *connection)
            .await?
            .rows_affected();
    }
    Ok(rows_affected)
}

fn bind_all(
    statement: &PositionalStatement,
) -> Result<Query<'_, Sqlite, SqliteArguments<'_>>, Error> {
    statement
        .values
        .iter()
        .enumerate()
        .try_fold(sqlx::query(&statement.sql), |query, (position, value)| {
            bind(query, position, value)
        })
}

fn bind<'q>(
    query: Query<'q, Sqlite, SqliteArguments<'q>>,
    position: usize,
    value: &'q Value,
) -> Result<Query<'q, Sqlite, SqliteArguments<'q>>, Error> {
    Ok(match value {
        Value::Null => query.bind(None::<String>),
        Value::Bool(b) => query.bind(*b),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Bytes(bytes) => query.bind(bytes.as_slice()),
        Value::Uuid(uuid) => query.bind(*uuid),
        Value::Date(date) => query.bind(*date),
        Value::DateTime(datetime) => query.bind(*datetime),
        Value::List(_) => {
            return Err(Error::UnbindableParameter {
                name: format!("#{position}"),
                kind: value.kind(),
            })
        }
    })
}

fn decode_row(row: &SqliteRow) -> Result<Row, Error> {
    row.columns()
        .iter()
        .map(|column| {
            Ok((
                column.name().to_string(),
                decode_column(row, column.ordinal())?,
            ))
        })
        .collect()
}

/// Decode by the storage class of the value itself; declared column types are advisory in
/// SQLite.
fn decode_column(row: &SqliteRow, index: usize) -> Result<Value, Error> {
    let storage_class = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };
    Ok(match storage_class.as_str() {
        "INTEGER" | "BOOLEAN" => Value::Int(row.try_get_unchecked(index)?),
        "REAL" | "NUMERIC" => Value::Float(row.try_get_unchecked(index)?),
        "BLOB" => Value::Bytes(row.try_get_unchecked(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    })
}
