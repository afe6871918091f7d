//! Execution against a MySQL server.

use async_trait::async_trait;
use sqlx::mysql::{MySql, MySqlArguments, MySqlPool, MySqlRow};
use sqlx::query::Query;
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

/// A [`Connection`] over a MySQL pool.
#[derive(Debug, Clone)]
pub struct MySqlConnection {
    pool: MySqlPool,
    type_handlers: TypeHandlers,
    metrics: Metrics,
}

impl MySqlConnection {
    pub fn new(pool: MySqlPool, type_handlers: TypeHandlers, metrics: Metrics) -> Self {
        MySqlConnection {
            pool,
            type_handlers,
            metrics,
        }
    }

    pub fn pool(&self) -> &MySqlPool {
        &self.pool
    }

    pub fn metrics(&self) -> &Metrics {
        &self.metrics
    }
}

#[async_trait]
impl Connection for MySqlConnection {
    fn dialect(&self) -> Dialect {
        Dialect::ClientServer
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

async fn execute_all(pool: &MySqlPool, statements: &[PositionalStatement]) -> Result<u64, Error> {
    let mut connection = pool.acquire().await?;
    run_all(&mut connection, statements).await
}

/// Run every statement but the last, then fetch the rows of the last one.
async fn fetch_last(
    pool: &MySqlPool,
    statements: &[PositionalStatement],
) -> Result<Vec<MySqlRow>, Error> {
    let Some((last, leading)) = statements.split_last() else {
        return Ok(vec![]);
    };
    let mut connection = pool.acquire().await?;
    run_all(&mut connection, leading).await?;
    Ok(bind_all(last)?.fetch_all(&mut *connection).await?)
}

async fn run_all(
    connection: &mut sqlx::MySqlConnection,
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
) -> Result<Query<'_, MySql, MySqlArguments>, Error> {
    statement
        .values
        .iter()
        .enumerate()
        .try_fold(sqlx::query(&statement.sql), |query, (position, value)| {
            bind(query, position, value)
        })
}

fn bind<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    position: usize,
    value: &'q Value,
) -> Result<Query<'q, MySql, MySqlArguments>, Error> {
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

fn decode_row(row: &MySqlRow) -> Result<Row, Error> {
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

/// Decode by the column type the server reports.
fn decode_column(row: &MySqlRow, index: usize) -> Result<Value, Error> {
    let column_type = {
        let raw = row.try_get_raw(index)?;
        if raw.is_null() {
            return Ok(Value::Null);
        }
        raw.type_info().name().to_string()
    };
    Ok(match column_type.as_str() {
        "BOOLEAN" => Value::Bool(row.try_get_unchecked(index)?),
        "TINYINT" | "SMALLINT" | "MEDIUMINT" | "INT" | "BIGINT" | "YEAR" => {
            Value::Int(row.try_get_unchecked(index)?)
        }
        unsigned if unsigned.ends_with(" UNSIGNED") => {
            let value: u64 = row.try_get_unchecked(index)?;
            #[allow(clippy::cast_precision_loss)]
            let approximate = value as f64;
            i64::try_from(value).map_or(Value::Float(approximate), Value::Int)
        }
        "FLOAT" => Value::Float(f64::from(row.try_get_unchecked::<f32, _>(index)?)),
        "DOUBLE" => Value::Float(row.try_get_unchecked(index)?),
        "DECIMAL" => {
            let text: String = row.try_get_unchecked(index)?;
            text.parse().map_or(Value::Text(text), Value::Float)
        }
        "DATE" => Value::Date(row.try_get_unchecked(index)?),
        "DATETIME" | "TIMESTAMP" => Value::DateTime(row.try_get_unchecked(index)?),
        "BINARY" | "VARBINARY" | "BLOB" | "TINYBLOB" | "MEDIUMBLOB" | "LONGBLOB" | "BIT"
        | "GEOMETRY" => Value::Bytes(row.try_get_unchecked(index)?),
        _ => Value::Text(row.try_get_unchecked(index)?),
    })
}
