//! Steps shared by every backend: preparing a script, logging it and recording the outcome.

use query_engine_sql::sql::string::SQL;
use query_engine_sql::sql::Value;

use crate::error::Error;
use crate::metrics::Metrics;
use crate::placeholders::{self, PositionalStatement};
use crate::type_handlers::TypeHandlers;

/// Rewrite a script into positional statements with encoded parameter values.
pub fn prepare(
    statement: &SQL,
    type_handlers: &TypeHandlers,
) -> Result<Vec<PositionalStatement>, Error> {
    tracing::info!(
        generated_sql = %statement.sql,
        params = ?&statement.params,
        dialect = %statement.dialect,
    );
    if tracing::enabled!(tracing::Level::DEBUG) {
        tracing::debug!(formatted_sql = %pretty_print(&statement.sql));
    }

    let mut statements = placeholders::prepare_script(&statement.sql, &statement.params)?;
    for positional in &mut statements {
        for value in &mut positional.values {
            *value = type_handlers.encode(std::mem::replace(value, Value::Null));
        }
    }
    Ok(statements)
}

/// Format a statement for reading in logs.
pub fn pretty_print(sql: &str) -> String {
    sqlformat::format(
        sql,
        &sqlformat::QueryParams::None,
        sqlformat::FormatOptions::default(),
    )
}

/// Count the outcome of a script.
pub fn record<T>(
    metrics: &Metrics,
    result: Result<T, Error>,
    rows: impl FnOnce(&T) -> usize,
) -> Result<T, Error> {
    match &result {
        Ok(value) => metrics.record_success(rows(value)),
        Err(error) => {
            metrics.record_failure();
            tracing::warn!(error = %error, "statement failed");
        }
    }
    result
}
