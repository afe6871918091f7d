//! Errors for execution.

use sqlx::mysql::MySqlDatabaseError;

/// MySQL's `ER_DUP_KEYNAME`.
const MYSQL_DUPLICATE_KEY_NAME: u16 = 1061;

/// Execution errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Database(#[from] sqlx::Error),
    #[error("parameter {name} holds a {kind} value, which cannot be bound")]
    UnbindableParameter { name: String, kind: &'static str },
    #[error("statement refers to parameter @{0}, which has no value")]
    UnknownParameter(String),
}

impl Error {
    /// Whether the store rejected a `CREATE INDEX` because the index already exists.
    pub fn is_duplicate_index(&self) -> bool {
        match self {
            Error::Database(sqlx::Error::Database(error)) => error
                .try_downcast_ref::<MySqlDatabaseError>()
                .is_some_and(|error| error.number() == MYSQL_DUPLICATE_KEY_NAME),
            _ => false,
        }
    }
}
