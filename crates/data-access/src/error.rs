//! Errors for data access.

use query_engine_sql::sql::Value;
use query_engine_translation::translation::error::Error as TranslationError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Translation(TranslationError),
    #[error("{0}")]
    Execution(#[from] query_engine_execution::Error),
    #[error("no row of {0} matches the predicate")]
    NoMatchingRow(String),
    #[error("the entity mapped to {0} has no key column")]
    MissingKeyDescriptor(String),
    #[error("unable to map entity: {0}")]
    Mapping(#[from] serde_json::Error),
    #[error("an entity of {0} did not serialize to an object")]
    NotAnObject(String),
    #[error("expected a number from the database, got {0:?}")]
    UnexpectedScalar(Value),
}

impl From<TranslationError> for Error {
    fn from(error: TranslationError) -> Self {
        match error {
            TranslationError::MissingKeyDescriptor(table) => Error::MissingKeyDescriptor(table),
            error => Error::Translation(error),
        }
    }
}
