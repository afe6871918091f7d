//! Errors for translation.

use query_engine_metadata::metadata::ScalarType;

use super::evaluate::EvaluationError;

/// A type for translation errors.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported expression: {0}")]
    UnsupportedExpression(String),
    #[error("failed to evaluate '{expression}': {source}")]
    Evaluation {
        expression: String,
        #[source]
        source: EvaluationError,
    },
    #[error("parameter '{0}' is already bound")]
    DuplicateParameter(String),
    #[error("'{0}' is not a valid parameter name")]
    InvalidParameterName(String),
    #[error("table '{0}' has no key column")]
    MissingKeyDescriptor(String),
    #[error("an update needs at least one assignment")]
    EmptyAssignments,
    #[error("value {0} cannot be stored in a column of type {1}")]
    TypeMismatch(serde_json::Value, ScalarType),
}
