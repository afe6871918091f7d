//! Errors that can occur when reading or using a configuration.

use std::path::PathBuf;

/// The errors that can be thrown when processing configuration.
#[derive(Debug, thiserror::Error)]
pub enum ParseConfigurationError {
    #[error("parse error on {file_path}:{line}:{column}: {message}")]
    ParseError {
        file_path: PathBuf,
        line: usize,
        column: usize,
        message: String,
    },
    #[error("empty connection URI")]
    EmptyConnectionUri { file_path: PathBuf },
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    // Error for when we don't want to leak the internal error type.
    #[error("I/O error: {0}")]
    IoErrorButStringified(String),
}

/// The errors that can be thrown when writing configuration.
#[derive(Debug, thiserror::Error)]
pub enum WriteParsedConfigurationError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The errors that can be thrown when resolving a parsed configuration at runtime.
#[derive(Debug, thiserror::Error)]
pub enum MakeRuntimeConfigurationError {
    #[error("invalid connection URI: {message}")]
    MissingEnvironmentVariable { file_path: PathBuf, message: String },
    #[error("cannot tell the database kind from the connection URI scheme {scheme:?}; set \"dialect\"")]
    UnknownDialect { scheme: String },
}
