//! Convert a parsed configuration into the runtime configuration.

use std::path::PathBuf;

use query_engine_sql::sql::Dialect;

use crate::configuration::Configuration;
use crate::environment::Environment;
use crate::error::MakeRuntimeConfigurationError;
use crate::values::{ConnectionUri, Secret};
use crate::version1::{ParsedConfiguration, CONFIGURATION_FILENAME};

/// Resolve secrets and settle the dialect.
pub fn make_runtime_configuration(
    parsed_config: ParsedConfiguration,
    environment: impl Environment,
) -> Result<Configuration, MakeRuntimeConfigurationError> {
    let connection_uri = match parsed_config.connection_uri {
        ConnectionUri(Secret::Plain(uri)) => Ok(uri),
        ConnectionUri(Secret::FromEnvironment { variable }) => {
            environment.read(&variable).map_err(|error| {
                MakeRuntimeConfigurationError::MissingEnvironmentVariable {
                    file_path: PathBuf::from(CONFIGURATION_FILENAME),
                    message: error.to_string(),
                }
            })
        }
    }?;

    let dialect = match parsed_config.dialect {
        Some(dialect) => dialect,
        None => dialect_of_uri(&connection_uri)?,
    };

    Ok(Configuration {
        connection_uri,
        dialect,
        pool_settings: parsed_config.pool_settings,
        evaluation_failure: parsed_config.evaluation_failure,
    })
}

/// The dialect a connection URI scheme implies.
pub fn dialect_of_uri(connection_uri: &str) -> Result<Dialect, MakeRuntimeConfigurationError> {
    let scheme = connection_uri
        .split_once(':')
        .map_or(connection_uri, |(scheme, _)| scheme);
    match scheme.to_ascii_lowercase().as_str() {
        "sqlite" => Ok(Dialect::Embedded),
        "mysql" | "mariadb" => Ok(Dialect::ClientServer),
        _ => Err(MakeRuntimeConfigurationError::UnknownDialect {
            scheme: scheme.to_string(),
        }),
    }
}
