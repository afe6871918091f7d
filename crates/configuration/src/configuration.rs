//! Configuration for the data-access layer.

use query_engine_sql::sql::Dialect;
use query_engine_translation::translation::options::{EvaluationFailure, TranslationOptions};

use crate::values::PoolSettings;

/// The 'Configuration' type collects all the information necessary to open a database at
/// runtime.
///
/// Values of this type are produced from a 'ParsedConfiguration' using
/// 'make_runtime_configuration', which resolves secrets from the environment and settles the
/// dialect.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub connection_uri: String,
    pub dialect: Dialect,
    pub pool_settings: PoolSettings,
    pub evaluation_failure: EvaluationFailure,
}

impl Configuration {
    pub fn translation_options(&self) -> TranslationOptions {
        TranslationOptions::new(self.evaluation_failure)
    }
}
