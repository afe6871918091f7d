//! Options controlling translation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// What to do when a value cannot be computed host-side.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "camelCase")]
pub enum EvaluationFailure {
    /// Surface the failure as a translation error.
    #[default]
    Fail,
    /// Keep going: predicates visit the failing node as a plain node, assignments bind NULL.
    Fallback,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TranslationOptions {
    pub evaluation_failure: EvaluationFailure,
}

impl TranslationOptions {
    pub fn new(evaluation_failure: EvaluationFailure) -> Self {
        TranslationOptions { evaluation_failure }
    }
}
