use crate::domain::config::NormalizationConfig;

/// Failures surfaced by the parsing and comparison core.
///
/// Malformed link records are not errors: the parsers drop them and count them.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CoreError {
    #[error("input unreadable: {input}: {reason}")]
    InputUnreadable { input: String, reason: String },

    #[error("collection {input} was built with a different normalization config (expected {expected:?}, found {found:?})")]
    ConfigMismatch {
        expected: Box<NormalizationConfig>,
        found: Box<NormalizationConfig>,
        input: String,
    },

    #[error("at least {needed} inputs are required, got {got}")]
    NotEnoughInputs { needed: usize, got: usize },

    #[error("collection {input} was built without occurrence tracking")]
    OccurrencesNotTracked { input: String },
}

impl CoreError {
    pub fn unreadable(input: impl Into<String>, reason: impl ToString) -> Self {
        CoreError::InputUnreadable {
            input: input.into(),
            reason: reason.to_string(),
        }
    }
}
