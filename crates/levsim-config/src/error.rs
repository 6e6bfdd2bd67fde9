use thiserror::Error;

/// Configuration rejected at construction. Not recoverable.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("unknown strategy_type: {0:?} (expected DUAL_MA | A | DONCHIAN_CHANNEL | B)")]
    UnknownStrategy(String),

    #[error("unknown action_mode: {0:?} (expected discrete | discrete-3 | continuous | continuous-1)")]
    UnknownActionMode(String),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

impl ConfigError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field,
            reason: reason.into(),
        }
    }
}
