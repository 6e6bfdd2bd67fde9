use levsim_config::ConfigError;
use levsim_shaping::MissingField;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum BrokerError {
    #[error("configuration rejected: {0}")]
    Config(#[from] ConfigError),

    /// The row lacks the price, the mark or a regime field the strategy reads.
    #[error("market row is missing field {field:?}")]
    MissingField { field: String },

    #[error("broker used before reset")]
    NotReset,
}

impl From<MissingField> for BrokerError {
    fn from(e: MissingField) -> Self {
        BrokerError::MissingField { field: e.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EnvError {
    #[error(transparent)]
    Broker(#[from] BrokerError),

    #[error("an episode needs at least 2 rows, got {got}")]
    NotEnoughRows { got: usize },

    /// Stepped after the episode terminated.
    #[error("episode already terminated at step {step}")]
    DataExhausted { step: usize },

    #[error("environment stepped before reset")]
    NotReset,
}
