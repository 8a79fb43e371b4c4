//! Error taxonomy for trading operations.
//!
//! Every failure is surfaced to the caller unchanged; nothing in this crate
//! retries. Callers branch on the variant to decide whether a retry makes
//! sense, and only [`TradeError::Transport`] is plausibly transient.

use thiserror::Error;

/// Result type for trading operations.
pub type TradeResult<T> = Result<T, TradeError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TradeError {
    /// Network, connection or HTTP-level failure.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response did not match the expected schema.
    #[error("Exchange protocol error: {0}")]
    ExchangeProtocol(String),

    /// The exchange explicitly refused the request.
    #[error("Exchange rejected request: {0}")]
    ExchangeRejected(String),

    /// Capability the exchange does not offer at all.
    #[error("Operation not supported: {0}")]
    UnsupportedOperation(String),

    /// Caller input that cannot be mapped to the exchange's types.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Construction-time configuration problem.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl TradeError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, TradeError::Transport(_))
    }
}

impl From<reqwest::Error> for TradeError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            TradeError::ExchangeProtocol(err.to_string())
        } else {
            TradeError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for TradeError {
    fn from(err: serde_json::Error) -> Self {
        TradeError::ExchangeProtocol(err.to_string())
    }
}

impl From<::config::ConfigError> for TradeError {
    fn from(err: ::config::ConfigError) -> Self {
        TradeError::Configuration(err.to_string())
    }
}
