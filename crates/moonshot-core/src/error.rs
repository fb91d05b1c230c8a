//! Error Types for the DCA Engine

use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Sentiment value {0} outside [0, 100]")]
    SentimentOutOfRange(i64),

    #[error("Sentiment unavailable: {0}")]
    SentimentUnavailable(String),

    #[error("Account data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Price unavailable for {0}")]
    PriceUnavailable(String),

    #[error("Insufficient funds: need {needed}, have {available}")]
    Liquidity {
        needed: Decimal,
        available: Decimal,
    },

    #[error("Order rejected: {0}")]
    OrderRejected(String),

    #[error("Venue error: {0}")]
    Venue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Whether this error aborts the whole run before any order is placed.
    ///
    /// Price gaps degrade the plan and order-level failures are recorded in
    /// the run result, so neither is fatal.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            EngineError::PriceUnavailable(_)
                | EngineError::Liquidity { .. }
                | EngineError::OrderRejected(_)
        )
    }

    /// Stable machine-readable code for invocation responses
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::SentimentOutOfRange(_) => "SENTIMENT_OUT_OF_RANGE",
            EngineError::SentimentUnavailable(_) => "SENTIMENT_UNAVAILABLE",
            EngineError::DataUnavailable(_) => "DATA_UNAVAILABLE",
            EngineError::PriceUnavailable(_) => "PRICE_UNAVAILABLE",
            EngineError::Liquidity { .. } => "INSUFFICIENT_FUNDS",
            EngineError::OrderRejected(_) => "ORDER_REJECTED",
            EngineError::Venue(_) => "VENUE_ERROR",
            EngineError::Config(_) => "CONFIG_ERROR",
            EngineError::Network(_) => "NETWORK_ERROR",
            EngineError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_fatal_classification() {
        assert!(EngineError::DataUnavailable("accounts".into()).is_fatal());
        assert!(EngineError::SentimentUnavailable("empty".into()).is_fatal());
        assert!(EngineError::Config("weights".into()).is_fatal());

        assert!(!EngineError::PriceUnavailable("BTC-USDC".into()).is_fatal());
        assert!(!EngineError::OrderRejected("post only".into()).is_fatal());
        assert!(
            !EngineError::Liquidity {
                needed: dec!(10),
                available: dec!(5)
            }
            .is_fatal()
        );
    }

    #[test]
    fn test_liquidity_message() {
        let err = EngineError::Liquidity {
            needed: dec!(80),
            available: dec!(12.5),
        };
        assert_eq!(err.to_string(), "Insufficient funds: need 80, have 12.5");
        assert_eq!(err.code(), "INSUFFICIENT_FUNDS");
    }
}
