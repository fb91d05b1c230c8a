//! Sentiment Sources
//!
//! A run needs exactly one reading. Missing or malformed data is an error,
//! never a default.

mod fear_greed;

pub use fear_greed::{FearGreedClient, parse_fear_greed};

use async_trait::async_trait;

use crate::error::Result;
use crate::model::SentimentReading;

/// Source of the market sentiment index
#[async_trait]
pub trait SentimentSource: Send + Sync {
    /// Fetch the current reading
    async fn fetch(&self) -> Result<SentimentReading>;

    /// Source name
    fn name(&self) -> &str;
}

/// Fixed reading, for tests and manual overrides
#[derive(Clone, Debug)]
pub struct StaticSentiment {
    value: u8,
    classification: String,
}

impl StaticSentiment {
    /// Fixed reading; fails if `value` is outside [0, 100]
    pub fn new(value: i64) -> Result<Self> {
        let reading = SentimentReading::new(value, classify(value))?;
        Ok(Self {
            value: reading.value,
            classification: reading.classification,
        })
    }
}

#[async_trait]
impl SentimentSource for StaticSentiment {
    async fn fetch(&self) -> Result<SentimentReading> {
        SentimentReading::new(i64::from(self.value), self.classification.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Label used by alternative.me for an index value
pub fn classify(value: i64) -> &'static str {
    match value {
        ..=24 => "Extreme Fear",
        25..=44 => "Fear",
        45..=55 => "Neutral",
        56..=75 => "Greed",
        _ => "Extreme Greed",
    }
}
