//! Fear & Greed Index Client
//!
//! Reads the alternative.me index. The response carries a `data` list whose
//! first entry holds the value as a string-encoded integer.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use super::SentimentSource;
use crate::error::{EngineError, Result};
use crate::model::SentimentReading;

const FNG_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Deserialize)]
struct FearGreedResponse {
    #[serde(default)]
    data: Vec<FearGreedEntry>,
}

#[derive(Debug, Deserialize)]
struct FearGreedEntry {
    value: String,
    value_classification: String,
}

/// Parse an index response body into a reading
pub fn parse_fear_greed(body: &str) -> Result<SentimentReading> {
    let response: FearGreedResponse = serde_json::from_str(body)
        .map_err(|e| EngineError::SentimentUnavailable(format!("malformed response: {e}")))?;

    let entry = response
        .data
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::SentimentUnavailable("no FNG data available".into()))?;

    let value: i64 = entry.value.trim().parse().map_err(|_| {
        EngineError::SentimentUnavailable(format!("failed to parse FNG value '{}'", entry.value))
    })?;

    SentimentReading::new(value, entry.value_classification)
}

/// HTTP client for the Fear & Greed index
pub struct FearGreedClient {
    http: reqwest::Client,
    url: String,
}

impl FearGreedClient {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(FNG_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SentimentSource for FearGreedClient {
    async fn fetch(&self) -> Result<SentimentReading> {
        let response = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| EngineError::SentimentUnavailable(format!("failed to fetch FNG index: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EngineError::SentimentUnavailable(format!("failed to read response body: {e}")))?;

        if !status.is_success() {
            return Err(EngineError::SentimentUnavailable(format!(
                "FNG API returned {status}"
            )));
        }

        parse_fear_greed(&body)
    }

    fn name(&self) -> &str {
        "alternative.me"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_response() {
        let reading = parse_fear_greed(
            r#"{
                "name": "Fear and Greed Index",
                "data": [
                    {"value": "27", "value_classification": "Fear", "timestamp": "1700000000"},
                    {"value": "31", "value_classification": "Fear", "timestamp": "1699913600"}
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(reading.value, 27);
        assert_eq!(reading.classification, "Fear");
    }

    #[test]
    fn test_empty_data_is_an_error() {
        let err = parse_fear_greed(r#"{"name":"Fear and Greed Index","data":[]}"#).unwrap_err();
        assert!(matches!(err, EngineError::SentimentUnavailable(_)));

        assert!(parse_fear_greed(r#"{"name":"Fear and Greed Index"}"#).is_err());
    }

    #[test]
    fn test_bad_values() {
        let not_a_number = r#"{"data":[{"value":"high","value_classification":"Greed"}]}"#;
        assert!(matches!(
            parse_fear_greed(not_a_number),
            Err(EngineError::SentimentUnavailable(_))
        ));

        let out_of_range = r#"{"data":[{"value":"140","value_classification":"Greed"}]}"#;
        assert!(matches!(
            parse_fear_greed(out_of_range),
            Err(EngineError::SentimentOutOfRange(140))
        ));

        assert!(parse_fear_greed("<html>").is_err());
    }

    #[test]
    fn test_client_keeps_url() {
        let client = FearGreedClient::new("https://api.alternative.me/fng/").unwrap();
        assert_eq!(client.url(), "https://api.alternative.me/fng/");
        assert_eq!(client.name(), "alternative.me");
    }
}
