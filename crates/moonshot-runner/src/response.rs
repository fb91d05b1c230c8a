//! Invocation Response
//!
//! The JSON document printed to stdout once per run, for the scheduler.

use std::process::ExitCode;

use chrono::{DateTime, Utc};
use serde::Serialize;

use moonshot_core::{EngineError, RunPlan, RunResult};

/// Outcome of one scheduled invocation
#[derive(Debug, Serialize)]
pub struct InvocationResponse {
    pub success: bool,
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,

    /// Stable error code, fatal failures only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    pub timestamp: DateTime<Utc>,
}

impl InvocationResponse {
    pub fn from_result(result: &RunResult) -> Self {
        let message = if result.overall_success {
            "DCA execution completed successfully".to_string()
        } else {
            format!(
                "DCA execution completed with {} failed order(s)",
                result.failed_count()
            )
        };

        Self {
            success: result.overall_success,
            message,
            data: serde_json::to_value(result).ok(),
            error: None,
            code: None,
            timestamp: Utc::now(),
        }
    }

    /// Dry run: the plan is reported, nothing was ordered
    pub fn from_plan(plan: &RunPlan) -> Self {
        Self {
            success: true,
            message: format!("Dry run planned {} buy(s)", plan.decisions.len()),
            data: serde_json::to_value(plan).ok(),
            error: None,
            code: None,
            timestamp: Utc::now(),
        }
    }

    pub fn from_error(err: &EngineError) -> Self {
        Self {
            success: false,
            message: "Bot execution failed".into(),
            data: None,
            error: Some(err.to_string()),
            code: Some(err.code().into()),
            timestamp: Utc::now(),
        }
    }

    /// 0 success, 2 partial failure, 1 fatal
    pub fn exit_code(&self) -> ExitCode {
        match (self.success, &self.error) {
            (true, _) => ExitCode::SUCCESS,
            (false, None) => ExitCode::from(2),
            (false, Some(_)) => ExitCode::FAILURE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use moonshot_core::{BuyDecision, ExecutionOutcome, Portfolio, SentimentReading};
    use rust_decimal_macros::dec;

    fn plan() -> RunPlan {
        RunPlan {
            sentiment: SentimentReading::new(50, "Neutral").unwrap(),
            multiplier: dec!(1.0),
            buffer: dec!(0.175),
            investable: dec!(100),
            decisions: vec![BuyDecision {
                symbol: "BTC".into(),
                product_id: "BTC-USDC".into(),
                cash_amount: dec!(80),
                reference_price: dec!(40000),
                rationale: "DCA with F&G multiplier 1 (Index: 50)".into(),
                decided_at: Utc::now(),
            }],
            portfolio: Portfolio::cash_only("USDC", dec!(1000)),
        }
    }

    #[test]
    fn test_successful_run() {
        let plan = plan();
        let outcome = ExecutionOutcome::placed(plan.decisions[0].clone(), dec!(0.002), "abc");
        let result = RunResult::from_outcomes(plan, vec![outcome], Utc::now());

        let response = InvocationResponse::from_result(&result);
        assert!(response.success);
        assert_eq!(response.exit_code(), ExitCode::SUCCESS);

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["success"], true);
        assert!(json["data"]["run_id"].is_string());
        assert!(json.get("error").is_none());
        assert!(json.get("code").is_none());
    }

    #[test]
    fn test_partial_failure_exit_code() {
        let plan = plan();
        let outcome = ExecutionOutcome::failed(plan.decisions[0].clone(), "Order rejected: INSUFFICIENT_FUND");
        let result = RunResult::from_outcomes(plan, vec![outcome], Utc::now());

        let response = InvocationResponse::from_result(&result);
        assert!(!response.success);
        assert!(response.error.is_none());
        assert_eq!(response.exit_code(), ExitCode::from(2));
        assert!(response.message.contains("1 failed"));
    }

    #[test]
    fn test_fatal_error() {
        let err = EngineError::SentimentUnavailable("timed out".into());
        let response = InvocationResponse::from_error(&err);

        assert!(!response.success);
        assert_eq!(response.code.as_deref(), Some("SENTIMENT_UNAVAILABLE"));
        assert_eq!(response.exit_code(), ExitCode::FAILURE);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("data").is_none());
        assert!(json["error"].as_str().unwrap().contains("timed out"));
    }

    #[test]
    fn test_dry_run_plan() {
        let response = InvocationResponse::from_plan(&plan());

        assert!(response.success);
        assert_eq!(response.message, "Dry run planned 1 buy(s)");
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["data"]["decisions"][0]["symbol"], "BTC");
    }
}
