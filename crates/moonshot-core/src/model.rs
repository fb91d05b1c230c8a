//! Domain Models
//!
//! Everything here is built fresh for a single invocation and dropped at the
//! end of it. Uses `rust_decimal` for all monetary values - never use f64 for money!

use std::collections::BTreeMap;
use std::fmt::Write as _;

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EngineError, Result};

/// Decimal places used when converting a quote amount into asset units
pub const BASE_SIZE_DP: u32 = 8;

/// One Fear & Greed observation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentReading {
    /// Index value, 0 = extreme fear, 100 = extreme greed
    pub value: u8,

    /// Source label (e.g. "Extreme Fear")
    pub classification: String,

    /// When the reading was taken
    pub observed_at: DateTime<Utc>,
}

impl SentimentReading {
    /// Build a reading, rejecting values outside [0, 100]
    pub fn new(value: i64, classification: impl Into<String>) -> Result<Self> {
        let value = u8::try_from(value)
            .ok()
            .filter(|v| *v <= 100)
            .ok_or(EngineError::SentimentOutOfRange(value))?;

        Ok(Self {
            value,
            classification: classification.into(),
            observed_at: Utc::now(),
        })
    }
}

/// A held asset valued at the current reference price
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetHolding {
    /// Ticker symbol (e.g., "BTC", "ETH")
    pub symbol: String,

    /// Units held
    pub balance: Decimal,

    /// Reference price in the quote currency
    pub price: Decimal,

    /// balance * price
    pub value: Decimal,
}

impl AssetHolding {
    pub fn new(symbol: impl Into<String>, balance: Decimal, price: Decimal) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            balance,
            price,
            value: balance * price,
        }
    }
}

/// Snapshot of the account at the start of a run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Portfolio {
    /// Stable asset used to pay for purchases (e.g. "USDC")
    pub cash_currency: String,

    /// Available cash
    pub cash_balance: Decimal,

    /// Valued holdings, keyed by symbol
    pub assets: BTreeMap<String, AssetHolding>,

    /// cash + sum of holding values
    pub total_value: Decimal,

    /// Snapshot time
    pub as_of: DateTime<Utc>,
}

impl Portfolio {
    pub fn new(
        cash_currency: impl Into<String>,
        cash_balance: Decimal,
        holdings: impl IntoIterator<Item = AssetHolding>,
    ) -> Self {
        let assets: BTreeMap<String, AssetHolding> = holdings
            .into_iter()
            .map(|h| (h.symbol.clone(), h))
            .collect();
        let positions_value: Decimal = assets.values().map(|h| h.value).sum();

        Self {
            cash_currency: cash_currency.into().to_uppercase(),
            cash_balance,
            total_value: cash_balance + positions_value,
            assets,
            as_of: Utc::now(),
        }
    }

    /// Portfolio holding nothing but cash
    pub fn cash_only(cash_currency: impl Into<String>, cash_balance: Decimal) -> Self {
        Self::new(cash_currency, cash_balance, [])
    }

    pub fn holding(&self, symbol: &str) -> Option<&AssetHolding> {
        self.assets.get(&symbol.to_uppercase())
    }

    /// Get allocation percentages, cash included under its currency symbol
    pub fn allocations(&self) -> BTreeMap<String, Decimal> {
        if self.total_value == Decimal::ZERO {
            return BTreeMap::new();
        }

        let mut allocs: BTreeMap<String, Decimal> = self
            .assets
            .iter()
            .map(|(symbol, h)| (symbol.clone(), (h.value / self.total_value) * dec!(100)))
            .collect();

        if self.cash_balance > Decimal::ZERO {
            allocs.insert(
                self.cash_currency.clone(),
                (self.cash_balance / self.total_value) * dec!(100),
            );
        }

        allocs
    }
}

/// Configured target weight for one asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationTarget {
    pub symbol: String,

    /// Share of each buy cycle, 0-100
    pub weight_percent: Decimal,
}

impl AllocationTarget {
    pub fn new(symbol: impl Into<String>, weight_percent: Decimal) -> Self {
        Self {
            symbol: symbol.into().to_uppercase(),
            weight_percent,
        }
    }
}

/// One planned purchase
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuyDecision {
    /// Asset to buy
    pub symbol: String,

    /// Venue product (e.g. "BTC-USDC")
    pub product_id: String,

    /// Quote currency to spend
    pub cash_amount: Decimal,

    /// Price the size is computed from
    pub reference_price: Decimal,

    pub rationale: String,

    pub decided_at: DateTime<Utc>,
}

impl BuyDecision {
    /// Order size in asset units, truncated to [`BASE_SIZE_DP`] places
    pub fn base_size(&self) -> Decimal {
        if self.reference_price <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        (self.cash_amount / self.reference_price)
            .round_dp_with_strategy(BASE_SIZE_DP, RoundingStrategy::ToZero)
    }
}

/// How an order attempt ended
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OrderStatus {
    Placed { venue_order_id: String },
    Failed { reason: String },
}

/// Result of attempting one [`BuyDecision`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    pub decision: BuyDecision,

    /// Units submitted; zero when the attempt failed
    pub filled_size: Decimal,

    #[serde(flatten)]
    pub status: OrderStatus,
}

impl ExecutionOutcome {
    pub fn placed(decision: BuyDecision, filled_size: Decimal, venue_order_id: impl Into<String>) -> Self {
        Self {
            decision,
            filled_size,
            status: OrderStatus::Placed {
                venue_order_id: venue_order_id.into(),
            },
        }
    }

    pub fn failed(decision: BuyDecision, reason: impl Into<String>) -> Self {
        Self {
            decision,
            filled_size: Decimal::ZERO,
            status: OrderStatus::Failed {
                reason: reason.into(),
            },
        }
    }

    pub fn succeeded(&self) -> bool {
        matches!(self.status, OrderStatus::Placed { .. })
    }

    pub fn venue_order_id(&self) -> Option<&str> {
        match &self.status {
            OrderStatus::Placed { venue_order_id } => Some(venue_order_id),
            OrderStatus::Failed { .. } => None,
        }
    }

    pub fn failure_reason(&self) -> Option<&str> {
        match &self.status {
            OrderStatus::Failed { reason } => Some(reason),
            OrderStatus::Placed { .. } => None,
        }
    }
}

/// Everything decided before any order is sent
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunPlan {
    pub sentiment: SentimentReading,

    pub multiplier: Decimal,

    /// Fraction of cash withheld this cycle
    pub buffer: Decimal,

    /// min(base * multiplier, cash * (1 - buffer)), floored at zero
    pub investable: Decimal,

    pub decisions: Vec<BuyDecision>,

    pub portfolio: Portfolio,
}

/// Aggregate of one invocation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: Uuid,

    /// False iff at least one outcome failed
    pub overall_success: bool,

    /// In decision order
    pub outcomes: Vec<ExecutionOutcome>,

    /// Sum of cash amounts over placed orders only
    pub total_invested: Decimal,

    /// Always zero, nothing is ever sold
    pub total_sold: Decimal,

    pub multiplier: Decimal,

    pub buffer: Decimal,

    pub sentiment: SentimentReading,

    pub portfolio_before: Portfolio,

    pub started_at: DateTime<Utc>,

    pub finished_at: DateTime<Utc>,
}

impl RunResult {
    /// Aggregate outcomes into a result
    pub fn from_outcomes(
        plan: RunPlan,
        outcomes: Vec<ExecutionOutcome>,
        started_at: DateTime<Utc>,
    ) -> Self {
        let total_invested = outcomes
            .iter()
            .filter(|o| o.succeeded())
            .map(|o| o.decision.cash_amount)
            .sum();

        Self {
            run_id: Uuid::new_v4(),
            overall_success: outcomes.iter().all(ExecutionOutcome::succeeded),
            outcomes,
            total_invested,
            total_sold: Decimal::ZERO,
            multiplier: plan.multiplier,
            buffer: plan.buffer,
            sentiment: plan.sentiment,
            portfolio_before: plan.portfolio,
            started_at,
            finished_at: Utc::now(),
        }
    }

    pub fn succeeded_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.succeeded()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.succeeded_count()
    }

    /// Generate summary
    pub fn summary(&self) -> String {
        let cash = &self.portfolio_before.cash_currency;
        let mut s = String::new();
        let _ = writeln!(
            s,
            "F&G {} ({}), multiplier {}, buffer {:.1}%",
            self.sentiment.value,
            self.sentiment.classification,
            self.multiplier.normalize(),
            self.buffer * dec!(100)
        );

        for outcome in &self.outcomes {
            let d = &outcome.decision;
            match &outcome.status {
                OrderStatus::Placed { venue_order_id } => {
                    let _ = writeln!(
                        s,
                        "  ✓ {:<6} {:>10.2} {} ({} units) order {}",
                        d.symbol, d.cash_amount, cash, outcome.filled_size, venue_order_id
                    );
                }
                OrderStatus::Failed { reason } => {
                    let _ = writeln!(
                        s,
                        "  ✗ {:<6} {:>10.2} {} failed: {}",
                        d.symbol, d.cash_amount, cash, reason
                    );
                }
            }
        }

        let _ = write!(
            s,
            "Placed {}/{} orders, total invested {:.2} {}",
            self.succeeded_count(),
            self.outcomes.len(),
            self.total_invested,
            cash
        );
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decision(symbol: &str, amount: Decimal, price: Decimal) -> BuyDecision {
        BuyDecision {
            symbol: symbol.into(),
            product_id: format!("{symbol}-USDC"),
            cash_amount: amount,
            reference_price: price,
            rationale: "test".into(),
            decided_at: Utc::now(),
        }
    }

    fn plan() -> RunPlan {
        RunPlan {
            sentiment: SentimentReading::new(30, "Fear").unwrap(),
            multiplier: dec!(1.425),
            buffer: dec!(0.075),
            investable: dec!(100),
            decisions: Vec::new(),
            portfolio: Portfolio::cash_only("USDC", dec!(1000)),
        }
    }

    #[test]
    fn test_sentiment_range() {
        assert_eq!(SentimentReading::new(0, "Extreme Fear").unwrap().value, 0);
        assert_eq!(SentimentReading::new(100, "Extreme Greed").unwrap().value, 100);
        assert!(matches!(
            SentimentReading::new(101, "?"),
            Err(EngineError::SentimentOutOfRange(101))
        ));
        assert!(matches!(
            SentimentReading::new(-1, "?"),
            Err(EngineError::SentimentOutOfRange(-1))
        ));
    }

    #[test]
    fn test_portfolio_total_value() {
        let portfolio = Portfolio::new(
            "usdc",
            dec!(500),
            [
                AssetHolding::new("btc", dec!(0.01), dec!(50000)),
                AssetHolding::new("ETH", dec!(0.5), dec!(3000)),
            ],
        );

        assert_eq!(portfolio.cash_currency, "USDC");
        assert_eq!(portfolio.holding("btc").unwrap().value, dec!(500));
        assert_eq!(portfolio.total_value, dec!(2500));
    }

    #[test]
    fn test_portfolio_allocations() {
        let portfolio = Portfolio::new(
            "USDC",
            dec!(1000),
            [AssetHolding::new("BTC", dec!(0.02), dec!(50000))],
        );

        let allocs = portfolio.allocations();
        assert_eq!(allocs["BTC"], dec!(50));
        assert_eq!(allocs["USDC"], dec!(50));

        assert!(Portfolio::cash_only("USDC", Decimal::ZERO).allocations().is_empty());
    }

    #[test]
    fn test_base_size_truncates() {
        let d = decision("BTC", dec!(80), dec!(97500));
        assert_eq!(d.base_size(), dec!(0.00082051));

        let zero_price = decision("BTC", dec!(80), Decimal::ZERO);
        assert_eq!(zero_price.base_size(), Decimal::ZERO);
    }

    #[test]
    fn test_outcome_accessors() {
        let ok = ExecutionOutcome::placed(decision("BTC", dec!(80), dec!(40000)), dec!(0.002), "abc");
        assert!(ok.succeeded());
        assert_eq!(ok.venue_order_id(), Some("abc"));
        assert_eq!(ok.failure_reason(), None);

        let bad = ExecutionOutcome::failed(decision("ETH", dec!(20), dec!(2000)), "rejected");
        assert!(!bad.succeeded());
        assert_eq!(bad.venue_order_id(), None);
        assert_eq!(bad.failure_reason(), Some("rejected"));
        assert_eq!(bad.filled_size, Decimal::ZERO);
    }

    #[test]
    fn test_run_result_aggregation() {
        let outcomes = vec![
            ExecutionOutcome::placed(decision("BTC", dec!(80), dec!(40000)), dec!(0.002), "abc"),
            ExecutionOutcome::failed(decision("ETH", dec!(20), dec!(2000)), "rejected"),
        ];

        let result = RunResult::from_outcomes(plan(), outcomes, Utc::now());
        assert!(!result.overall_success);
        assert_eq!(result.total_invested, dec!(80));
        assert_eq!(result.total_sold, Decimal::ZERO);
        assert_eq!(result.succeeded_count(), 1);
        assert_eq!(result.failed_count(), 1);
        assert!(result.summary().contains("Placed 1/2 orders"));
    }

    #[test]
    fn test_empty_run_is_success() {
        let result = RunResult::from_outcomes(plan(), Vec::new(), Utc::now());
        assert!(result.overall_success);
        assert_eq!(result.total_invested, Decimal::ZERO);
    }

    #[test]
    fn test_outcome_serializes_flat_status() {
        let ok = ExecutionOutcome::placed(decision("BTC", dec!(80), dec!(40000)), dec!(0.002), "abc");
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "placed");
        assert_eq!(json["venue_order_id"], "abc");
        assert!(json.get("reason").is_none());
    }
}
