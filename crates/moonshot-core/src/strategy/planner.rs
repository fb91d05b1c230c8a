//! Allocation Planner
//!
//! Turns the cash balance and today's sentiment into an ordered list of buys.
//!
//! ```text
//!  raw        = base_investment * multiplier(index)
//!  cap        = cash * (1 - buffer(index))
//!  investable = min(raw, cap)
//!  per asset  = investable * weight / 100      (configuration order)
//! ```
//!
//! Weights are never renormalized: an asset skipped for lack of a price
//! simply leaves its share uninvested this cycle.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{buffer_fraction, multiplier};
use crate::config::BotConfig;
use crate::error::Result;
use crate::exchange::{TradingVenue, product_id};
use crate::model::{AllocationTarget, BuyDecision, Portfolio, RunPlan, SentimentReading};

/// How much of the cash balance this cycle may spend
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sizing {
    pub multiplier: Decimal,
    pub buffer: Decimal,

    /// base_investment * multiplier
    pub raw_amount: Decimal,

    /// cash * (1 - buffer)
    pub cap: Decimal,

    /// min(raw_amount, cap), never negative
    pub investable: Decimal,
}

/// Planner for sentiment-weighted buys
#[derive(Clone, Debug)]
pub struct AllocationPlanner {
    targets: Vec<AllocationTarget>,
    base_investment: Decimal,
    quote_currency: String,
}

impl AllocationPlanner {
    pub fn new(
        targets: Vec<AllocationTarget>,
        base_investment: Decimal,
        quote_currency: impl Into<String>,
    ) -> Self {
        Self {
            targets,
            base_investment,
            quote_currency: quote_currency.into().to_uppercase(),
        }
    }

    /// Create from a validated configuration
    pub fn from_config(config: &BotConfig) -> Self {
        Self::new(
            config.targets.clone(),
            config.base_investment,
            config.quote_currency.clone(),
        )
    }

    pub fn targets(&self) -> &[AllocationTarget] {
        &self.targets
    }

    /// Size this cycle's spend
    pub fn sizing(&self, cash_balance: Decimal, sentiment_value: u8) -> Result<Sizing> {
        let multiplier = multiplier(sentiment_value)?;
        let buffer = buffer_fraction(sentiment_value)?;

        let raw_amount = self.base_investment * multiplier;
        let cap = cash_balance * (Decimal::ONE - buffer);
        let investable = raw_amount.min(cap).max(Decimal::ZERO);

        Ok(Sizing {
            multiplier,
            buffer,
            raw_amount,
            cap,
            investable,
        })
    }

    /// Plan the buys for one run
    ///
    /// Returns an empty list, not an error, when there is nothing to spend.
    pub async fn plan(
        &self,
        portfolio: &Portfolio,
        sentiment: &SentimentReading,
        venue: &dyn TradingVenue,
    ) -> Result<Vec<BuyDecision>> {
        let sizing = self.sizing(portfolio.cash_balance, sentiment.value)?;
        Ok(self.decide(&sizing, sentiment, venue).await)
    }

    /// Plan the buys and keep everything that went into them
    pub async fn plan_run(
        &self,
        portfolio: Portfolio,
        sentiment: SentimentReading,
        venue: &dyn TradingVenue,
    ) -> Result<RunPlan> {
        let sizing = self.sizing(portfolio.cash_balance, sentiment.value)?;
        let decisions = self.decide(&sizing, &sentiment, venue).await;

        Ok(RunPlan {
            sentiment,
            multiplier: sizing.multiplier,
            buffer: sizing.buffer,
            investable: sizing.investable,
            decisions,
            portfolio,
        })
    }

    async fn decide(
        &self,
        sizing: &Sizing,
        sentiment: &SentimentReading,
        venue: &dyn TradingVenue,
    ) -> Vec<BuyDecision> {
        tracing::info!(
            multiplier = %sizing.multiplier.normalize(),
            buffer_pct = %(sizing.buffer * dec!(100)).normalize(),
            raw = %sizing.raw_amount,
            cap = %sizing.cap,
            investable = %sizing.investable,
            "Sized buy cycle"
        );

        if sizing.investable <= Decimal::ZERO {
            tracing::info!(currency = %self.quote_currency, "No cash available for investment");
            return Vec::new();
        }

        let rationale = format!(
            "DCA with F&G multiplier {} (Index: {})",
            sizing.multiplier.normalize(),
            sentiment.value
        );

        let mut decisions = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let amount = sizing.investable * target.weight_percent / dec!(100);
            if amount <= Decimal::ZERO {
                continue;
            }

            let product = product_id(&target.symbol, &self.quote_currency);
            let price = match venue.get_price(&product).await {
                Ok(price) if price > Decimal::ZERO => price,
                Ok(price) => {
                    tracing::warn!(product = %product, %price, "Skipping asset with non-positive price");
                    continue;
                }
                Err(e) => {
                    tracing::warn!(product = %product, error = %e, "Skipping asset, price unavailable");
                    continue;
                }
            };

            tracing::debug!(symbol = %target.symbol, %amount, %price, "Planned buy");
            decisions.push(BuyDecision {
                symbol: target.symbol.clone(),
                product_id: product,
                cash_amount: amount,
                reference_price: price,
                rationale: rationale.clone(),
                decided_at: Utc::now(),
            });
        }

        decisions
    }
}
