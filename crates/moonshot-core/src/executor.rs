//! Order Execution
//!
//! Sends planned buys to the venue one at a time, in plan order. A failed
//! buy is recorded and the loop moves on; nothing is retried and nothing
//! already filled is rolled back. The next scheduled run is the retry.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::exchange::{MarketBuyOrder, TradingVenue};
use crate::model::{BuyDecision, ExecutionOutcome, RunPlan, RunResult};

/// Sequential executor for buy decisions
pub struct OrderExecutor {
    venue: Arc<dyn TradingVenue>,
}

impl OrderExecutor {
    pub fn new(venue: Arc<dyn TradingVenue>) -> Self {
        Self { venue }
    }

    /// Execute a plan and aggregate the outcomes
    pub async fn execute(&self, plan: RunPlan) -> RunResult {
        let started_at = Utc::now();
        let outcomes = self
            .execute_decisions(&plan.decisions, plan.portfolio.cash_balance)
            .await;
        RunResult::from_outcomes(plan, outcomes, started_at)
    }

    /// Execute decisions against a fixed cash balance
    ///
    /// The balance is the one captured in the snapshot; it is not re-fetched
    /// or drawn down between orders.
    pub async fn execute_decisions(
        &self,
        decisions: &[BuyDecision],
        cash_balance: Decimal,
    ) -> Vec<ExecutionOutcome> {
        let mut outcomes = Vec::with_capacity(decisions.len());

        for decision in decisions {
            let outcome = match self.place(decision, cash_balance).await {
                Ok((size, order_id)) => {
                    tracing::info!(
                        symbol = %decision.symbol,
                        amount = %decision.cash_amount,
                        %size,
                        order_id = %order_id,
                        "Order placed"
                    );
                    ExecutionOutcome::placed(decision.clone(), size, order_id)
                }
                Err(e) => {
                    tracing::error!(
                        symbol = %decision.symbol,
                        amount = %decision.cash_amount,
                        error = %e,
                        "Buy failed"
                    );
                    ExecutionOutcome::failed(decision.clone(), e.to_string())
                }
            };
            outcomes.push(outcome);
        }

        outcomes
    }

    async fn place(&self, decision: &BuyDecision, cash_balance: Decimal) -> Result<(Decimal, String)> {
        if cash_balance < decision.cash_amount {
            return Err(EngineError::Liquidity {
                needed: decision.cash_amount,
                available: cash_balance,
            });
        }

        let size = decision.base_size();
        if size <= Decimal::ZERO {
            return Err(EngineError::OrderRejected(format!(
                "order size for {} rounds to zero",
                decision.product_id
            )));
        }

        tracing::info!(
            product = %decision.product_id,
            amount = %decision.cash_amount,
            %size,
            price = %decision.reference_price,
            venue = self.venue.name(),
            "Placing market buy"
        );

        let order = MarketBuyOrder::new(decision.product_id.clone(), size);
        let ack = self.venue.place_market_buy(&order).await?;

        if !ack.success {
            return Err(EngineError::OrderRejected(
                ack.failure_reason
                    .unwrap_or_else(|| "venue returned no reason".into()),
            ));
        }

        Ok((size, ack.order_id))
    }
}
