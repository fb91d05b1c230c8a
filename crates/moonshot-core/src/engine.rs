//! DCA Engine
//!
//! One invocation: snapshot the account, read sentiment, plan, buy.
//!
//! ```text
//! ┌──────────┐   ┌───────────┐   ┌─────────┐   ┌──────────┐
//! │ Snapshot │──▶│ Sentiment │──▶│ Planner │──▶│ Executor │──▶ RunResult
//! └──────────┘   └───────────┘   └─────────┘   └──────────┘
//!   fatal          fatal           degrades      per-order
//! ```
//!
//! The engine is built once per process with its venue and sentiment
//! source passed in, then `execute()` is called once per scheduled trigger.

use std::sync::Arc;

use chrono::Utc;

use crate::config::BotConfig;
use crate::error::Result;
use crate::exchange::TradingVenue;
use crate::executor::OrderExecutor;
use crate::model::{RunPlan, RunResult};
use crate::sentiment::SentimentSource;
use crate::snapshot::PortfolioSnapshotBuilder;
use crate::strategy::AllocationPlanner;

pub struct DcaEngine {
    venue: Arc<dyn TradingVenue>,
    sentiment: Arc<dyn SentimentSource>,
    planner: AllocationPlanner,
    snapshots: PortfolioSnapshotBuilder,
    executor: OrderExecutor,
}

impl DcaEngine {
    /// Build an engine; the configuration is validated here
    pub fn new(
        config: &BotConfig,
        venue: Arc<dyn TradingVenue>,
        sentiment: Arc<dyn SentimentSource>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            planner: AllocationPlanner::from_config(config),
            snapshots: PortfolioSnapshotBuilder::new(venue.clone(), config.quote_currency.clone()),
            executor: OrderExecutor::new(venue.clone()),
            venue,
            sentiment,
        })
    }

    pub fn planner(&self) -> &AllocationPlanner {
        &self.planner
    }

    /// Everything up to, but not including, order placement
    pub async fn plan_only(&self) -> Result<RunPlan> {
        let portfolio = self.snapshots.snapshot().await?;

        let sentiment = self.sentiment.fetch().await?;
        tracing::info!(
            value = sentiment.value,
            classification = %sentiment.classification,
            source = self.sentiment.name(),
            "Fear & Greed index"
        );

        let plan = self
            .planner
            .plan_run(portfolio, sentiment, self.venue.as_ref())
            .await?;

        for decision in &plan.decisions {
            tracing::info!(
                symbol = %decision.symbol,
                amount = %decision.cash_amount,
                price = %decision.reference_price,
                rationale = %decision.rationale,
                "Buy decision"
            );
        }
        Ok(plan)
    }

    /// Run once and aggregate the outcome
    ///
    /// `Err` means nothing was ordered. Order-level failures come back inside
    /// an `Ok` result with `overall_success == false`.
    pub async fn execute(&self) -> Result<RunResult> {
        let started_at = Utc::now();
        tracing::info!(venue = self.venue.name(), "Starting DCA run");

        let plan = self.plan_only().await?;
        let outcomes = self
            .executor
            .execute_decisions(&plan.decisions, plan.portfolio.cash_balance)
            .await;
        let result = RunResult::from_outcomes(plan, outcomes, started_at);

        if result.failed_count() > 0 {
            tracing::warn!(
                run_id = %result.run_id,
                placed = result.succeeded_count(),
                failed = result.failed_count(),
                invested = %result.total_invested,
                "DCA run finished with failures"
            );
        } else {
            tracing::info!(
                run_id = %result.run_id,
                placed = result.succeeded_count(),
                invested = %result.total_invested,
                "DCA run finished"
            );
        }

        Ok(result)
    }
}
