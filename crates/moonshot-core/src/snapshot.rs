//! Portfolio Snapshot
//!
//! Values the account at the start of a run: the stable cash balance plus
//! every other nonzero balance priced against it.

use std::collections::BTreeMap;
use std::sync::Arc;

use rust_decimal::Decimal;

use crate::error::{EngineError, Result};
use crate::exchange::{TradingVenue, product_id};
use crate::model::{AssetHolding, Portfolio};

/// Builds a fresh [`Portfolio`] from venue balances and prices
pub struct PortfolioSnapshotBuilder {
    venue: Arc<dyn TradingVenue>,
    cash_currency: String,
}

impl PortfolioSnapshotBuilder {
    pub fn new(venue: Arc<dyn TradingVenue>, cash_currency: impl Into<String>) -> Self {
        Self {
            venue,
            cash_currency: cash_currency.into().to_uppercase(),
        }
    }

    /// Take the snapshot
    ///
    /// Fails only if the account listing fails. An asset whose price cannot
    /// be fetched is left out of the snapshot.
    pub async fn snapshot(&self) -> Result<Portfolio> {
        let accounts = self.venue.list_accounts().await.map_err(|e| match e {
            EngineError::DataUnavailable(msg) => EngineError::DataUnavailable(msg),
            other => EngineError::DataUnavailable(format!("failed to list accounts: {other}")),
        })?;

        // Venues can report several accounts per currency
        let mut balances: BTreeMap<String, Decimal> = BTreeMap::new();
        for account in accounts {
            if account.balance > Decimal::ZERO {
                *balances.entry(account.currency.to_uppercase()).or_default() += account.balance;
            }
        }

        let cash_balance = balances.remove(&self.cash_currency).unwrap_or_default();

        let mut holdings = Vec::with_capacity(balances.len());
        for (symbol, balance) in balances {
            let product = product_id(&symbol, &self.cash_currency);
            match self.venue.get_price(&product).await {
                Ok(price) => holdings.push(AssetHolding::new(symbol, balance, price)),
                Err(e) => {
                    tracing::warn!(product = %product, error = %e, "Leaving unpriced asset out of snapshot");
                }
            }
        }

        let portfolio = Portfolio::new(self.cash_currency.clone(), cash_balance, holdings);

        tracing::info!(
            cash = %portfolio.cash_balance,
            currency = %portfolio.cash_currency,
            assets = portfolio.assets.len(),
            total_value = %portfolio.total_value,
            "Portfolio snapshot"
        );
        for (symbol, percent) in portfolio.allocations() {
            tracing::debug!(%symbol, percent = %percent.round_dp(2), "Allocation");
        }

        Ok(portfolio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchange::MockVenue;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_snapshot_values_holdings() {
        let venue = MockVenue::new()
            .with_price("BTC", dec!(50000))
            .with_price("ETH", dec!(2000))
            .with_balance("USDC", dec!(1000))
            .with_balance("BTC", dec!(0.01))
            .with_balance("ETH", dec!(0.5))
            .with_balance("SOL", Decimal::ZERO);

        let portfolio = PortfolioSnapshotBuilder::new(Arc::new(venue), "USDC")
            .snapshot()
            .await
            .unwrap();

        assert_eq!(portfolio.cash_balance, dec!(1000));
        assert_eq!(portfolio.assets.len(), 2);
        assert_eq!(portfolio.holding("BTC").unwrap().value, dec!(500));
        assert_eq!(portfolio.holding("ETH").unwrap().value, dec!(1000));
        assert!(portfolio.holding("SOL").is_none());
        assert_eq!(portfolio.total_value, dec!(2500));
    }

    #[tokio::test]
    async fn test_unpriced_asset_is_omitted() {
        let venue = MockVenue::new()
            .without_price("ETH")
            .with_price("BTC", dec!(50000))
            .with_balance("USDC", dec!(10))
            .with_balance("BTC", dec!(0.001))
            .with_balance("ETH", dec!(2))
            .with_balance("DOGE", dec!(1000));

        let portfolio = PortfolioSnapshotBuilder::new(Arc::new(venue), "USDC")
            .snapshot()
            .await
            .unwrap();

        assert_eq!(portfolio.assets.keys().collect::<Vec<_>>(), vec!["BTC"]);
        assert_eq!(portfolio.total_value, dec!(60));
    }

    #[tokio::test]
    async fn test_split_accounts_are_summed() {
        let venue = MockVenue::new()
            .with_balance("USDC", dec!(300))
            .with_balance("usdc", dec!(200));

        let portfolio = PortfolioSnapshotBuilder::new(Arc::new(venue), "usdc")
            .snapshot()
            .await
            .unwrap();

        assert_eq!(portfolio.cash_balance, dec!(500));
        assert!(portfolio.assets.is_empty());
    }

    #[tokio::test]
    async fn test_no_cash_account() {
        let venue = MockVenue::new().with_balance("BTC", dec!(1));

        let portfolio = PortfolioSnapshotBuilder::new(Arc::new(venue), "USDC")
            .snapshot()
            .await
            .unwrap();

        assert_eq!(portfolio.cash_balance, Decimal::ZERO);
        assert_eq!(portfolio.total_value, dec!(97500));
    }

    #[tokio::test]
    async fn test_account_listing_failure_is_fatal() {
        let venue = MockVenue::new().accounts_unavailable();

        let err = PortfolioSnapshotBuilder::new(Arc::new(venue), "USDC")
            .snapshot()
            .await
            .unwrap_err();

        assert!(matches!(err, EngineError::DataUnavailable(_)));
        assert!(err.is_fatal());
    }
}
