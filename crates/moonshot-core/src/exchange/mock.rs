//! Mock Venue
//!
//! In-memory venue for tests and paper trading. Returns realistic static
//! prices and records every order it is sent.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;

use super::{AccountBalance, MarketBuyOrder, OrderAck, TradingVenue};
use crate::error::{EngineError, Result};

/// Mock venue with static prices and scripted failures
pub struct MockVenue {
    accounts: Vec<AccountBalance>,
    prices: HashMap<String, Decimal>,
    missing_prices: HashSet<String>,
    rejected_orders: HashSet<String>,
    failing_orders: HashSet<String>,
    accounts_down: bool,
    orders: Mutex<Vec<MarketBuyOrder>>,
}

impl Default for MockVenue {
    fn default() -> Self {
        Self::new()
    }
}

impl MockVenue {
    /// Empty account, default price table
    pub fn new() -> Self {
        let prices = [
            ("BTC", dec!(97500)),
            ("ETH", dec!(3450)),
            ("SOL", dec!(195)),
            ("ADA", dec!(0.95)),
            ("DOT", dec!(7.20)),
            ("LINK", dec!(24.50)),
            ("AVAX", dec!(42.00)),
            ("LTC", dec!(105)),
        ]
        .into_iter()
        .map(|(s, p)| (s.to_string(), p))
        .collect();

        Self {
            accounts: Vec::new(),
            prices,
            missing_prices: HashSet::new(),
            rejected_orders: HashSet::new(),
            failing_orders: HashSet::new(),
            accounts_down: false,
            orders: Mutex::new(Vec::new()),
        }
    }

    /// Add an account balance
    pub fn with_balance(mut self, currency: &str, balance: Decimal) -> Self {
        self.accounts.push(AccountBalance::new(currency, balance));
        self
    }

    /// Override a price
    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_uppercase(), price);
        self
    }

    /// Price lookups for `symbol` fail
    pub fn without_price(mut self, symbol: &str) -> Self {
        self.missing_prices.insert(symbol.to_uppercase());
        self
    }

    /// Orders for `symbol` come back with `success == false`
    pub fn rejecting_orders(mut self, symbol: &str) -> Self {
        self.rejected_orders.insert(symbol.to_uppercase());
        self
    }

    /// Orders for `symbol` fail in transit
    pub fn failing_orders(mut self, symbol: &str) -> Self {
        self.failing_orders.insert(symbol.to_uppercase());
        self
    }

    /// Account listing fails
    pub fn accounts_unavailable(mut self) -> Self {
        self.accounts_down = true;
        self
    }

    /// Orders accepted so far, in submission order
    pub async fn placed_orders(&self) -> Vec<MarketBuyOrder> {
        self.orders.lock().await.clone()
    }

    fn base_symbol(product_id: &str) -> String {
        product_id
            .split('-')
            .next()
            .unwrap_or(product_id)
            .to_uppercase()
    }
}

#[async_trait]
impl TradingVenue for MockVenue {
    async fn list_accounts(&self) -> Result<Vec<AccountBalance>> {
        if self.accounts_down {
            return Err(EngineError::Venue("accounts endpoint unavailable".into()));
        }
        Ok(self.accounts.clone())
    }

    async fn get_price(&self, product_id: &str) -> Result<Decimal> {
        let symbol = Self::base_symbol(product_id);
        if self.missing_prices.contains(&symbol) {
            return Err(EngineError::PriceUnavailable(product_id.to_string()));
        }
        self.prices
            .get(&symbol)
            .copied()
            .ok_or_else(|| EngineError::PriceUnavailable(product_id.to_string()))
    }

    async fn place_market_buy(&self, order: &MarketBuyOrder) -> Result<OrderAck> {
        let symbol = Self::base_symbol(&order.product_id);

        if self.failing_orders.contains(&symbol) {
            return Err(EngineError::Venue(format!(
                "connection reset placing {}",
                order.product_id
            )));
        }
        if self.rejected_orders.contains(&symbol) {
            return Ok(OrderAck::rejected("INSUFFICIENT_FUND"));
        }

        let mut orders = self.orders.lock().await;
        orders.push(order.clone());
        Ok(OrderAck::accepted(format!("mock-{}", orders.len())))
    }

    fn name(&self) -> &str {
        "MockVenue"
    }
}
