//! Exchange Integration
//!
//! The trading venue holds the only state that outlives a run (balances and
//! order history). The engine talks to it through [`TradingVenue`].

mod coinbase;
mod mock;

pub use coinbase::CoinbaseClient;
pub use mock::MockVenue;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Result;

/// One currency account on the venue
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Currency code (e.g. "BTC", "USDC")
    pub currency: String,

    /// Total balance, holds included
    pub balance: Decimal,

    /// Balance not reserved by open orders
    pub available: Decimal,
}

impl AccountBalance {
    pub fn new(currency: impl Into<String>, balance: Decimal) -> Self {
        Self {
            currency: currency.into().to_uppercase(),
            balance,
            available: balance,
        }
    }
}

/// Market buy for a fixed number of asset units
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketBuyOrder {
    /// Venue product (e.g. "BTC-USDC")
    pub product_id: String,

    /// Units of the base asset
    pub base_size: Decimal,

    /// Idempotency key sent with the order
    pub client_order_id: Uuid,
}

impl MarketBuyOrder {
    pub fn new(product_id: impl Into<String>, base_size: Decimal) -> Self {
        Self {
            product_id: product_id.into(),
            base_size,
            client_order_id: Uuid::new_v4(),
        }
    }
}

/// Venue response to an order submission
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub success: bool,

    /// Venue order id; empty when the order was refused
    pub order_id: String,

    pub failure_reason: Option<String>,
}

impl OrderAck {
    pub fn accepted(order_id: impl Into<String>) -> Self {
        Self {
            success: true,
            order_id: order_id.into(),
            failure_reason: None,
        }
    }

    pub fn rejected(reason: impl Into<String>) -> Self {
        Self {
            success: false,
            order_id: String::new(),
            failure_reason: Some(reason.into()),
        }
    }
}

/// Product id for an asset priced in the quote currency ("BTC" + "USDC" -> "BTC-USDC")
pub fn product_id(symbol: &str, quote: &str) -> String {
    format!("{}-{}", symbol.to_uppercase(), quote.to_uppercase())
}

/// Trading venue client
///
/// Implement this for each venue. Every call is a single blocking round trip
/// bounded by the client's timeout; a timeout is just another `Err`.
#[async_trait]
pub trait TradingVenue: Send + Sync {
    /// List every account with its balance
    async fn list_accounts(&self) -> Result<Vec<AccountBalance>>;

    /// Current reference price for a product
    async fn get_price(&self, product_id: &str) -> Result<Decimal>;

    /// Submit a market buy
    ///
    /// `Ok` with `success == false` means the venue refused the order;
    /// `Err` means the submission itself failed.
    async fn place_market_buy(&self, order: &MarketBuyOrder) -> Result<OrderAck>;

    /// Venue name
    fn name(&self) -> &str;
}
