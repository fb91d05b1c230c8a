//! # moonshot-core
//!
//! Sentiment-weighted dollar-cost averaging. Once per scheduled trigger the
//! engine reads the Crypto Fear & Greed Index, sizes the buy from it, splits
//! the amount across configured target weights and places market buys.
//!
//! ## Sizing
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  Base $100, cash $1000, weights BTC 80 / ETH 20              │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Index 10  Extreme Fear   1.80x  buffer  0%   → $180         │
//! │  Index 30  Fear           1.43x  buffer 7.5%  → $142.50      │
//! │  Index 50  Neutral        1.00x  buffer 17.5% → $100         │
//! │  Index 70  Greed          0.78x  buffer 20%   → $77.50       │
//! │  Index 90  Extreme Greed  0.58x  buffer 20%   → $58          │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cash buffer only ever caps the spend: `min(base * multiplier,
//! cash * (1 - buffer))`. Fear spends more and keeps less in reserve.

pub mod config;
pub mod engine;
pub mod error;
pub mod exchange;
pub mod executor;
pub mod model;
pub mod sentiment;
pub mod snapshot;
pub mod strategy;

pub use config::{BotConfig, Settings, VenueConfig};
pub use engine::DcaEngine;
pub use error::{EngineError, Result};
pub use exchange::{CoinbaseClient, MockVenue, TradingVenue};
pub use executor::OrderExecutor;
pub use model::{
    AllocationTarget, AssetHolding, BuyDecision, ExecutionOutcome, OrderStatus, Portfolio,
    RunPlan, RunResult, SentimentReading,
};
pub use sentiment::{FearGreedClient, SentimentSource, StaticSentiment};
pub use snapshot::PortfolioSnapshotBuilder;
pub use strategy::{AllocationPlanner, buffer_fraction, multiplier};
