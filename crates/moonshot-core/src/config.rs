//! Configuration
//!
//! Loaded once per process from a TOML file or the environment, validated,
//! then handed to the engine. Nothing here is re-read during a run.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::model::AllocationTarget;

pub const DEFAULT_FNG_URL: &str = "https://api.alternative.me/fng/";
pub const DEFAULT_QUOTE_CURRENCY: &str = "USDC";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Strategy configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    /// Target weights, in execution order
    pub targets: Vec<AllocationTarget>,

    /// Spend per cycle before the sentiment multiplier
    #[serde(default = "default_base_investment")]
    pub base_investment: Decimal,

    /// Stable asset purchases are paid with
    #[serde(default = "default_quote_currency")]
    pub quote_currency: String,

    /// Fear & Greed endpoint
    #[serde(default = "default_sentiment_url")]
    pub sentiment_url: String,

    /// Advisory; validated but not applied to the multiplier
    #[serde(default = "default_buy_threshold")]
    pub buy_threshold: i32,

    /// Advisory; validated but not applied to the multiplier
    #[serde(default = "default_min_multiplier")]
    pub min_multiplier: Decimal,

    /// Advisory; validated but not applied to the multiplier
    #[serde(default = "default_max_multiplier")]
    pub max_multiplier: Decimal,

    /// Informational, the schedule lives outside the process
    #[serde(default = "default_frequency")]
    pub investment_frequency: String,

    /// Informational, the schedule lives outside the process
    #[serde(default = "default_execution_time")]
    pub execution_time: String,
}

fn default_base_investment() -> Decimal { dec!(100) }
fn default_quote_currency() -> String { DEFAULT_QUOTE_CURRENCY.into() }
fn default_sentiment_url() -> String { DEFAULT_FNG_URL.into() }
fn default_buy_threshold() -> i32 { 25 }
fn default_min_multiplier() -> Decimal { dec!(0.5) }
fn default_max_multiplier() -> Decimal { dec!(2.0) }
fn default_frequency() -> String { "weekly".into() }
fn default_execution_time() -> String { "09:00".into() }

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            targets: vec![
                AllocationTarget::new("BTC", dec!(80)),
                AllocationTarget::new("ETH", dec!(20)),
            ],
            base_investment: default_base_investment(),
            quote_currency: default_quote_currency(),
            sentiment_url: default_sentiment_url(),
            buy_threshold: default_buy_threshold(),
            min_multiplier: default_min_multiplier(),
            max_multiplier: default_max_multiplier(),
            investment_frequency: default_frequency(),
            execution_time: default_execution_time(),
        }
    }
}

impl BotConfig {
    /// Build from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable numbers fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let targets = match lookup("ALLOCATIONS") {
            Some(spec) => parse_allocations(&spec)?,
            None => vec![
                AllocationTarget::new("BTC", decimal_or(&lookup, "BTC_ALLOCATION", dec!(80))),
                AllocationTarget::new("ETH", decimal_or(&lookup, "ETH_ALLOCATION", dec!(20))),
            ],
        };

        Ok(Self {
            targets,
            base_investment: decimal_or(&lookup, "WEEKLY_BASE_INVESTMENT", defaults.base_investment),
            quote_currency: lookup("QUOTE_CURRENCY")
                .map_or(defaults.quote_currency, |q| q.to_uppercase()),
            sentiment_url: lookup("FNG_API_URL").unwrap_or(defaults.sentiment_url),
            buy_threshold: lookup("FNG_BUY_THRESHOLD")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.buy_threshold),
            min_multiplier: decimal_or(&lookup, "MIN_MULTIPLIER", defaults.min_multiplier),
            max_multiplier: decimal_or(&lookup, "MAX_MULTIPLIER", defaults.max_multiplier),
            investment_frequency: lookup("INVESTMENT_FREQUENCY")
                .unwrap_or(defaults.investment_frequency),
            execution_time: lookup("EXECUTION_TIME").unwrap_or(defaults.execution_time),
        })
    }

    /// Reject configurations the engine must never see
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(EngineError::Config("at least one allocation target is required".into()));
        }

        let mut seen = HashSet::new();
        for target in &self.targets {
            if target.symbol.is_empty() {
                return Err(EngineError::Config("allocation symbol must not be empty".into()));
            }
            if !seen.insert(target.symbol.as_str()) {
                return Err(EngineError::Config(format!(
                    "duplicate allocation for {}",
                    target.symbol
                )));
            }
            if target.weight_percent < Decimal::ZERO || target.weight_percent > dec!(100) {
                return Err(EngineError::Config(format!(
                    "allocation for {} must be between 0 and 100, got {}",
                    target.symbol, target.weight_percent
                )));
            }
        }

        let total: Decimal = self.targets.iter().map(|t| t.weight_percent).sum();
        if total != dec!(100) {
            return Err(EngineError::Config(format!(
                "allocations must sum to 100, got {total}"
            )));
        }

        if self.base_investment <= Decimal::ZERO {
            return Err(EngineError::Config("weekly base investment must be positive".into()));
        }

        if !(0..=100).contains(&self.buy_threshold) {
            return Err(EngineError::Config("FNG buy threshold must be between 0 and 100".into()));
        }

        if self.min_multiplier <= Decimal::ZERO {
            return Err(EngineError::Config("minimum multiplier must be positive".into()));
        }
        if self.max_multiplier <= Decimal::ZERO {
            return Err(EngineError::Config("maximum multiplier must be positive".into()));
        }
        if self.min_multiplier > self.max_multiplier {
            return Err(EngineError::Config(
                "minimum multiplier cannot be greater than maximum multiplier".into(),
            ));
        }

        if self.quote_currency.is_empty() {
            return Err(EngineError::Config("quote currency must not be empty".into()));
        }

        Ok(())
    }
}

/// Venue credentials and transport settings
#[derive(Clone, Serialize, Deserialize)]
pub struct VenueConfig {
    #[serde(default)]
    pub api_key: String,

    /// Base64-encoded signing secret
    #[serde(default)]
    pub api_secret: String,

    #[serde(default)]
    pub passphrase: String,

    #[serde(default)]
    pub sandbox: bool,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_timeout() -> u64 { DEFAULT_HTTP_TIMEOUT_SECS }

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_secret: String::new(),
            passphrase: String::new(),
            sandbox: false,
            timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
        }
    }
}

impl fmt::Debug for VenueConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("passphrase", &"<redacted>")
            .field("sandbox", &self.sandbox)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl VenueConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            api_key: lookup("COINBASE_API_KEY").unwrap_or_default(),
            api_secret: lookup("COINBASE_API_SECRET").unwrap_or_default(),
            passphrase: lookup("COINBASE_PASSPHRASE").unwrap_or_default(),
            sandbox: lookup("COINBASE_SANDBOX")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(false),
            timeout_secs: lookup("HTTP_TIMEOUT_SECS")
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() || self.api_secret.is_empty() || self.passphrase.is_empty() {
            return Err(EngineError::Config("Coinbase API credentials are required".into()));
        }
        if self.timeout_secs == 0 {
            return Err(EngineError::Config("HTTP timeout must be positive".into()));
        }
        Ok(())
    }
}

/// Everything the runner loads at startup
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bot: BotConfig,

    #[serde(default)]
    pub venue: VenueConfig,
}

impl Settings {
    /// Environment only
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            bot: BotConfig::from_env()?,
            venue: VenueConfig::from_env(),
        })
    }

    /// TOML file; venue credentials missing from the file come from the environment
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            EngineError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let mut settings = Self::from_toml(&raw)?;

        if settings.venue.api_key.is_empty() {
            settings.venue = VenueConfig {
                sandbox: settings.venue.sandbox,
                timeout_secs: settings.venue.timeout_secs,
                ..VenueConfig::from_env()
            };
        }
        Ok(settings)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(raw)
            .map_err(|e| EngineError::Config(format!("invalid config file: {e}")))?;

        settings.bot.quote_currency = settings.bot.quote_currency.to_uppercase();
        for target in &mut settings.bot.targets {
            target.symbol = target.symbol.to_uppercase();
        }
        Ok(settings)
    }
}

/// Parse `SYM:weight,SYM:weight`
pub fn parse_allocations(spec: &str) -> Result<Vec<AllocationTarget>> {
    spec.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (symbol, weight) = entry.split_once(':').ok_or_else(|| {
                EngineError::Config(format!("allocation '{entry}' must look like SYMBOL:WEIGHT"))
            })?;
            let weight: Decimal = weight.trim().parse().map_err(|_| {
                EngineError::Config(format!("allocation weight '{}' is not a number", weight.trim()))
            })?;
            Ok(AllocationTarget::new(symbol.trim(), weight))
        })
        .collect()
}

fn decimal_or<F>(lookup: &F, key: &str, default: Decimal) -> Decimal
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
