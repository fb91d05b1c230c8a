//! Coinbase Exchange Client
//!
//! REST client for the Coinbase Exchange API. Private endpoints are signed
//! with `CB-ACCESS-*` headers: base64(HMAC-SHA256(secret, timestamp + METHOD + path + body)).

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use chrono::Utc;
use hmac::{Hmac, Mac};
use reqwest::{Method, StatusCode};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::{AccountBalance, MarketBuyOrder, OrderAck, TradingVenue};
use crate::config::VenueConfig;
use crate::error::{EngineError, Result};

const PRODUCTION_URL: &str = "https://api.exchange.coinbase.com";
const SANDBOX_URL: &str = "https://api-public.sandbox.exchange.coinbase.com";

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Deserialize)]
struct CoinbaseAccount {
    currency: String,
    balance: Decimal,
    available: Decimal,
}

#[derive(Debug, Deserialize)]
struct CoinbaseTicker {
    price: Decimal,
}

#[derive(Debug, Serialize)]
struct CoinbaseOrderRequest<'a> {
    product_id: &'a str,
    side: &'static str,
    #[serde(rename = "type")]
    order_type: &'static str,
    size: String,
    client_oid: String,
}

#[derive(Debug, Deserialize)]
struct CoinbaseOrder {
    id: String,
    status: String,
    #[serde(default)]
    reject_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CoinbaseErrorBody {
    message: String,
}

/// Coinbase Exchange client
pub struct CoinbaseClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    secret: Vec<u8>,
    passphrase: String,
}

impl CoinbaseClient {
    /// Create from venue configuration
    pub fn new(config: &VenueConfig) -> Result<Self> {
        let secret = BASE64
            .decode(config.api_secret.trim())
            .map_err(|_| EngineError::Config("COINBASE_API_SECRET is not valid base64".into()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("moonshot/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let base_url = if config.sandbox { SANDBOX_URL } else { PRODUCTION_URL };

        Ok(Self {
            http,
            base_url: base_url.to_string(),
            api_key: config.api_key.clone(),
            secret,
            passphrase: config.passphrase.clone(),
        })
    }

    /// Point at a different host (proxies, recorded fixtures)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request signature for `CB-ACCESS-SIGN`
    fn sign(&self, timestamp: &str, method: &Method, path: &str, body: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .unwrap_or_else(|_| unreachable!("HMAC accepts keys of any length"));
        mac.update(timestamp.as_bytes());
        mac.update(method.as_str().as_bytes());
        mac.update(path.as_bytes());
        mac.update(body.as_bytes());
        BASE64.encode(mac.finalize().into_bytes())
    }

    /// Send a request and return status plus raw body
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<String>,
        signed: bool,
    ) -> Result<(StatusCode, String)> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.http.request(method.clone(), &url);

        if signed {
            let timestamp = Utc::now().timestamp().to_string();
            let signature = self.sign(&timestamp, &method, path, body.as_deref().unwrap_or(""));
            request = request
                .header("CB-ACCESS-KEY", &self.api_key)
                .header("CB-ACCESS-SIGN", signature)
                .header("CB-ACCESS-TIMESTAMP", timestamp)
                .header("CB-ACCESS-PASSPHRASE", &self.passphrase);
        }

        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, "application/json")
                .body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!(%method, path, status = status.as_u16(), "Coinbase response");
        Ok((status, text))
    }
}

/// Pull the `message` field out of an error body, falling back to the raw text
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<CoinbaseErrorBody>(body)
        .map_or_else(|_| format!("{status} - {body}"), |e| e.message)
}

/// Map an order response onto an acknowledgement
fn order_ack(status: StatusCode, body: &str) -> Result<OrderAck> {
    if status.is_success() {
        let order: CoinbaseOrder = serde_json::from_str(body)?;
        if order.status == "rejected" {
            return Ok(OrderAck::rejected(
                order.reject_reason.unwrap_or_else(|| "order rejected".into()),
            ));
        }
        return Ok(OrderAck::accepted(order.id));
    }

    if status.is_client_error() {
        return Ok(OrderAck::rejected(error_message(status, body)));
    }

    Err(EngineError::Venue(error_message(status, body)))
}

#[async_trait]
impl TradingVenue for CoinbaseClient {
    async fn list_accounts(&self) -> Result<Vec<AccountBalance>> {
        let (status, body) = self.send(Method::GET, "/accounts", None, true).await?;
        if !status.is_success() {
            return Err(EngineError::DataUnavailable(error_message(status, &body)));
        }

        let accounts: Vec<CoinbaseAccount> = serde_json::from_str(&body)?;
        Ok(accounts
            .into_iter()
            .map(|a| AccountBalance {
                currency: a.currency.to_uppercase(),
                balance: a.balance,
                available: a.available,
            })
            .collect())
    }

    async fn get_price(&self, product_id: &str) -> Result<Decimal> {
        let path = format!("/products/{product_id}/ticker");
        let (status, body) = self.send(Method::GET, &path, None, false).await?;
        if !status.is_success() {
            return Err(EngineError::PriceUnavailable(format!(
                "{product_id}: {}",
                error_message(status, &body)
            )));
        }

        let ticker: CoinbaseTicker = serde_json::from_str(&body)?;
        if ticker.price <= Decimal::ZERO {
            return Err(EngineError::PriceUnavailable(format!(
                "{product_id}: non-positive price {}",
                ticker.price
            )));
        }
        Ok(ticker.price)
    }

    async fn place_market_buy(&self, order: &MarketBuyOrder) -> Result<OrderAck> {
        let request = CoinbaseOrderRequest {
            product_id: &order.product_id,
            side: "buy",
            order_type: "market",
            size: order.base_size.normalize().to_string(),
            client_oid: order.client_order_id.to_string(),
        };
        let body = serde_json::to_string(&request)?;

        let (status, response) = self.send(Method::POST, "/orders", Some(body), true).await?;
        order_ack(status, &response)
    }

    fn name(&self) -> &str {
        "Coinbase"
    }
}
