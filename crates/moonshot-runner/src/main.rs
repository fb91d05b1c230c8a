//! moonshot
//!
//! Runs one sentiment-weighted DCA cycle and prints an invocation response.
//! Meant to be fired by an external scheduler (cron, EventBridge, systemd
//! timer); the process never loops on its own.
//!
//! Logs go to stderr, the JSON response to stdout.

mod response;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use moonshot_core::{
    CoinbaseClient, DcaEngine, EngineError, FearGreedClient, MockVenue, SentimentSource,
    Settings, StaticSentiment, TradingVenue,
};

use crate::response::InvocationResponse;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum VenueKind {
    Coinbase,
    Mock,
}

#[derive(Debug, Parser)]
#[command(name = "moonshot", version, about = "Sentiment-weighted DCA buyer")]
struct Args {
    /// TOML settings file; environment variables are used when omitted
    #[arg(long, env = "MOONSHOT_CONFIG")]
    config: Option<PathBuf>,

    /// Plan the buys without placing orders
    #[arg(long)]
    dry_run: bool,

    /// Venue to trade on
    #[arg(long, value_enum, env = "MOONSHOT_VENUE", default_value = "coinbase")]
    venue: VenueKind,

    /// Use this Fear & Greed value instead of fetching it
    #[arg(long, value_parser = clap::value_parser!(i64).range(0..=100))]
    sentiment: Option<i64>,

    /// Quote balance for the mock venue
    #[arg(long, default_value = "1000")]
    mock_balance: Decimal,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    dotenvy::dotenv().ok();

    let args = Args::parse();

    let response = match run(&args).await {
        Ok(response) => response,
        Err(e) => {
            tracing::error!(code = e.code(), error = %e, "Bot execution failed");
            InvocationResponse::from_error(&e)
        }
    };

    if let Err(e) = print_response(&response) {
        tracing::error!(error = %e, "Failed to write response");
        return ExitCode::FAILURE;
    }
    response.exit_code()
}

async fn run(args: &Args) -> Result<InvocationResponse, EngineError> {
    let settings = match &args.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::from_env()?,
    };
    settings.bot.validate()?;

    for target in &settings.bot.targets {
        tracing::info!(symbol = %target.symbol, weight = %target.weight_percent, "Allocation");
    }
    tracing::info!(
        base = %settings.bot.base_investment,
        currency = %settings.bot.quote_currency,
        venue = ?args.venue,
        dry_run = args.dry_run,
        "Configuration loaded"
    );

    let venue: Arc<dyn TradingVenue> = match args.venue {
        VenueKind::Coinbase => {
            settings.venue.validate()?;
            let client = CoinbaseClient::new(&settings.venue)?;
            tracing::info!(url = client.base_url(), "Using Coinbase");
            Arc::new(client)
        }
        VenueKind::Mock => {
            tracing::warn!(balance = %args.mock_balance, "Using mock venue, no real orders are placed");
            Arc::new(MockVenue::new().with_balance(&settings.bot.quote_currency, args.mock_balance))
        }
    };

    let sentiment: Arc<dyn SentimentSource> = match args.sentiment {
        Some(value) => {
            tracing::info!(value, "Using fixed Fear & Greed value");
            Arc::new(StaticSentiment::new(value)?)
        }
        None => Arc::new(FearGreedClient::new(settings.bot.sentiment_url.clone())?),
    };

    let engine = DcaEngine::new(&settings.bot, venue, sentiment)?;

    if args.dry_run {
        let plan = engine.plan_only().await?;
        return Ok(InvocationResponse::from_plan(&plan));
    }

    let result = engine.execute().await?;
    for line in result.summary().lines() {
        tracing::info!("{line}");
    }
    tracing::info!(
        invested = %result.total_invested,
        sold = %result.total_sold,
        "Bot execution completed"
    );

    Ok(InvocationResponse::from_result(&result))
}

fn print_response(response: &InvocationResponse) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(response).context("serializing invocation response")?;
    println!("{json}");
    Ok(())
}
