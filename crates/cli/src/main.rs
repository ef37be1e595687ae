use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde_json::Value;
use stocklens_core::analysis::AnalysisGateway;
use stocklens_core::config::Settings;
use stocklens_core::domain::company::{ChartTimeRange, Stock};
use stocklens_core::llm::gemini::GeminiClient;
use stocklens_core::llm::offline::OfflineClient;
use stocklens_core::llm::GenerationClient;
use stocklens_core::market::catalog::Catalog;
use stocklens_core::market::provider::{MarketDataProvider, MockMarketData};
use stocklens_core::session::DetailsLoader;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "stocklens_cli")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Stock series enriched with tagged news and narratives.
    Details {
        #[arg(long)]
        symbol: String,
        /// 1M, 3M, 6M, 1Y, 5Y or MAX.
        #[arg(long, default_value = "1Y")]
        range: ChartTimeRange,
    },
    /// Comparable companies from the built-in catalog.
    Similar {
        #[arg(long)]
        symbol: String,
    },
    Recommend {
        #[arg(long)]
        symbol: String,
        /// Free-form market conditions, e.g. "bullish".
        #[arg(long)]
        market: Option<String>,
    },
    Risk {
        #[arg(long)]
        symbol: String,
    },
    /// Narrative trend analysis for a sector.
    Sector {
        #[arg(long)]
        sector: String,
        #[arg(long)]
        timeframe: Option<String>,
    },
    EventImpact {
        #[arg(long)]
        event_id: String,
        #[arg(long)]
        symbol: String,
    },
    /// Lists the market events available for impact analysis.
    Events,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    let client: Arc<dyn GenerationClient> = match GeminiClient::from_settings(&settings) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            tracing::warn!(error = %e, "generation endpoint unavailable; analyses will use fallbacks");
            Arc::new(OfflineClient)
        }
    };
    let gateway = AnalysisGateway::new(client);
    tracing::debug!(provider = ?gateway.provider(), "analysis gateway ready");
    let catalog = Catalog::builtin();
    let provider = Arc::new(MockMarketData::new(catalog.clone()));

    let out = run(args.command, &catalog, provider, gateway).await;
    match out {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            Ok(())
        }
        Err(err) => {
            sentry_anyhow::capture_anyhow(&err);
            tracing::error!(error = %format!("{err:#}"), "command failed");
            Err(err)
        }
    }
}

async fn run(
    command: Command,
    catalog: &Catalog,
    provider: Arc<MockMarketData>,
    gateway: AnalysisGateway,
) -> anyhow::Result<Value> {
    let value = match command {
        Command::Details { symbol, range } => {
            let details = DetailsLoader::new(provider, gateway)
                .load(&symbol, range)
                .await?;
            serde_json::to_value(details)?
        }
        Command::Similar { symbol } => {
            let company = catalog
                .find(&symbol)
                .with_context(|| format!("unknown symbol: {symbol}"))?;
            let similar = gateway
                .suggest_similar_stocks(company, catalog)
                .await;
            serde_json::to_value(similar)?
        }
        Command::Recommend { symbol, market } => {
            let stock = fetch_stock(provider.as_ref(), &symbol).await?;
            serde_json::to_value(gateway.recommend(&stock, market.as_deref()).await)?
        }
        Command::Risk { symbol } => {
            let stock = fetch_stock(provider.as_ref(), &symbol).await?;
            serde_json::to_value(gateway.assess_risk(&stock).await)?
        }
        Command::Sector { sector, timeframe } => {
            let analysis = gateway.sector_trends(&sector, timeframe.as_deref()).await;
            serde_json::json!({ "sector": sector, "analysis": analysis })
        }
        Command::EventImpact { event_id, symbol } => {
            let event = provider
                .fetch_market_events()
                .await?
                .into_iter()
                .find(|e| e.id == event_id)
                .with_context(|| format!("unknown event: {event_id}"))?;
            serde_json::to_value(gateway.analyze_event_impact(&event, &symbol).await)?
        }
        Command::Events => serde_json::to_value(provider.fetch_market_events().await?)?,
    };
    Ok(value)
}

async fn fetch_stock(provider: &dyn MarketDataProvider, symbol: &str) -> anyhow::Result<Stock> {
    provider
        .fetch_stock_data(symbol, ChartTimeRange::default())
        .await?
        .with_context(|| format!("Stock data not found for {symbol}"))
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
