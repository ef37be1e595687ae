use crate::domain::company::{ChartTimeRange, Company, Stock, StockDataPoint};
use crate::domain::news::{MarketEvent, NewsArticle, ProductInnovation};
use crate::market::catalog::Catalog;
use anyhow::Result;
use chrono::{Duration, NaiveDate, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

const DEFAULT_BASE_PRICE: f64 = 50.0;
const VOLUME_RANGE: std::ops::Range<u64> = 500_000..1_500_000;

#[async_trait::async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// `None` when the symbol is unknown.
    async fn fetch_stock_data(&self, symbol: &str, range: ChartTimeRange)
        -> Result<Option<Stock>>;

    async fn fetch_news_for_stock(&self, symbol: &str) -> Result<Vec<NewsArticle>>;

    async fn fetch_product_innovations(&self, symbol: &str) -> Result<Vec<ProductInnovation>>;

    async fn fetch_market_events(&self) -> Result<Vec<MarketEvent>>;

    async fn search_stocks(&self, query: &str) -> Result<Vec<Company>>;
}

/// Synthesizes price series, news, innovations and events for catalog symbols.
#[derive(Debug)]
pub struct MockMarketData {
    catalog: Catalog,
    rng: Mutex<StdRng>,
}

impl MockMarketData {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible series for tests.
    pub fn with_seed(catalog: Catalog, seed: u64) -> Self {
        Self {
            catalog,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn company_name(&self, symbol: &str) -> String {
        self.catalog
            .find(symbol)
            .map(|c| c.name.clone())
            .unwrap_or_else(|| symbol.to_string())
    }

    fn random_walk(&self, days: u32, base_price: f64, today: NaiveDate) -> Vec<StockDataPoint> {
        // A poisoned lock only means another caller panicked mid-walk; the RNG is still usable.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let floor = base_price / 5.0;
        let start = today - Duration::days(i64::from(days));

        let mut price = base_price;
        let mut out = Vec::with_capacity(days as usize);
        for i in 0..days {
            price += (rng.gen::<f64>() - 0.49) * (base_price / 50.0);
            price = price.max(floor);
            out.push(StockDataPoint {
                date: start + Duration::days(i64::from(i)),
                price: round_cents(price),
                volume: rng.gen_range(VOLUME_RANGE),
            });
        }
        out
    }
}

pub fn base_price(symbol: &str) -> f64 {
    match symbol {
        "TSLA" => 180.0,
        "GOOGL" => 170.0,
        "MSFT" => 430.0,
        "AAPL" => 170.0,
        "AMZN" => 180.0,
        _ => DEFAULT_BASE_PRICE,
    }
}

fn round_cents(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

#[async_trait::async_trait]
impl MarketDataProvider for MockMarketData {
    async fn fetch_stock_data(
        &self,
        symbol: &str,
        range: ChartTimeRange,
    ) -> Result<Option<Stock>> {
        let Some(company) = self.catalog.find(symbol).cloned() else {
            return Ok(None);
        };

        let base = base_price(&company.symbol);
        let historical_data = self.random_walk(range.days(), base, Utc::now().date_naive());

        let current_price = historical_data.last().map(|p| p.price).unwrap_or(base);
        let prev_price = historical_data
            .len()
            .checked_sub(2)
            .map(|i| historical_data[i].price)
            .unwrap_or(current_price);
        let price_change_percent = round_cents((current_price - prev_price) / prev_price * 100.0);

        Ok(Some(Stock {
            company,
            historical_data,
            current_price,
            price_change_percent: Some(price_change_percent),
        }))
    }

    async fn fetch_news_for_stock(&self, symbol: &str) -> Result<Vec<NewsArticle>> {
        let name = self.company_name(symbol);
        let article = |n: u32, title: String, source: &str, date: NaiveDate, summary: String| {
            NewsArticle {
                id: format!("{symbol}_news_{n}"),
                title,
                source: source.to_string(),
                date,
                summary,
                url: "#".to_string(),
                sentiment: None,
                sentiment_reasoning: None,
            }
        };

        Ok(vec![
            article(
                1,
                format!("{name} Announces Q3 Earnings Beat"),
                "Financial Times",
                ymd(2024, 7, 15),
                "Positive results driven by strong cloud performance and AI initiatives. Stock expected to react favorably.".to_string(),
            ),
            article(
                2,
                format!("New Product Launch from {name} Receives Mixed Reviews"),
                "TechCrunch",
                ymd(2024, 7, 10),
                "Innovative features but concerns about pricing and market fit. Analysts are divided on its long-term impact.".to_string(),
            ),
            article(
                3,
                format!("Regulatory Scrutiny Intensifies for {name} in Europe"),
                "Reuters",
                ymd(2024, 7, 5),
                "Potential fines and operational changes could impact future profitability. Investors are wary.".to_string(),
            ),
            article(
                4,
                format!("{name} partners with Acme Corp for strategic AI development"),
                "Bloomberg",
                ymd(2024, 6, 28),
                format!("This partnership aims to accelerate AI research and product integration, potentially boosting {name}'s competitive edge."),
            ),
            article(
                5,
                format!("Market Analysts Upgrade {name} Stock to 'Buy'"),
                "Wall Street Journal",
                ymd(2024, 6, 20),
                "Upgraded based on strong growth prospects and innovation pipeline. Price target increased by 15%.".to_string(),
            ),
        ])
    }

    async fn fetch_product_innovations(&self, symbol: &str) -> Result<Vec<ProductInnovation>> {
        let name = self.company_name(symbol);
        let innovation = |n: u32, date: NaiveDate, title: String, description: &str, score: u8| {
            ProductInnovation {
                id: format!("{symbol}_innov_{n}"),
                date,
                title,
                description: description.to_string(),
                impact_score: Some(score),
            }
        };

        Ok(vec![
            innovation(
                1,
                ymd(2024, 5, 15),
                format!("Launch of Next-Gen AI Chip by {name}"),
                "A new chip promising 2x performance for AI workloads, targeting data centers and autonomous systems.",
                8,
            ),
            innovation(
                2,
                ymd(2024, 2, 20),
                format!("{name} Unveils \"Synergy OS\" for Seamless Device Integration"),
                "A new operating system aiming to unify user experience across all company devices.",
                7,
            ),
            innovation(
                3,
                ymd(2023, 11, 1),
                format!("Breakthrough in Quantum Computing Research by {name}"),
                "Published research detailing significant progress towards a stable quantum bit, potentially revolutionizing computing.",
                9,
            ),
        ])
    }

    async fn fetch_market_events(&self) -> Result<Vec<MarketEvent>> {
        let event = |id: &str, date: NaiveDate, title: &str, description: &str, affected: &[&str]| {
            MarketEvent {
                id: id.to_string(),
                date,
                title: title.to_string(),
                description: description.to_string(),
                affected_stocks: affected.iter().map(|s| s.to_string()).collect(),
                category: None,
                impact_analysis: None,
                predicted_impact_score: None,
            }
        };

        Ok(vec![
            event(
                "event_1",
                ymd(2023, 11, 17),
                "ChatGPT Launch Anniversary",
                "Marking one year since the public release of ChatGPT, significantly impacting AI industry perception and investment.",
                &["MSFT", "GOOGL", "OPENAI"],
            ),
            event(
                "event_2",
                ymd(2024, 1, 10),
                "Major Tech Company Layoffs Announced",
                "Several large tech companies, including Google and Microsoft, announce significant workforce reductions amidst economic uncertainty.",
                &["GOOGL", "MSFT", "AMZN"],
            ),
            event(
                "event_3",
                ymd(2024, 6, 5),
                "Apple Vision Pro Global Rollout Begins",
                "Apple starts the global rollout of its mixed-reality headset, setting a new benchmark for spatial computing.",
                &["AAPL", "MSFT"],
            ),
        ])
    }

    async fn search_stocks(&self, query: &str) -> Result<Vec<Company>> {
        Ok(self.catalog.search(query))
    }
}
