//! View-state orchestration for the detail panes and stock search.
//!
//! A completion only lands in shared state when it belongs to the latest request for its
//! subject; earlier requests that resolve late are dropped.

use crate::analysis::AnalysisGateway;
use crate::domain::company::{ChartTimeRange, Company};
use crate::domain::details::StockDetails;
use crate::domain::news::ProductInnovation;
use crate::market::provider::MarketDataProvider;
use anyhow::{bail, Context};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

pub const PRIMARY_PANE: &str = "primary";
pub const COMPARISON_PANE: &str = "comparison";
pub const PANES: [&str; 2] = [PRIMARY_PANE, COMPARISON_PANE];

const SEARCH_SUBJECT: &str = "search";

#[derive(Clone)]
pub struct DetailsLoader {
    provider: Arc<dyn MarketDataProvider>,
    gateway: AnalysisGateway,
}

impl DetailsLoader {
    pub fn new(provider: Arc<dyn MarketDataProvider>, gateway: AnalysisGateway) -> Self {
        Self { provider, gateway }
    }

    pub fn provider(&self) -> &Arc<dyn MarketDataProvider> {
        &self.provider
    }

    /// Fetches a stock for `range` and enriches it with tagged news, narratives and
    /// innovation impact texts. Only market data failures surface as errors; analysis
    /// steps always produce something.
    pub async fn load(&self, symbol: &str, range: ChartTimeRange) -> anyhow::Result<StockDetails> {
        let stock = self
            .provider
            .fetch_stock_data(symbol, range)
            .await
            .with_context(|| format!("failed to fetch stock data for {symbol}"))?;
        let Some(stock) = stock else {
            bail!("Stock data not found for {symbol}");
        };

        let (news, innovations) = tokio::try_join!(
            self.provider.fetch_news_for_stock(symbol),
            self.provider.fetch_product_innovations(symbol),
        )
        .with_context(|| format!("failed to fetch news for {symbol}"))?;

        let news = self.gateway.analyze_news_sentiment(&news).await;

        let (market_trends, ai_summary) = tokio::join!(
            self.gateway.market_trends_summary(stock.name(), &news),
            self.gateway.investment_summary(&stock),
        );

        let innovations = futures::future::join_all(
            innovations
                .into_iter()
                .map(|innovation| self.narrate_innovation(stock.name(), innovation)),
        )
        .await;

        tracing::debug!(
            symbol = stock.symbol(),
            range = %range,
            points = stock.historical_data.len(),
            news = news.len(),
            innovations = innovations.len(),
            "stock details loaded"
        );

        Ok(StockDetails {
            stock,
            time_range: range,
            news,
            innovations,
            ai_summary: Some(ai_summary),
            market_trends: Some(market_trends),
        })
    }

    async fn narrate_innovation(
        &self,
        company_name: &str,
        mut innovation: ProductInnovation,
    ) -> ProductInnovation {
        innovation.description = self
            .gateway
            .innovation_impact(company_name, &innovation.title, &innovation.description)
            .await;
        innovation
    }
}

/// Proof that a request was issued for `subject` at `generation`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    subject: String,
    generation: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlotState<T> {
    pub loading: bool,
    pub value: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for SlotState<T> {
    fn default() -> Self {
        Self {
            loading: false,
            value: None,
            error: None,
        }
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u64,
    state: SlotState<T>,
}

/// Loading/value/error per subject, guarded by a generation counter.
#[derive(Debug)]
pub struct RequestSlots<T> {
    slots: Mutex<HashMap<String, Slot<T>>>,
}

impl<T> Default for RequestSlots<T> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<T: Clone> RequestSlots<T> {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Slot<T>>> {
        self.slots.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Supersedes any request in flight for `subject`. The previous value stays visible
    /// until this request completes.
    pub fn begin(&self, subject: &str) -> Ticket {
        let mut slots = self.lock();
        let slot = slots.entry(subject.to_string()).or_insert_with(|| Slot {
            generation: 0,
            state: SlotState::default(),
        });
        slot.generation += 1;
        slot.state.loading = true;
        slot.state.error = None;
        Ticket {
            subject: subject.to_string(),
            generation: slot.generation,
        }
    }

    /// Applies `result` if `ticket` is still the latest for its subject. Returns whether it
    /// was applied.
    pub fn commit(&self, ticket: Ticket, result: anyhow::Result<T>) -> bool {
        let mut slots = self.lock();
        let Some(slot) = slots.get_mut(&ticket.subject) else {
            return false;
        };
        if slot.generation != ticket.generation {
            tracing::debug!(
                subject = %ticket.subject,
                stale = ticket.generation,
                latest = slot.generation,
                "dropping stale completion"
            );
            return false;
        }

        slot.state.loading = false;
        match result {
            Ok(value) => {
                slot.state.value = Some(value);
                slot.state.error = None;
            }
            Err(err) => {
                tracing::warn!(subject = %ticket.subject, error = %format!("{err:#}"), "request failed");
                slot.state.value = None;
                slot.state.error = Some(err.to_string());
            }
        }
        true
    }

    pub fn snapshot(&self, subject: &str) -> SlotState<T> {
        self.lock()
            .get(subject)
            .map(|slot| slot.state.clone())
            .unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaneView {
    pub pane: String,
    pub symbol: Option<String>,
    pub time_range: ChartTimeRange,
    pub loading: bool,
    pub details: Option<StockDetails>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct Selection {
    symbol: Option<String>,
    range: ChartTimeRange,
}

/// Detail panes (`primary`, `comparison`) plus the stock search slot.
pub struct ViewState {
    loader: DetailsLoader,
    selections: Mutex<HashMap<&'static str, Selection>>,
    details: RequestSlots<StockDetails>,
    search: RequestSlots<Vec<Company>>,
}

impl ViewState {
    pub fn new(loader: DetailsLoader) -> Self {
        Self {
            loader,
            selections: Mutex::new(HashMap::new()),
            details: RequestSlots::new(),
            search: RequestSlots::new(),
        }
    }

    fn pane_key(pane: &str) -> anyhow::Result<&'static str> {
        match PANES.iter().copied().find(|p| *p == pane) {
            Some(key) => Ok(key),
            None => bail!("unknown pane: {pane}"),
        }
    }

    fn selections(&self) -> MutexGuard<'_, HashMap<&'static str, Selection>> {
        self.selections.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Shows `symbol` in `pane`. Without a range the pane keeps its current one.
    pub async fn select(
        &self,
        pane: &str,
        symbol: &str,
        range: Option<ChartTimeRange>,
    ) -> anyhow::Result<PaneView> {
        let key = Self::pane_key(pane)?;
        let symbol = symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            bail!("symbol is required");
        }

        let range = {
            let mut selections = self.selections();
            let selection = selections.entry(key).or_default();
            if let Some(range) = range {
                selection.range = range;
            }
            selection.symbol = Some(symbol.clone());
            selection.range
        };

        self.refresh(key, &symbol, range).await;
        self.snapshot(key)
    }

    /// Changes the pane's range and refetches its current symbol, if any.
    pub async fn set_time_range(&self, pane: &str, range: ChartTimeRange) -> anyhow::Result<PaneView> {
        let key = Self::pane_key(pane)?;
        let symbol = {
            let mut selections = self.selections();
            let selection = selections.entry(key).or_default();
            selection.range = range;
            selection.symbol.clone()
        };

        if let Some(symbol) = symbol {
            self.refresh(key, &symbol, range).await;
        }
        self.snapshot(key)
    }

    async fn refresh(&self, key: &'static str, symbol: &str, range: ChartTimeRange) {
        let ticket = self.details.begin(key);
        let result = self.loader.load(symbol, range).await;
        if !self.details.commit(ticket, result) {
            tracing::info!(pane = key, symbol, "selection superseded before load finished");
        }
    }

    pub fn snapshot(&self, pane: &str) -> anyhow::Result<PaneView> {
        let key = Self::pane_key(pane)?;
        let selection = self.selections().get(key).cloned().unwrap_or_default();
        let slot = self.details.snapshot(key);
        Ok(PaneView {
            pane: key.to_string(),
            symbol: selection.symbol,
            time_range: selection.range,
            loading: slot.loading,
            details: slot.value,
            error: slot.error,
        })
    }

    pub async fn search(&self, query: &str) -> SlotState<Vec<Company>> {
        let ticket = self.search.begin(SEARCH_SUBJECT);
        let result = self
            .loader
            .provider()
            .search_stocks(query)
            .await
            .with_context(|| format!("search failed for {query:?}"));
        self.search.commit(ticket, result);
        self.search.snapshot(SEARCH_SUBJECT)
    }

    pub fn search_snapshot(&self) -> SlotState<Vec<Company>> {
        self.search.snapshot(SEARCH_SUBJECT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::company::Stock;
    use crate::domain::news::{MarketEvent, NewsArticle, Sentiment};
    use crate::llm::offline::OfflineClient;
    use crate::llm::scripted::ScriptedClient;
    use crate::llm::ResponseFormat;
    use crate::market::catalog::Catalog;
    use crate::market::provider::MockMarketData;
    use anyhow::anyhow;
    use tokio::sync::Notify;

    fn mock() -> Arc<MockMarketData> {
        Arc::new(MockMarketData::with_seed(Catalog::builtin(), 7))
    }

    fn loader(provider: Arc<dyn MarketDataProvider>, gateway: AnalysisGateway) -> DetailsLoader {
        DetailsLoader::new(provider, gateway)
    }

    fn offline() -> AnalysisGateway {
        AnalysisGateway::new(Arc::new(OfflineClient))
    }

    /// Holds `fetch_stock_data` for one symbol until released.
    struct GatedProvider {
        inner: Arc<MockMarketData>,
        gated: &'static str,
        gate: Arc<Notify>,
    }

    #[async_trait::async_trait]
    impl MarketDataProvider for GatedProvider {
        async fn fetch_stock_data(
            &self,
            symbol: &str,
            range: ChartTimeRange,
        ) -> anyhow::Result<Option<Stock>> {
            if symbol == self.gated {
                self.gate.notified().await;
            }
            self.inner.fetch_stock_data(symbol, range).await
        }

        async fn fetch_news_for_stock(&self, symbol: &str) -> anyhow::Result<Vec<NewsArticle>> {
            self.inner.fetch_news_for_stock(symbol).await
        }

        async fn fetch_product_innovations(
            &self,
            symbol: &str,
        ) -> anyhow::Result<Vec<ProductInnovation>> {
            self.inner.fetch_product_innovations(symbol).await
        }

        async fn fetch_market_events(&self) -> anyhow::Result<Vec<MarketEvent>> {
            self.inner.fetch_market_events().await
        }

        async fn search_stocks(&self, query: &str) -> anyhow::Result<Vec<Company>> {
            self.inner.search_stocks(query).await
        }
    }

    #[tokio::test]
    async fn load_enriches_stock_with_narratives() {
        let client = Arc::new(ScriptedClient::responding(|req| match req.format {
            ResponseFormat::Json => Ok("[]".to_string()),
            ResponseFormat::Text => Ok("Narrative text.".to_string()),
        }));
        let details = loader(mock(), AnalysisGateway::new(client.clone()))
            .load("MSFT", ChartTimeRange::ThreeMonths)
            .await
            .unwrap();

        assert_eq!(details.symbol(), "MSFT");
        assert_eq!(details.time_range, ChartTimeRange::ThreeMonths);
        assert_eq!(details.ai_summary.as_deref(), Some("Narrative text."));
        assert_eq!(details.market_trends.as_deref(), Some("Narrative text."));
        assert!(!details.innovations.is_empty());
        assert!(details
            .innovations
            .iter()
            .all(|i| i.description == "Narrative text."));
        assert!(details
            .news
            .iter()
            .all(|n| n.sentiment == Some(Sentiment::Neutral)));

        // sentiment + trends + summary + one call per innovation
        assert_eq!(client.call_count(), 3 + details.innovations.len());
    }

    #[tokio::test]
    async fn load_degrades_to_fallbacks_when_generation_fails() {
        let details = loader(mock(), offline())
            .load("AAPL", ChartTimeRange::OneMonth)
            .await
            .unwrap();

        assert_eq!(
            details.ai_summary.as_deref(),
            Some("Could not generate AI summary for Apple Inc.. Please try again later.")
        );
        for innovation in &details.innovations {
            assert_eq!(
                innovation.description,
                format!(
                    "Could not analyze impact of {}. Please try again later.",
                    innovation.title
                )
            );
        }
    }

    #[tokio::test]
    async fn load_fails_for_unknown_symbol() {
        let err = loader(mock(), offline())
            .load("ZZZZ", ChartTimeRange::OneYear)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Stock data not found for ZZZZ");
    }

    #[test]
    fn slots_drop_stale_completions() {
        let slots = RequestSlots::<u32>::new();
        let first = slots.begin("primary");
        let second = slots.begin("primary");

        assert!(slots.commit(second, Ok(2)));
        assert!(!slots.commit(first, Ok(1)));

        let state = slots.snapshot("primary");
        assert_eq!(state.value, Some(2));
        assert!(!state.loading);
    }

    #[test]
    fn slot_failure_clears_value() {
        let slots = RequestSlots::<u32>::new();
        let t = slots.begin("primary");
        slots.commit(t, Ok(1));

        let t = slots.begin("primary");
        assert!(slots.snapshot("primary").loading);
        assert_eq!(slots.snapshot("primary").value, Some(1));

        slots.commit(t, Err(anyhow!("boom")));
        let state = slots.snapshot("primary");
        assert_eq!(state.value, None);
        assert_eq!(state.error.as_deref(), Some("boom"));
    }

    #[test]
    fn subjects_are_independent() {
        let slots = RequestSlots::<u32>::new();
        let a = slots.begin("primary");
        let b = slots.begin("comparison");
        assert!(slots.commit(b, Ok(2)));
        assert!(slots.commit(a, Ok(1)));
        assert_eq!(slots.snapshot("primary").value, Some(1));
        assert_eq!(slots.snapshot("comparison").value, Some(2));
    }

    #[tokio::test]
    async fn late_completion_does_not_overwrite_newer_selection() {
        let gate = Arc::new(Notify::new());
        let provider = Arc::new(GatedProvider {
            inner: mock(),
            gated: "AAPL",
            gate: gate.clone(),
        });
        let view = ViewState::new(loader(provider, offline()));

        let (slow, fast) = tokio::join!(view.select(PRIMARY_PANE, "AAPL", None), async {
            let res = view.select(PRIMARY_PANE, "MSFT", None).await;
            gate.notify_one();
            res
        });

        assert_eq!(fast.unwrap().details.unwrap().symbol(), "MSFT");
        // The slow request resolved last but was superseded.
        let slow = slow.unwrap();
        assert_eq!(slow.symbol.as_deref(), Some("MSFT"));
        assert_eq!(slow.details.unwrap().symbol(), "MSFT");
    }

    #[tokio::test]
    async fn panes_load_independently_and_keep_their_range() {
        let view = ViewState::new(loader(mock(), offline()));

        view.select(PRIMARY_PANE, "aapl", Some(ChartTimeRange::SixMonths))
            .await
            .unwrap();
        view.select(COMPARISON_PANE, "GOOGL", None).await.unwrap();

        let primary = view
            .set_time_range(PRIMARY_PANE, ChartTimeRange::FiveYears)
            .await
            .unwrap();
        assert_eq!(primary.symbol.as_deref(), Some("AAPL"));
        assert_eq!(
            primary.details.unwrap().time_range,
            ChartTimeRange::FiveYears
        );

        let comparison = view.snapshot(COMPARISON_PANE).unwrap();
        assert_eq!(comparison.time_range, ChartTimeRange::OneYear);
        assert_eq!(comparison.details.unwrap().symbol(), "GOOGL");

        assert!(view.snapshot("sidebar").is_err());
    }

    #[tokio::test]
    async fn failed_selection_surfaces_single_error() {
        let view = ViewState::new(loader(mock(), offline()));
        view.select(PRIMARY_PANE, "AAPL", None).await.unwrap();

        let pane = view.select(PRIMARY_PANE, "ZZZZ", None).await.unwrap();
        assert!(pane.details.is_none());
        assert_eq!(pane.error.as_deref(), Some("Stock data not found for ZZZZ"));
        assert!(!pane.loading);
    }

    #[tokio::test]
    async fn search_fills_search_slot() {
        let view = ViewState::new(loader(mock(), offline()));
        let state = view.search("micro").await;
        assert!(!state.loading);
        let hits = state.value.unwrap();
        assert_eq!(hits[0].symbol, "MSFT");
        assert_eq!(view.search_snapshot().value.unwrap().len(), hits.len());
    }
}
