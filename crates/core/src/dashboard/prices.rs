use crate::domain::company::ChartTimeRange;
use crate::market::provider::MarketDataProvider;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};

/// Current prices captured once per fetch cycle. Valuations read from the snapshot so that
/// repeated reads within a cycle agree.
#[derive(Debug, Clone, Default)]
pub struct PriceSnapshot {
    prices: HashMap<String, f64>,
    captured_at: Option<DateTime<Utc>>,
}

impl PriceSnapshot {
    pub fn from_prices(prices: impl IntoIterator<Item = (String, f64)>) -> Self {
        Self {
            prices: prices.into_iter().collect(),
            captured_at: Some(Utc::now()),
        }
    }

    pub async fn capture<'a>(
        provider: &dyn MarketDataProvider,
        symbols: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let mut snapshot = Self::default();
        snapshot.extend_missing(provider, symbols).await;
        snapshot
    }

    /// Fetches prices only for symbols not yet in the snapshot. Symbols the provider does not
    /// know, or fails on, stay absent.
    pub async fn extend_missing<'a>(
        &mut self,
        provider: &dyn MarketDataProvider,
        symbols: impl IntoIterator<Item = &'a str>,
    ) {
        let missing: BTreeSet<&str> = symbols
            .into_iter()
            .filter(|s| !self.prices.contains_key(*s))
            .collect();
        if missing.is_empty() {
            return;
        }

        let fetched = join_all(missing.into_iter().map(|symbol| async move {
            let res = provider
                .fetch_stock_data(symbol, ChartTimeRange::OneMonth)
                .await;
            (symbol, res)
        }))
        .await;

        for (symbol, res) in fetched {
            match res {
                Ok(Some(stock)) => {
                    self.prices.insert(symbol.to_string(), stock.current_price);
                }
                Ok(None) => tracing::debug!(%symbol, "no price for unknown symbol"),
                Err(e) => tracing::warn!(%symbol, error = %e, "price fetch failed"),
            }
        }
        self.captured_at = Some(Utc::now());
    }

    pub fn price(&self, symbol: &str) -> Option<f64> {
        self.prices.get(symbol).copied()
    }

    pub fn captured_at(&self) -> Option<DateTime<Utc>> {
        self.captured_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::catalog::Catalog;
    use crate::market::provider::MockMarketData;

    #[tokio::test]
    async fn captured_prices_stay_stable() {
        let provider = MockMarketData::with_seed(Catalog::builtin(), 3);
        let mut snapshot = PriceSnapshot::capture(&provider, ["AAPL", "NOPE"]).await;

        let first = snapshot.price("AAPL").unwrap();
        assert!(snapshot.price("NOPE").is_none());

        snapshot.extend_missing(&provider, ["AAPL", "MSFT"]).await;
        assert_eq!(snapshot.price("AAPL"), Some(first));
        assert!(snapshot.price("MSFT").is_some());
        assert!(snapshot.captured_at().is_some());
    }
}
