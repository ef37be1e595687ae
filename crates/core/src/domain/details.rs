use crate::domain::company::{ChartTimeRange, Stock};
use crate::domain::news::{NewsArticle, ProductInnovation};
use serde::{Deserialize, Serialize};

/// A stock enriched for display. Enrichment fields are rebuilt on every fetch cycle and
/// never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockDetails {
    #[serde(flatten)]
    pub stock: Stock,
    pub time_range: ChartTimeRange,
    pub news: Vec<NewsArticle>,
    pub innovations: Vec<ProductInnovation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ai_summary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_trends: Option<String>,
}

impl StockDetails {
    pub fn symbol(&self) -> &str {
        self.stock.symbol()
    }
}
