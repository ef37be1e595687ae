use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    PriceAbove,
    PriceBelow,
    /// Declared for compatibility with stored alerts; nothing evaluates it.
    SentimentChange,
}

/// A price for the price conditions, a sentiment label for `sentiment_change`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AlertTarget {
    Price(f64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAlert {
    pub id: String,
    pub stock_symbol: String,
    pub condition: AlertCondition,
    pub target_value: AlertTarget,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioItem {
    pub stock_symbol: String,
    pub shares: f64,
    pub purchase_price: f64,
    pub purchase_date: NaiveDate,
}
