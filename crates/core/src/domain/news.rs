use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    Neutral,
}

impl Sentiment {
    /// Lenient parse of a model-provided label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `id` stays stable across enrichment passes; sentiment results are matched back by it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub id: String,
    pub title: String,
    pub source: String,
    pub date: NaiveDate,
    pub summary: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment_reasoning: Option<String>,
}

impl NewsArticle {
    pub fn with_sentiment(mut self, sentiment: Sentiment, reasoning: impl Into<String>) -> Self {
        self.sentiment = Some(sentiment);
        self.sentiment_reasoning = Some(reasoning.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInnovation {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    /// 1..=10
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_score: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketEvent {
    pub id: String,
    pub date: NaiveDate,
    pub title: String,
    pub description: String,
    pub affected_stocks: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact_analysis: Option<String>,
    /// -10..=10, only populated on demand.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_impact_score: Option<i8>,
}

impl MarketEvent {
    pub const DEFAULT_CATEGORY: &'static str = "General";

    pub fn category_or_default(&self) -> &str {
        self.category
            .as_deref()
            .filter(|c| !c.trim().is_empty())
            .unwrap_or(Self::DEFAULT_CATEGORY)
    }

    /// Copy of the event carrying an impact analysis. The category is defaulted when absent.
    pub fn with_impact(&self, analysis: impl Into<String>, score: i8) -> Self {
        Self {
            category: Some(self.category_or_default().to_string()),
            impact_analysis: Some(analysis.into()),
            predicted_impact_score: Some(score),
            ..self.clone()
        }
    }
}
