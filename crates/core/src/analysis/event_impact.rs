use crate::analysis::{log_fallback, AnalysisGateway};
use crate::domain::contract::LlmEventImpact;
use crate::domain::news::MarketEvent;
use crate::llm::Sampling;

const OPERATION: &str = "event_impact";
const SAMPLING: Sampling = Sampling::new(0.3, 30, 0.85, 1024);

pub const INVALID_INPUT_ANALYSIS: &str = "Invalid input provided.";
pub const EVENT_IMPACT_ERROR_ANALYSIS: &str = "Error analyzing event impact. Please try again.";

impl AnalysisGateway {
    /// Returns a copy of `event` carrying an impact analysis for `stock_symbol` and a score
    /// in -10..=10.
    pub async fn analyze_event_impact(&self, event: &MarketEvent, stock_symbol: &str) -> MarketEvent {
        let stock_symbol = stock_symbol.trim();
        if stock_symbol.is_empty() {
            tracing::debug!(operation = OPERATION, event_id = %event.id, "target symbol missing");
            return event.with_impact(INVALID_INPUT_ANALYSIS, 0);
        }

        let result = self
            .generate_json::<LlmEventImpact>(event_prompt(event, stock_symbol), SAMPLING)
            .await
            .and_then(LlmEventImpact::validate_and_into_impact);

        match result {
            Ok((analysis, score)) => event.with_impact(analysis, score),
            Err(err) => {
                log_fallback(OPERATION, &err);
                event.with_impact(EVENT_IMPACT_ERROR_ANALYSIS, 0)
            }
        }
    }
}

fn event_prompt(event: &MarketEvent, stock_symbol: &str) -> String {
    format!(
        "Analyze the potential impact of the following market event on stock {stock_symbol}.\n\n\
Event Details:\n\
- Title: {title}\n\
- Description: {description}\n\
- Date: {date}\n\
- Category: {category}\n\n\
Cover:\n\
1. Short-term impact (1-7 days)\n\
2. Medium-term impact (1-3 months)\n\
3. Long-term implications (6+ months)\n\
4. Market sentiment effects\n\
5. Trading volume expectations\n\n\
Return a JSON object with ONLY the following properties:\n\
- \"impactAnalysis\": string (max 150 words, covering the points above)\n\
- \"predictedImpactScore\": integer (-10 to 10, where -10 is very negative, 0 is neutral, 10 is very positive)\n\n\
Consider industry relevance, market conditions, historical precedents, investor sentiment, and fundamental vs technical impact.\n\
Your response must be a single valid JSON object with ONLY those two properties and no text, comments or markdown around it.",
        title = event.title,
        description = event.description,
        date = event.date,
        category = event.category_or_default(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::scripted::ScriptedClient;
    use chrono::NaiveDate;
    use std::sync::Arc;

    fn event() -> MarketEvent {
        MarketEvent {
            id: "event_3".to_string(),
            date: NaiveDate::from_ymd_opt(2024, 6, 5).unwrap(),
            title: "Vision Pro Global Rollout".to_string(),
            description: "Mixed-reality headset ships worldwide.".to_string(),
            affected_stocks: ["AAPL".to_string(), "MSFT".to_string()].into_iter().collect(),
            category: None,
            impact_analysis: None,
            predicted_impact_score: None,
        }
    }

    #[tokio::test]
    async fn clamps_out_of_range_score() {
        let client = Arc::new(ScriptedClient::replying(
            "{\"impactAnalysis\":\"text\",\"predictedImpactScore\":37}",
        ));
        let gateway = AnalysisGateway::new(client.clone());

        let out = gateway.analyze_event_impact(&event(), "AAPL").await;

        assert_eq!(out.predicted_impact_score, Some(10));
        assert_eq!(out.impact_analysis.as_deref(), Some("text"));
        assert_eq!(out.category.as_deref(), Some("General"));
        assert!(client.requests()[0].prompt.contains("on stock AAPL"));
    }

    #[tokio::test]
    async fn clamps_negative_score() {
        let client = Arc::new(ScriptedClient::replying(
            "```json\n{\"impactAnalysis\":\"bad\",\"predictedImpactScore\":-99,\"extra\":true}\n```",
        ));
        let gateway = AnalysisGateway::new(client);

        let out = gateway.analyze_event_impact(&event(), "MSFT").await;
        assert_eq!(out.predicted_impact_score, Some(-10));
        assert_eq!(out.impact_analysis.as_deref(), Some("bad"));
    }

    #[tokio::test]
    async fn wrong_types_fall_back() {
        let client = Arc::new(ScriptedClient::replying(
            "{\"impactAnalysis\":\"text\",\"predictedImpactScore\":\"high\"}",
        ));
        let gateway = AnalysisGateway::new(client);

        let out = gateway.analyze_event_impact(&event(), "AAPL").await;
        assert_eq!(out.predicted_impact_score, Some(0));
        assert_eq!(out.impact_analysis.as_deref(), Some(EVENT_IMPACT_ERROR_ANALYSIS));
    }

    #[tokio::test]
    async fn missing_symbol_skips_the_call() {
        let client = Arc::new(ScriptedClient::new());
        let gateway = AnalysisGateway::new(client.clone());

        let mut categorized = event();
        categorized.category = Some("Technology".to_string());
        let out = gateway.analyze_event_impact(&categorized, " ").await;

        assert_eq!(out.impact_analysis.as_deref(), Some(INVALID_INPUT_ANALYSIS));
        assert_eq!(out.predicted_impact_score, Some(0));
        assert_eq!(out.category.as_deref(), Some("Technology"));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn transport_failure_falls_back() {
        let client = Arc::new(ScriptedClient::failing("dns"));
        let gateway = AnalysisGateway::new(client);

        let out = gateway.analyze_event_impact(&event(), "AAPL").await;
        assert_eq!(out.impact_analysis.as_deref(), Some(EVENT_IMPACT_ERROR_ANALYSIS));
        assert_eq!(out.predicted_impact_score, Some(0));
        assert_eq!(out.id, "event_3");
    }
}
