use crate::analysis::{log_fallback, or_not_available, week_range_52_label, AnalysisGateway};
use crate::domain::company::Stock;
use crate::domain::contract::LlmRecommendation;
use crate::domain::recommendation::{Recommendation, RecommendationAction};
use crate::llm::Sampling;

const OPERATION: &str = "recommendation";
const SAMPLING: Sampling = Sampling::new(0.2, 20, 0.8, 512);

pub const DEFAULT_MARKET_CONDITIONS: &str = "neutral";

pub fn fallback_recommendation() -> Recommendation {
    Recommendation {
        recommendation: RecommendationAction::Hold,
        confidence: 1,
        reasoning: "Error generating recommendation. Please consult a financial advisor."
            .to_string(),
    }
}

impl AnalysisGateway {
    /// Buy/hold/sell call with a confidence in 1..=10. `market_conditions` defaults to
    /// "neutral".
    pub async fn recommend(&self, stock: &Stock, market_conditions: Option<&str>) -> Recommendation {
        let market_conditions = market_conditions
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .unwrap_or(DEFAULT_MARKET_CONDITIONS);

        let result = self
            .generate_json::<LlmRecommendation>(
                recommendation_prompt(stock, market_conditions),
                SAMPLING,
            )
            .await
            .and_then(LlmRecommendation::validate_and_into_recommendation);

        match result {
            Ok(recommendation) => recommendation,
            Err(err) => {
                log_fallback(OPERATION, &err);
                fallback_recommendation()
            }
        }
    }
}

fn recommendation_prompt(stock: &Stock, market_conditions: &str) -> String {
    let c = &stock.company;
    format!(
        "Provide an investment recommendation for {name} ({symbol}).\n\n\
Stock Information:\n\
- Current Price: {price:.2}\n\
- Market Cap: {market_cap}\n\
- P/E Ratio: {pe}\n\
- Sector: {sector}\n\
- 52-Week Range: {range}\n\n\
Market Conditions: {market_conditions}\n\n\
Return a JSON object with ONLY the following properties:\n\
- \"recommendation\": string (\"buy\", \"hold\", or \"sell\")\n\
- \"confidence\": number (1-10, where 10 is highest confidence)\n\
- \"reasoning\": string (brief explanation, max 100 words)\n\n\
Base the recommendation on fundamental analysis, technical indicators, and current market conditions.\n\
Your response must be a single valid JSON object with ONLY those three properties and no text, comments or markdown around it.",
        name = c.name,
        symbol = c.symbol,
        price = stock.current_price,
        market_cap = or_not_available(c.market_cap.as_deref()),
        pe = or_not_available(c.pe_ratio),
        sector = c.sector,
        range = week_range_52_label(stock),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures;
    use crate::llm::scripted::ScriptedClient;
    use crate::llm::ResponseFormat;
    use std::sync::Arc;

    #[tokio::test]
    async fn parses_and_clamps_confidence() {
        let client = Arc::new(ScriptedClient::replying(
            "{\"recommendation\":\"buy\",\"confidence\":15,\"reasoning\":\"Strong cloud growth.\"}",
        ));
        let gateway = AnalysisGateway::new(client.clone());
        let stock = fixtures::stock("MSFT", &[430.0]);

        let rec = gateway.recommend(&stock, Some("bullish")).await;

        assert_eq!(rec.recommendation, RecommendationAction::Buy);
        assert_eq!(rec.confidence, 10);
        assert_eq!(rec.reasoning, "Strong cloud growth.");
        let req = &client.requests()[0];
        assert_eq!(req.format, ResponseFormat::Json);
        assert!(req.prompt.contains("Market Conditions: bullish"));
    }

    #[tokio::test]
    async fn low_confidence_is_raised_to_one() {
        let client = Arc::new(ScriptedClient::replying(
            "{\"recommendation\":\"sell\",\"confidence\":-99,\"reasoning\":\"r\"}",
        ));
        let gateway = AnalysisGateway::new(client.clone());
        let stock = fixtures::stock("TSLA", &[180.0]);

        let rec = gateway.recommend(&stock, None).await;
        assert_eq!(rec.recommendation, RecommendationAction::Sell);
        assert_eq!(rec.confidence, 1);
        assert!(client.requests()[0].prompt.contains("Market Conditions: neutral"));
    }

    #[tokio::test]
    async fn missing_field_falls_back() {
        let client = Arc::new(ScriptedClient::replying(
            "{\"recommendation\":\"buy\",\"confidence\":8}",
        ));
        let gateway = AnalysisGateway::new(client);
        let stock = fixtures::stock("AAPL", &[170.0]);

        assert_eq!(gateway.recommend(&stock, None).await, fallback_recommendation());
    }

    #[tokio::test]
    async fn unknown_action_falls_back() {
        let client = Arc::new(ScriptedClient::replying(
            "{\"recommendation\":\"strong buy\",\"confidence\":8,\"reasoning\":\"r\"}",
        ));
        let gateway = AnalysisGateway::new(client);
        let stock = fixtures::stock("AAPL", &[170.0]);

        let rec = gateway.recommend(&stock, None).await;
        assert_eq!(rec.recommendation, RecommendationAction::Hold);
        assert_eq!(rec.confidence, 1);
    }

    #[tokio::test]
    async fn string_confidence_falls_back() {
        let client = Arc::new(ScriptedClient::replying(
            "{\"recommendation\":\"buy\",\"confidence\":\"8\",\"reasoning\":\"r\"}",
        ));
        let gateway = AnalysisGateway::new(client);
        let stock = fixtures::stock("AAPL", &[170.0]);

        assert_eq!(gateway.recommend(&stock, None).await, fallback_recommendation());
    }

    #[tokio::test]
    async fn non_json_reply_falls_back() {
        let client = Arc::new(ScriptedClient::replying("I would buy this stock."));
        let gateway = AnalysisGateway::new(client);
        let stock = fixtures::stock("AAPL", &[170.0]);

        assert_eq!(gateway.recommend(&stock, None).await, fallback_recommendation());
    }
}
