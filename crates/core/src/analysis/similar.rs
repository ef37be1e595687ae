use crate::analysis::{log_fallback, or_not_available, AnalysisGateway};
use crate::domain::company::Company;
use crate::domain::contract::LlmSymbolList;
use crate::llm::Sampling;
use crate::market::catalog::Catalog;

const OPERATION: &str = "similar_stocks";
const SAMPLING: Sampling = Sampling::new(0.3, 20, 0.8, 512);

const FALLBACK_LIMIT: usize = 3;

impl AnalysisGateway {
    /// Catalog companies comparable to `selected`. The selected symbol is never part of the
    /// result.
    pub async fn suggest_similar_stocks(&self, selected: &Company, catalog: &Catalog) -> Vec<Company> {
        let universe = catalog.companies();
        if universe.is_empty() {
            tracing::debug!(operation = OPERATION, "empty candidate universe");
            return Vec::new();
        }

        match self
            .generate_json::<LlmSymbolList>(similar_prompt(selected, universe), SAMPLING)
            .await
        {
            Ok(LlmSymbolList(symbols)) => universe
                .iter()
                .filter(|c| c.symbol != selected.symbol)
                .filter(|c| symbols.iter().any(|s| s.trim().eq_ignore_ascii_case(&c.symbol)))
                .cloned()
                .collect(),
            Err(err) => {
                log_fallback(OPERATION, &err);
                catalog
                    .sector_peers(&selected.symbol)
                    .into_iter()
                    .take(FALLBACK_LIMIT)
                    .cloned()
                    .collect()
            }
        }
    }
}

fn similar_prompt(selected: &Company, universe: &[Company]) -> String {
    let others = universe
        .iter()
        .filter(|c| c.symbol != selected.symbol)
        .map(|c| format!("{} ({}), Sector: {}", c.name, c.symbol, c.sector))
        .collect::<Vec<_>>()
        .join("; ");

    format!(
        "Analyze the stock {name} ({symbol}) in the {sector} sector.\n\n\
Selected Stock Details:\n\
- Name: {name}\n\
- Symbol: {symbol}\n\
- Sector: {sector}\n\
- Market Cap: {market_cap}\n\
- Description: {description}\n\n\
From the following companies, suggest 2-3 similar stocks based on:\n\
- Same or related sector\n\
- Similar market capitalization\n\
- Comparable business model\n\
- Potential for portfolio diversification\n\n\
Available Companies: {others}\n\n\
Return your answer as a JSON array of company symbols only, for example [\"MSFT\", \"AMZN\", \"GOOGL\"].\n\
Your response must be a single valid JSON array of strings with no text, comments or markdown around it.",
        name = selected.name,
        symbol = selected.symbol,
        sector = selected.sector,
        market_cap = or_not_available(selected.market_cap.as_deref()),
        description = or_not_available(Some(&selected.description)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::fixtures;
    use crate::llm::scripted::ScriptedClient;
    use std::sync::Arc;

    fn symbols(companies: &[Company]) -> Vec<&str> {
        companies.iter().map(|c| c.symbol.as_str()).collect()
    }

    #[tokio::test]
    async fn keeps_only_known_symbols_and_never_self() {
        let client = Arc::new(ScriptedClient::replying(
            "[\"AAPL\", \"googl\", \"ZZZZ\", \"MSFT\"]",
        ));
        let gateway = AnalysisGateway::new(client.clone());
        let catalog = Catalog::builtin();

        let out = gateway
            .suggest_similar_stocks(&fixtures::company("AAPL"), &catalog)
            .await;

        assert_eq!(symbols(&out), vec!["MSFT", "GOOGL"]);
        assert!(!client.requests()[0].prompt.contains("Apple Inc. (AAPL), Sector"));
    }

    #[tokio::test]
    async fn malformed_response_uses_sector_peers() {
        let client = Arc::new(ScriptedClient::replying("{\"symbols\": [\"MSFT\"]}"));
        let gateway = AnalysisGateway::new(client);
        let catalog = Catalog::builtin();
        let selected = fixtures::company("AAPL");

        let out = gateway
            .suggest_similar_stocks(&selected, &catalog)
            .await;

        assert!(!out.is_empty());
        assert!(out.len() <= 3);
        assert!(out.iter().all(|c| c.sector == selected.sector));
        assert!(out.iter().all(|c| c.symbol != "AAPL"));
    }

    #[tokio::test]
    async fn wrong_element_types_fall_back() {
        let client = Arc::new(ScriptedClient::replying("[1, 2, 3]"));
        let gateway = AnalysisGateway::new(client);
        let catalog = Catalog::builtin();
        let selected = fixtures::company("JPM");

        let out = gateway
            .suggest_similar_stocks(&selected, &catalog)
            .await;
        assert_eq!(symbols(&out), vec!["GS"]);
    }

    #[tokio::test]
    async fn empty_universe_skips_the_call() {
        let client = Arc::new(ScriptedClient::new());
        let gateway = AnalysisGateway::new(client.clone());

        let out = gateway
            .suggest_similar_stocks(&fixtures::company("AAPL"), &Catalog::new(Vec::new()))
            .await;

        assert!(out.is_empty());
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn self_only_answer_yields_nothing() {
        let client = Arc::new(ScriptedClient::replying("[\"TSLA\"]"));
        let gateway = AnalysisGateway::new(client);
        let catalog = Catalog::builtin();

        let out = gateway
            .suggest_similar_stocks(&fixtures::company("TSLA"), &catalog)
            .await;
        assert!(out.is_empty());
    }
}
