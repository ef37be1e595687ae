use crate::analysis::{log_fallback, AnalysisGateway};
use crate::domain::contract::{LlmSentimentBatch, SentimentTag};
use crate::domain::news::{NewsArticle, Sentiment};
use crate::llm::Sampling;
use std::collections::HashMap;

const OPERATION: &str = "news_sentiment";
const SAMPLING: Sampling = Sampling::new(0.2, 30, 0.90, 2048);

pub const SENTIMENT_ERROR_REASONING: &str = "Error analyzing sentiment.";

impl AnalysisGateway {
    /// Tags every article with a sentiment. Returns the articles in input order.
    pub async fn analyze_news_sentiment(&self, articles: &[NewsArticle]) -> Vec<NewsArticle> {
        if articles.is_empty() {
            tracing::debug!(operation = OPERATION, "no articles to analyze");
            return Vec::new();
        }

        let result = self
            .generate_json::<LlmSentimentBatch>(sentiment_prompt(articles), SAMPLING)
            .await;

        match result {
            Ok(batch) => apply_tags(articles, &batch.into_lookup()),
            Err(err) => {
                log_fallback(OPERATION, &err);
                articles
                    .iter()
                    .cloned()
                    .map(|a| a.with_sentiment(Sentiment::Neutral, SENTIMENT_ERROR_REASONING))
                    .collect()
            }
        }
    }
}

fn apply_tags(articles: &[NewsArticle], lookup: &HashMap<String, SentimentTag>) -> Vec<NewsArticle> {
    articles
        .iter()
        .cloned()
        .map(|article| {
            let tag = lookup
                .get(&article.id)
                .cloned()
                .unwrap_or_else(SentimentTag::undetermined);
            article.with_sentiment(tag.sentiment, tag.reasoning)
        })
        .collect()
}

fn sentiment_prompt(articles: &[NewsArticle]) -> String {
    let rendered = articles
        .iter()
        .map(|a| format!("Article ID: {}\nTitle: {}\nSummary: {}", a.id, a.title, a.summary))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    let instructions = [
        "Analyze the sentiment of the following news article summaries.",
        "For each article provide its \"id\", a \"sentiment\" of 'positive', 'negative' or 'neutral', and a brief \"sentimentReasoning\".",
        "",
        "Respond with a JSON array. Each object MUST contain ONLY these properties:",
        "- \"id\": string (the article ID exactly as given)",
        "- \"sentiment\": string ('positive', 'negative' or 'neutral')",
        "- \"sentimentReasoning\": string",
        "",
        "Example object:",
        "{\"id\": \"some_article_id\", \"sentiment\": \"positive\", \"sentimentReasoning\": \"The article expresses optimism about future growth.\"}",
    ]
    .join("\n");

    format!(
        "{instructions}\n\nArticles to analyze:\n{rendered}\n\n\
Your entire response MUST be a single valid JSON array of objects shaped exactly as described. \
Do not include any other text, explanations, or markdown formatting."
    )
}
