//! Narrative-analysis gateway.
//!
//! Every operation renders its inputs into a prompt, calls the generation endpoint, decodes
//! the answer and, on any failure, logs and returns a fixed fallback. No operation returns
//! an error to its caller and none keeps state between calls.

pub mod event_impact;
pub mod narrative;
pub mod recommendation;
pub mod risk;
pub mod sentiment;
pub mod similar;

use crate::domain::company::Stock;
use crate::llm::error::raw_output_of;
use crate::llm::{json, GenerateRequest, GenerationClient, Provider, ResponseFormat, Sampling};
use anyhow::ensure;
use serde::de::DeserializeOwned;
use std::fmt::Display;
use std::sync::Arc;

const NOT_AVAILABLE: &str = "N/A";

#[derive(Clone)]
pub struct AnalysisGateway {
    client: Arc<dyn GenerationClient>,
}

impl AnalysisGateway {
    pub fn new(client: Arc<dyn GenerationClient>) -> Self {
        Self { client }
    }

    pub fn provider(&self) -> Provider {
        self.client.provider()
    }

    /// Free-text call. Blank output counts as a failure.
    async fn generate_text(&self, prompt: String, sampling: Sampling) -> anyhow::Result<String> {
        let text = self
            .client
            .generate(GenerateRequest {
                prompt,
                sampling,
                format: ResponseFormat::Text,
            })
            .await?;

        let text = text.trim();
        ensure!(!text.is_empty(), "generation endpoint returned empty text");
        Ok(text.to_string())
    }

    /// Structured call: the response must decode into `T` after normalization.
    async fn generate_json<T: DeserializeOwned>(
        &self,
        prompt: String,
        sampling: Sampling,
    ) -> anyhow::Result<T> {
        let text = self
            .client
            .generate(GenerateRequest {
                prompt,
                sampling,
                format: ResponseFormat::Json,
            })
            .await?;

        Ok(json::decode::<T>(&text)?)
    }
}

fn log_fallback(operation: &'static str, err: &anyhow::Error) {
    match raw_output_of(err) {
        Some(raw_output) => tracing::warn!(
            operation,
            error = %format!("{err:#}"),
            raw_output,
            "analysis failed; using fallback"
        ),
        None => tracing::warn!(
            operation,
            error = %format!("{err:#}"),
            "analysis failed; using fallback"
        ),
    }
}

fn or_not_available<T: Display>(value: Option<T>) -> String {
    value
        .map(|v| v.to_string())
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

/// Low/high over the most recent 365 daily points.
pub fn week_range_52(stock: &Stock) -> Option<(f64, f64)> {
    let start = stock.historical_data.len().saturating_sub(365);
    stock.historical_data[start..]
        .iter()
        .map(|p| p.price)
        .fold(None, |acc, price| match acc {
            None => Some((price, price)),
            Some((lo, hi)) => Some((lo.min(price), hi.max(price))),
        })
}

fn week_range_52_label(stock: &Stock) -> String {
    week_range_52(stock)
        .map(|(lo, hi)| format!("{lo:.2} - {hi:.2}"))
        .unwrap_or_else(|| NOT_AVAILABLE.to_string())
}
