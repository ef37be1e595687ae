pub mod error;
pub mod gemini;
pub mod json;
pub mod offline;

#[cfg(test)]
pub mod scripted;

use serde::Serialize;

/// Sampling controls forwarded to the generation endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sampling {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Sampling {
    pub const fn new(temperature: f32, top_k: u32, top_p: f32, max_output_tokens: u32) -> Self {
        Self {
            temperature,
            top_k,
            top_p,
            max_output_tokens,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Text,
    /// The endpoint is asked to emit a single JSON value.
    Json,
}

#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub prompt: String,
    pub sampling: Sampling,
    pub format: ResponseFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    Offline,
}

#[async_trait::async_trait]
pub trait GenerationClient: Send + Sync {
    fn provider(&self) -> Provider;

    /// Returns the raw response text.
    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<String>;
}
