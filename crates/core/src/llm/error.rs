use crate::llm::Provider;
use serde_json::Value;
use std::fmt;

#[derive(Debug, Clone)]
pub struct LlmDiagnosticsError {
    pub provider: Option<Provider>,
    pub stage: &'static str,
    pub detail: String,
    pub raw_output: Option<String>,
    pub raw_response_json: Option<Value>,
}

impl LlmDiagnosticsError {
    /// Response text that could not be interpreted as the expected shape.
    pub fn decode(detail: impl Into<String>, raw_output: &str) -> Self {
        Self {
            provider: None,
            stage: "decode",
            detail: detail.into(),
            raw_output: Some(raw_output.to_string()),
            raw_response_json: None,
        }
    }
}

impl fmt::Display for LlmDiagnosticsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.provider {
            Some(provider) => write!(
                f,
                "LLM error (provider={:?}, stage={}): {}",
                provider, self.stage, self.detail
            ),
            None => write!(f, "LLM error (stage={}): {}", self.stage, self.detail),
        }
    }
}

impl std::error::Error for LlmDiagnosticsError {}

/// Raw model output attached anywhere in the error chain, if any.
pub fn raw_output_of(err: &anyhow::Error) -> Option<&str> {
    err.chain()
        .find_map(|e| e.downcast_ref::<LlmDiagnosticsError>())
        .and_then(|diag| diag.raw_output.as_deref())
}
