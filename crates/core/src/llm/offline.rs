use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{GenerateRequest, GenerationClient, Provider};

/// Stand-in used when no generation endpoint is configured. Every call fails, so every
/// gateway operation degrades to its fallback.
#[derive(Debug, Clone, Default)]
pub struct OfflineClient;

#[async_trait::async_trait]
impl GenerationClient for OfflineClient {
    fn provider(&self) -> Provider {
        Provider::Offline
    }

    async fn generate(&self, _request: GenerateRequest) -> anyhow::Result<String> {
        Err(LlmDiagnosticsError {
            provider: Some(Provider::Offline),
            stage: "unconfigured",
            detail: "no generation endpoint configured".to_string(),
            raw_output: None,
            raw_response_json: None,
        }
        .into())
    }
}
