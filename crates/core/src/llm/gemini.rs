use crate::config::Settings;
use crate::llm::error::LlmDiagnosticsError;
use crate::llm::{GenerateRequest, GenerationClient, Provider, ResponseFormat};
use anyhow::Context;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 60;

const JSON_MIME_TYPE: &str = "application/json";

#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl GeminiClient {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let api_key = settings.require_gemini_api_key()?.to_string();
        let base_url = settings
            .gemini_base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let model = settings
            .gemini_model
            .clone()
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let timeout_secs = settings.gemini_timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            http,
            api_key,
            base_url,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    fn request_body(request: &GenerateRequest) -> GenerateContentRequest<'_> {
        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.sampling.temperature,
                top_k: request.sampling.top_k,
                top_p: request.sampling.top_p,
                max_output_tokens: request.sampling.max_output_tokens,
                response_mime_type: match request.format {
                    ResponseFormat::Json => Some(JSON_MIME_TYPE),
                    ResponseFormat::Text => None,
                },
            },
        }
    }

    async fn generate_content(
        &self,
        body: &GenerateContentRequest<'_>,
    ) -> anyhow::Result<(serde_json::Value, GenerateContentResponse)> {
        let mut headers = HeaderMap::new();
        headers.insert("x-goog-api-key", HeaderValue::from_str(&self.api_key)?);

        let res = self
            .http
            .post(self.url())
            .headers(headers)
            .json(body)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = res.status();
        let text = res
            .text()
            .await
            .context("failed to read Gemini response body")?;
        if !status.is_success() {
            let raw_response_json = serde_json::from_str::<serde_json::Value>(&text).ok();
            return Err(LlmDiagnosticsError {
                provider: Some(Provider::Gemini),
                stage: "http",
                detail: format!("status={status}"),
                raw_output: Some(text),
                raw_response_json,
            }
            .into());
        }

        let raw_json = serde_json::from_str::<serde_json::Value>(&text)
            .with_context(|| format!("failed to parse Gemini response JSON: {text}"))?;
        let parsed = serde_json::from_value::<GenerateContentResponse>(raw_json.clone())
            .context("failed to decode Gemini response into GenerateContentResponse")?;
        Ok((raw_json, parsed))
    }

    fn response_text(res: &GenerateContentResponse) -> Option<String> {
        let candidate = res.candidates.first()?;
        let mut out = String::new();
        for part in &candidate.content.parts {
            // Thought parts carry reasoning traces, not the answer.
            if part.thought {
                continue;
            }
            if let Some(text) = &part.text {
                out.push_str(text);
            }
        }
        Some(out)
    }
}

#[async_trait::async_trait]
impl GenerationClient for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: GenerateRequest) -> anyhow::Result<String> {
        let body = Self::request_body(&request);
        let (raw_json, res) = self.generate_content(&body).await?;

        match Self::response_text(&res) {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => {
                let finish_reason = res
                    .candidates
                    .first()
                    .and_then(|c| c.finish_reason.clone())
                    .unwrap_or_else(|| "none".to_string());
                Err(LlmDiagnosticsError {
                    provider: Some(Provider::Gemini),
                    stage: "empty_response",
                    detail: format!("no response text (finish_reason={finish_reason})"),
                    raw_output: None,
                    raw_response_json: Some(raw_json),
                }
                .into())
            }
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Clone, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Clone, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: CandidateContent,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Sampling;
    use serde_json::json;

    #[test]
    fn request_body_sets_json_mime_type_only_for_structured_output() {
        let mut request = GenerateRequest {
            prompt: "hello".to_string(),
            sampling: Sampling::new(0.2, 30, 0.9, 2048),
            format: ResponseFormat::Json,
        };

        let v = serde_json::to_value(GeminiClient::request_body(&request)).unwrap();
        assert_eq!(v["contents"][0]["parts"][0]["text"], json!("hello"));
        assert_eq!(v["generationConfig"]["topK"], json!(30));
        assert_eq!(v["generationConfig"]["maxOutputTokens"], json!(2048));
        assert_eq!(
            v["generationConfig"]["responseMimeType"],
            json!("application/json")
        );

        request.format = ResponseFormat::Text;
        let v = serde_json::to_value(GeminiClient::request_body(&request)).unwrap();
        assert!(v["generationConfig"].get("responseMimeType").is_none());
    }

    #[test]
    fn response_text_joins_parts_and_skips_thoughts() {
        let res: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "[\"MSFT\","},
                    {"text": " \"GOOGL\"]"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();

        assert_eq!(
            GeminiClient::response_text(&res).as_deref(),
            Some("[\"MSFT\", \"GOOGL\"]")
        );
    }

    #[test]
    fn response_text_is_none_without_candidates() {
        let res: GenerateContentResponse =
            serde_json::from_value(json!({"promptFeedback": {"blockReason": "SAFETY"}})).unwrap();
        assert!(GeminiClient::response_text(&res).is_none());
    }
}
