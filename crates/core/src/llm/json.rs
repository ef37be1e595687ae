use crate::llm::error::LlmDiagnosticsError;
use serde::de::DeserializeOwned;

/// Trims the text, removes one surrounding Markdown fence and drops control characters
/// other than tab, LF and CR.
pub fn normalize(text: &str) -> String {
    let trimmed = text.trim();
    let body = strip_fence(trimmed).unwrap_or(trimmed);
    body.chars().filter(|c| !is_stripped_control(*c)).collect()
}

fn strip_fence(text: &str) -> Option<&str> {
    let inner = text.strip_prefix("```")?.strip_suffix("```")?;
    // Optional language tag directly after the opening fence (```json).
    let inner = inner.trim_start_matches(|c: char| c.is_alphanumeric() || c == '_');
    let inner = inner.trim();
    if inner.is_empty() {
        return None;
    }
    Some(inner)
}

fn is_stripped_control(c: char) -> bool {
    matches!(c, '\u{00}'..='\u{08}' | '\u{0B}' | '\u{0C}' | '\u{0E}'..='\u{1F}' | '\u{7F}')
}

/// Normalizes `text` and parses it into `T`. The error carries the original text.
pub fn decode<T: DeserializeOwned>(text: &str) -> Result<T, LlmDiagnosticsError> {
    let normalized = normalize(text);
    serde_json::from_str::<T>(&normalized).map_err(|e| {
        LlmDiagnosticsError::decode(
            format!("response does not match expected shape: {e}; normalized={normalized}"),
            text,
        )
    })
}
