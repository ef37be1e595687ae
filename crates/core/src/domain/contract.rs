//! Shapes the generation endpoint is asked to emit, and their conversion into domain values.
//!
//! Deserialization is strict about the primitive type of every required field and ignores
//! unknown keys. Scores are clamped into their documented ranges during conversion.

use crate::domain::news::Sentiment;
use crate::domain::recommendation::{
    Recommendation, RecommendationAction, RiskAssessment, RiskLevel,
};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const IMPACT_SCORE_RANGE: (i32, i32) = (-10, 10);
pub const CONFIDENCE_RANGE: (i32, i32) = (1, 10);
pub const RISK_SCORE_RANGE: (i32, i32) = (1, 10);

pub const UNDETERMINED_SENTIMENT_REASONING: &str = "Could not determine sentiment.";

/// Rounds to the nearest integer and clamps into `[min, max]`.
pub fn clamp_score(value: f64, (min, max): (i32, i32)) -> anyhow::Result<i32> {
    ensure!(value.is_finite(), "score must be a finite number (got {value})");
    Ok(value.round().clamp(min as f64, max as f64) as i32)
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentimentTag {
    pub sentiment: Sentiment,
    pub reasoning: String,
}

impl SentimentTag {
    pub fn undetermined() -> Self {
        Self {
            sentiment: Sentiment::Neutral,
            reasoning: UNDETERMINED_SENTIMENT_REASONING.to_string(),
        }
    }
}

/// Array of per-article verdicts. Entries are kept as raw JSON so that one malformed
/// entry only costs that article its tag.
#[derive(Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct LlmSentimentBatch(pub Vec<Value>);

impl LlmSentimentBatch {
    /// Indexes entries by `id`. Entries without a string id are skipped; the first entry
    /// for a repeated id wins.
    pub fn into_lookup(self) -> HashMap<String, SentimentTag> {
        let mut out = HashMap::new();
        for entry in self.0 {
            let Some(id) = entry.get("id").and_then(Value::as_str) else {
                continue;
            };
            if out.contains_key(id) {
                continue;
            }

            let sentiment = entry
                .get("sentiment")
                .and_then(Value::as_str)
                .and_then(Sentiment::from_label)
                .unwrap_or(Sentiment::Neutral);
            let reasoning = entry
                .get("sentimentReasoning")
                .and_then(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .unwrap_or(UNDETERMINED_SENTIMENT_REASONING)
                .to_string();

            out.insert(id.to_string(), SentimentTag { sentiment, reasoning });
        }
        out
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LlmSymbolList(pub Vec<String>);

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmEventImpact {
    pub impact_analysis: String,
    pub predicted_impact_score: f64,
}

impl LlmEventImpact {
    pub fn validate_and_into_impact(self) -> anyhow::Result<(String, i8)> {
        let score = clamp_score(self.predicted_impact_score, IMPACT_SCORE_RANGE)
            .context("invalid predictedImpactScore")?;
        Ok((self.impact_analysis, score as i8))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmRecommendation {
    pub recommendation: String,
    pub confidence: f64,
    pub reasoning: String,
}

impl LlmRecommendation {
    pub fn validate_and_into_recommendation(self) -> anyhow::Result<Recommendation> {
        let recommendation = RecommendationAction::from_label(&self.recommendation)
            .with_context(|| format!("unknown recommendation: {}", self.recommendation))?;
        let confidence =
            clamp_score(self.confidence, CONFIDENCE_RANGE).context("invalid confidence")?;

        Ok(Recommendation {
            recommendation,
            confidence: confidence as u8,
            reasoning: self.reasoning,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmRiskAssessment {
    pub risk_level: String,
    pub risk_factors: Vec<String>,
    pub risk_score: f64,
    pub mitigation_strategies: Vec<String>,
}

impl LlmRiskAssessment {
    pub fn validate_and_into_assessment(self) -> anyhow::Result<RiskAssessment> {
        let risk_level = RiskLevel::from_label(&self.risk_level)
            .with_context(|| format!("unknown riskLevel: {}", self.risk_level))?;
        let risk_score =
            clamp_score(self.risk_score, RISK_SCORE_RANGE).context("invalid riskScore")?;

        Ok(RiskAssessment {
            risk_level,
            risk_factors: self.risk_factors,
            risk_score: risk_score as u8,
            mitigation_strategies: self.mitigation_strategies,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn clamp_score_bounds_and_rounds() {
        assert_eq!(clamp_score(15.0, IMPACT_SCORE_RANGE).unwrap(), 10);
        assert_eq!(clamp_score(-99.0, IMPACT_SCORE_RANGE).unwrap(), -10);
        assert_eq!(clamp_score(-99.0, CONFIDENCE_RANGE).unwrap(), 1);
        assert_eq!(clamp_score(6.6, RISK_SCORE_RANGE).unwrap(), 7);
        assert_eq!(clamp_score(0.0, CONFIDENCE_RANGE).unwrap(), 1);
    }

    #[test]
    fn sentiment_lookup_skips_entries_without_id() {
        let batch: LlmSentimentBatch = serde_json::from_value(json!([
            {"id": "a", "sentiment": "positive", "sentimentReasoning": "beat estimates"},
            {"sentiment": "negative", "sentimentReasoning": "no id"},
            {"id": "b", "sentiment": "ecstatic"},
            {"id": "a", "sentiment": "negative", "sentimentReasoning": "duplicate"},
            "not an object"
        ]))
        .unwrap();

        let lookup = batch.into_lookup();
        assert_eq!(lookup.len(), 2);
        assert_eq!(
            lookup["a"],
            SentimentTag {
                sentiment: Sentiment::Positive,
                reasoning: "beat estimates".to_string()
            }
        );
        assert_eq!(lookup["b"], SentimentTag::undetermined());
    }

    #[test]
    fn event_impact_rejects_string_score() {
        let res = serde_json::from_value::<LlmEventImpact>(json!({
            "impactAnalysis": "text",
            "predictedImpactScore": "7"
        }));
        assert!(res.is_err());
    }

    #[test]
    fn recommendation_validates_action_label() {
        let ok = LlmRecommendation {
            recommendation: "BUY".to_string(),
            confidence: 42.0,
            reasoning: "cheap".to_string(),
        }
        .validate_and_into_recommendation()
        .unwrap();
        assert_eq!(ok.recommendation, RecommendationAction::Buy);
        assert_eq!(ok.confidence, 10);

        let bad = LlmRecommendation {
            recommendation: "accumulate".to_string(),
            confidence: 5.0,
            reasoning: "r".to_string(),
        };
        assert!(bad.validate_and_into_recommendation().is_err());
    }

    #[test]
    fn risk_assessment_requires_every_field() {
        let res = serde_json::from_value::<LlmRiskAssessment>(json!({
            "riskLevel": "high",
            "riskFactors": ["debt"],
            "mitigationStrategies": ["hedge"]
        }));
        assert!(res.is_err());
    }
}
