use crate::analysis::{log_fallback, or_not_available, AnalysisGateway};
use crate::domain::company::Stock;
use crate::domain::contract::LlmRiskAssessment;
use crate::domain::recommendation::{RiskAssessment, RiskLevel};
use crate::llm::Sampling;

const OPERATION: &str = "risk_assessment";
const SAMPLING: Sampling = Sampling::new(0.2, 25, 0.80, 1024);

pub fn fallback_risk_assessment() -> RiskAssessment {
    RiskAssessment {
        risk_level: RiskLevel::Medium,
        risk_factors: vec!["Risk assessment unavailable".to_string()],
        risk_score: 5,
        mitigation_strategies: vec![
            "Consult financial advisor".to_string(),
            "Conduct thorough research".to_string(),
        ],
    }
}

impl AnalysisGateway {
    pub async fn assess_risk(&self, stock: &Stock) -> RiskAssessment {
        let result = self
            .generate_json::<LlmRiskAssessment>(risk_prompt(stock), SAMPLING)
            .await
            .and_then(LlmRiskAssessment::validate_and_into_assessment);

        match result {
            Ok(assessment) => assessment,
            Err(err) => {
                log_fallback(OPERATION, &err);
                fallback_risk_assessment()
            }
        }
    }
}

fn risk_prompt(stock: &Stock) -> String {
    let c = &stock.company;
    format!(
        "Assess the investment risk for {name} ({symbol}).\n\n\
Stock Details:\n\
- Sector: {sector}\n\
- Market Cap: {market_cap}\n\
- P/E Ratio: {pe}\n\
- Description: {description}\n\n\
Return a JSON object with ONLY the following properties:\n\
- \"riskLevel\": string (\"low\", \"medium\", or \"high\")\n\
- \"riskFactors\": array of strings (top 3-5 risk factors)\n\
- \"riskScore\": number (1-10, where 10 is highest risk)\n\
- \"mitigationStrategies\": array of strings (2-3 risk mitigation approaches)\n\n\
Consider volatility, sector stability, competitive position, financial health, and market conditions.\n\
Your response must be a single valid JSON object with ONLY those four properties and no text, comments or markdown around it.",
        name = c.name,
        symbol = c.symbol,
        sector = c.sector,
        market_cap = or_not_available(c.market_cap.as_deref()),
        pe = or_not_available(c.pe_ratio),
        description = or_not_available(Some(&c.description)),
    )
}
