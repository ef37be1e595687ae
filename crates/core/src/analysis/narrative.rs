use crate::analysis::{log_fallback, or_not_available, week_range_52_label, AnalysisGateway};
use crate::domain::company::Stock;
use crate::domain::news::NewsArticle;
use crate::llm::Sampling;

const MARKET_TRENDS_SAMPLING: Sampling = Sampling::new(0.4, 40, 0.9, 1024);
const SUMMARY_SAMPLING: Sampling = Sampling::new(0.4, 40, 0.9, 1024);
const INNOVATION_SAMPLING: Sampling = Sampling::new(0.4, 40, 0.9, 512);
const SECTOR_SAMPLING: Sampling = Sampling::new(0.4, 40, 0.9, 1024);

const MAX_TREND_ARTICLES: usize = 5;
const TREND_SUMMARY_CHARS: usize = 100;

pub const DEFAULT_SECTOR_TIMEFRAME: &str = "3 months";

impl AnalysisGateway {
    /// Short narrative of the market trends around a company, from up to five recent articles.
    pub async fn market_trends_summary(
        &self,
        company_name: &str,
        recent_news: &[NewsArticle],
    ) -> String {
        const OPERATION: &str = "market_trends";
        if company_name.trim().is_empty() {
            tracing::debug!(operation = OPERATION, "company name missing");
            return "Company name is required for market trends analysis.".to_string();
        }

        match self
            .generate_text(market_trends_prompt(company_name, recent_news), MARKET_TRENDS_SAMPLING)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                log_fallback(OPERATION, &err);
                format!("Could not fetch market trends for {company_name}. Please try again later.")
            }
        }
    }

    pub async fn investment_summary(&self, stock: &Stock) -> String {
        const OPERATION: &str = "investment_summary";
        match self
            .generate_text(investment_summary_prompt(stock), SUMMARY_SAMPLING)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                log_fallback(OPERATION, &err);
                format!(
                    "Could not generate AI summary for {}. Please try again later.",
                    stock.name()
                )
            }
        }
    }

    pub async fn innovation_impact(
        &self,
        company_name: &str,
        innovation_title: &str,
        innovation_description: &str,
    ) -> String {
        const OPERATION: &str = "innovation_impact";
        if [company_name, innovation_title, innovation_description]
            .iter()
            .any(|s| s.trim().is_empty())
        {
            tracing::debug!(operation = OPERATION, "incomplete innovation details");
            return "Complete innovation details are required for analysis.".to_string();
        }

        let prompt = innovation_prompt(company_name, innovation_title, innovation_description);
        match self.generate_text(prompt, INNOVATION_SAMPLING).await {
            Ok(text) => text,
            Err(err) => {
                log_fallback(OPERATION, &err);
                format!("Could not analyze impact of {innovation_title}. Please try again later.")
            }
        }
    }

    /// `timeframe` defaults to three months.
    pub async fn sector_trends(&self, sector: &str, timeframe: Option<&str>) -> String {
        const OPERATION: &str = "sector_trends";
        if sector.trim().is_empty() {
            tracing::debug!(operation = OPERATION, "sector missing");
            return "Sector name is required for trend analysis.".to_string();
        }
        let timeframe = timeframe
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_SECTOR_TIMEFRAME);

        match self
            .generate_text(sector_prompt(sector, timeframe), SECTOR_SAMPLING)
            .await
        {
            Ok(text) => text,
            Err(err) => {
                log_fallback(OPERATION, &err);
                format!("Could not analyze trends for {sector} sector. Please try again later.")
            }
        }
    }
}

fn truncate_chars(s: &str, max: usize) -> &str {
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

fn market_trends_prompt(company_name: &str, recent_news: &[NewsArticle]) -> String {
    let headlines = recent_news
        .iter()
        .take(MAX_TREND_ARTICLES)
        .map(|n| format!("- {}: {}...", n.title, truncate_chars(&n.summary, TREND_SUMMARY_CHARS)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Provide a concise market trends summary for {company_name}, considering the following recent news headlines and summaries:\n\n\
{headlines}\n\n\
Focus on:\n\
- Key market drivers affecting the company\n\
- Potential risks and opportunities\n\
- Overall market perception and investor sentiment\n\
- Recent performance indicators\n\n\
Keep the summary under 150 words and provide actionable insights."
    )
}

fn investment_summary_prompt(stock: &Stock) -> String {
    let c = &stock.company;
    format!(
        "Generate a comprehensive investment summary for {name} ({symbol}).\n\n\
Company Details:\n\
- Name: {name}\n\
- Symbol: {symbol}\n\
- Sector: {sector}\n\
- Description: {description}\n\
- Market Cap: {market_cap}\n\
- P/E Ratio: {pe}\n\
- Current Price: {price:.2}\n\
- 52-Week Range: {range}\n\n\
Provide an investment summary covering:\n\
- Market position and competitive advantages\n\
- Recent performance and key metrics\n\
- Growth catalysts and opportunities\n\
- Potential risks and challenges\n\
- Investment thesis and outlook\n\n\
Keep the summary between 100-150 words, professional and informative.",
        name = c.name,
        symbol = c.symbol,
        sector = c.sector,
        description = or_not_available(Some(&c.description)),
        market_cap = or_not_available(c.market_cap.as_deref()),
        pe = or_not_available(c.pe_ratio),
        price = stock.current_price,
        range = week_range_52_label(stock),
    )
}

fn innovation_prompt(company_name: &str, title: &str, description: &str) -> String {
    format!(
        "Analyze the potential market impact of the following product innovation:\n\n\
Company: {company_name}\n\
Innovation Title: {title}\n\
Innovation Description: {description}\n\n\
Provide analysis covering:\n\
- Market opportunity and addressable market size\n\
- Competitive differentiation and advantages\n\
- Potential revenue impact and timeline\n\
- Market adoption challenges and barriers\n\
- Impact on company valuation and stock price\n\
- Competitive response expectations\n\n\
Deliver a concise but comprehensive analysis (75-100 words) focusing on investment implications."
    )
}

fn sector_prompt(sector: &str, timeframe: &str) -> String {
    format!(
        "Analyze current trends and outlook for the {sector} sector over the {timeframe} timeframe.\n\n\
Include analysis of:\n\
- Key growth drivers and headwinds\n\
- Regulatory environment and policy impacts\n\
- Technological disruptions and innovations\n\
- Market valuations and investor sentiment\n\
- Top performers and laggards in the sector\n\
- Investment opportunities and risks\n\n\
Provide a comprehensive sector analysis (150-200 words) with actionable insights for investors."
    )
}
