use anyhow::bail;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Static catalog entry. `symbol` is the unique key across the system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Company {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub sector: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub market_cap: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pe_ratio: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revenue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockDataPoint {
    pub date: NaiveDate,
    pub price: f64,
    pub volume: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    #[serde(flatten)]
    pub company: Company,
    pub historical_data: Vec<StockDataPoint>,
    pub current_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price_change_percent: Option<f64>,
}

impl Stock {
    pub fn symbol(&self) -> &str {
        &self.company.symbol
    }

    pub fn name(&self) -> &str {
        &self.company.name
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ChartTimeRange {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[default]
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "5Y")]
    FiveYears,
    #[serde(rename = "MAX")]
    Max,
}

impl ChartTimeRange {
    /// Number of daily points generated for the range. `Max` is capped at ten years.
    pub fn days(self) -> u32 {
        match self {
            Self::OneMonth => 30,
            Self::ThreeMonths => 90,
            Self::SixMonths => 180,
            Self::OneYear => 365,
            Self::FiveYears => 365 * 5,
            Self::Max => 365 * 10,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneMonth => "1M",
            Self::ThreeMonths => "3M",
            Self::SixMonths => "6M",
            Self::OneYear => "1Y",
            Self::FiveYears => "5Y",
            Self::Max => "MAX",
        }
    }
}

impl fmt::Display for ChartTimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartTimeRange {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_uppercase().as_str() {
            "1M" => Self::OneMonth,
            "3M" => Self::ThreeMonths,
            "6M" => Self::SixMonths,
            "1Y" => Self::OneYear,
            "5Y" => Self::FiveYears,
            "MAX" => Self::Max,
            other => bail!("unknown chart time range: {other}"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn stock_flattens_company_fields() {
        let v = json!({
            "id": "1",
            "symbol": "AAPL",
            "name": "Apple Inc.",
            "sector": "Technology",
            "description": "Phones",
            "peRatio": 28.5,
            "historicalData": [{"date": "2024-07-01", "price": 170.0, "volume": 600000}],
            "currentPrice": 170.0
        });

        let stock: Stock = serde_json::from_value(v).unwrap();
        assert_eq!(stock.symbol(), "AAPL");
        assert_eq!(stock.company.pe_ratio, Some(28.5));
        assert_eq!(stock.historical_data.len(), 1);
        assert_eq!(stock.price_change_percent, None);
    }

    #[test]
    fn time_range_parses_labels() {
        assert_eq!("1y".parse::<ChartTimeRange>().unwrap(), ChartTimeRange::OneYear);
        assert_eq!("MAX".parse::<ChartTimeRange>().unwrap().days(), 3650);
        assert!("2W".parse::<ChartTimeRange>().is_err());
        assert_eq!(
            serde_json::to_value(ChartTimeRange::SixMonths).unwrap(),
            json!("6M")
        );
    }
}
