use crate::domain::company::Company;
use std::sync::Arc;

/// Immutable reference table of known companies. Cloning shares the same table.
#[derive(Debug, Clone)]
pub struct Catalog {
    companies: Arc<[Company]>,
}

impl Catalog {
    pub fn new(companies: Vec<Company>) -> Self {
        Self {
            companies: companies.into(),
        }
    }

    /// Large-cap US names used by the mock market data.
    pub fn builtin() -> Self {
        Self::new(
            BUILTIN
                .iter()
                .enumerate()
                .map(|(i, e)| Company {
                    id: (i + 1).to_string(),
                    symbol: e.symbol.to_string(),
                    name: e.name.to_string(),
                    sector: e.sector.to_string(),
                    description: e.description.to_string(),
                    market_cap: Some(e.market_cap.to_string()),
                    pe_ratio: Some(e.pe_ratio),
                    revenue: Some(e.revenue.to_string()),
                    logo_url: None,
                })
                .collect(),
        )
    }

    pub fn companies(&self) -> &[Company] {
        &self.companies
    }

    pub fn len(&self) -> usize {
        self.companies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.companies.is_empty()
    }

    /// Case-insensitive symbol lookup.
    pub fn find(&self, symbol: &str) -> Option<&Company> {
        let symbol = symbol.trim();
        self.companies
            .iter()
            .find(|c| c.symbol.eq_ignore_ascii_case(symbol))
    }

    /// Substring match on name or symbol, case-insensitive. A blank query returns everything.
    pub fn search(&self, query: &str) -> Vec<Company> {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return self.companies.to_vec();
        }
        self.companies
            .iter()
            .filter(|c| {
                c.name.to_lowercase().contains(&query) || c.symbol.to_lowercase().contains(&query)
            })
            .cloned()
            .collect()
    }

    pub fn sector_peers(&self, symbol: &str) -> Vec<&Company> {
        let Some(company) = self.find(symbol) else {
            return Vec::new();
        };
        self.companies
            .iter()
            .filter(|c| c.sector == company.sector && c.symbol != company.symbol)
            .collect()
    }
}

struct BuiltinEntry {
    symbol: &'static str,
    name: &'static str,
    sector: &'static str,
    description: &'static str,
    market_cap: &'static str,
    pe_ratio: f64,
    revenue: &'static str,
}

const BUILTIN: &[BuiltinEntry] = &[
    BuiltinEntry {
        symbol: "AAPL",
        name: "Apple Inc.",
        sector: "Technology",
        description: "Designs consumer electronics, software and online services.",
        market_cap: "2.9T",
        pe_ratio: 28.5,
        revenue: "383B",
    },
    BuiltinEntry {
        symbol: "MSFT",
        name: "Microsoft Corporation",
        sector: "Technology",
        description: "Develops software, cloud infrastructure and productivity services.",
        market_cap: "3.2T",
        pe_ratio: 35.1,
        revenue: "245B",
    },
    BuiltinEntry {
        symbol: "GOOGL",
        name: "Alphabet Inc.",
        sector: "Technology",
        description: "Operates Google search, advertising, YouTube and Google Cloud.",
        market_cap: "2.1T",
        pe_ratio: 24.3,
        revenue: "307B",
    },
    BuiltinEntry {
        symbol: "AMZN",
        name: "Amazon.com, Inc.",
        sector: "Consumer Cyclical",
        description: "Runs an online marketplace, logistics network and AWS cloud platform.",
        market_cap: "1.9T",
        pe_ratio: 42.7,
        revenue: "575B",
    },
    BuiltinEntry {
        symbol: "TSLA",
        name: "Tesla, Inc.",
        sector: "Automotive",
        description: "Manufactures electric vehicles, batteries and energy storage systems.",
        market_cap: "780B",
        pe_ratio: 62.0,
        revenue: "97B",
    },
    BuiltinEntry {
        symbol: "NVDA",
        name: "NVIDIA Corporation",
        sector: "Technology",
        description: "Designs GPUs and accelerated computing platforms for AI and graphics.",
        market_cap: "3.0T",
        pe_ratio: 55.2,
        revenue: "61B",
    },
    BuiltinEntry {
        symbol: "META",
        name: "Meta Platforms, Inc.",
        sector: "Communication Services",
        description: "Operates Facebook, Instagram and WhatsApp and builds mixed-reality devices.",
        market_cap: "1.3T",
        pe_ratio: 26.8,
        revenue: "135B",
    },
    BuiltinEntry {
        symbol: "JPM",
        name: "JPMorgan Chase & Co.",
        sector: "Financial Services",
        description: "Provides investment banking, consumer banking and asset management.",
        market_cap: "570B",
        pe_ratio: 11.9,
        revenue: "158B",
    },
    BuiltinEntry {
        symbol: "GS",
        name: "The Goldman Sachs Group, Inc.",
        sector: "Financial Services",
        description: "Global investment banking, securities and investment management firm.",
        market_cap: "150B",
        pe_ratio: 15.4,
        revenue: "46B",
    },
    BuiltinEntry {
        symbol: "JNJ",
        name: "Johnson & Johnson",
        sector: "Healthcare",
        description: "Develops pharmaceuticals and medical technology products.",
        market_cap: "380B",
        pe_ratio: 15.8,
        revenue: "85B",
    },
];
