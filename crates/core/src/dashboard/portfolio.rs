use crate::dashboard::prices::PriceSnapshot;
use crate::domain::dashboard::PortfolioItem;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HoldingValuation {
    #[serde(flatten)]
    pub item: PortfolioItem,
    pub current_price: f64,
    /// False when no snapshot price existed and the purchase price was used instead.
    pub priced: bool,
    pub value: f64,
    pub cost_basis: f64,
    pub gain_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioValuation {
    pub holdings: Vec<HoldingValuation>,
    pub total_value: f64,
    pub total_cost: f64,
    pub total_gain_loss: f64,
}

pub fn valuate(portfolio: &[PortfolioItem], prices: &PriceSnapshot) -> PortfolioValuation {
    let holdings: Vec<HoldingValuation> = portfolio
        .iter()
        .map(|item| {
            let snapshot_price = prices.price(&item.stock_symbol);
            let current_price = snapshot_price.unwrap_or(item.purchase_price);
            let value = item.shares * current_price;
            let cost_basis = item.shares * item.purchase_price;
            HoldingValuation {
                item: item.clone(),
                current_price,
                priced: snapshot_price.is_some(),
                value,
                cost_basis,
                gain_loss: value - cost_basis,
            }
        })
        .collect();

    let total_value = holdings.iter().map(|h| h.value).sum();
    let total_cost = holdings.iter().map(|h| h.cost_basis).sum();
    PortfolioValuation {
        holdings,
        total_value,
        total_cost,
        total_gain_loss: total_value - total_cost,
    }
}
