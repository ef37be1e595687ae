//! Watchlist, alerts and portfolio. Lists are read once at startup and persisted on every
//! change; they are independent of the enrichment pipeline.

pub mod alerts;
pub mod portfolio;
pub mod prices;
pub mod store;

use crate::domain::company::Company;
use crate::domain::dashboard::{AlertCondition, AlertTarget, PortfolioItem, UserAlert};
use crate::market::catalog::Catalog;
use anyhow::{bail, ensure};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use store::{ListKey, ListStore};

/// Input the dashboard refuses. Any other error from a `Dashboard` operation is a storage
/// failure, and the in-memory lists are left as they were.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidInput(pub String);

impl fmt::Display for InvalidInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvalidInput {}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAlert {
    pub stock_symbol: String,
    pub condition: AlertCondition,
    pub target_value: AlertTarget,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewHolding {
    pub stock_symbol: String,
    pub shares: f64,
    pub purchase_price: f64,
}

#[derive(Debug)]
pub struct Dashboard {
    store: ListStore,
    catalog: Catalog,
    watchlist: Vec<Company>,
    alerts: Vec<UserAlert>,
    portfolio: Vec<PortfolioItem>,
}

/// Writes `next` and only then replaces `current` with it.
fn persist<T: Serialize>(
    store: &ListStore,
    key: ListKey,
    current: &mut Vec<T>,
    next: Vec<T>,
) -> anyhow::Result<()> {
    store.save(key, &next)?;
    *current = next;
    Ok(())
}

impl Dashboard {
    pub fn load(store: ListStore, catalog: Catalog) -> anyhow::Result<Self> {
        let watchlist: Vec<Company> = store.load(ListKey::Watchlist)?;
        let alerts: Vec<UserAlert> = store.load(ListKey::Alerts)?;
        let portfolio: Vec<PortfolioItem> = store.load(ListKey::Portfolio)?;
        tracing::info!(
            dir = %store.dir().display(),
            watchlist = watchlist.len(),
            alerts = alerts.len(),
            holdings = portfolio.len(),
            "dashboard lists loaded"
        );
        Ok(Self {
            store,
            catalog,
            watchlist,
            alerts,
            portfolio,
        })
    }

    fn known_symbol(&self, symbol: &str) -> anyhow::Result<&Company> {
        match self.catalog.find(symbol) {
            Some(company) => Ok(company),
            None => bail!(InvalidInput(format!("unknown symbol: {symbol}"))),
        }
    }

    pub fn watchlist(&self) -> &[Company] {
        &self.watchlist
    }

    /// Returns false when the symbol is already watched.
    pub fn add_to_watchlist(&mut self, symbol: &str) -> anyhow::Result<bool> {
        let company = self.known_symbol(symbol)?.clone();
        if self.watchlist.iter().any(|c| c.symbol == company.symbol) {
            return Ok(false);
        }
        let mut next = self.watchlist.clone();
        next.push(company);
        persist(&self.store, ListKey::Watchlist, &mut self.watchlist, next)?;
        Ok(true)
    }

    pub fn remove_from_watchlist(&mut self, symbol: &str) -> anyhow::Result<bool> {
        let symbol = symbol.trim();
        let next: Vec<Company> = self
            .watchlist
            .iter()
            .filter(|c| !c.symbol.eq_ignore_ascii_case(symbol))
            .cloned()
            .collect();
        if next.len() == self.watchlist.len() {
            return Ok(false);
        }
        persist(&self.store, ListKey::Watchlist, &mut self.watchlist, next)?;
        Ok(true)
    }

    pub fn alerts(&self) -> &[UserAlert] {
        &self.alerts
    }

    /// New alerts start active.
    pub fn add_alert(&mut self, new: NewAlert) -> anyhow::Result<UserAlert> {
        let symbol = self.known_symbol(&new.stock_symbol)?.symbol.clone();
        match (new.condition, &new.target_value) {
            (AlertCondition::PriceAbove | AlertCondition::PriceBelow, AlertTarget::Price(p)) => {
                ensure!(
                    p.is_finite() && *p > 0.0,
                    InvalidInput("price target must be positive".to_string())
                );
            }
            (AlertCondition::PriceAbove | AlertCondition::PriceBelow, AlertTarget::Label(_)) => {
                bail!(InvalidInput("price alerts need a numeric target".to_string()));
            }
            (AlertCondition::SentimentChange, _) => {}
        }

        let alert = UserAlert {
            id: uuid::Uuid::new_v4().to_string(),
            stock_symbol: symbol,
            condition: new.condition,
            target_value: new.target_value,
            is_active: true,
        };
        let mut next = self.alerts.clone();
        next.push(alert.clone());
        persist(&self.store, ListKey::Alerts, &mut self.alerts, next)?;
        Ok(alert)
    }

    pub fn remove_alert(&mut self, id: &str) -> anyhow::Result<bool> {
        let next: Vec<UserAlert> = self.alerts.iter().filter(|a| a.id != id).cloned().collect();
        if next.len() == self.alerts.len() {
            return Ok(false);
        }
        persist(&self.store, ListKey::Alerts, &mut self.alerts, next)?;
        Ok(true)
    }

    /// Flips `is_active`; `None` when no alert has that id.
    pub fn toggle_alert(&mut self, id: &str) -> anyhow::Result<Option<UserAlert>> {
        let mut next = self.alerts.clone();
        let Some(alert) = next.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        alert.is_active = !alert.is_active;
        let toggled = alert.clone();
        persist(&self.store, ListKey::Alerts, &mut self.alerts, next)?;
        Ok(Some(toggled))
    }

    pub fn portfolio(&self) -> &[PortfolioItem] {
        &self.portfolio
    }

    pub fn add_holding(
        &mut self,
        new: NewHolding,
        purchase_date: NaiveDate,
    ) -> anyhow::Result<PortfolioItem> {
        let symbol = self.known_symbol(&new.stock_symbol)?.symbol.clone();
        ensure!(
            new.shares.is_finite() && new.shares > 0.0,
            InvalidInput("shares must be positive".to_string())
        );
        ensure!(
            new.purchase_price.is_finite() && new.purchase_price > 0.0,
            InvalidInput("purchase price must be positive".to_string())
        );

        let item = PortfolioItem {
            stock_symbol: symbol,
            shares: new.shares,
            purchase_price: new.purchase_price,
            purchase_date,
        };
        let mut next = self.portfolio.clone();
        next.push(item.clone());
        persist(&self.store, ListKey::Portfolio, &mut self.portfolio, next)?;
        Ok(item)
    }

    /// Removes every lot held in `symbol`.
    pub fn remove_holding(&mut self, symbol: &str) -> anyhow::Result<bool> {
        let symbol = symbol.trim();
        let next: Vec<PortfolioItem> = self
            .portfolio
            .iter()
            .filter(|p| !p.stock_symbol.eq_ignore_ascii_case(symbol))
            .cloned()
            .collect();
        if next.len() == self.portfolio.len() {
            return Ok(false);
        }
        persist(&self.store, ListKey::Portfolio, &mut self.portfolio, next)?;
        Ok(true)
    }
}
