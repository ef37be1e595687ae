use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use stocklens_core::analysis::AnalysisGateway;
use stocklens_core::dashboard::alerts::evaluate_alerts;
use stocklens_core::dashboard::portfolio::{valuate, PortfolioValuation};
use stocklens_core::dashboard::prices::PriceSnapshot;
use stocklens_core::dashboard::{Dashboard, InvalidInput, NewAlert, NewHolding};
use stocklens_core::domain::company::{ChartTimeRange, Company, Stock};
use stocklens_core::domain::dashboard::{PortfolioItem, UserAlert};
use stocklens_core::domain::news::MarketEvent;
use stocklens_core::domain::recommendation::{Recommendation, RiskAssessment};
use stocklens_core::market::catalog::Catalog;
use stocklens_core::market::provider::MarketDataProvider;
use stocklens_core::session::{DetailsLoader, PaneView, SlotState, ViewState};
use tokio::sync::{Mutex, RwLock};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    catalog: Catalog,
    provider: Arc<dyn MarketDataProvider>,
    gateway: AnalysisGateway,
    view: Arc<ViewState>,
    dashboard: Arc<Mutex<Dashboard>>,
    prices: Arc<RwLock<PriceSnapshot>>,
}

impl AppState {
    pub fn new(
        catalog: Catalog,
        provider: Arc<dyn MarketDataProvider>,
        gateway: AnalysisGateway,
        dashboard: Dashboard,
    ) -> Self {
        let loader = DetailsLoader::new(provider.clone(), gateway.clone());
        Self {
            catalog,
            provider,
            gateway,
            view: Arc::new(ViewState::new(loader)),
            dashboard: Arc::new(Mutex::new(dashboard)),
            prices: Arc::new(RwLock::new(PriceSnapshot::default())),
        }
    }

    async fn stock(&self, symbol: &str) -> Result<Stock, StatusCode> {
        self.provider
            .fetch_stock_data(symbol, ChartTimeRange::default())
            .await
            .map_err(internal)?
            .ok_or(StatusCode::NOT_FOUND)
    }

    /// Snapshot covering `symbols`. Prices already captured this cycle are reused.
    async fn prices_for(&self, symbols: &[String]) -> PriceSnapshot {
        let mut prices = self.prices.write().await;
        prices
            .extend_missing(self.provider.as_ref(), symbols.iter().map(String::as_str))
            .await;
        prices.clone()
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/stocks", get(search_stocks))
        .route("/panes/:pane", get(get_pane))
        .route("/panes/:pane/select", post(select_stock))
        .route("/panes/:pane/range", post(set_time_range))
        .route("/stocks/:symbol/similar", get(similar_stocks))
        .route("/stocks/:symbol/recommendation", get(recommendation))
        .route("/stocks/:symbol/risk", get(risk_assessment))
        .route("/sectors/:sector/trends", get(sector_trends))
        .route("/events", get(market_events))
        .route("/events/:id/impact", post(event_impact))
        .route("/watchlist", get(get_watchlist).post(add_to_watchlist))
        .route("/watchlist/:symbol", delete(remove_from_watchlist))
        .route("/alerts", get(get_alerts).post(add_alert))
        .route("/alerts/triggered", get(triggered_alerts))
        .route("/alerts/:id", delete(remove_alert))
        .route("/alerts/:id/toggle", post(toggle_alert))
        .route("/portfolio", get(get_portfolio).post(add_holding))
        .route("/portfolio/:symbol", delete(remove_holding))
        .route("/prices/refresh", post(refresh_prices))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

fn internal(e: anyhow::Error) -> StatusCode {
    sentry_anyhow::capture_anyhow(&e);
    tracing::error!(error = %format!("{e:#}"), "request failed");
    StatusCode::INTERNAL_SERVER_ERROR
}

fn rejected(e: anyhow::Error) -> StatusCode {
    tracing::warn!(error = %format!("{e:#}"), "request rejected");
    StatusCode::BAD_REQUEST
}

/// Refused input is a 400; anything else from the dashboard is a storage failure.
fn dashboard_error(e: anyhow::Error) -> StatusCode {
    if e.downcast_ref::<InvalidInput>().is_some() {
        rejected(e)
    } else {
        internal(e)
    }
}

async fn healthz() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    #[serde(default)]
    q: String,
}

async fn search_stocks(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Json<SlotState<Vec<Company>>> {
    Json(state.view.search(&query.q).await)
}

async fn get_pane(
    State(state): State<AppState>,
    Path(pane): Path<String>,
) -> Result<Json<PaneView>, StatusCode> {
    let view = state.view.snapshot(&pane).map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct SelectBody {
    symbol: String,
    #[serde(default)]
    range: Option<ChartTimeRange>,
}

async fn select_stock(
    State(state): State<AppState>,
    Path(pane): Path<String>,
    Json(body): Json<SelectBody>,
) -> Result<Json<PaneView>, StatusCode> {
    let view = state
        .view
        .select(&pane, &body.symbol, body.range)
        .await
        .map_err(rejected)?;
    Ok(Json(view))
}

#[derive(Debug, Deserialize)]
struct RangeBody {
    range: ChartTimeRange,
}

async fn set_time_range(
    State(state): State<AppState>,
    Path(pane): Path<String>,
    Json(body): Json<RangeBody>,
) -> Result<Json<PaneView>, StatusCode> {
    let view = state
        .view
        .set_time_range(&pane, body.range)
        .await
        .map_err(rejected)?;
    Ok(Json(view))
}

async fn similar_stocks(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<Vec<Company>>, StatusCode> {
    let company = state.catalog.find(&symbol).ok_or(StatusCode::NOT_FOUND)?;
    let similar = state
        .gateway
        .suggest_similar_stocks(company, &state.catalog)
        .await;
    Ok(Json(similar))
}

#[derive(Debug, Deserialize)]
struct RecommendationQuery {
    market: Option<String>,
}

async fn recommendation(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<RecommendationQuery>,
) -> Result<Json<Recommendation>, StatusCode> {
    let stock = state.stock(&symbol).await?;
    let rec = state
        .gateway
        .recommend(&stock, query.market.as_deref())
        .await;
    Ok(Json(rec))
}

async fn risk_assessment(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<Json<RiskAssessment>, StatusCode> {
    let stock = state.stock(&symbol).await?;
    Ok(Json(state.gateway.assess_risk(&stock).await))
}

#[derive(Debug, Deserialize)]
struct SectorQuery {
    timeframe: Option<String>,
}

#[derive(Debug, Serialize)]
struct SectorTrends {
    sector: String,
    analysis: String,
}

async fn sector_trends(
    State(state): State<AppState>,
    Path(sector): Path<String>,
    Query(query): Query<SectorQuery>,
) -> Json<SectorTrends> {
    let analysis = state
        .gateway
        .sector_trends(&sector, query.timeframe.as_deref())
        .await;
    Json(SectorTrends { sector, analysis })
}

async fn market_events(State(state): State<AppState>) -> Result<Json<Vec<MarketEvent>>, StatusCode> {
    let events = state.provider.fetch_market_events().await.map_err(internal)?;
    Ok(Json(events))
}

#[derive(Debug, Deserialize)]
struct ImpactBody {
    symbol: String,
}

async fn event_impact(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ImpactBody>,
) -> Result<Json<MarketEvent>, StatusCode> {
    let events = state.provider.fetch_market_events().await.map_err(internal)?;
    let event = events
        .into_iter()
        .find(|e| e.id == id)
        .ok_or(StatusCode::NOT_FOUND)?;
    Ok(Json(
        state.gateway.analyze_event_impact(&event, &body.symbol).await,
    ))
}

async fn get_watchlist(State(state): State<AppState>) -> Json<Vec<Company>> {
    Json(state.dashboard.lock().await.watchlist().to_vec())
}

#[derive(Debug, Deserialize)]
struct WatchBody {
    symbol: String,
}

async fn add_to_watchlist(
    State(state): State<AppState>,
    Json(body): Json<WatchBody>,
) -> Result<(StatusCode, Json<Vec<Company>>), StatusCode> {
    let mut dashboard = state.dashboard.lock().await;
    let added = dashboard.add_to_watchlist(&body.symbol).map_err(dashboard_error)?;
    let status = if added { StatusCode::CREATED } else { StatusCode::OK };
    Ok((status, Json(dashboard.watchlist().to_vec())))
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let removed = state
        .dashboard
        .lock()
        .await
        .remove_from_watchlist(&symbol)
        .map_err(dashboard_error)?;
    Ok(if removed { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND })
}

async fn get_alerts(State(state): State<AppState>) -> Json<Vec<UserAlert>> {
    Json(state.dashboard.lock().await.alerts().to_vec())
}

async fn add_alert(
    State(state): State<AppState>,
    Json(body): Json<NewAlert>,
) -> Result<(StatusCode, Json<UserAlert>), StatusCode> {
    let alert = state
        .dashboard
        .lock()
        .await
        .add_alert(body)
        .map_err(dashboard_error)?;
    Ok((StatusCode::CREATED, Json(alert)))
}

async fn remove_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let removed = state
        .dashboard
        .lock()
        .await
        .remove_alert(&id)
        .map_err(dashboard_error)?;
    Ok(if removed { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND })
}

async fn toggle_alert(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserAlert>, StatusCode> {
    state
        .dashboard
        .lock()
        .await
        .toggle_alert(&id)
        .map_err(dashboard_error)?
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn triggered_alerts(State(state): State<AppState>) -> Json<Vec<UserAlert>> {
    let alerts = state.dashboard.lock().await.alerts().to_vec();
    let symbols: Vec<String> = alerts.iter().map(|a| a.stock_symbol.clone()).collect();
    let prices = state.prices_for(&symbols).await;
    Json(
        evaluate_alerts(&alerts, &prices)
            .into_iter()
            .cloned()
            .collect(),
    )
}

async fn get_portfolio(State(state): State<AppState>) -> Json<PortfolioValuation> {
    let portfolio = state.dashboard.lock().await.portfolio().to_vec();
    let symbols: Vec<String> = portfolio.iter().map(|p| p.stock_symbol.clone()).collect();
    let prices = state.prices_for(&symbols).await;
    Json(valuate(&portfolio, &prices))
}

async fn add_holding(
    State(state): State<AppState>,
    Json(body): Json<NewHolding>,
) -> Result<(StatusCode, Json<PortfolioItem>), StatusCode> {
    let today = Utc::now().date_naive();
    let item = state
        .dashboard
        .lock()
        .await
        .add_holding(body, today)
        .map_err(dashboard_error)?;
    Ok((StatusCode::CREATED, Json(item)))
}

async fn remove_holding(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> Result<StatusCode, StatusCode> {
    let removed = state
        .dashboard
        .lock()
        .await
        .remove_holding(&symbol)
        .map_err(dashboard_error)?;
    Ok(if removed { StatusCode::NO_CONTENT } else { StatusCode::NOT_FOUND })
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PriceCycle {
    captured_at: Option<DateTime<Utc>>,
    prices: HashMap<String, f64>,
}

/// Starts a new price cycle for every symbol the dashboard tracks.
async fn refresh_prices(State(state): State<AppState>) -> Json<PriceCycle> {
    let symbols: Vec<String> = {
        let dashboard = state.dashboard.lock().await;
        dashboard
            .alerts()
            .iter()
            .map(|a| a.stock_symbol.clone())
            .chain(dashboard.portfolio().iter().map(|p| p.stock_symbol.clone()))
            .chain(dashboard.watchlist().iter().map(|c| c.symbol.clone()))
            .collect()
    };

    let snapshot =
        PriceSnapshot::capture(state.provider.as_ref(), symbols.iter().map(String::as_str)).await;
    let cycle = PriceCycle {
        captured_at: snapshot.captured_at(),
        prices: symbols
            .iter()
            .filter_map(|s| snapshot.price(s).map(|p| (s.clone(), p)))
            .collect(),
    };
    *state.prices.write().await = snapshot;
    tracing::info!(symbols = symbols.len(), "price snapshot refreshed");
    Json(cycle)
}
