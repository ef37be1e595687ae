use std::sync::Arc;

use stocklens_core::analysis::AnalysisGateway;
use stocklens_core::config::Settings;
use stocklens_core::dashboard::store::ListStore;
use stocklens_core::dashboard::Dashboard;
use stocklens_core::llm::gemini::GeminiClient;
use stocklens_core::llm::offline::OfflineClient;
use stocklens_core::llm::GenerationClient;
use stocklens_core::market::catalog::Catalog;
use stocklens_core::market::provider::MockMarketData;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod routes;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .with(sentry_tracing::layer())
        .init();

    let client: Arc<dyn GenerationClient> = match GeminiClient::from_settings(&settings) {
        Ok(client) => {
            tracing::info!(model = client.model(), "using Gemini generation endpoint");
            Arc::new(client)
        }
        Err(e) => {
            sentry_anyhow::capture_anyhow(&e);
            tracing::error!(error = %e, "generation endpoint unavailable; starting API in degraded mode");
            Arc::new(OfflineClient)
        }
    };

    let catalog = Catalog::builtin();
    let provider = Arc::new(MockMarketData::new(catalog.clone()));
    let dashboard = Dashboard::load(ListStore::open(&settings.data_dir)?, catalog.clone())?;
    let gateway = AnalysisGateway::new(client);
    let analysis_provider = gateway.provider();
    let state = routes::AppState::new(catalog, provider, gateway, dashboard);

    let app = routes::router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], settings.port));
    tracing::info!(%addr, provider = ?analysis_provider, "api listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}

fn init_sentry(settings: &Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
