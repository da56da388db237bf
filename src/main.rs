mod business_logic;
mod config;
mod errors;
mod handlers;
mod models;
mod services;
mod state;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use axum::{routing::get, Router};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::AppConfig;
use crate::handlers::scan::{get_scan_status, get_scan_stream};
use crate::services::bybit::BybitClient;
use crate::services::exchange::Notifier;
use crate::services::scan_state::new_shared_state;
use crate::services::scanner::ScanService;
use crate::services::telegram::{LogNotifier, TelegramNotifier};
use crate::state::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::health::health,
        handlers::scan::get_scan_status,
        handlers::scan::get_scan_stream
    ),
    components(schemas(
        models::health::HealthResponse,
        models::scan::ScanSnapshot,
        models::scan::InstrumentStatus,
        errors::ErrorResponse
    ))
)]
struct ApiDoc;

fn init_tracing(log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "structscan=info".into());

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "structscan.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(file_layer)
        .init();

    guard
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let _log_guard = init_tracing(config.log_dir.as_deref());

    tracing::info!(
        "Scanning {} {} markets above turnover {}",
        config.exchange.category,
        config.exchange.quote_asset,
        config.scan.min_turnover
    );

    let telegram = match &config.telegram {
        Some(settings) => Some(TelegramNotifier::new(settings)?),
        None => None,
    };

    match telegram {
        Some(notifier) => run(config, notifier).await,
        None => {
            tracing::warn!("TELEGRAM_BOT_TOKEN or CHAT_ID not set, alerts go to the log only");
            run(config, LogNotifier).await
        }
    }
}

async fn run<N: Notifier + 'static>(config: AppConfig, notifier: N) -> anyhow::Result<()> {
    let client = Arc::new(BybitClient::new(&config.exchange)?);
    let scan_state = new_shared_state();

    let service = ScanService::new(
        Arc::clone(&client),
        BybitClient::clone(&client),
        notifier,
        config.scanner.clone(),
        config.scan.clone(),
        scan_state.clone(),
    );

    // Cron-style invocation: one cycle, then exit
    if config.scan_interval_secs == 0 {
        let summary = service.run_cycle().await;
        tracing::info!("Single scan finished: {:?}", summary);
        return Ok(());
    }

    let every = Duration::from_secs(config.scan_interval_secs);
    tokio::spawn(async move {
        tracing::info!("Structure scanner active, scanning every {}s", every.as_secs());
        service.run(every).await;
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/scan", get(get_scan_status))
        .route("/scan/stream", get(get_scan_stream))
        .with_state(AppState { scan_state })
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.bind_addr))?;
    tracing::info!("Server running on http://{}", config.bind_addr);
    tracing::info!("Swagger UI: http://{}/swagger-ui", config.bind_addr);
    axum::serve(listener, app).await.context("server error")?;

    Ok(())
}
