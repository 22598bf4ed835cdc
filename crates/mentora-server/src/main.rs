use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::middleware as axum_mw;
use axum::routing::{get, post};
use jiff::Timestamp;
use tower_http::cors::{Any, CorsLayer};
use tracing_subscriber::EnvFilter;

mod error;
mod middleware;
mod routes;
mod state;

use mentora_export::registry::Registry;
use mentora_export::styles::DocumentStyles;
use mentora_jobs::progress::ProgressBoard;
use mentora_jobs::queue::start_workers;
use mentora_jobs::service::ReportService;
use mentora_jobs::{JobContext, RunnerConfig, reaper};
use mentora_store::memory::MemoryAnalytics;
use mentora_store::reports::ReportStore;
use state::AppState;

fn env_u64(name: &str, default: u64) -> u64 {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Structured JSON logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let data_dir = env::var("MENTORA_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
    let bind = env::var("MENTORA_BIND").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let workers = env_u64("MENTORA_WORKERS", 4) as usize;
    let retention = Duration::from_secs(env_u64("MENTORA_RETENTION_HOURS", 24) * 3600);
    let stalled_after = Duration::from_secs(env_u64("MENTORA_STALLED_MINUTES", 30) * 60);
    let sweep_every = Duration::from_secs(env_u64("MENTORA_SWEEP_MINUTES", 15) * 60);

    // An incomplete renderer registry is a boot failure, not a runtime one.
    let registry = Registry::standard(DocumentStyles::default())?;

    let ctx = JobContext {
        store: Arc::new(ReportStore::open(&data_dir).await?),
        // TODO: replace with the relational AnalyticsSource once the
        // analytics database connector lands
        analytics: Arc::new(MemoryAnalytics::default()),
        registry: Arc::new(registry),
        progress: ProgressBoard::new(),
        config: RunnerConfig::default(),
    };

    let (queue, _dispatcher) = start_workers(ctx.clone(), workers);
    let service = Arc::new(ReportService::new(ctx.clone(), queue));

    // Periodic reconciliation: fail stalled runs, expire old artifacts.
    let sweep_store = Arc::clone(&ctx.store);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(sweep_every);
        loop {
            ticker.tick().await;
            let now = Timestamp::now();
            if let Err(e) = reaper::sweep_stalled(&sweep_store, stalled_after, now).await {
                tracing::warn!(error = %e, "stalled sweep failed");
            }
            if let Err(e) = reaper::sweep_expired(&sweep_store, retention, now).await {
                tracing::warn!(error = %e, "retention sweep failed");
            }
        }
    });

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let protected = Router::new()
        .route("/reports", post(routes::reports::generate_report))
        .route("/reports", get(routes::reports::list_reports))
        .route("/reports/{id}", get(routes::reports::get_report))
        .route("/reports/{id}/progress", get(routes::reports::get_progress))
        .route(
            "/reports/{id}/download",
            get(routes::reports::download_report),
        )
        .layer(axum_mw::from_fn(middleware::auth::require_auth));

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .merge(protected)
        .layer(cors)
        .with_state(AppState { service });

    tracing::info!(%bind, %data_dir, workers, "mentora report service starting");
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
