mod api;
mod dashboard;
mod problem;
mod reconcile;
mod router;
mod telemetry;

use std::net::SocketAddr;

use anniversary_core::{AnniversaryPolicy, IssuanceMode};
use anniversary_storage::Database;
use anniversary_util::{load_env_file, AppConfig};
use tracing::info;

use crate::reconcile::Reconciler;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    load_env_file();
    let config = AppConfig::from_env()?;

    telemetry::init_tracing(&config)?;
    let metrics = telemetry::init_metrics()?;

    let database = Database::connect(&config.database_url).await?;
    database.run_migrations().await?;
    info!(stage = "app", database_url = %config.database_url, "database ready");

    let mode = IssuanceMode::from_backfill_flag(config.backfill_certificates);
    let timezone = config.timezone;
    let reconciler = Reconciler::new(database.clone(), AnniversaryPolicy::new(mode), timezone);
    info!(
        stage = "app",
        mode = mode.as_str(),
        timezone = timezone.name(),
        today = %reconciler.today(),
        "anniversary reconciler configured"
    );

    let state = router::AppState::new(metrics, database, reconciler);

    let addr: SocketAddr = config.bind_addr;
    info!(stage = "app", %addr, env = %config.environment.as_str(), "starting HTTP server");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router::app_router(state))
        .await
        .map_err(|err| err.into())
}
