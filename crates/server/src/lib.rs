//! HTTP server for the History Atlas API.

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;

use config::Config;
use history_atlas_assembly::AtlasService;
use history_atlas_db::RestCollectionClient;
use history_atlas_telemetry::Metrics;
use std::sync::Arc;
use tracing::info;

/// State shared by every request handler.
#[derive(Clone)]
pub struct AppState {
    pub service: AtlasService,
    pub metrics: Metrics,
}

/// Connect to the store and serve the API until shutdown is requested.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    info!("Starting History Atlas API");

    let metrics = Metrics::new()?;
    let client = RestCollectionClient::new(
        &config.supabase_url,
        &config.supabase_anon_key,
        config.request_timeout(),
        metrics.clone(),
    )?;
    let service = AtlasService::new(Arc::new(client), metrics.clone(), config.fetch_concurrency);

    let app = routes::router(AppState { service, metrics }, config.request_timeout());

    let addr = config.listen_address();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
