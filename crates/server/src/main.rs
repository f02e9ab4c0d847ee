//! History Atlas API server.

use clap::Parser;
use history_atlas_server::config::Config;
use history_atlas_telemetry::init_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; the environment may already be populated.
    let _ = dotenvy::dotenv();
    let config = Config::parse();

    init_logging(config.log_level.as_deref())?;
    history_atlas_server::serve(config).await
}
