//! Binary entrypoint for the Stagelink API server.
use stagelink_api::{run, ServerConfig};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Listen address can be overridden with STAGELINK_ADDR
    run(ServerConfig::from_env()).await
}
