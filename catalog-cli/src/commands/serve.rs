use anyhow::{Context, Result};
use catalog_service::{observability::init_tracing, server, state::AppState};
use std::path::Path;

pub async fn execute(config_path: Option<&Path>, port: Option<u16>) -> Result<()> {
    let mut config = super::load_config(config_path)?;
    if let Some(port) = port {
        config.service.port = port;
    }

    init_tracing(&config).context("Failed to initialize tracing")?;

    let state = AppState::build(config)
        .await
        .context("Failed to initialize service state")?;

    server::serve(state).await.context("Server error")
}
