use anyhow::{anyhow, Context, Result};
use tracing_subscriber::EnvFilter;

use dualwrite_server::{bootstrap, run_server, AppState, DualDbConfig, ServerConfig};

fn init_tracing() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing().ok();

    // Optional; real deployments set the variables directly
    if let Ok(path) = dotenvy::dotenv() {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let db_config = DualDbConfig::from_env().context("Failed to load database configuration")?;
    let pools = bootstrap(&db_config)
        .await
        .context("Failed to initialize databases")?;

    let config = ServerConfig::default();
    let state = AppState::from_pools(pools, config.form_page.clone());

    run_server(state, config).await.context("Server error")?;

    Ok(())
}
