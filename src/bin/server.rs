//! WebSocket search server.
//!
//! Usage: `scour-server [--config PATH]`

use scour::{AppState, ScourConfig};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = parse_args()?;
    let config = ScourConfig::load(config_path.as_deref())?;

    scour::init_tracing(&config.logging.filter);
    tracing::info!(
        catalog = %config.catalog.path.display(),
        bypass = %config.fetch.bypass_url,
        "scour-server starting"
    );

    let state = AppState::from_config(&config)?;
    scour::server::run(&config, state).await.map_err(|e| {
        tracing::error!(error = %e, "scour-server exited with error");
        anyhow::anyhow!("scour-server failed: {e}")
    })?;

    Ok(())
}

fn parse_args() -> anyhow::Result<Option<PathBuf>> {
    let mut args = std::env::args().skip(1);
    match (args.next().as_deref(), args.next()) {
        (None, _) => Ok(None),
        (Some("--config"), Some(path)) => Ok(Some(PathBuf::from(path))),
        _ => anyhow::bail!("usage: scour-server [--config PATH]"),
    }
}
