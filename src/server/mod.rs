//! HTTP/WebSocket surface.
//!
//! - `GET /health` returns `{"status":"ok"}`
//! - `GET /ws/search/` upgrades to a WebSocket session; each text frame
//!   `{"action":"search","term":"..."}` starts a search whose events stream
//!   back as JSON text frames

mod ws;

use crate::catalog::FileCatalog;
use crate::config::ScourConfig;
use crate::error::Result;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use scour_search::{SearchOrchestrator, SessionRegistry, SourceCatalog};
use std::sync::Arc;
use std::time::Duration;

/// Shared state for every connection.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<SearchOrchestrator>,
    pub registry: Arc<SessionRegistry>,
    pub session_buffer: usize,
}

impl AppState {
    /// Build state from configuration, reading sources from the configured
    /// catalog file.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be built.
    pub fn from_config(config: &ScourConfig) -> Result<Self> {
        config.validate()?;
        let catalog = Arc::new(FileCatalog::new(&config.catalog.path));
        Self::with_catalog(config, catalog)
    }

    /// Build state around an arbitrary catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the fetch or orchestrator configuration is invalid.
    pub fn with_catalog(config: &ScourConfig, catalog: Arc<dyn SourceCatalog>) -> Result<Self> {
        let orchestrator = SearchOrchestrator::new(
            catalog,
            config.fetch.clone(),
            config.orchestrator.clone(),
        )?;
        Ok(Self {
            orchestrator: Arc::new(orchestrator),
            registry: Arc::new(SessionRegistry::new(Duration::from_millis(
                config.server.delivery_timeout_ms,
            ))),
            session_buffer: config.server.session_buffer,
        })
    }
}

/// Routes served by the host.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws/search/", get(ws::ws_handler))
        .route("/ws/search", get(ws::ws_handler))
        .with_state(state)
}

/// Bind `host:port` and serve until the process is stopped.
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails.
pub async fn run(config: &ScourConfig, state: AppState) -> Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    serve(listener, state).await
}

/// Serve on an already bound listener.
///
/// # Errors
///
/// Returns an error if the server fails.
pub async fn serve(listener: tokio::net::TcpListener, state: AppState) -> Result<()> {
    let local_addr = listener.local_addr()?;
    tracing::info!("scour listening on http://{local_addr}");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok"
    }))
}
