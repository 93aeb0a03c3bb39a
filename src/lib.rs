//! Host application for the `scour-search` pipeline.
//!
//! Loads configuration, reads source definitions from a TOML catalog file,
//! and serves searches to WebSocket clients. The pipeline itself lives in
//! [`scour_search`].

pub mod catalog;
pub mod config;
pub mod error;
pub mod server;
pub mod sink;

pub use catalog::FileCatalog;
pub use config::ScourConfig;
pub use error::{Result, ServiceError};
pub use server::AppState;

/// Install the global tracing subscriber, writing to stderr.
///
/// `RUST_LOG` takes precedence over `default_filter`.
pub fn init_tracing(default_filter: &str) {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}
