//! Error types for the scour host.

/// Top-level error type for the host application.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// Search pipeline error.
    #[error("search error: {0}")]
    Search(#[from] scour_search::SearchError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServiceError>;
