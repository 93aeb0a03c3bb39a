//! Error types for the scour-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. Per-source errors ([`BuildError`],
//! [`FetchError`]) never escape the job that produced them; they are
//! rendered into a `SourceFailed` event instead.

/// Errors raised while turning a source definition into a request.
///
/// Always produced before any network call is made.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// A template that must carry the search-term placeholder does not.
    #[error("{field} does not contain the {placeholder} placeholder")]
    MissingPlaceholder {
        field: &'static str,
        placeholder: &'static str,
    },

    /// POST was selected but the payload template is empty.
    #[error("POST search selected but the payload template is empty")]
    EmptyPayload,

    /// The payload parsed neither as JSON nor as key/value lines.
    #[error("payload not structured and not key-value")]
    UnstructuredPayload,

    /// The base URL or the built request URL is not a valid absolute URL.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    /// One of the source's CSS selectors does not compile.
    #[error("invalid {field} selector {selector:?}")]
    InvalidSelector {
        field: &'static str,
        selector: String,
    },
}

/// Errors raised while retrieving a source's content.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),

    /// Connection, TLS, or body-read failure.
    #[error("network error: {0}")]
    Network(String),

    /// The site answered with a non-success HTTP status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The bypass service could not be reached or answered garbage.
    #[error("bypass service unreachable: {0}")]
    BypassUnreachable(String),

    /// The bypass service reported a failure for this URL.
    #[error("bypass service failed: {0}")]
    Bypass(String),
}

/// Errors that can occur in the search pipeline outside a single source.
///
/// Per-source [`BuildError`]s and [`FetchError`]s never surface here; they
/// end inside their job as a `SourceFailed` event.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The source catalog could not be read.
    #[error("catalog error: {0}")]
    Catalog(String),

    /// Invalid configuration.
    #[error("config error: {0}")]
    Config(String),

    /// An HTTP client could not be constructed.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Convenience type alias for scour-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
