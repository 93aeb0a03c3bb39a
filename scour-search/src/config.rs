//! Pipeline configuration with sensible defaults.
//!
//! [`FetchConfig`] controls timeouts, the bypass service endpoint, and
//! request headers. [`OrchestratorConfig`] bounds job concurrency and the
//! hand-off buffer between extraction and delivery.

use crate::error::SearchError;
use serde::{Deserialize, Serialize};

/// Default address of the bypass (challenge-solving) service.
pub const DEFAULT_BYPASS_URL: &str = "http://flaresolverr:8191/v1";

/// Configuration for content retrieval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout for direct requests to a source, in seconds.
    pub direct_timeout_seconds: u64,
    /// How long the bypass service may spend on one page, in seconds.
    pub bypass_timeout_seconds: u64,
    /// Endpoint of the bypass service.
    pub bypass_url: String,
    /// Custom User-Agent string. If `None`, rotates through a built-in list
    /// of realistic browser User-Agents.
    pub user_agent: Option<String>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            direct_timeout_seconds: 10,
            bypass_timeout_seconds: 60,
            bypass_url: DEFAULT_BYPASS_URL.to_owned(),
            user_agent: None,
        }
    }
}

impl FetchConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.direct_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "direct_timeout_seconds must be greater than 0".into(),
            ));
        }
        if self.bypass_timeout_seconds == 0 {
            return Err(SearchError::Config(
                "bypass_timeout_seconds must be greater than 0".into(),
            ));
        }
        if url::Url::parse(&self.bypass_url).is_err() {
            return Err(SearchError::Config(format!(
                "bypass_url is not a valid URL: {}",
                self.bypass_url
            )));
        }
        if matches!(self.user_agent.as_deref(), Some(ua) if ua.trim().is_empty()) {
            return Err(SearchError::Config("user_agent must not be empty".into()));
        }
        Ok(())
    }
}

/// Configuration for the search orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Upper bound on jobs running at once across all searches.
    pub max_concurrent_jobs: usize,
    /// Records buffered between the extraction thread and delivery.
    pub extract_buffer: usize,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_jobs: 16,
            extract_buffer: 32,
        }
    }
}

impl OrchestratorConfig {
    /// Validates this configuration, returning an error if any field is invalid.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.max_concurrent_jobs == 0 {
            return Err(SearchError::Config(
                "max_concurrent_jobs must be greater than 0".into(),
            ));
        }
        if self.extract_buffer == 0 {
            return Err(SearchError::Config(
                "extract_buffer must be greater than 0".into(),
            ));
        }
        Ok(())
    }
}
