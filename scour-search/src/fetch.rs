//! Content retrieval, directly or through the bypass service.
//!
//! Every failure mode (network, timeout, non-success status, bypass
//! failure) is normalised into a [`FetchError`]. No retries happen here.

use crate::config::FetchConfig;
use crate::error::{FetchError, SearchError};
use crate::http;
use crate::request::{Payload, SearchRequest};
use crate::types::SearchType;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Extra time granted to the bypass HTTP call beyond the service's own
/// `maxTimeout`, so the service can report its timeout itself.
const BYPASS_GRACE_SECONDS: u64 = 5;

/// What a successful fetch produced.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// An HTML (or other markup) body to run selectors against.
    RawMarkup(String),
    /// A JSON API response that already carries result items.
    StructuredItems(Vec<serde_json::Value>),
}

#[derive(Debug, Serialize)]
struct BypassRequest<'a> {
    cmd: &'static str,
    url: &'a str,
    #[serde(rename = "maxTimeout")]
    max_timeout: u64,
}

#[derive(Debug, Deserialize)]
struct BypassResponse {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    solution: Option<BypassSolution>,
}

#[derive(Debug, Deserialize)]
struct BypassSolution {
    response: String,
}

/// Executes built requests against sources or the bypass service.
///
/// Cheap to share behind an `Arc`; the inner client pools connections.
#[derive(Debug, Clone)]
pub struct ContentFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl ContentFetcher {
    /// Create a fetcher from validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] for invalid configuration or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(config: FetchConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let client = http::build_client(&config)?;
        Ok(Self { client, config })
    }

    /// Returns the configuration this fetcher was built with.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Retrieve the content for `request`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on network failure, timeout, non-success
    /// status, or bypass-service failure.
    pub async fn fetch(
        &self,
        request: &SearchRequest,
        requires_bypass: bool,
    ) -> Result<FetchOutcome, FetchError> {
        if requires_bypass {
            if request.payload.is_some() {
                tracing::warn!(url = %request.url, "bypass fetch ignores the request payload");
            }
            self.fetch_via_bypass(&request.url).await
        } else {
            self.fetch_direct(request).await
        }
    }

    async fn fetch_direct(&self, request: &SearchRequest) -> Result<FetchOutcome, FetchError> {
        let timeout_secs = self.config.direct_timeout_seconds;
        tracing::trace!(method = %request.method, url = %request.url, "direct fetch");

        let mut builder = match request.method {
            SearchType::Get => self.client.get(request.url.clone()),
            SearchType::Post => self.client.post(request.url.clone()),
        }
        .timeout(Duration::from_secs(timeout_secs));

        builder = match &request.payload {
            Some(Payload::Json(value)) => builder.json(value),
            Some(Payload::Form(fields)) => builder.form(fields),
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout_secs))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| classify_reqwest_error(&e, timeout_secs))?;

        tracing::trace!(bytes = body.len(), "direct response received");
        Ok(classify_body(body))
    }

    async fn fetch_via_bypass(&self, url: &Url) -> Result<FetchOutcome, FetchError> {
        let timeout_secs = self.config.bypass_timeout_seconds;
        tracing::debug!(%url, bypass = %self.config.bypass_url, "delegating fetch to bypass service");

        let payload = BypassRequest {
            cmd: "request.get",
            url: url.as_str(),
            max_timeout: timeout_secs.saturating_mul(1000),
        };

        let response = self
            .client
            .post(&self.config.bypass_url)
            .json(&payload)
            .timeout(Duration::from_secs(timeout_secs + BYPASS_GRACE_SECONDS))
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    FetchError::Timeout(timeout_secs)
                } else {
                    FetchError::BypassUnreachable(e.to_string())
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| FetchError::BypassUnreachable(format!("response read failed: {e}")))?;

        parse_bypass_response(status.as_u16(), &body)
    }
}

/// Map a bypass-service reply onto a fetch outcome.
///
/// The service reports failures in its JSON body, often alongside a 500
/// status, so the body is inspected before the status code.
fn parse_bypass_response(status: u16, body: &str) -> Result<FetchOutcome, FetchError> {
    let parsed: BypassResponse = match serde_json::from_str(body) {
        Ok(parsed) => parsed,
        Err(e) if (200..300).contains(&status) => {
            return Err(FetchError::BypassUnreachable(format!(
                "malformed response: {e}"
            )));
        }
        Err(_) => {
            return Err(FetchError::BypassUnreachable(format!("HTTP status {status}")));
        }
    };

    if parsed.status == "ok" {
        return parsed
            .solution
            .map(|solution| FetchOutcome::RawMarkup(solution.response))
            .ok_or_else(|| FetchError::Bypass("response is missing the solution".into()));
    }

    let message = parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("status {}", parsed.status));
    Err(FetchError::Bypass(message))
}

/// Detect the pre-extracted API shape (`{"data": {"results": [...]}}`);
/// anything else is treated as markup.
pub fn classify_body(body: String) -> FetchOutcome {
    if body.trim_start().starts_with('{') {
        if let Ok(mut value) = serde_json::from_str::<serde_json::Value>(&body) {
            if let Some(serde_json::Value::Array(items)) = value
                .pointer_mut("/data/results")
                .map(serde_json::Value::take)
            {
                return FetchOutcome::StructuredItems(items);
            }
        }
    }
    FetchOutcome::RawMarkup(body)
}

fn classify_reqwest_error(err: &reqwest::Error, timeout_secs: u64) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout(timeout_secs)
    } else {
        FetchError::Network(err.to_string())
    }
}
