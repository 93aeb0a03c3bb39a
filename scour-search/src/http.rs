//! Shared HTTP client for source requests.
//!
//! One [`reqwest::Client`] is built per [`crate::fetch::ContentFetcher`] and
//! shared by all of its jobs. Timeouts are applied per request because
//! direct fetches and bypass delegations use different limits.

use crate::config::FetchConfig;
use crate::error::SearchError;
use rand::Rng;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

/// Desktop browser identities; one is picked per client when no
/// User-Agent is configured.
const BROWSER_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/141.0.0.0 Safari/537.36 Edg/141.0.0.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 14_6) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.5 Safari/605.1.15",
    "Mozilla/5.0 (X11; Linux x86_64; rv:143.0) Gecko/20100101 Firefox/143.0",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/140.0.0.0 Safari/537.36",
];

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/json;q=0.9,*/*;q=0.8";

/// Build the client used for both direct fetches and bypass delegation.
///
/// Sends browser-like `Accept` headers, decompresses gzip and brotli, and
/// follows at most 10 redirects. There is no cookie store, so jobs never
/// share session state.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &FetchConfig) -> Result<reqwest::Client, SearchError> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_owned());

    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.8"));

    reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Pick one of the built-in browser User-Agents at random.
pub fn random_user_agent() -> &'static str {
    let index = rand::thread_rng().gen_range(0..BROWSER_USER_AGENTS.len());
    BROWSER_USER_AGENTS[index]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_user_agent_is_a_browser_identity() {
        for _ in 0..20 {
            let ua = random_user_agent();
            assert!(BROWSER_USER_AGENTS.contains(&ua));
            assert!(ua.starts_with("Mozilla/5.0"));
        }
    }

    #[test]
    fn default_config_builds() {
        assert!(build_client(&FetchConfig::default()).is_ok());
    }

    #[test]
    fn configured_user_agent_builds() {
        let config = FetchConfig {
            user_agent: Some("ScourBot/1.0".into()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn invalid_user_agent_is_http_error() {
        let config = FetchConfig {
            user_agent: Some("bad\nagent".into()),
            ..Default::default()
        };
        assert!(matches!(build_client(&config), Err(SearchError::Http(_))));
    }
}
