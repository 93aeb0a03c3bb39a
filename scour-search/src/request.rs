//! Request construction from a source's templated search rule.
//!
//! GET sources carry the percent-encoded term in the URL. POST sources carry
//! the raw term in a payload template, which is resolved by trying an ordered
//! list of payload strategies and keeping the first that succeeds.

use crate::error::BuildError;
use crate::types::{SearchType, SourceDefinition, PLACEHOLDER};
use url::Url;

/// Body sent with a POST search.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Sent as `application/json`.
    Json(serde_json::Value),
    /// Sent as `application/x-www-form-urlencoded`, fields in template order.
    Form(Vec<(String, String)>),
}

/// A concrete, fetchable request for one source.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub method: SearchType,
    pub url: Url,
    /// Present only for POST requests.
    pub payload: Option<Payload>,
}

type PayloadStrategy = fn(&str) -> Option<Payload>;

/// Payload strategies in priority order.
const PAYLOAD_STRATEGIES: &[(&str, PayloadStrategy)] = &[
    ("json", parse_json_payload),
    ("key-value", parse_key_value_payload),
];

/// Build the request for `source` searching for `term`.
///
/// The endpoint must carry the placeholder for every search type. Sources
/// routed through the bypass service are always built as GET, because the
/// bypass contract only retrieves pages by URL.
///
/// # Errors
///
/// Returns [`BuildError`] when the endpoint placeholder is missing, the POST
/// template is empty or unresolvable, or a URL does not parse. No network
/// call has been made when this fails.
pub fn build_request(source: &SourceDefinition, term: &str) -> Result<SearchRequest, BuildError> {
    parse_url(&source.base_url)?;
    require_placeholder("search_endpoint", &source.search_endpoint)?;
    let encoded = urlencoding::encode(term);

    let method = if source.requires_bypass {
        SearchType::Get
    } else {
        source.search_type
    };

    match method {
        SearchType::Get => {
            let url = endpoint_url(source, &encoded)?;
            Ok(SearchRequest {
                method,
                url,
                payload: None,
            })
        }
        SearchType::Post => {
            let template = source
                .post_payload_template
                .as_deref()
                .filter(|t| !t.trim().is_empty())
                .ok_or(BuildError::EmptyPayload)?;
            if !template.contains(PLACEHOLDER) {
                tracing::warn!(
                    source = %source.name,
                    placeholder = PLACEHOLDER,
                    "post_payload_template has no placeholder; term only travels in the URL"
                );
            }

            let url = endpoint_url(source, &encoded)?;
            let payload = resolve_payload(&template.replace(PLACEHOLDER, term))?;
            Ok(SearchRequest {
                method,
                url,
                payload: Some(payload),
            })
        }
    }
}

/// Resolve substituted payload text into a structured [`Payload`].
///
/// # Errors
///
/// Returns [`BuildError::UnstructuredPayload`] if no strategy accepts the text.
pub fn resolve_payload(text: &str) -> Result<Payload, BuildError> {
    PAYLOAD_STRATEGIES
        .iter()
        .find_map(|(name, strategy)| {
            let payload = strategy(text)?;
            tracing::trace!(strategy = name, "payload resolved");
            Some(payload)
        })
        .ok_or(BuildError::UnstructuredPayload)
}

/// Accepts JSON objects and arrays; scalars fall through to the next strategy.
fn parse_json_payload(text: &str) -> Option<Payload> {
    match serde_json::from_str::<serde_json::Value>(text) {
        Ok(value) if value.is_object() || value.is_array() => Some(Payload::Json(value)),
        _ => None,
    }
}

/// Parses `key:value` / `key=value` lines. A `:` anywhere in the line takes
/// priority over `=`; each line splits on the first occurrence.
fn parse_key_value_payload(text: &str) -> Option<Payload> {
    let mut fields: Vec<(String, String)> = Vec::new();

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':').or_else(|| line.split_once('=')) else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() {
            continue;
        }
        let value = value.trim().to_owned();
        match fields.iter_mut().find(|(k, _)| k == key) {
            Some(existing) => existing.1 = value,
            None => fields.push((key.to_owned(), value)),
        }
    }

    if fields.is_empty() {
        None
    } else {
        Some(Payload::Form(fields))
    }
}

fn require_placeholder(field: &'static str, template: &str) -> Result<(), BuildError> {
    if template.contains(PLACEHOLDER) {
        Ok(())
    } else {
        Err(BuildError::MissingPlaceholder {
            field,
            placeholder: PLACEHOLDER,
        })
    }
}

/// Base URL (trailing slash stripped) + endpoint with every placeholder
/// replaced by the encoded term.
fn endpoint_url(source: &SourceDefinition, encoded_term: &str) -> Result<Url, BuildError> {
    let endpoint = source.search_endpoint.replace(PLACEHOLDER, encoded_term);
    let separator = if endpoint.is_empty() || endpoint.starts_with(['/', '?', '#']) {
        ""
    } else {
        "/"
    };
    let raw = format!(
        "{}{separator}{endpoint}",
        source.base_url.trim_end_matches('/')
    );
    parse_url(&raw)
}

fn parse_url(raw: &str) -> Result<Url, BuildError> {
    Url::parse(raw).map_err(|e| BuildError::InvalidUrl {
        url: raw.to_owned(),
        reason: e.to_string(),
    })
}
