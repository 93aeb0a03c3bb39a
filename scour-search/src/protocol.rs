//! Session wire protocol: inbound search requests and outbound messages.
//!
//! Inbound:
//!
//! ```json
//! { "action": "search", "term": "dune" }
//! ```
//!
//! Outbound messages are either an error or a result record:
//!
//! ```json
//! { "error": true, "message": "No search term provided." }
//! { "source": "Example", "title": "Dune", "link": "https://...", "poster": "https://..." }
//! ```

use crate::types::{ResultRecord, SearchEvent};
use serde::{Deserialize, Serialize};

/// The only inbound action that starts a search.
pub const SEARCH_ACTION: &str = "search";

/// A message received from a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub term: Option<String>,
}

impl InboundMessage {
    /// Build a search request for `term`.
    pub fn search(term: impl Into<String>) -> Self {
        Self {
            action: Some(SEARCH_ACTION.to_owned()),
            term: Some(term.into()),
        }
    }

    /// Returns `true` if this message asks for a search.
    pub fn is_search(&self) -> bool {
        self.action.as_deref() == Some(SEARCH_ACTION)
    }
}

/// Error payload; `source` is present only for per-source failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorMessage {
    pub error: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub message: String,
}

impl ErrorMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: true,
            source: None,
            message: message.into(),
        }
    }
}

/// A message sent to a client session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OutboundMessage {
    Error(ErrorMessage),
    Result(ResultRecord),
}

impl OutboundMessage {
    pub fn error(message: impl Into<String>) -> Self {
        Self::Error(ErrorMessage::new(message))
    }
}

impl From<SearchEvent> for OutboundMessage {
    fn from(event: SearchEvent) -> Self {
        match event {
            SearchEvent::ResultFound(record) => Self::Result(record),
            SearchEvent::SourceFailed { source, message } => Self::Error(ErrorMessage {
                error: true,
                source: Some(source),
                message,
            }),
            SearchEvent::SessionError { message } => Self::error(message),
        }
    }
}
