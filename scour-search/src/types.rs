//! Core types: source definitions, result records, and pipeline events.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Substitution marker standing for the search term inside templates.
pub const PLACEHOLDER: &str = "%QUERY%";

/// How a source expects the search term to be submitted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SearchType {
    /// Term is placed in the URL of a GET request.
    #[default]
    Get,
    /// Term is placed in a POST payload built from a template.
    Post,
}

impl SearchType {
    /// Returns the HTTP method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CSS selectors describing where result items live in a source's markup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorSet {
    /// Selects one node per candidate result item.
    pub container: String,
    /// Selects the title node, relative to the container.
    pub title: String,
    /// Selects the `<a>` node whose `href` is the result link.
    pub link: String,
    /// Selects the image node holding the poster URL.
    pub poster: String,
    /// Attribute read off the poster node (`src`, `data-src`, ...).
    #[serde(default = "default_poster_attribute")]
    pub poster_attribute: String,
}

fn default_poster_attribute() -> String {
    "src".to_owned()
}

fn default_true() -> bool {
    true
}

/// Declarative description of one external content source.
///
/// Owned by the catalog; the pipeline only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDefinition {
    /// Unique human identifier, echoed in every event for this source.
    pub name: String,
    /// Absolute base URL, e.g. `https://example.org`.
    pub base_url: String,
    /// Inactive sources are never dispatched.
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default)]
    pub search_type: SearchType,
    /// Path template, e.g. `/?s=%QUERY%`.
    pub search_endpoint: String,
    /// POST body template with the raw term substituted for the placeholder.
    #[serde(default)]
    pub post_payload_template: Option<String>,
    /// Route fetches through the bypass service instead of a direct request.
    #[serde(default)]
    pub requires_bypass: bool,
    pub selectors: SelectorSet,
}

/// A single extracted result, emitted once then discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    /// Name of the source that produced this result.
    pub source: String,
    pub title: String,
    /// Absolute URL of the result page.
    pub link: String,
    /// Absolute URL of the poster image.
    pub poster: String,
}

/// Opaque identifier of the client session a search streams to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Typed event delivered to a session's sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchEvent {
    /// One extracted result.
    ResultFound(ResultRecord),
    /// A source's job ended without results because building or fetching failed.
    SourceFailed { source: String, message: String },
    /// The search could not start at all (no term, no configured sources).
    SessionError { message: String },
}

/// Lifecycle of one per-source search job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobState {
    Pending,
    Building,
    Fetching,
    Extracting,
    Delivering,
    Done,
    Failed,
}

impl JobState {
    /// Returns `true` for `Done` and `Failed`.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Pending => "pending",
            Self::Building => "building",
            Self::Fetching => "fetching",
            Self::Extracting => "extracting",
            Self::Delivering => "delivering",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}
