//! # scour-search
//!
//! Concurrent fan-out search across declaratively configured content
//! sources.
//!
//! Each source is a [`SourceDefinition`]: a templated search rule (GET URL or
//! POST payload with a `%QUERY%` placeholder) plus CSS selectors describing
//! where result items live in the response. A search runs one isolated job
//! per active source and streams every extracted [`ResultRecord`] to the
//! requesting session as soon as it is found.
//!
//! ## Design
//!
//! - [`request`] builds a GET or POST request from a source's templates;
//!   POST payloads are resolved JSON-first with a key/value fallback
//! - [`fetch`] retrieves content directly or through a bypass service for
//!   sites that block automated clients
//! - [`extract`] walks result containers lazily and skips malformed items
//!   instead of failing the batch
//! - [`orchestrator`] runs the jobs concurrently; a failing source produces
//!   exactly one `SourceFailed` event and never affects the others
//! - [`sink`] is the boundary to whatever transport carries the session
//!
//! No deduplication, ranking, caching, or retries are performed.

pub mod catalog;
pub mod config;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod http;
pub mod orchestrator;
pub mod protocol;
pub mod request;
pub mod sink;
pub mod types;
pub mod url_resolve;

pub use catalog::{SourceCatalog, StaticCatalog};
pub use config::{FetchConfig, OrchestratorConfig};
pub use error::{BuildError, FetchError, Result, SearchError};
pub use fetch::{ContentFetcher, FetchOutcome};
pub use orchestrator::{SearchHandle, SearchOrchestrator};
pub use protocol::{InboundMessage, OutboundMessage};
pub use sink::{ResultSink, SessionRegistry};
pub use types::{
    JobState, ResultRecord, SearchEvent, SearchType, SelectorSet, SessionId, SourceDefinition,
};
