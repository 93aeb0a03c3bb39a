//! Search orchestrator: one isolated job per active source, run concurrently.
//!
//! Each job walks `Pending → Building → Fetching → Extracting → Delivering →
//! Done`, or ends in `Failed` after building or fetching goes wrong. Results
//! are streamed to the session's sink one event per record; a failing source
//! produces exactly one `SourceFailed` event and never affects its siblings.

pub mod job;
pub mod search;

pub use job::SearchJob;
pub use search::{SearchHandle, SearchOrchestrator};
