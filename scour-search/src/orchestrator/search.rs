//! Core search orchestrator: concurrent per-source fan-out.
//!
//! Reads the catalog once per search, spawns one job per active source, and
//! returns a [`SearchHandle`] that can enumerate the jobs' states. Events go
//! to the sink handed in at search start; the orchestrator itself holds no
//! per-session state.

use crate::catalog::SourceCatalog;
use crate::config::{FetchConfig, OrchestratorConfig};
use crate::error::SearchError;
use crate::fetch::ContentFetcher;
use crate::sink::ResultSink;
use crate::types::{JobState, SearchEvent, SessionId};
use std::sync::Arc;
use tokio::sync::{watch, Semaphore};
use tokio::task::JoinHandle;

use super::job::{run_job, JobContext, SearchJob};

/// Sent when a search request carries no usable term.
pub const NO_TERM_MESSAGE: &str = "No search term provided.";

/// Sent when the catalog has no active sources.
pub const NO_SOURCES_MESSAGE: &str = "No active sites configured.";

/// Fans searches out to every active source in a catalog.
pub struct SearchOrchestrator {
    catalog: Arc<dyn SourceCatalog>,
    fetcher: Arc<ContentFetcher>,
    limiter: Arc<Semaphore>,
    config: OrchestratorConfig,
}

impl SearchOrchestrator {
    /// Create an orchestrator reading sources from `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if either configuration is invalid, or
    /// [`SearchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        catalog: Arc<dyn SourceCatalog>,
        fetch: FetchConfig,
        config: OrchestratorConfig,
    ) -> Result<Self, SearchError> {
        let fetcher = ContentFetcher::new(fetch)?;
        Self::with_fetcher(catalog, fetcher, config)
    }

    /// Create an orchestrator around an existing fetcher.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` is invalid.
    pub fn with_fetcher(
        catalog: Arc<dyn SourceCatalog>,
        fetcher: ContentFetcher,
        config: OrchestratorConfig,
    ) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            catalog,
            fetcher: Arc::new(fetcher),
            limiter: Arc::new(Semaphore::new(config.max_concurrent_jobs)),
            config,
        })
    }

    /// Start a search for `term` on behalf of `session`.
    ///
    /// Returns as soon as the jobs are spawned. The term reaches every job
    /// exactly as given; only the emptiness check ignores whitespace. When
    /// the term is blank or no source is active, exactly one `SessionError`
    /// event is delivered and the returned handle holds no jobs. There is no
    /// "search finished" event; callers that need completion locally await
    /// the handle.
    pub async fn start_search(
        &self,
        term: &str,
        session: SessionId,
        sink: Arc<dyn ResultSink>,
    ) -> SearchHandle {
        if term.trim().is_empty() {
            tracing::debug!(%session, "search rejected: empty term");
            session_error(&sink, &session, NO_TERM_MESSAGE).await;
            return SearchHandle::default();
        }

        let sources = match self.catalog.list_active().await {
            Ok(sources) => sources,
            Err(err) => {
                tracing::error!(%session, error = %err, "failed to read source catalog");
                session_error(&sink, &session, &format!("Could not read source catalog: {err}"))
                    .await;
                return SearchHandle::default();
            }
        };
        let sources: Vec<_> = sources.into_iter().filter(|s| s.is_active).collect();

        if sources.is_empty() {
            tracing::warn!(%session, "search rejected: no active sources");
            session_error(&sink, &session, NO_SOURCES_MESSAGE).await;
            return SearchHandle::default();
        }

        tracing::info!(%session, sources = sources.len(), "starting search");
        tracing::trace!(%session, term, "search term");

        let jobs = sources
            .into_iter()
            .map(|source| {
                let name = source.name.clone();
                let job = SearchJob {
                    source,
                    term: term.to_owned(),
                    session: session.clone(),
                };
                let ctx = JobContext {
                    fetcher: Arc::clone(&self.fetcher),
                    sink: Arc::clone(&sink),
                    limiter: Arc::clone(&self.limiter),
                    extract_buffer: self.config.extract_buffer,
                };
                let (state_tx, state_rx) = watch::channel(JobState::Pending);
                let task = tokio::spawn(run_job(job, ctx, state_tx));
                JobHandle {
                    source: name,
                    state: state_rx,
                    task,
                }
            })
            .collect();

        SearchHandle { jobs }
    }
}

async fn session_error(sink: &Arc<dyn ResultSink>, session: &SessionId, message: &str) {
    sink.deliver(
        session,
        SearchEvent::SessionError {
            message: message.to_owned(),
        },
    )
    .await;
}

struct JobHandle {
    source: String,
    state: watch::Receiver<JobState>,
    task: JoinHandle<()>,
}

/// Tracks the jobs of one search.
///
/// Dropping the handle detaches the jobs; they still run to completion.
#[derive(Default)]
pub struct SearchHandle {
    jobs: Vec<JobHandle>,
}

impl SearchHandle {
    /// Number of jobs spawned for this search.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// Current `(source, state)` of every job, in catalog order.
    pub fn states(&self) -> Vec<(String, JobState)> {
        self.jobs
            .iter()
            .map(|job| (job.source.clone(), *job.state.borrow()))
            .collect()
    }

    /// Returns `true` once every job has reached `Done` or `Failed`.
    pub fn is_finished(&self) -> bool {
        self.jobs.iter().all(|job| job.state.borrow().is_terminal())
    }

    /// Wait for every job to end and return their final states.
    ///
    /// A job whose task panicked is reported as `Failed`.
    pub async fn wait(self) -> Vec<(String, JobState)> {
        let (meta, tasks): (Vec<_>, Vec<_>) = self
            .jobs
            .into_iter()
            .map(|job| ((job.source, job.state), job.task))
            .unzip();

        let joined = futures::future::join_all(tasks).await;

        meta.into_iter()
            .zip(joined)
            .map(|((source, state), result)| match result {
                Ok(()) => (source, *state.borrow()),
                Err(err) => {
                    tracing::error!(%source, error = %err, "search job panicked");
                    (source, JobState::Failed)
                }
            })
            .collect()
    }
}
