//! A single per-source search job and its state machine.

use crate::extract::{ExtractBody, ResultExtractor};
use crate::fetch::ContentFetcher;
use crate::request::{build_request, SearchRequest};
use crate::sink::ResultSink;
use crate::types::{JobState, SearchEvent, SessionId, SourceDefinition};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Semaphore};

/// One source searched for one term on behalf of one session.
#[derive(Debug, Clone)]
pub struct SearchJob {
    pub source: SourceDefinition,
    pub term: String,
    pub session: SessionId,
}

/// Shared collaborators a job needs; nothing in here is mutated by jobs.
#[derive(Clone)]
pub(crate) struct JobContext {
    pub fetcher: Arc<ContentFetcher>,
    pub sink: Arc<dyn ResultSink>,
    pub limiter: Arc<Semaphore>,
    pub extract_buffer: usize,
}

/// Run `job` to completion, publishing every transition on `state`.
///
/// Emits either zero or more `ResultFound` events, or exactly one
/// `SourceFailed` event, never both.
pub(crate) async fn run_job(job: SearchJob, ctx: JobContext, state: watch::Sender<JobState>) {
    // The limiter is never closed, so acquisition only fails if that changes.
    let _permit = ctx.limiter.acquire().await.ok();
    let source = job.source.name.clone();

    state.send_replace(JobState::Building);
    let (request, extractor) = match prepare(&job.source, &job.term) {
        Ok(prepared) => prepared,
        Err(err) => {
            tracing::warn!(%source, error = %err, "request build failed");
            let message = format!("Failed to build request for {source}: {err}");
            fail(&job, &ctx, &state, message).await;
            return;
        }
    };

    state.send_replace(JobState::Fetching);
    tracing::debug!(
        %source,
        bypass = job.source.requires_bypass,
        method = %request.method,
        "fetching"
    );
    let outcome = match ctx.fetcher.fetch(&request, job.source.requires_bypass).await {
        Ok(outcome) => outcome,
        Err(err) => {
            tracing::warn!(%source, error = %err, "fetch failed");
            let message = format!("Failed to fetch data from {source}: {err}");
            fail(&job, &ctx, &state, message).await;
            return;
        }
    };

    state.send_replace(JobState::Extracting);
    // HTML parsing is CPU-bound and the parsed document cannot cross threads,
    // so extraction runs on the blocking pool and hands records over.
    let (tx, mut rx) = mpsc::channel(ctx.extract_buffer.max(1));
    let extraction = tokio::task::spawn_blocking(move || {
        let body = ExtractBody::from(outcome);
        for record in extractor.extract(&body) {
            if tx.blocking_send(record).is_err() {
                break;
            }
        }
    });

    state.send_replace(JobState::Delivering);
    let mut delivered = 0usize;
    while let Some(record) = rx.recv().await {
        ctx.sink
            .deliver(&job.session, SearchEvent::ResultFound(record))
            .await;
        delivered += 1;
    }

    if let Err(err) = extraction.await {
        tracing::error!(%source, error = %err, "extraction task panicked");
    }

    state.send_replace(JobState::Done);
    tracing::info!(%source, delivered, "source finished");
}

fn prepare(
    source: &SourceDefinition,
    term: &str,
) -> Result<(SearchRequest, ResultExtractor), crate::error::BuildError> {
    let request = build_request(source, term)?;
    let extractor = ResultExtractor::for_source(source)?;
    Ok((request, extractor))
}

async fn fail(job: &SearchJob, ctx: &JobContext, state: &watch::Sender<JobState>, message: String) {
    state.send_replace(JobState::Failed);
    ctx.sink
        .deliver(
            &job.session,
            SearchEvent::SourceFailed {
                source: job.source.name.clone(),
                message,
            },
        )
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FetchConfig;
    use crate::types::{SearchType, SelectorSet};
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct CollectingSink {
        events: Mutex<Vec<SearchEvent>>,
    }

    #[async_trait]
    impl ResultSink for CollectingSink {
        async fn deliver(&self, _session: &SessionId, event: SearchEvent) {
            self.events.lock().await.push(event);
        }
    }

    fn job(endpoint: &str, container: &str) -> SearchJob {
        SearchJob {
            source: SourceDefinition {
                name: "Broken".into(),
                base_url: "https://example.org".into(),
                is_active: true,
                search_type: SearchType::Get,
                search_endpoint: endpoint.into(),
                post_payload_template: None,
                requires_bypass: false,
                selectors: SelectorSet {
                    container: container.into(),
                    title: "h2".into(),
                    link: "a".into(),
                    poster: "img".into(),
                    poster_attribute: "src".into(),
                },
            },
            term: "dune".into(),
            session: SessionId::new("s1"),
        }
    }

    fn context(sink: Arc<CollectingSink>) -> JobContext {
        JobContext {
            fetcher: Arc::new(ContentFetcher::new(FetchConfig::default()).expect("fetcher")),
            sink,
            limiter: Arc::new(Semaphore::new(1)),
            extract_buffer: 4,
        }
    }

    #[tokio::test]
    async fn missing_placeholder_fails_before_fetching() {
        let sink = Arc::new(CollectingSink::default());
        let (tx, rx) = watch::channel(JobState::Pending);

        run_job(job("/search", "article"), context(Arc::clone(&sink)), tx).await;

        assert_eq!(*rx.borrow(), JobState::Failed);
        let events = sink.events.lock().await;
        assert_eq!(events.len(), 1);
        match &events[0] {
            SearchEvent::SourceFailed { source, message } => {
                assert_eq!(source, "Broken");
                assert!(message.starts_with("Failed to build request for Broken"));
                assert!(message.contains("%QUERY%"));
            }
            other => panic!("expected SourceFailed, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_selector_fails_at_build() {
        let sink = Arc::new(CollectingSink::default());
        let (tx, rx) = watch::channel(JobState::Pending);

        run_job(job("/?s=%QUERY%", "div[["), context(Arc::clone(&sink)), tx).await;

        assert_eq!(*rx.borrow(), JobState::Failed);
        let events = sink.events.lock().await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            &events[0],
            SearchEvent::SourceFailed { message, .. } if message.contains("container selector")
        ));
    }
}
