//! Pipeline Orchestrator.
//!
//! One run per source: enumerate → dedup check → select → dispatch
//! (fetch → transform → deliver → commit) → join → summary.
//!
//! Delivery is at-least-once: an identifier is committed only after the sink
//! accepted the payload, so a crash or store failure between the two leads to
//! a duplicate on the next run, never a silent loss.

use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::dispatch::Dispatcher;
use crate::error::{CandidateError, CandidateResult, SinkError, SourceError, SourceResult};
use crate::select::select;
use crate::traits::{sink::NotificationSink, source::SourceAdapter, store::DedupStore};
use crate::types::{
    candidate::{Candidate, Tracked},
    config::{PipelineConfig, RunOptions, RunSummary},
};

/// Wires a Dedup Store and a Notification Sink to any number of sources.
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn DedupStore>,
    sink: Arc<dyn NotificationSink>,
    config: PipelineConfig,
}

impl Pipeline {
    pub fn new(store: Arc<dyn DedupStore>, sink: Arc<dyn NotificationSink>) -> Self {
        Self {
            store,
            sink,
            config: PipelineConfig::default(),
        }
    }

    pub fn with_config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run one source to completion.
    ///
    /// Returns `Err` only for source-level failures (listing unreachable,
    /// malformed date); in that case nothing from the source was processed.
    /// Candidate failures are logged and counted in the summary.
    pub async fn run(
        &self,
        source: Arc<dyn SourceAdapter>,
        options: &RunOptions,
    ) -> SourceResult<RunSummary> {
        let name = source.name().to_string();
        info!(source = %name, policy = ?options.policy, "Starting source run");

        let candidates = source.list_candidates(&options.filters).await?;
        let mut summary = RunSummary {
            discovered: candidates.len(),
            ..Default::default()
        };

        let mut tracked = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            match self.store.is_processed(&candidate.identifier).await {
                Ok(true) => {
                    debug!(source = %name, id = %candidate.identifier, "Already processed");
                    summary.skipped += 1;
                    tracked.push(Tracked::processed(candidate));
                }
                Ok(false) => tracked.push(Tracked::pending(candidate)),
                Err(e) => {
                    let err = CandidateError::Lookup(e);
                    warn!(source = %name, id = %candidate.identifier, error = %err, "Candidate failed");
                    summary.failed += 1;
                    tracked.push(Tracked::processed(candidate));
                }
            }
        }

        let selected = select(tracked, options.policy);
        summary.attempted = selected.len();
        if selected.is_empty() {
            info!(source = %name, discovered = summary.discovered, "Nothing to process");
            return Ok(summary);
        }
        info!(
            source = %name,
            selected = selected.len(),
            max_concurrency = self.config.max_concurrency,
            "Dispatching candidates"
        );

        let mut dispatcher = Dispatcher::new(self.config.max_concurrency);
        for candidate in selected {
            let task = process_candidate(
                source.clone(),
                self.store.clone(),
                self.sink.clone(),
                self.config.delivery_timeout,
                candidate,
            );
            if let Err(e) = dispatcher.submit(task).await {
                error!(source = %name, error = %e, "Dispatcher refused candidate");
                summary.failed += 1;
            }
        }

        for joined in dispatcher.join_all().await {
            let outcome = joined.unwrap_or_else(|e| Err(CandidateError::Panicked(e.to_string())));
            match outcome {
                Ok(()) => summary.delivered += 1,
                Err(CandidateError::Commit(_)) => {
                    summary.delivered += 1;
                    summary.uncommitted += 1;
                }
                Err(CandidateError::Panicked(reason)) => {
                    error!(source = %name, reason = %reason, "Candidate task panicked");
                    summary.failed += 1;
                }
                Err(_) => summary.failed += 1,
            }
        }

        info!(
            source = %name,
            discovered = summary.discovered,
            skipped = summary.skipped,
            attempted = summary.attempted,
            delivered = summary.delivered,
            failed = summary.failed,
            uncommitted = summary.uncommitted,
            "Source run complete"
        );
        Ok(summary)
    }

    /// Run several sources concurrently.
    ///
    /// A source-level failure is logged and reported for that source only;
    /// siblings keep running.
    pub async fn run_all(
        &self,
        sources: Vec<(Arc<dyn SourceAdapter>, RunOptions)>,
    ) -> Vec<(String, SourceResult<RunSummary>)> {
        let runs = sources.into_iter().map(|(source, options)| async move {
            let name = source.name().to_string();
            let result = self.run(source, &options).await;
            if let Err(e) = &result {
                error!(source = %name, error = %e, "Source run aborted");
            }
            (name, result)
        });
        join_all(runs).await
    }
}

/// fetch → transform → deliver → commit for one candidate.
///
/// Errors are logged here and returned only for counting; they never cross
/// the task boundary as panics.
async fn process_candidate(
    source: Arc<dyn SourceAdapter>,
    store: Arc<dyn DedupStore>,
    sink: Arc<dyn NotificationSink>,
    delivery_timeout: Duration,
    candidate: Candidate,
) -> CandidateResult<()> {
    let result = deliver_candidate(&*source, &*store, &*sink, delivery_timeout, &candidate).await;

    match &result {
        Ok(()) => info!(
            source = %source.name(),
            sink = %sink.name(),
            id = %candidate.identifier,
            title = %candidate.title,
            "Delivered"
        ),
        Err(e @ CandidateError::Commit(_)) => error!(
            source = %source.name(),
            id = %candidate.identifier,
            error = %e,
            "Delivered but not committed; it will be delivered again next run"
        ),
        Err(e) => warn!(
            source = %source.name(),
            id = %candidate.identifier,
            error = %e,
            "Candidate failed"
        ),
    }
    result
}

async fn deliver_candidate(
    source: &dyn SourceAdapter,
    store: &dyn DedupStore,
    sink: &dyn NotificationSink,
    delivery_timeout: Duration,
    candidate: &Candidate,
) -> CandidateResult<()> {
    let detail = source.fetch_detail(candidate).await?;
    let payload = source.transform(candidate, detail)?;

    match tokio::time::timeout(delivery_timeout, sink.deliver(&payload)).await {
        Ok(delivered) => delivered?,
        Err(_) => {
            return Err(SinkError::Timeout {
                seconds: delivery_timeout.as_secs(),
            }
            .into())
        }
    }

    store
        .mark_processed(&candidate.identifier)
        .await
        .map_err(CandidateError::Commit)
}

/// Flatten `run_all` results into totals, counting aborted sources.
pub fn total(results: &[(String, SourceResult<RunSummary>)]) -> (RunSummary, Vec<&SourceError>) {
    let mut totals = RunSummary::default();
    let mut aborted = Vec::new();
    for (_, result) in results {
        match result {
            Ok(s) => {
                totals.discovered += s.discovered;
                totals.skipped += s.skipped;
                totals.attempted += s.attempted;
                totals.delivered += s.delivered;
                totals.failed += s.failed;
                totals.uncommitted += s.uncommitted;
            }
            Err(e) => aborted.push(e),
        }
    }
    (totals, aborted)
}
